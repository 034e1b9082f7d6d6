use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub user_type: FeedbackUserType,
    pub benefits: Vec<String>,
    pub future_use: FutureUse,
    pub suggestions: Option<String>,
    pub rating: i32,
    pub submitted_at: DateTime<Utc>,
    pub metadata: RequestMetadata,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackUserType {
    Student,
    Institute,
}

impl FeedbackUserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackUserType::Student => "student",
            FeedbackUserType::Institute => "institute",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(FeedbackUserType::Student),
            "institute" => Some(FeedbackUserType::Institute),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FutureUse {
    Yes,
    No,
}

impl FutureUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            FutureUse::Yes => "yes",
            FutureUse::No => "no",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yes" => Some(FutureUse::Yes),
            "no" => Some(FutureUse::No),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub user_type: FeedbackUserType,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub future_use: FutureUse,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Suggestions cannot exceed 1000 characters"))]
    pub suggestions: Option<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
}

impl CreateFeedbackRequest {
    /// Trims text, drops blank suggestions and collapses the benefit tags
    /// into a sorted set.
    pub fn normalized(mut self) -> Self {
        let mut benefits: Vec<String> = self
            .benefits
            .iter()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect();
        benefits.sort();
        benefits.dedup();
        self.benefits = benefits;
        self.suggestions = self
            .suggestions
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }
}
