use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{CreateFeedbackRequest, Feedback, RequestMetadata},
    error::{AppError, Result},
    repository::FeedbackRepository,
};

pub struct FeedbackService {
    repo: Arc<dyn FeedbackRepository>,
}

impl FeedbackService {
    pub fn new(repo: Arc<dyn FeedbackRepository>) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, request: CreateFeedbackRequest, metadata: RequestMetadata) -> Result<Feedback> {
        let request = request.normalized();
        request.validate()?;

        let feedback = self.repo.create(Feedback {
            id: Uuid::new_v4(),
            user_type: request.user_type,
            benefits: request.benefits,
            future_use: request.future_use,
            suggestions: request.suggestions,
            rating: request.rating,
            submitted_at: Utc::now(),
            metadata,
        }).await?;

        tracing::info!("Feedback {} received (rating {})", feedback.id, feedback.rating);
        Ok(feedback)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Feedback>> {
        self.repo.list().await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Feedback not found".to_string()));
        }
        Ok(())
    }
}
