use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{InstituteSummary, StudentSummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "eventName")]
    pub name: String,
    pub event_type: EventType,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub venue: String,
    pub timings: Option<String>,
    #[serde(rename = "fees")]
    pub fee: f64,
    pub capacity: i64,
    pub status: EventStatus,
    pub institute_id: Uuid,
    pub registered_students: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    Hackathon,
    CodingCompetition,
    ProjectExpo,
    Workshop,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Hackathon => "hackathon",
            EventType::CodingCompetition => "coding-competition",
            EventType::ProjectExpo => "project-expo",
            EventType::Workshop => "workshop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hackathon" => Some(EventType::Hackathon),
            "coding-competition" => Some(EventType::CodingCompetition),
            "project-expo" => Some(EventType::ProjectExpo),
            "workshop" => Some(EventType::Workshop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EventStatus {
    #[default]
    Active,
    Ended,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Active => "Active",
            EventStatus::Ended => "Ended",
            EventStatus::Cancelled => "Cancelled",
        }
    }

    /// Whether `self -> next` is allowed. In permissive mode every status is
    /// reachable from every other one; strict mode makes Ended and Cancelled
    /// terminal.
    pub fn can_transition_to(self, next: EventStatus, strict: bool) -> bool {
        if !strict || self == next {
            return true;
        }
        matches!(
            (self, next),
            (EventStatus::Active, EventStatus::Ended) | (EventStatus::Active, EventStatus::Cancelled)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(EventStatus::Active),
            "Ended" => Ok(EventStatus::Ended),
            "Cancelled" => Ok(EventStatus::Cancelled),
            other => Err(format!(
                "Invalid status '{}'. Expected one of: Active, Ended, Cancelled",
                other
            )),
        }
    }
}

/// Why a roster mutation was refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Event is not open for registration (status: {0})")]
    InvalidState(EventStatus),

    #[error("Registration deadline has passed")]
    DeadlinePassed,

    #[error("Event has reached its capacity")]
    CapacityExceeded,

    #[error("Already registered for this event")]
    AlreadyRegistered,

    #[error("Not registered for this event")]
    NotRegistered,
}

impl Event {
    pub fn is_registered(&self, student_id: Uuid) -> bool {
        self.registered_students.contains(&student_id)
    }

    pub fn registrant_count(&self) -> i64 {
        self.registered_students.len() as i64
    }

    pub fn remaining_seats(&self) -> i64 {
        (self.capacity - self.registrant_count()).max(0)
    }

    /// Checks run in a fixed order: status, deadline, capacity, duplicate.
    pub fn check_can_register(
        &self,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), RegistrationError> {
        if self.status != EventStatus::Active {
            return Err(RegistrationError::InvalidState(self.status));
        }
        if now > self.deadline {
            return Err(RegistrationError::DeadlinePassed);
        }
        if self.registrant_count() >= self.capacity {
            return Err(RegistrationError::CapacityExceeded);
        }
        if self.is_registered(student_id) {
            return Err(RegistrationError::AlreadyRegistered);
        }
        Ok(())
    }

    pub fn check_can_unregister(&self, student_id: Uuid) -> Result<(), RegistrationError> {
        if !self.is_registered(student_id) {
            return Err(RegistrationError::NotRegistered);
        }
        Ok(())
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            name: self.name.clone(),
            event_type: self.event_type,
            description: self.description.clone(),
            event_date: self.event_date,
            deadline: self.deadline,
            venue: self.venue.clone(),
            timings: self.timings.clone(),
            fee: self.fee,
            capacity: self.capacity,
        }
    }
}

/// The institute-editable part of an event. Used both as the create payload
/// and as the merged result of a partial update, so both paths share one
/// set of validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_schedule"))]
pub struct EventDraft {
    #[serde(rename = "eventName")]
    #[validate(length(min = 1, max = 200, message = "Event name is required"))]
    pub name: String,
    pub event_type: EventType,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    #[validate(length(min = 1, message = "Venue is required"))]
    pub venue: String,
    #[serde(default)]
    pub timings: Option<String>,
    #[serde(rename = "fees", default)]
    #[validate(range(min = 0.0, message = "Fees cannot be negative"))]
    pub fee: f64,
    #[validate(range(min = 1, message = "Capacity must be a positive integer"))]
    pub capacity: i64,
}

impl EventDraft {
    /// Trims free-text fields; blank timings become `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.venue = self.venue.trim().to_string();
        self.timings = self
            .timings
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn apply(mut self, patch: UpdateEventRequest) -> Self {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(event_type) = patch.event_type {
            self.event_type = event_type;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(event_date) = patch.event_date {
            self.event_date = event_date;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(venue) = patch.venue {
            self.venue = venue;
        }
        if let Some(timings) = patch.timings {
            self.timings = Some(timings);
        }
        if let Some(fee) = patch.fee {
            self.fee = fee;
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        self
    }
}

fn validate_schedule(draft: &EventDraft) -> Result<(), ValidationError> {
    if draft.deadline > draft.event_date {
        let mut err = ValidationError::new("deadline_after_event_date");
        err.message = Some("Registration deadline must be on or before the event date".into());
        return Err(err);
    }
    if !draft.fee.is_finite() {
        let mut err = ValidationError::new("invalid_fee");
        err.message = Some("Fees must be a finite number".into());
        return Err(err);
    }
    Ok(())
}

/// Partial update. Status and roster are deliberately absent: status moves
/// only through the status endpoint and the roster only through
/// register/unregister.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(rename = "eventName")]
    pub name: Option<String>,
    pub event_type: Option<EventType>,
    pub description: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub timings: Option<String>,
    #[serde(rename = "fees")]
    pub fee: Option<f64>,
    pub capacity: Option<i64>,
}

/// An event with its owner and registrants resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub institute: Option<InstituteSummary>,
    pub registrants: Vec<StudentSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventStatistics {
    pub event_id: Uuid,
    pub total_registrations: i64,
    pub capacity: i64,
    pub remaining_seats: i64,
    pub capacity_used: String,
    pub total_revenue: f64,
    pub university_distribution: BTreeMap<String, usize>,
    pub major_distribution: BTreeMap<String, usize>,
}

impl EventStatistics {
    /// Buckets are keyed by the exact stored strings; "IIT Delhi" and
    /// "iit delhi" stay separate.
    pub fn compute(event: &Event, registrants: &[StudentSummary]) -> Self {
        let total = event.registrant_count();
        let utilization = if event.capacity > 0 {
            total as f64 / event.capacity as f64 * 100.0
        } else {
            0.0
        };

        let mut university_distribution = BTreeMap::new();
        let mut major_distribution = BTreeMap::new();
        for student in registrants {
            *university_distribution.entry(student.university.clone()).or_insert(0) += 1;
            *major_distribution.entry(student.major.clone()).or_insert(0) += 1;
        }

        Self {
            event_id: event.id,
            total_registrations: total,
            capacity: event.capacity,
            remaining_seats: event.remaining_seats(),
            capacity_used: format!("{:.2}%", utilization),
            total_revenue: total as f64 * event.fee,
            university_distribution,
            major_distribution,
        }
    }
}
