use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod user_repository;
pub mod event_repository;
pub mod feedback_repository;

pub use user_repository::SqliteUserRepository;
pub use event_repository::SqliteEventRepository;
pub use feedback_repository::SqliteFeedbackRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_institute_name(&self, institute_name: &str) -> Result<Option<User>>;
    /// Looks up an account of `role` by email or username and returns it
    /// together with its password hash.
    async fn find_credentials(&self, identifier: &str, role: Role) -> Result<Option<(User, String)>>;
    async fn list_by_role(&self, role: Role) -> Result<Vec<User>>;
    async fn count(&self) -> Result<i64>;
    async fn count_by_role(&self, role: Role) -> Result<i64>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, institute_id: Uuid, draft: EventDraft) -> Result<Event>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>>;
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Event>>;
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Event>>;
    async fn list_by_institute(&self, institute_id: Uuid) -> Result<Vec<Event>>;
    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<Event>>;
    async fn count(&self) -> Result<i64>;
    /// Applies the draft only while the current roster still fits the new
    /// capacity. Returns `None` when no row was updated.
    async fn update(&self, id: Uuid, draft: EventDraft) -> Result<Option<Event>>;
    async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<Event>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Adds the student to the roster in one conditional statement. Returns
    /// false when nothing was inserted because the event is not active, the
    /// deadline has passed, the roster is full or the student is already on it.
    async fn try_register(&self, event_id: Uuid, student_id: Uuid, now: DateTime<Utc>) -> Result<bool>;
    /// Returns false when the student was not on the roster.
    async fn unregister(&self, event_id: Uuid, student_id: Uuid) -> Result<bool>;
    async fn registrants(&self, event_id: Uuid) -> Result<Vec<StudentSummary>>;
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn create(&self, feedback: Feedback) -> Result<Feedback>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Feedback>>;
    async fn list(&self) -> Result<Vec<Feedback>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
