use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{EventRepository, UserRepository},
};

/// Event lifecycle and the registration workflow.
pub struct EventService {
    repo: Arc<dyn EventRepository>,
    user_repo: Arc<dyn UserRepository>,
    strict_transitions: bool,
}

impl EventService {
    pub fn new(
        repo: Arc<dyn EventRepository>,
        user_repo: Arc<dyn UserRepository>,
        strict_transitions: bool,
    ) -> Self {
        Self { repo, user_repo, strict_transitions }
    }

    pub async fn create(&self, institute_id: Uuid, draft: EventDraft) -> Result<Event> {
        let draft = draft.normalized();
        draft.validate()?;

        let event = self.repo.create(institute_id, draft).await?;
        tracing::info!("Institute {} created event {} ({})", institute_id, event.id, event.name);

        Ok(event)
    }

    pub async fn get(&self, id: Uuid) -> Result<Event> {
        self.repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    pub async fn details(&self, id: Uuid) -> Result<EventDetails> {
        let event = self.get(id).await?;

        let institute = self.user_repo
            .find_by_id(event.institute_id)
            .await?
            .and_then(|user| user.institute_summary());
        let registrants = self.repo.registrants(id).await?;

        Ok(EventDetails { event, institute, registrants })
    }

    /// Active events still accepting registrations, soonest first.
    pub async fn list_active(&self) -> Result<Vec<Event>> {
        self.repo.list_active(Utc::now()).await
    }

    pub async fn list_for_institute(&self, institute_id: Uuid) -> Result<Vec<Event>> {
        self.repo.list_by_institute(institute_id).await
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<Event>> {
        self.repo.list_by_student(student_id).await
    }

    pub async fn list_all(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        self.repo.list(limit, offset).await
    }

    /// Loads an event the institute owns; other institutes get `Forbidden`.
    async fn owned(&self, id: Uuid, institute_id: Uuid) -> Result<Event> {
        let event = self.get(id).await?;
        if event.institute_id != institute_id {
            return Err(AppError::Forbidden);
        }
        Ok(event)
    }

    pub async fn update(&self, id: Uuid, institute_id: Uuid, patch: UpdateEventRequest) -> Result<Event> {
        let event = self.owned(id, institute_id).await?;

        let draft = event.to_draft().apply(patch).normalized();
        draft.validate()?;

        if draft.capacity < event.registrant_count() {
            return Err(capacity_below_roster(event.registrant_count()));
        }

        match self.repo.update(id, draft).await? {
            Some(updated) => Ok(updated),
            // Registrations landed after the read above; re-diagnose.
            None => {
                let current = self.get(id).await?;
                Err(capacity_below_roster(current.registrant_count()))
            }
        }
    }

    pub async fn delete(&self, id: Uuid, actor_id: Uuid, actor_role: Role) -> Result<()> {
        let event = self.get(id).await?;

        let allowed = match actor_role {
            Role::Admin => true,
            Role::Institute => event.institute_id == actor_id,
            Role::Student => false,
        };
        if !allowed {
            return Err(AppError::Forbidden);
        }

        self.repo.delete(id).await?;
        tracing::info!("Event {} deleted by {} {}", id, actor_role, actor_id);

        Ok(())
    }

    /// Events owned by someone else are reported as missing.
    pub async fn change_status(&self, id: Uuid, institute_id: Uuid, status: &str) -> Result<Event> {
        let event = self.repo.find_by_id(id).await?
            .filter(|e| e.institute_id == institute_id)
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        let next: EventStatus = status.parse().map_err(AppError::BadRequest)?;

        if !event.status.can_transition_to(next, self.strict_transitions) {
            return Err(AppError::BadRequest(format!(
                "Cannot change status from {} to {}",
                event.status, next
            )));
        }

        let updated = self.repo.update_status(id, next).await?;
        tracing::info!("Event {} status {} -> {}", id, event.status, next);

        Ok(updated)
    }

    pub async fn register(&self, event_id: Uuid, student_id: Uuid) -> Result<Event> {
        self.register_at(event_id, student_id, Utc::now()).await
    }

    pub async fn register_at(&self, event_id: Uuid, student_id: Uuid, now: DateTime<Utc>) -> Result<Event> {
        let event = self.get(event_id).await?;
        event.check_can_register(student_id, now)?;

        if !self.repo.try_register(event_id, student_id, now).await? {
            // Another request changed the event between the read and the
            // insert; report what the current state says.
            let current = self.get(event_id).await?;
            current.check_can_register(student_id, now)?;
            // The fresh read admits the student, so the roster was full when
            // the insert ran and a seat opened up before the re-read (another
            // student unregistered or the capacity was raised).
            return Err(RegistrationError::CapacityExceeded.into());
        }

        tracing::info!("Student {} registered for event {}", student_id, event_id);
        self.get(event_id).await
    }

    pub async fn unregister(&self, event_id: Uuid, student_id: Uuid) -> Result<Event> {
        let event = self.get(event_id).await?;
        event.check_can_unregister(student_id)?;

        if !self.repo.unregister(event_id, student_id).await? {
            return Err(RegistrationError::NotRegistered.into());
        }

        tracing::info!("Student {} unregistered from event {}", student_id, event_id);
        self.get(event_id).await
    }

    pub async fn statistics(&self, event_id: Uuid, institute_id: Uuid) -> Result<EventStatistics> {
        let event = self.owned(event_id, institute_id).await?;
        let registrants = self.repo.registrants(event_id).await?;

        Ok(EventStatistics::compute(&event, &registrants))
    }
}

fn capacity_below_roster(registered: i64) -> AppError {
    AppError::BadRequest(format!(
        "Capacity cannot be lower than the {} students already registered",
        registered
    ))
}
