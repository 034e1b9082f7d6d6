mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eventhub::{
    domain::*,
    error::{AppError, Result},
    repository::{EventRepository, SqliteEventRepository, SqliteUserRepository},
    service::event_service::EventService,
};
use uuid::Uuid;

use common::*;

fn registration_error(err: AppError) -> RegistrationError {
    match err {
        AppError::Registration(e) => e,
        other => panic!("expected a registration error, got {:?}", other),
    }
}

#[tokio::test]
async fn capacity_two_admits_two_then_refuses() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Capacity College").await?;
    let event = ctx.event_service.create(institute.id, event_draft(2, 0.0)).await?;

    let a = create_student(&ctx, "alice").await?;
    let b = create_student(&ctx, "bob").await?;
    let c = create_student(&ctx, "carol").await?;

    ctx.event_service.register(event.id, a.id).await?;
    let after_two = ctx.event_service.register(event.id, b.id).await?;
    assert_eq!(after_two.registered_students.len(), 2);

    let err = ctx.event_service.register(event.id, c.id).await.unwrap_err();
    assert_eq!(registration_error(err), RegistrationError::CapacityExceeded);

    let event = ctx.event_service.get(event.id).await?;
    assert_eq!(event.registered_students.len(), 2);
    assert!(!event.is_registered(c.id));

    Ok(())
}

#[tokio::test]
async fn registering_twice_is_rejected_and_roster_unchanged() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Twice Institute").await?;
    let event = ctx.event_service.create(institute.id, event_draft(10, 0.0)).await?;
    let student = create_student(&ctx, "dave").await?;

    ctx.event_service.register(event.id, student.id).await?;
    let err = ctx.event_service.register(event.id, student.id).await.unwrap_err();
    assert_eq!(registration_error(err), RegistrationError::AlreadyRegistered);

    let event = ctx.event_service.get(event.id).await?;
    assert_eq!(event.registered_students, vec![student.id]);

    Ok(())
}

#[tokio::test]
async fn register_after_unregister_succeeds() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Again University").await?;
    let event = ctx.event_service.create(institute.id, event_draft(1, 0.0)).await?;
    let student = create_student(&ctx, "erin").await?;

    ctx.event_service.register(event.id, student.id).await?;
    let emptied = ctx.event_service.unregister(event.id, student.id).await?;
    assert!(emptied.registered_students.is_empty());

    let again = ctx.event_service.register(event.id, student.id).await?;
    assert_eq!(again.registered_students, vec![student.id]);

    Ok(())
}

#[tokio::test]
async fn unregister_without_registration_fails() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Never College").await?;
    let event = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;
    let registered = create_student(&ctx, "frank").await?;
    let stranger = create_student(&ctx, "grace").await?;

    ctx.event_service.register(event.id, registered.id).await?;

    let err = ctx.event_service.unregister(event.id, stranger.id).await.unwrap_err();
    assert_eq!(registration_error(err), RegistrationError::NotRegistered);

    let event = ctx.event_service.get(event.id).await?;
    assert_eq!(event.registered_students, vec![registered.id]);

    Ok(())
}

#[tokio::test]
async fn deadline_passed_wins_over_free_seats() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Late Institute").await?;
    let event = ctx.event_service.create(institute.id, event_draft(50, 0.0)).await?;
    let student = create_student(&ctx, "heidi").await?;

    let after_deadline = event.deadline + Duration::minutes(1);
    let err = ctx.event_service
        .register_at(event.id, student.id, after_deadline)
        .await
        .unwrap_err();
    assert_eq!(registration_error(err), RegistrationError::DeadlinePassed);

    // Exactly at the deadline is still open
    ctx.event_service.register_at(event.id, student.id, event.deadline).await?;

    Ok(())
}

#[tokio::test]
async fn cancelled_event_refuses_registration() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Cancel College").await?;
    let event = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;
    let student = create_student(&ctx, "ivan").await?;

    let cancelled = ctx.event_service
        .change_status(event.id, institute.id, "Cancelled")
        .await?;
    assert_eq!(cancelled.status, EventStatus::Cancelled);

    let err = ctx.event_service.register(event.id, student.id).await.unwrap_err();
    assert_eq!(
        registration_error(err),
        RegistrationError::InvalidState(EventStatus::Cancelled)
    );

    Ok(())
}

#[tokio::test]
async fn register_on_missing_event_is_not_found() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let student = create_student(&ctx, "judy").await?;

    let err = ctx.event_service
        .register(Uuid::new_v4(), student.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn concurrent_registrations_never_overshoot_capacity() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Rush University").await?;
    let event = ctx.event_service.create(institute.id, event_draft(3, 0.0)).await?;

    let mut students = Vec::new();
    for i in 0..10 {
        students.push(create_student(&ctx, &format!("rush{}", i)).await?);
    }

    let mut handles = Vec::new();
    for student in &students {
        let ctx = ctx.clone();
        let (event_id, student_id) = (event.id, student.id);
        handles.push(tokio::spawn(async move {
            ctx.event_service.register(event_id, student_id).await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => admitted += 1,
            Err(err) => assert_eq!(registration_error(err), RegistrationError::CapacityExceeded),
        }
    }

    let event = ctx.event_service.get(event.id).await?;
    assert_eq!(admitted, 3);
    assert_eq!(event.registered_students.len(), 3);

    Ok(())
}

#[tokio::test]
async fn statistics_report_utilization_and_revenue() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Stats Institute").await?;
    let event = ctx.event_service.create(institute.id, event_draft(10, 100.0)).await?;

    let students = [
        create_student_at(&ctx, "kim", "North University", "Physics").await?,
        create_student_at(&ctx, "lee", "North University", "Computer Science").await?,
        create_student_at(&ctx, "max", "South University", "Computer Science").await?,
    ];
    for student in &students {
        ctx.event_service.register(event.id, student.id).await?;
    }

    let stats = ctx.event_service.statistics(event.id, institute.id).await?;
    assert_eq!(stats.capacity_used, "30.00%");
    assert_eq!(stats.total_revenue, 300.0);
    assert_eq!(stats.total_registrations, 3);
    assert_eq!(stats.remaining_seats, 7);
    assert_eq!(stats.university_distribution.get("North University"), Some(&2));
    assert_eq!(stats.university_distribution.get("South University"), Some(&1));
    assert_eq!(stats.major_distribution.get("Computer Science"), Some(&2));

    Ok(())
}

#[tokio::test]
async fn statistics_are_owner_only() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let owner = create_institute(&ctx, "Owner College").await?;
    let other = create_institute(&ctx, "Other College").await?;
    let event = ctx.event_service.create(owner.id, event_draft(10, 0.0)).await?;

    let err = ctx.event_service.statistics(event.id, other.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn status_change_by_other_institute_is_not_found() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let owner = create_institute(&ctx, "Status Owner").await?;
    let other = create_institute(&ctx, "Status Other").await?;
    let event = ctx.event_service.create(owner.id, event_draft(10, 0.0)).await?;

    let err = ctx.event_service
        .change_status(event.id, other.id, "Ended")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Ownership is resolved before the status value is looked at
    let err = ctx.event_service
        .change_status(event.id, other.id, "Finished")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx.event_service
        .change_status(Uuid::new_v4(), owner.id, "Finished")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx.event_service
        .change_status(event.id, owner.id, "Finished")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn permissive_mode_reopens_ended_events() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Loose Institute").await?;
    let event = ctx.event_service.create(institute.id, event_draft(10, 0.0)).await?;

    ctx.event_service.change_status(event.id, institute.id, "Ended").await?;
    let reopened = ctx.event_service.change_status(event.id, institute.id, "Active").await?;
    assert_eq!(reopened.status, EventStatus::Active);

    Ok(())
}

#[tokio::test]
async fn strict_mode_keeps_ended_terminal() -> anyhow::Result<()> {
    let ctx = test_context(true).await?;
    let institute = create_institute(&ctx, "Strict Institute").await?;
    let event = ctx.event_service.create(institute.id, event_draft(10, 0.0)).await?;

    ctx.event_service.change_status(event.id, institute.id, "Ended").await?;
    let err = ctx.event_service
        .change_status(event.id, institute.id, "Active")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let event = ctx.event_service.get(event.id).await?;
    assert_eq!(event.status, EventStatus::Ended);

    Ok(())
}

#[tokio::test]
async fn create_rejects_deadline_after_event_date() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Backwards College").await?;

    let mut draft = event_draft(10, 0.0);
    draft.deadline = draft.event_date + Duration::days(1);

    let err = ctx.event_service.create(institute.id, draft).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn update_cannot_shrink_capacity_below_roster() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Shrink University").await?;
    let event = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;

    for name in ["nina", "otto", "paul"] {
        let student = create_student(&ctx, name).await?;
        ctx.event_service.register(event.id, student.id).await?;
    }

    let err = ctx.event_service
        .update(event.id, institute.id, UpdateEventRequest {
            capacity: Some(2),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let updated = ctx.event_service
        .update(event.id, institute.id, UpdateEventRequest {
            name: Some("  Autumn Hackathon ".to_string()),
            capacity: Some(3),
            ..Default::default()
        })
        .await?;
    assert_eq!(updated.name, "Autumn Hackathon");
    assert_eq!(updated.capacity, 3);
    assert_eq!(updated.registered_students.len(), 3);

    Ok(())
}

#[tokio::test]
async fn listings_follow_ownership_and_roster() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Listing Institute").await?;
    let student = create_student(&ctx, "quinn").await?;

    let open = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;
    let closed = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;
    ctx.event_service.change_status(closed.id, institute.id, "Ended").await?;

    let mut past = event_draft(5, 0.0);
    past.event_date = Utc::now() - Duration::days(1);
    past.deadline = Utc::now() - Duration::days(2);
    ctx.event_service.create(institute.id, past).await?;

    ctx.event_service.register(open.id, student.id).await?;

    let active = ctx.event_service.list_active().await?;
    assert_eq!(active.iter().map(|e| e.id).collect::<Vec<_>>(), vec![open.id]);

    assert_eq!(ctx.event_service.list_for_institute(institute.id).await?.len(), 3);

    let registered = ctx.event_service.list_for_student(student.id).await?;
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].id, open.id);

    Ok(())
}

#[tokio::test]
async fn deleting_event_by_admin_or_owner_only() -> anyhow::Result<()> {

    let ctx = test_context(false).await?;
    let owner = create_institute(&ctx, "Delete Owner").await?;
    let other = create_institute(&ctx, "Delete Other").await?;
    let student = create_student(&ctx, "rita").await?;
    let event = ctx.event_service.create(owner.id, event_draft(5, 0.0)).await?;
    ctx.event_service.register(event.id, student.id).await?;

    let err = ctx.event_service.delete(event.id, other.id, Role::Institute).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = ctx.event_service.delete(event.id, student.id, Role::Student).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    ctx.event_service.delete(event.id, owner.id, Role::Institute).await?;
    assert!(ctx.event_service.list_for_student(student.id).await?.is_empty());

    let err = ctx.event_service.get(event.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn details_resolve_institute_and_registrants() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Detail College").await?;
    let student = create_student(&ctx, "sam").await?;
    let event = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;
    ctx.event_service.register(event.id, student.id).await?;

    let details = ctx.event_service.details(event.id).await?;
    assert_eq!(details.institute.map(|i| i.institute_name), Some("Detail College".to_string()));
    assert_eq!(details.registrants.len(), 1);
    assert_eq!(details.registrants[0].id, student.id);
    assert_eq!(details.registrants[0].student_id, "ID-sam");

    Ok(())
}

#[tokio::test]
async fn shrinking_capacity_races_registration_without_overshoot() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Race Institute").await?;

    for round in 0..5 {
        let event = ctx.event_service.create(institute.id, event_draft(5, 0.0)).await?;
        for seat in 0..2 {
            let student = create_student(&ctx, &format!("seat{}r{}", seat, round)).await?;
            ctx.event_service.register(event.id, student.id).await?;
        }
        let late = create_student(&ctx, &format!("late{}", round)).await?;

        let shrink = UpdateEventRequest { capacity: Some(2), ..Default::default() };
        let (registered, updated) = tokio::join!(
            ctx.event_service.register(event.id, late.id),
            ctx.event_service.update(event.id, institute.id, shrink),
        );

        assert!(
            !(registered.is_ok() && updated.is_ok()),
            "round {}: both the registration and the shrink succeeded",
            round
        );
        if let Err(err) = updated {
            assert!(matches!(err, AppError::BadRequest(_)), "round {}: {:?}", round, err);
        }

        let event = ctx.event_service.get(event.id).await?;
        assert!(event.registrant_count() <= event.capacity, "round {}", round);
    }

    Ok(())
}

/// Lets a rival take the last seat right before the insert and give it back
/// right after, so the insert sees a full roster and the re-read does not.
struct SeatTakenAndReturned {
    inner: SqliteEventRepository,
    rival: Uuid,
}

#[async_trait]
impl EventRepository for SeatTakenAndReturned {
    async fn create(&self, institute_id: Uuid, draft: EventDraft) -> Result<Event> {
        self.inner.create(institute_id, draft).await
    }
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        self.inner.find_by_id(id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        self.inner.list(limit, offset).await
    }
    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        self.inner.list_active(now).await
    }
    async fn list_by_institute(&self, institute_id: Uuid) -> Result<Vec<Event>> {
        self.inner.list_by_institute(institute_id).await
    }
    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<Event>> {
        self.inner.list_by_student(student_id).await
    }
    async fn count(&self) -> Result<i64> {
        self.inner.count().await
    }
    async fn update(&self, id: Uuid, draft: EventDraft) -> Result<Option<Event>> {
        self.inner.update(id, draft).await
    }
    async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<Event> {
        self.inner.update_status(id, status).await
    }
    async fn delete(&self, id: Uuid) -> Result<()> {
        self.inner.delete(id).await
    }
    async fn try_register(&self, event_id: Uuid, student_id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        self.inner.try_register(event_id, self.rival, now).await?;
        let inserted = self.inner.try_register(event_id, student_id, now).await?;
        self.inner.unregister(event_id, self.rival).await?;
        Ok(inserted)
    }
    async fn unregister(&self, event_id: Uuid, student_id: Uuid) -> Result<bool> {
        self.inner.unregister(event_id, student_id).await
    }
    async fn registrants(&self, event_id: Uuid) -> Result<Vec<StudentSummary>> {
        self.inner.registrants(event_id).await
    }
}

#[tokio::test]
async fn seat_freed_after_a_full_insert_reports_capacity_exceeded() -> anyhow::Result<()> {
    let ctx = test_context(false).await?;
    let institute = create_institute(&ctx, "Seat Institute").await?;
    let rival = create_student(&ctx, "rival").await?;
    let student = create_student(&ctx, "hopeful").await?;
    let event = ctx.event_service.create(institute.id, event_draft(1, 0.0)).await?;

    let service = EventService::new(
        Arc::new(SeatTakenAndReturned {
            inner: SqliteEventRepository::new(ctx.db_pool.clone()),
            rival: rival.id,
        }),
        Arc::new(SqliteUserRepository::new(ctx.db_pool.clone())),
        false,
    );

    let err = service.register(event.id, student.id).await.unwrap_err();
    assert_eq!(registration_error(err), RegistrationError::CapacityExceeded);

    // The seat really is free again
    let event = service.get(event.id).await?;
    assert!(event.registered_students.is_empty());
    assert!(event.check_can_register(student.id, Utc::now()).is_ok());

    Ok(())
}
