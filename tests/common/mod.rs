#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use eventhub::{
    config::Settings,
    domain::*,
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub const PASSWORD: &str = "secure_password123";

/// A fresh in-memory database with the schema applied. One connection, so
/// every pooled query sees the same database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

pub fn test_settings(strict_status_transitions: bool) -> Settings {
    let mut settings = Settings::default();
    settings.auth.jwt_secret = "test-secret".to_string();
    settings.events.strict_status_transitions = strict_status_transitions;
    settings
}

pub async fn test_context(strict_status_transitions: bool) -> anyhow::Result<Arc<ServiceContext>> {
    let pool = test_pool().await?;
    Ok(Arc::new(ServiceContext::new(pool, &test_settings(strict_status_transitions))))
}

pub fn student_signup(username: &str, university: &str, major: &str) -> StudentSignupRequest {
    StudentSignupRequest {
        fullname: format!("Student {}", username),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: PASSWORD.to_string(),
        student_id: format!("ID-{}", username),
        major: major.to_string(),
        phone: "9876543210".to_string(),
        university: university.to_string(),
    }
}

pub fn institute_signup(name: &str, email: &str) -> InstituteSignupRequest {
    InstituteSignupRequest {
        institute_name: name.to_string(),
        institute_type: InstituteType::Engineering,
        email: email.to_string(),
        password: PASSWORD.to_string(),
        phone: "080-2345678".to_string(),
        address: "1 College Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        pincode: "560001".to_string(),
        country: "India".to_string(),
        established_year: 1990,
        affiliated_to: None,
        website: None,
        contact_person_name: "R. Rao".to_string(),
        designation: "Registrar".to_string(),
        terms: true,
    }
}

pub async fn create_student(ctx: &ServiceContext, username: &str) -> anyhow::Result<User> {
    create_student_at(ctx, username, "State University", "Computer Science").await
}

pub async fn create_student_at(
    ctx: &ServiceContext,
    username: &str,
    university: &str,
    major: &str,
) -> anyhow::Result<User> {
    Ok(ctx.account_service
        .register_student(student_signup(username, university, major))
        .await?)
}

pub async fn create_institute(ctx: &ServiceContext, name: &str) -> anyhow::Result<User> {
    let email = format!("{}@institute.example.com", name.to_lowercase().replace(' ', ""));
    let (user, _token) = ctx.account_service
        .register_institute(institute_signup(name, &email))
        .await?;
    Ok(user)
}

/// An event a week out whose registration closes in three days.
pub fn event_draft(capacity: i64, fee: f64) -> EventDraft {
    let event_date = Utc::now() + Duration::days(7);
    EventDraft {
        name: "Spring Hackathon".to_string(),
        event_type: EventType::Hackathon,
        description: "Build something in 24 hours".to_string(),
        event_date,
        deadline: event_date - Duration::days(4),
        venue: "Main Hall".to_string(),
        timings: Some("09:00 - 18:00".to_string()),
        fee,
        capacity,
    }
}
