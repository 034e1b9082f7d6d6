use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Feedback, FeedbackUserType, FutureUse, RequestMetadata},
    error::{AppError, Result},
    repository::FeedbackRepository,
};

#[derive(FromRow)]
struct FeedbackRow {
    id: String,
    user_type: String,
    benefits: String,
    future_use: String,
    suggestions: Option<String>,
    rating: i32,
    ip_address: Option<String>,
    user_agent: Option<String>,
    submitted_at: NaiveDateTime,
}

pub struct SqliteFeedbackRepository {
    pool: SqlitePool,
}

impl SqliteFeedbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_feedback(row: FeedbackRow) -> Result<Feedback> {
        // Benefit tags are stored as a JSON array
        let benefits: Vec<String> = serde_json::from_str(&row.benefits)
            .map_err(|e| AppError::Database(format!("Invalid benefits column: {}", e)))?;

        Ok(Feedback {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_type: FeedbackUserType::parse(&row.user_type)
                .ok_or_else(|| AppError::Database(format!("Invalid user type: {}", row.user_type)))?,
            benefits,
            future_use: FutureUse::parse(&row.future_use)
                .ok_or_else(|| AppError::Database(format!("Invalid future use: {}", row.future_use)))?,
            suggestions: row.suggestions,
            rating: row.rating,
            submitted_at: DateTime::from_naive_utc_and_offset(row.submitted_at, Utc),
            metadata: RequestMetadata {
                ip_address: row.ip_address,
                user_agent: row.user_agent,
            },
        })
    }
}

#[async_trait]
impl FeedbackRepository for SqliteFeedbackRepository {
    async fn create(&self, feedback: Feedback) -> Result<Feedback> {
        let benefits_json = serde_json::to_string(&feedback.benefits)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO feedback (
                id, user_type, benefits, future_use, suggestions, rating,
                ip_address, user_agent, submitted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(feedback.id.to_string())
        .bind(feedback.user_type.as_str())
        .bind(&benefits_json)
        .bind(feedback.future_use.as_str())
        .bind(&feedback.suggestions)
        .bind(feedback.rating)
        .bind(&feedback.metadata.ip_address)
        .bind(&feedback.metadata.user_agent)
        .bind(feedback.submitted_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(feedback.id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created feedback".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Feedback>> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, user_type, benefits, future_use, suggestions, rating,
                   ip_address, user_agent, submitted_at
            FROM feedback
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_feedback).transpose()
    }

    async fn list(&self) -> Result<Vec<Feedback>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, user_type, benefits, future_use, suggestions, rating,
                   ip_address, user_agent, submitted_at
            FROM feedback
            ORDER BY submitted_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_feedback).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
