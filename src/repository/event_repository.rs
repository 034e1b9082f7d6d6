use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Event, EventDraft, EventStatus, EventType, StudentSummary},
    error::{AppError, Result},
    repository::EventRepository,
};

// The roster is folded into each row as a comma-separated id list.
const EVENT_SELECT: &str = r#"
    SELECT e.id, e.name, e.event_type, e.description, e.event_date, e.deadline,
           e.venue, e.timings, e.fee, e.capacity, e.status, e.institute_id,
           (SELECT GROUP_CONCAT(r.student_id)
              FROM event_registrations r
             WHERE r.event_id = e.id) AS registered_students,
           e.created_at, e.updated_at
    FROM events e
"#;

#[derive(FromRow)]
struct EventRow {
    id: String,
    name: String,
    event_type: String,
    description: String,
    event_date: NaiveDateTime,
    deadline: NaiveDateTime,
    venue: String,
    timings: Option<String>,
    fee: f64,
    capacity: i64,
    status: String,
    institute_id: String,
    registered_students: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RegistrantRow {
    id: String,
    fullname: Option<String>,
    email: String,
    student_id: Option<String>,
    major: Option<String>,
    university: Option<String>,
}

pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: EventRow) -> Result<Event> {
        let registered_students = row.registered_students
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter(|s| !s.is_empty())
            .map(Uuid::parse_str)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Event {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            event_type: Self::parse_event_type(&row.event_type)?,
            description: row.description,
            event_date: DateTime::from_naive_utc_and_offset(row.event_date, Utc),
            deadline: DateTime::from_naive_utc_and_offset(row.deadline, Utc),
            venue: row.venue,
            timings: row.timings,
            fee: row.fee,
            capacity: row.capacity,
            status: Self::parse_status(&row.status)?,
            institute_id: Uuid::parse_str(&row.institute_id).map_err(|e| AppError::Database(e.to_string()))?,
            registered_students,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_event_type(s: &str) -> Result<EventType> {
        EventType::parse(s)
            .ok_or_else(|| AppError::Database(format!("Invalid event type: {}", s)))
    }

    fn parse_status(s: &str) -> Result<EventStatus> {
        s.parse::<EventStatus>()
            .map_err(|_| AppError::Database(format!("Invalid event status: {}", s)))
    }

    async fn fetch_many(&self, sql: &str, binds: &[String]) -> Result<Vec<Event>> {
        let mut query = sqlx::query_as::<_, EventRow>(sql);
        for value in binds {
            query = query.bind(value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_event)
            .collect()
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create(&self, institute_id: Uuid, draft: EventDraft) -> Result<Event> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let institute_id_str = institute_id.to_string();
        let status_str = EventStatus::Active.as_str();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO events (
                id, name, event_type, description, event_date, deadline,
                venue, timings, fee, capacity, status, institute_id,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&draft.name)
        .bind(draft.event_type.as_str())
        .bind(&draft.description)
        .bind(draft.event_date.naive_utc())
        .bind(draft.deadline.naive_utc())
        .bind(&draft.venue)
        .bind(&draft.timings)
        .bind(draft.fee)
        .bind(draft.capacity)
        .bind(status_str)
        .bind(&institute_id_str)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created event".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("{} WHERE e.id = ?", EVENT_SELECT);
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_event(r)?)),
            None => Ok(None)
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Event>> {
        let sql = format!("{} ORDER BY e.created_at DESC LIMIT ? OFFSET ?", EVENT_SELECT);
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_event)
            .collect()
    }

    async fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let sql = format!(
            "{} WHERE e.status = ? AND e.deadline >= ? ORDER BY e.event_date ASC",
            EVENT_SELECT
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(EventStatus::Active.as_str())
            .bind(now.naive_utc())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_event)
            .collect()
    }

    async fn list_by_institute(&self, institute_id: Uuid) -> Result<Vec<Event>> {
        let sql = format!(
            "{} WHERE e.institute_id = ? ORDER BY e.created_at DESC",
            EVENT_SELECT
        );
        self.fetch_many(&sql, &[institute_id.to_string()]).await
    }

    async fn list_by_student(&self, student_id: Uuid) -> Result<Vec<Event>> {
        let sql = format!(
            r#"{}
            INNER JOIN event_registrations er ON er.event_id = e.id
            WHERE er.student_id = ?
            ORDER BY e.event_date ASC"#,
            EVENT_SELECT
        );
        self.fetch_many(&sql, &[student_id.to_string()]).await
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }

    async fn update(&self, id: Uuid, draft: EventDraft) -> Result<Option<Event>> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        // The roster guard shares the statement with the write, mirroring
        // the capacity check in try_register.
        let result = sqlx::query(
            r#"
            UPDATE events
            SET name = ?, event_type = ?, description = ?, event_date = ?, deadline = ?,
                venue = ?, timings = ?, fee = ?, capacity = ?, updated_at = ?
            WHERE id = ?
              AND (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = events.id) <= ?
            "#
        )
        .bind(&draft.name)
        .bind(draft.event_type.as_str())
        .bind(&draft.description)
        .bind(draft.event_date.naive_utc())
        .bind(draft.deadline.naive_utc())
        .bind(&draft.venue)
        .bind(&draft.timings)
        .bind(draft.fee)
        .bind(draft.capacity)
        .bind(now)
        .bind(&id_str)
        .bind(draft.capacity)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    async fn update_status(&self, id: Uuid, status: EventStatus) -> Result<Event> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE events SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Event not found".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn try_register(&self, event_id: Uuid, student_id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let event_id_str = event_id.to_string();
        let student_id_str = student_id.to_string();
        let now_naive = now.naive_utc();

        // Every guard lives in the same statement so two concurrent requests
        // can't both pass the capacity check.
        let result = sqlx::query(
            r#"
            INSERT INTO event_registrations (event_id, student_id, registered_at)
            SELECT e.id, ?, ?
            FROM events e
            WHERE e.id = ?
              AND e.status = ?
              AND e.deadline >= ?
              AND (SELECT COUNT(*) FROM event_registrations r WHERE r.event_id = e.id) < e.capacity
              AND NOT EXISTS (
                  SELECT 1 FROM event_registrations r
                  WHERE r.event_id = e.id AND r.student_id = ?
              )
            "#
        )
        .bind(&student_id_str)
        .bind(now_naive)
        .bind(&event_id_str)
        .bind(EventStatus::Active.as_str())
        .bind(now_naive)
        .bind(&student_id_str)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() == 1),
            Err(e) => match e.as_database_error() {
                Some(db) if db.is_unique_violation() => Ok(false),
                _ => Err(AppError::Database(e.to_string())),
            },
        }
    }

    async fn unregister(&self, event_id: Uuid, student_id: Uuid) -> Result<bool> {
        let event_id_str = event_id.to_string();
        let student_id_str = student_id.to_string();

        let result = sqlx::query(
            "DELETE FROM event_registrations WHERE event_id = ? AND student_id = ?"
        )
        .bind(&event_id_str)
        .bind(&student_id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn registrants(&self, event_id: Uuid) -> Result<Vec<StudentSummary>> {
        let event_id_str = event_id.to_string();

        let rows = sqlx::query_as::<_, RegistrantRow>(
            r#"
            SELECT u.id, u.fullname, u.email, u.student_id, u.major, u.university
            FROM event_registrations r
            INNER JOIN users u ON u.id = r.student_id
            WHERE r.event_id = ?
            ORDER BY r.registered_at ASC
            "#
        )
        .bind(&event_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| -> Result<StudentSummary> {
                Ok(StudentSummary {
                    id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
                    fullname: row.fullname.unwrap_or_default(),
                    email: row.email,
                    student_id: row.student_id.unwrap_or_default(),
                    major: row.major.unwrap_or_default(),
                    university: row.university.unwrap_or_default(),
                })
            })
            .collect()
    }
}
