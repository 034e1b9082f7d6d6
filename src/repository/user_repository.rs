use async_trait::async_trait;
use chrono::{DateTime, Utc, NaiveDateTime};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{
        AdminProfile, InstituteProfile, InstituteType, NewUser, Role, StudentProfile, User,
        UserProfile,
    },
    error::{AppError, Result},
    repository::UserRepository,
};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, role, phone, terms_accepted,
    fullname, student_id, major, university,
    institute_name, institute_type, address, city, state, pincode, country,
    established_year, affiliated_to, website, contact_person_name, designation,
    created_at, updated_at
"#;

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    phone: String,
    terms_accepted: i32,
    fullname: Option<String>,
    student_id: Option<String>,
    major: Option<String>,
    university: Option<String>,
    institute_name: Option<String>,
    institute_type: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pincode: Option<String>,
    country: Option<String>,
    established_year: Option<i32>,
    affiliated_to: Option<String>,
    website: Option<String>,
    contact_person_name: Option<String>,
    designation: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

/// Role-specific columns flattened for insertion.
#[derive(Default)]
struct ProfileColumns<'a> {
    fullname: Option<&'a str>,
    student_id: Option<&'a str>,
    major: Option<&'a str>,
    university: Option<&'a str>,
    institute_name: Option<&'a str>,
    institute_type: Option<&'static str>,
    address: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    pincode: Option<&'a str>,
    country: Option<&'a str>,
    established_year: Option<i32>,
    affiliated_to: Option<&'a str>,
    website: Option<&'a str>,
    contact_person_name: Option<&'a str>,
    designation: Option<&'a str>,
}

impl<'a> ProfileColumns<'a> {
    fn from_profile(profile: &'a UserProfile) -> Self {
        match profile {
            UserProfile::Student(s) => Self {
                fullname: Some(&s.fullname),
                student_id: Some(&s.student_id),
                major: Some(&s.major),
                university: Some(&s.university),
                ..Default::default()
            },
            UserProfile::Institute(i) => Self {
                institute_name: Some(&i.institute_name),
                institute_type: Some(i.institute_type.as_str()),
                address: Some(&i.address),
                city: Some(&i.city),
                state: Some(&i.state),
                pincode: Some(&i.pincode),
                country: Some(&i.country),
                established_year: Some(i.established_year),
                affiliated_to: i.affiliated_to.as_deref(),
                website: i.website.as_deref(),
                contact_person_name: Some(&i.contact_person_name),
                designation: Some(&i.designation),
                ..Default::default()
            },
            UserProfile::Admin(a) => Self {
                fullname: a.fullname.as_deref(),
                ..Default::default()
            },
        }
    }
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<(User, String)> {
        let id = Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?;
        let role = Role::parse(&row.role)
            .ok_or_else(|| AppError::Database(format!("Invalid role: {}", row.role)))?;

        fn required<T>(value: Option<T>, field: &str, id: Uuid) -> Result<T> {
            value.ok_or_else(|| {
                AppError::Database(format!("User {} is missing required field {}", id, field))
            })
        }

        let profile = match role {
            Role::Student => UserProfile::Student(StudentProfile {
                fullname: required(row.fullname, "fullname", id)?,
                student_id: required(row.student_id, "student_id", id)?,
                major: required(row.major, "major", id)?,
                university: required(row.university, "university", id)?,
            }),
            Role::Institute => {
                let type_str = required(row.institute_type, "institute_type", id)?;
                let institute_type = InstituteType::parse(&type_str).ok_or_else(|| {
                    AppError::Database(format!("Invalid institute type: {}", type_str))
                })?;

                UserProfile::Institute(InstituteProfile {
                    institute_name: required(row.institute_name, "institute_name", id)?,
                    institute_type,
                    address: required(row.address, "address", id)?,
                    city: required(row.city, "city", id)?,
                    state: required(row.state, "state", id)?,
                    pincode: required(row.pincode, "pincode", id)?,
                    country: required(row.country, "country", id)?,
                    established_year: required(row.established_year, "established_year", id)?,
                    affiliated_to: row.affiliated_to,
                    website: row.website,
                    contact_person_name: required(row.contact_person_name, "contact_person_name", id)?,
                    designation: required(row.designation, "designation", id)?,
                })
            }
            Role::Admin => UserProfile::Admin(AdminProfile { fullname: row.fullname }),
        };

        let user = User {
            id,
            username: row.username,
            email: row.email,
            phone: row.phone,
            terms_accepted: row.terms_accepted != 0,
            profile,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        };

        Ok((user, row.password_hash))
    }

    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, filter);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_user(r)?.0)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();
        let role_str = user.profile.role().as_str();
        let terms_int = if user.terms_accepted { 1i32 } else { 0i32 };
        let cols = ProfileColumns::from_profile(&user.profile);

        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, role, phone, terms_accepted,
                fullname, student_id, major, university,
                institute_name, institute_type, address, city, state, pincode, country,
                established_year, affiliated_to, website, contact_person_name, designation,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&id_str)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(role_str)
        .bind(&user.phone)
        .bind(terms_int)
        .bind(cols.fullname)
        .bind(cols.student_id)
        .bind(cols.major)
        .bind(cols.university)
        .bind(cols.institute_name)
        .bind(cols.institute_type)
        .bind(cols.address)
        .bind(cols.city)
        .bind(cols.state)
        .bind(cols.pincode)
        .bind(cols.country)
        .bind(cols.established_year)
        .bind(cols.affiliated_to)
        .bind(cols.website)
        .bind(cols.contact_person_name)
        .bind(cols.designation)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                AppError::Conflict("Username or email already registered".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created user".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", &email.to_lowercase()).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("username", &username.to_lowercase()).await
    }

    async fn find_by_institute_name(&self, institute_name: &str) -> Result<Option<User>> {
        self.find_one("institute_name", institute_name.trim()).await
    }

    async fn find_credentials(&self, identifier: &str, role: Role) -> Result<Option<(User, String)>> {
        let identifier = identifier.trim().to_lowercase();
        let sql = format!(
            "SELECT {} FROM users WHERE (email = ? OR username = ?) AND role = ?",
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&identifier)
            .bind(&identifier)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::row_to_user).transpose()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE role = ? ORDER BY created_at DESC",
            USER_COLUMNS
        );

        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| Self::row_to_user(r).map(|(user, _)| user))
            .collect()
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.0)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
