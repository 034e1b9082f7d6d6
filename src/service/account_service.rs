use std::sync::Arc;

use rand::Rng;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, Result},
    repository::UserRepository,
};

const USERNAME_ATTEMPTS: usize = 5;

pub struct AccountService {
    repo: Arc<dyn UserRepository>,
    auth_service: Arc<AuthService>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn UserRepository>, auth_service: Arc<AuthService>) -> Self {
        Self { repo, auth_service }
    }

    pub async fn register_student(&self, request: StudentSignupRequest) -> Result<User> {
        let request = request.normalized();
        request.validate()?;

        // Check for duplicate email
        if self.repo.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        // Check for duplicate username
        if self.repo.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }

        let password_hash = AuthService::hash_password(&request.password).await?;

        let user = self.repo.create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            phone: request.phone,
            terms_accepted: true,
            profile: UserProfile::Student(StudentProfile {
                fullname: request.fullname,
                student_id: request.student_id,
                major: request.major,
                university: request.university,
            }),
        }).await?;

        tracing::info!("Student registered: {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Returns the new account together with a bearer token.
    pub async fn register_institute(&self, request: InstituteSignupRequest) -> Result<(User, String)> {
        let request = request.normalized();
        request.validate()?;

        if self.repo.find_by_email(&request.email).await?.is_some()
            || self.repo.find_by_institute_name(&request.institute_name).await?.is_some()
        {
            return Err(AppError::Conflict(
                "Institute already exists with this email or name".to_string(),
            ));
        }

        let username = self.unused_institute_username(&request.institute_name).await?;
        let password_hash = AuthService::hash_password(&request.password).await?;

        let user = self.repo.create(NewUser {
            username,
            email: request.email.clone(),
            password_hash,
            phone: request.phone.clone(),
            terms_accepted: request.terms,
            profile: UserProfile::Institute(request.profile()),
        }).await?;

        let token = self.auth_service.issue_token(user.id, Role::Institute)?;
        tracing::info!("Institute registered: {} ({})", user.username, user.id);

        Ok((user, token))
    }

    async fn unused_institute_username(&self, institute_name: &str) -> Result<String> {
        for _ in 0..USERNAME_ATTEMPTS {
            let suffix = rand::thread_rng().gen_range(1000..=9999);
            let candidate = institute_username(institute_name, suffix);
            if self.repo.find_by_username(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict("Could not allocate a username, please retry".to_string()))
    }

    /// Identifier may be email or username; the account must hold `role`.
    pub async fn login(&self, role: Role, request: LoginRequest) -> Result<(User, String)> {
        request.validate()?;

        let (user, password_hash) = match self.repo.find_credentials(&request.identifier, role).await? {
            Some(found) => found,
            None => {
                tracing::debug!("Login failed: no {} account for {}", role, request.identifier);
                return Err(AppError::Unauthorized);
            }
        };

        if !AuthService::verify_password(&request.password, &password_hash).await? {
            tracing::debug!("Login failed: wrong password for {}", user.username);
            return Err(AppError::Unauthorized);
        }

        let token = self.auth_service.issue_token(user.id, role)?;
        tracing::info!("{} login: {}", role, user.username);

        Ok((user, token))
    }

    pub async fn get(&self, id: Uuid) -> Result<User> {
        self.repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn list(&self, role: Role) -> Result<Vec<User>> {
        self.repo.list_by_role(role).await
    }

    /// Admin accounts are provisioned out of band and can't be removed here.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let user = self.get(id).await?;
        if user.role() == Role::Admin {
            return Err(AppError::BadRequest("Admin accounts cannot be deleted".to_string()));
        }

        self.repo.delete(id).await?;
        tracing::info!("Deleted {} account {}", user.role(), user.username);

        Ok(())
    }
}
