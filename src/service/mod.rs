pub mod account_service;
pub mod event_service;
pub mod feedback_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::AuthService;
use crate::config::Settings;
use account_service::AccountService;
use event_service::EventService;
use feedback_service::FeedbackService;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub feedback_repo: Arc<dyn FeedbackRepository>,
    pub auth_service: Arc<AuthService>,
    pub account_service: Arc<AccountService>,
    pub event_service: Arc<EventService>,
    pub feedback_service: Arc<FeedbackService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let event_repo: Arc<dyn EventRepository> = Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let feedback_repo: Arc<dyn FeedbackRepository> = Arc::new(SqliteFeedbackRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(&settings.auth));

        let account_service = Arc::new(AccountService::new(user_repo.clone(), auth_service.clone()));
        let event_service = Arc::new(EventService::new(
            event_repo.clone(),
            user_repo.clone(),
            settings.events.strict_status_transitions,
        ));
        let feedback_service = Arc::new(FeedbackService::new(feedback_repo.clone()));

        Self {
            user_repo,
            event_repo,
            feedback_repo,
            auth_service,
            account_service,
            event_service,
            feedback_service,
            db_pool,
        }
    }
}
