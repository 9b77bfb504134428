use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Actor, CompletionOutcome, ContactUpdate, DailyCompletion, DayProgress, EmergencyContact,
    HealthData, HealthProfile, HistoryEntry, NewContact, NewTaskData, NewUser, Profile,
    ProfileData, Role, Task, TaskLog, UpdateTaskData, User, UserSummary,
};
use async_trait::async_trait;
use chrono::NaiveDate;

// Re-export domain modules
pub mod completions;
pub mod profiles;
pub mod progress;
pub mod tasks;
pub mod users;

/// Domain-specific trait for task storage operations
#[async_trait]
pub trait TaskRepository {
    async fn create_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>, CoreError>;
    async fn find_tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>, CoreError>;
    async fn find_tasks_due_on(&self, user_id: i64, date: NaiveDate) -> Result<Vec<Task>, CoreError>;
    async fn update_task(&self, id: i64, data: UpdateTaskData) -> Result<Task, CoreError>;
    async fn delete_task(&self, id: i64, owner: Option<i64>) -> Result<(), CoreError>;
}

/// Domain-specific trait for the completion log
#[async_trait]
pub trait CompletionRepository {
    async fn complete_task(
        &self,
        task_id: i64,
        actor: &Actor,
        method: &str,
        date: NaiveDate,
    ) -> Result<CompletionOutcome, CoreError>;
    async fn find_logs_for_user(&self, user_id: i64) -> Result<Vec<TaskLog>, CoreError>;
    async fn find_completed_task_ids(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<i64>, CoreError>;
    async fn find_history(
        &self,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<HistoryEntry>, CoreError>;
    async fn clear_completions(&self, user_id: i64, date: NaiveDate) -> Result<u64, CoreError>;
}

/// Domain-specific trait for progress aggregation
#[async_trait]
pub trait ProgressRepository {
    async fn day_progress(&self, user_id: i64, date: NaiveDate) -> Result<DayProgress, CoreError>;
    async fn month_progress(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyCompletion>, CoreError>;
}

/// Domain-specific trait for user accounts
#[async_trait]
pub trait UserRepository {
    async fn create_user(&self, data: NewUser) -> Result<User, CoreError>;
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, CoreError>;
    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, CoreError>;
    async fn find_users_by_role(&self, role: Role) -> Result<Vec<UserSummary>, CoreError>;
}

/// Domain-specific trait for profiles, emergency contacts and health records
#[async_trait]
pub trait ProfileRepository {
    async fn find_profile(&self, user_id: i64) -> Result<Option<Profile>, CoreError>;
    async fn upsert_profile(&self, user_id: i64, data: ProfileData) -> Result<Profile, CoreError>;
    async fn find_contacts(&self, user_id: i64) -> Result<Vec<EmergencyContact>, CoreError>;
    async fn add_contact(&self, user_id: i64, data: NewContact) -> Result<EmergencyContact, CoreError>;
    async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        data: ContactUpdate,
    ) -> Result<EmergencyContact, CoreError>;
    async fn delete_contact(&self, user_id: i64, contact_id: i64) -> Result<(), CoreError>;
    async fn find_health_profile(&self, user_id: i64) -> Result<Option<HealthProfile>, CoreError>;
    async fn upsert_health_profile(
        &self,
        user_id: i64,
        data: HealthData,
    ) -> Result<HealthProfile, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    TaskRepository + CompletionRepository + ProgressRepository + UserRepository + ProfileRepository
{
    // This trait automatically composes all domain-specific repositories
    // Individual domain operations are defined in their respective traits
}

/// SQLite implementation of the repository pattern. The pool is injected
/// at construction; per-operation connections are never opened.
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}
