use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Caregiver,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "caregiver" => Ok(Role::Caregiver),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// The authenticated caller of an operation, as established at the
/// network boundary. Carries just enough to evaluate access rules.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub subject_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Public projection of a user, safe to return over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// A care task. One-off tasks are due only on `task_date`; daily tasks are
/// due every day inside the optional [`task_date`, `end_date`] window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub title: String,
    pub task_time: Option<NaiveTime>,
    pub category: Option<String>,
    pub task_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub important: bool,
    pub description: Option<String>,
    #[serde(rename = "isDaily")]
    pub is_daily: bool,
    pub created_at: NaiveDateTime,
}

impl Task {
    /// Whether this task is expected on the given calendar day.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        if self.is_daily {
            let started = self.task_date.map_or(true, |start| start <= date);
            let not_ended = self.end_date.map_or(true, |end| end >= date);
            started && not_ended
        } else {
            self.task_date == Some(date)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub user_id: i64,
    pub title: String,
    pub task_time: Option<NaiveTime>,
    pub category: Option<String>,
    pub task_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub important: bool,
    pub description: Option<String>,
    pub is_daily: bool,
}

/// Partial update for a task. The outer `Option` means "leave untouched";
/// for nullable columns the inner `Option` distinguishes "set to NULL"
/// from "set to this value".
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub task_time: Option<Option<NaiveTime>>,
    pub category: Option<Option<String>>,
    pub task_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub important: Option<bool>,
    pub description: Option<Option<String>>,
    pub is_daily: Option<bool>,
}

impl UpdateTaskData {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.task_time.is_none()
            && self.category.is_none()
            && self.task_date.is_none()
            && self.end_date.is_none()
            && self.important.is_none()
            && self.description.is_none()
            && self.is_daily.is_none()
    }
}

/// One completion event. At most one exists per (task, calendar day).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskLog {
    pub id: i64,
    #[serde(rename = "taskId")]
    pub task_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub method: String,
    pub completed_at: NaiveDateTime,
    pub completed_on: NaiveDate,
}

/// Outcome of a completion attempt. Repeats on the same day are not an
/// error; callers get told the day was already covered.
#[derive(Debug, Clone)]
pub enum CompletionOutcome {
    Logged(TaskLog),
    AlreadyCompleted,
}

/// A completion event joined with the task it belongs to, for history views.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryEntry {
    #[serde(rename = "logId")]
    pub log_id: i64,
    #[serde(rename = "taskId")]
    pub task_id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub method: String,
    pub completed_at: NaiveDateTime,
    pub completed_on: NaiveDate,
    pub title: String,
    pub category: Option<String>,
    pub task_time: Option<NaiveTime>,
    pub task_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Expected-vs-completed counts for one subject and day.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DayProgress {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub date: NaiveDate,
    pub expected: i64,
    pub completed: i64,
    pub percent: u8,
}

/// One day of a month-level progress report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyCompletion {
    pub date: NaiveDate,
    pub expected: i64,
    pub completed: i64,
    pub rate: u8,
}

/// Completion percentage, rounded half-up and capped at 100.
/// A day with nothing expected reports zero, never a division error.
pub fn progress_percent(expected: i64, completed: i64) -> u8 {
    if expected <= 0 {
        return 0;
    }
    let percent = ((completed as f64 / expected as f64) * 100.0).round() as i64;
    percent.clamp(0, 100) as u8
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// Full replacement payload for a profile upsert. Absent fields clear
/// their columns; the row is rewritten as a whole.
#[derive(Debug, Clone, Default)]
pub struct ProfileData {
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmergencyContact {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub name: String,
    pub relationship: Option<String>,
    pub phone: String,
    pub notes: Option<String>,
    #[serde(rename = "isPrimary")]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewContact {
    pub name: String,
    pub relationship: Option<String>,
    pub phone: String,
    pub notes: Option<String>,
    pub is_primary: bool,
}

/// Partial update for an emergency contact, same outer/inner `Option`
/// convention as [`UpdateTaskData`].
#[derive(Debug, Clone, Default)]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub relationship: Option<Option<String>>,
    pub phone: Option<String>,
    pub notes: Option<Option<String>>,
    pub is_primary: Option<bool>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.relationship.is_none()
            && self.phone.is_none()
            && self.notes.is_none()
            && self.is_primary.is_none()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HealthProfile {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub conditions: Option<String>,
    pub medical_notes: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// Full replacement payload for a health profile upsert.
#[derive(Debug, Clone, Default)]
pub struct HealthData {
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub conditions: Option<String>,
    pub medical_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_task(task_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Task {
        Task {
            id: 1,
            user_id: 1,
            title: "Morning medication".to_string(),
            task_time: None,
            category: None,
            task_date,
            end_date,
            important: false,
            description: None,
            is_daily: true,
            created_at: date(2024, 1, 1).and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn one_off_task_is_due_only_on_its_date() {
        let mut task = daily_task(Some(date(2024, 10, 3)), None);
        task.is_daily = false;

        assert!(task.is_due_on(date(2024, 10, 3)));
        assert!(!task.is_due_on(date(2024, 10, 2)));
        assert!(!task.is_due_on(date(2024, 10, 4)));
    }

    #[test]
    fn one_off_task_without_date_is_never_due() {
        let mut task = daily_task(None, None);
        task.is_daily = false;

        assert!(!task.is_due_on(date(2024, 10, 3)));
    }

    #[test]
    fn open_ended_daily_task_is_due_every_day() {
        let task = daily_task(None, None);

        assert!(task.is_due_on(date(2020, 1, 1)));
        assert!(task.is_due_on(date(2030, 12, 31)));
    }

    #[test]
    fn daily_task_window_is_inclusive_on_both_ends() {
        let task = daily_task(Some(date(2024, 10, 2)), Some(date(2024, 10, 5)));

        assert!(!task.is_due_on(date(2024, 10, 1)));
        assert!(task.is_due_on(date(2024, 10, 2)));
        assert!(task.is_due_on(date(2024, 10, 5)));
        assert!(!task.is_due_on(date(2024, 10, 6)));
    }

    #[test]
    fn daily_task_with_only_start_runs_forever() {
        let task = daily_task(Some(date(2024, 10, 2)), None);

        assert!(!task.is_due_on(date(2024, 10, 1)));
        assert!(task.is_due_on(date(2025, 3, 15)));
    }

    #[test]
    fn percent_is_zero_when_nothing_expected() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(0, 3), 0);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(progress_percent(3, 1), 33);
        assert_eq!(progress_percent(3, 2), 67);
        assert_eq!(progress_percent(8, 1), 13);
        assert_eq!(progress_percent(2, 1), 50);
    }

    #[test]
    fn percent_is_capped_at_one_hundred() {
        assert_eq!(progress_percent(2, 5), 100);
        assert_eq!(progress_percent(1, 1), 100);
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("Caregiver".parse::<Role>().unwrap(), Role::Caregiver);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn empty_task_update_is_detected() {
        assert!(UpdateTaskData::default().is_empty());

        let update = UpdateTaskData {
            important: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());

        let clears_date = UpdateTaskData {
            task_date: Some(None),
            ..Default::default()
        };
        assert!(!clears_date.is_empty());
    }
}
