use crate::access;
use crate::calendar;
use crate::error::CoreError;
use crate::models::{Actor, CompletionOutcome, HistoryEntry, Task, TaskLog};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::NaiveDate;

const HISTORY_SELECT: &str = r#"SELECT
      l.id AS log_id,
      l.task_id,
      l.user_id,
      l.method,
      l.completed_at,
      l.completed_on,
      t.title,
      t.category,
      t.task_time,
      t.task_date,
      t.end_date
    FROM task_logs l
    JOIN tasks t ON t.id = l.task_id
    WHERE l.user_id = $1"#;

#[async_trait]
impl super::CompletionRepository for SqliteRepository {
    async fn complete_task(
        &self,
        task_id: i64,
        actor: &Actor,
        method: &str,
        date: NaiveDate,
    ) -> Result<CompletionOutcome, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Task {}", task_id)))?;

        // The rule is evaluated against the task's owner, not any id the
        // caller supplied.
        access::ensure_can_act_on(actor, task.user_id)?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM task_logs WHERE task_id = $1 AND completed_on = $2 LIMIT 1",
        )
        .bind(task_id)
        .bind(date)
        .fetch_optional(self.pool())
        .await?;
        if existing.is_some() {
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        // The log always carries the owner's id, and the timestamp is pinned
        // to noon so the stored instant stays inside the recorded day.
        let inserted = sqlx::query_as::<_, TaskLog>(
            r#"INSERT INTO task_logs (task_id, user_id, method, completed_at, completed_on)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(task_id)
        .bind(task.user_id)
        .bind(method)
        .bind(calendar::noon(date))
        .bind(date)
        .fetch_one(self.pool())
        .await;

        match inserted {
            Ok(log) => Ok(CompletionOutcome::Logged(log)),
            // Two requests can pass the pre-check together; the unique
            // constraint decides the race and the loser reports the same
            // outcome as a plain repeat.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(CompletionOutcome::AlreadyCompleted)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_logs_for_user(&self, user_id: i64) -> Result<Vec<TaskLog>, CoreError> {
        let logs: Vec<TaskLog> = sqlx::query_as(
            "SELECT * FROM task_logs WHERE user_id = $1 ORDER BY completed_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(logs)
    }

    async fn find_completed_task_ids(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<i64>, CoreError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"SELECT DISTINCT task_id FROM task_logs
            WHERE user_id = $1 AND completed_on = $2
            ORDER BY task_id
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_history(
        &self,
        user_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        let entries: Vec<HistoryEntry> = match date {
            Some(day) => {
                let sql = format!(
                    "{} AND l.completed_on = $2 ORDER BY l.completed_at DESC, l.id DESC",
                    HISTORY_SELECT
                );
                sqlx::query_as(&sql)
                    .bind(user_id)
                    .bind(day)
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                let sql = format!("{} ORDER BY l.completed_at DESC, l.id DESC", HISTORY_SELECT);
                sqlx::query_as(&sql)
                    .bind(user_id)
                    .fetch_all(self.pool())
                    .await?
            }
        };
        Ok(entries)
    }

    async fn clear_completions(&self, user_id: i64, date: NaiveDate) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM task_logs WHERE user_id = $1 AND completed_on = $2")
            .bind(user_id)
            .bind(date)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}
