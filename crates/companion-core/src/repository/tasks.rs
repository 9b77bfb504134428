use crate::error::CoreError;
use crate::models::{NewTaskData, Task, UpdateTaskData};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

/// Filter matching every task expected on the day bound as `$2`, for the
/// owner bound as `$1`. Daily tasks match inside their inclusive window;
/// one-off tasks match their exact date. Shared with the progress module
/// so "expected" always means the same thing as the due-today listing.
pub(crate) const DUE_ON_FILTER: &str = "user_id = $1
      AND (
        (is_daily = 1
          AND (task_date IS NULL OR task_date <= $2)
          AND (end_date IS NULL OR end_date >= $2)
        )
        OR
        (is_daily = 0 AND task_date = $2)
      )";

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn create_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        if data.user_id <= 0 {
            return Err(CoreError::InvalidInput(
                "userId must be a positive id".to_string(),
            ));
        }
        let title = data.title.trim();
        if title.is_empty() {
            return Err(CoreError::InvalidInput("title must not be empty".to_string()));
        }

        let task: Task = sqlx::query_as(
            r#"INSERT INTO tasks
              (user_id, title, task_time, category, task_date, end_date, important, description, is_daily, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(data.user_id)
        .bind(title)
        .bind(data.task_time)
        .bind(&data.category)
        .bind(data.task_date)
        .bind(data.end_date)
        .bind(data.important)
        .bind(&data.description)
        .bind(data.is_daily)
        .bind(Utc::now().naive_utc())
        .fetch_one(self.pool())
        .await?;

        Ok(task)
    }

    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>, CoreError> {
        let tasks: Vec<Task> = sqlx::query_as("SELECT * FROM tasks WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
        Ok(tasks)
    }

    async fn find_tasks_due_on(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Task>, CoreError> {
        let sql = format!(
            "SELECT * FROM tasks WHERE {} ORDER BY task_time IS NULL, task_time, id",
            DUE_ON_FILTER
        );
        let tasks: Vec<Task> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_all(self.pool())
            .await?;
        Ok(tasks)
    }

    async fn update_task(&self, id: i64, data: UpdateTaskData) -> Result<Task, CoreError> {
        if data.is_empty() {
            return Err(CoreError::InvalidInput("No fields to update".to_string()));
        }
        if let Some(title) = &data.title {
            if title.trim().is_empty() {
                return Err(CoreError::InvalidInput("title must not be empty".to_string()));
            }
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        let mut updated = false;

        if let Some(title) = &data.title {
            qb.push("title = ");
            qb.push_bind(title.trim().to_string());
            updated = true;
        }

        if let Some(task_time) = &data.task_time {
            if updated {
                qb.push(", ");
            }
            qb.push("task_time = ");
            qb.push_bind(*task_time);
            updated = true;
        }

        if let Some(category) = &data.category {
            if updated {
                qb.push(", ");
            }
            qb.push("category = ");
            qb.push_bind(category.clone());
            updated = true;
        }

        if let Some(task_date) = &data.task_date {
            if updated {
                qb.push(", ");
            }
            qb.push("task_date = ");
            qb.push_bind(*task_date);
            updated = true;
        }

        if let Some(end_date) = &data.end_date {
            if updated {
                qb.push(", ");
            }
            qb.push("end_date = ");
            qb.push_bind(*end_date);
            updated = true;
        }

        if let Some(important) = &data.important {
            if updated {
                qb.push(", ");
            }
            qb.push("important = ");
            qb.push_bind(*important);
            updated = true;
        }

        if let Some(description) = &data.description {
            if updated {
                qb.push(", ");
            }
            qb.push("description = ");
            qb.push_bind(description.clone());
            updated = true;
        }

        if let Some(is_daily) = &data.is_daily {
            if updated {
                qb.push(", ");
            }
            qb.push("is_daily = ");
            qb.push_bind(*is_daily);
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(self.pool()).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Task {}", id)));
        }

        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(task)
    }

    async fn delete_task(&self, id: i64, owner: Option<i64>) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let existing: Option<(i64,)> = match owner {
            Some(user_id) => {
                sqlx::query_as("SELECT id FROM tasks WHERE id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT id FROM tasks WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };
        if existing.is_none() {
            return Err(CoreError::NotFound(format!("Task {}", id)));
        }

        // Log rows go in the same transaction; a completion must never
        // outlive its task.
        sqlx::query("DELETE FROM task_logs WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
