use crate::calendar;
use crate::error::CoreError;
use crate::models::{progress_percent, DailyCompletion, DayProgress};
use crate::repository::tasks::DUE_ON_FILTER;
use crate::repository::{SqliteRepository, TaskRepository};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

#[async_trait]
impl super::ProgressRepository for SqliteRepository {
    async fn day_progress(&self, user_id: i64, date: NaiveDate) -> Result<DayProgress, CoreError> {
        let sql = format!("SELECT COUNT(*) FROM tasks WHERE {}", DUE_ON_FILTER);
        let (expected,): (i64,) = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_one(self.pool())
            .await?;

        let (completed,): (i64,) = sqlx::query_as(
            "SELECT COUNT(DISTINCT task_id) FROM task_logs WHERE user_id = $1 AND completed_on = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(self.pool())
        .await?;

        Ok(DayProgress {
            user_id,
            date,
            expected,
            completed,
            percent: progress_percent(expected, completed),
        })
    }

    async fn month_progress(
        &self,
        user_id: i64,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyCompletion>, CoreError> {
        let dates = calendar::month_dates(year, month)?;

        // One task fetch covers the whole month; the due rule is evaluated
        // in memory per day. Completions come back pre-grouped by day.
        let tasks = self.find_tasks_for_user(user_id).await?;

        // month_dates yields at least 28 days for any valid month
        let first = dates[0];
        let last = dates[dates.len() - 1];
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            r#"SELECT completed_on, COUNT(DISTINCT task_id)
            FROM task_logs
            WHERE user_id = $1 AND completed_on BETWEEN $2 AND $3
            GROUP BY completed_on
            "#,
        )
        .bind(user_id)
        .bind(first)
        .bind(last)
        .fetch_all(self.pool())
        .await?;
        let completed_by_day: HashMap<NaiveDate, i64> = rows.into_iter().collect();

        let report = dates
            .into_iter()
            .map(|date| {
                let expected = tasks.iter().filter(|t| t.is_due_on(date)).count() as i64;
                let completed = completed_by_day.get(&date).copied().unwrap_or(0);
                DailyCompletion {
                    date,
                    expected,
                    completed,
                    rate: progress_percent(expected, completed),
                }
            })
            .collect();

        Ok(report)
    }
}
