use crate::error::CoreError;
use crate::models::{NewUser, Role, User, UserSummary};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl super::UserRepository for SqliteRepository {
    async fn create_user(&self, data: NewUser) -> Result<User, CoreError> {
        let name = data.name.trim();
        let email = data.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(CoreError::InvalidInput(
                "name and email must not be empty".to_string(),
            ));
        }

        // An email that collides with an existing login name would make the
        // identifier lookup ambiguous, so both columns are checked up front.
        if self.find_user_by_identifier(email).await?.is_some() {
            return Err(CoreError::AlreadyExists(format!("User {}", email)));
        }

        let inserted = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (name, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(Utc::now().naive_utc())
        .fetch_one(self.pool())
        .await;

        match inserted {
            Ok(user) => Ok(user),
            // The unique indexes are the backstop for concurrent signups.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(CoreError::AlreadyExists(format!("User {}", email)))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, CoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, CoreError> {
        let user = sqlx::query_as(
            r#"SELECT * FROM users
            WHERE LOWER(email) = LOWER($1) OR LOWER(name) = LOWER($1)
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    async fn find_users_by_role(&self, role: Role) -> Result<Vec<UserSummary>, CoreError> {
        let users: Vec<UserSummary> = sqlx::query_as(
            r#"SELECT id, name, email, role FROM users
            WHERE role = $1
            ORDER BY name COLLATE NOCASE ASC
            "#,
        )
        .bind(role)
        .fetch_all(self.pool())
        .await?;
        Ok(users)
    }
}
