use crate::error::CoreError;
use crate::models::{
    ContactUpdate, EmergencyContact, HealthData, HealthProfile, NewContact, Profile, ProfileData,
};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

#[async_trait]
impl super::ProfileRepository for SqliteRepository {
    async fn find_profile(&self, user_id: i64) -> Result<Option<Profile>, CoreError> {
        let profile = sqlx::query_as("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, user_id: i64, data: ProfileData) -> Result<Profile, CoreError> {
        // Whole-row replacement: absent fields clear their columns.
        let profile: Profile = sqlx::query_as(
            r#"INSERT INTO user_profiles (user_id, full_name, dob, gender, phone, address, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(user_id) DO UPDATE SET
              full_name = excluded.full_name,
              dob = excluded.dob,
              gender = excluded.gender,
              phone = excluded.phone,
              address = excluded.address,
              updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data.full_name)
        .bind(data.dob)
        .bind(&data.gender)
        .bind(&data.phone)
        .bind(&data.address)
        .bind(Utc::now().naive_utc())
        .fetch_one(self.pool())
        .await?;
        Ok(profile)
    }

    async fn find_contacts(&self, user_id: i64) -> Result<Vec<EmergencyContact>, CoreError> {
        let contacts: Vec<EmergencyContact> = sqlx::query_as(
            r#"SELECT * FROM emergency_contacts
            WHERE user_id = $1
            ORDER BY is_primary DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(contacts)
    }

    async fn add_contact(
        &self,
        user_id: i64,
        data: NewContact,
    ) -> Result<EmergencyContact, CoreError> {
        let name = data.name.trim();
        let phone = data.phone.trim();
        if name.is_empty() || phone.is_empty() {
            return Err(CoreError::InvalidInput(
                "name and phone must not be empty".to_string(),
            ));
        }

        let mut tx = self.pool().begin().await?;

        // At most one primary contact per user; demote the rest in the same
        // transaction as the insert.
        if data.is_primary {
            sqlx::query("UPDATE emergency_contacts SET is_primary = 0 WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let contact: EmergencyContact = sqlx::query_as(
            r#"INSERT INTO emergency_contacts (user_id, name, relationship, phone, notes, is_primary)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(&data.relationship)
        .bind(phone)
        .bind(&data.notes)
        .bind(data.is_primary)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(contact)
    }

    async fn update_contact(
        &self,
        user_id: i64,
        contact_id: i64,
        data: ContactUpdate,
    ) -> Result<EmergencyContact, CoreError> {
        if data.is_empty() {
            return Err(CoreError::InvalidInput("No fields to update".to_string()));
        }

        let mut tx = self.pool().begin().await?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM emergency_contacts WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(contact_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_none() {
            return Err(CoreError::NotFound(format!("Contact {}", contact_id)));
        }

        if data.is_primary == Some(true) {
            sqlx::query("UPDATE emergency_contacts SET is_primary = 0 WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE emergency_contacts SET ");
        let mut updated = false;

        if let Some(name) = &data.name {
            qb.push("name = ");
            qb.push_bind(name.trim().to_string());
            updated = true;
        }

        if let Some(relationship) = &data.relationship {
            if updated {
                qb.push(", ");
            }
            qb.push("relationship = ");
            qb.push_bind(relationship.clone());
            updated = true;
        }

        if let Some(phone) = &data.phone {
            if updated {
                qb.push(", ");
            }
            qb.push("phone = ");
            qb.push_bind(phone.trim().to_string());
            updated = true;
        }

        if let Some(notes) = &data.notes {
            if updated {
                qb.push(", ");
            }
            qb.push("notes = ");
            qb.push_bind(notes.clone());
            updated = true;
        }

        if let Some(is_primary) = &data.is_primary {
            if updated {
                qb.push(", ");
            }
            qb.push("is_primary = ");
            qb.push_bind(*is_primary);
        }

        qb.push(" WHERE user_id = ");
        qb.push_bind(user_id);
        qb.push(" AND id = ");
        qb.push_bind(contact_id);
        qb.build().execute(&mut *tx).await?;

        let contact: EmergencyContact =
            sqlx::query_as("SELECT * FROM emergency_contacts WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(contact_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok(contact)
    }

    async fn delete_contact(&self, user_id: i64, contact_id: i64) -> Result<(), CoreError> {
        let result =
            sqlx::query("DELETE FROM emergency_contacts WHERE user_id = $1 AND id = $2")
                .bind(user_id)
                .bind(contact_id)
                .execute(self.pool())
                .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Contact {}", contact_id)));
        }
        Ok(())
    }

    async fn find_health_profile(&self, user_id: i64) -> Result<Option<HealthProfile>, CoreError> {
        let health = sqlx::query_as("SELECT * FROM health_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(health)
    }

    async fn upsert_health_profile(
        &self,
        user_id: i64,
        data: HealthData,
    ) -> Result<HealthProfile, CoreError> {
        let health: HealthProfile = sqlx::query_as(
            r#"INSERT INTO health_profiles (user_id, blood_type, allergies, conditions, medical_notes, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(user_id) DO UPDATE SET
              blood_type = excluded.blood_type,
              allergies = excluded.allergies,
              conditions = excluded.conditions,
              medical_notes = excluded.medical_notes,
              updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data.blood_type)
        .bind(&data.allergies)
        .bind(&data.conditions)
        .bind(&data.medical_notes)
        .bind(Utc::now().naive_utc())
        .fetch_one(self.pool())
        .await?;
        Ok(health)
    }
}
