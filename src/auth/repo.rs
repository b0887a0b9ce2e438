use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: OffsetDateTime,
}

/// One-to-one profile extension; storage only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: Uuid,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age_years: i32,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, external_id, first_name, last_name, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_external_id(
        db: &PgPool,
        external_id: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a password-holding user. Part of the registration
    /// transaction so the profile row lands with it or not at all.
    pub async fn create_with_password_tx(
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut **tx)
        .await?;
        Ok(user)
    }

    pub async fn create_passwordless_tx(
        tx: &mut Transaction<'_, Postgres>,
        external_id: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, external_id, first_name, last_name) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(external_id)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&mut **tx)
        .await?;
        Ok(user)
    }
}

impl Profile {
    pub async fn create_tx(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
    ) -> anyhow::Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            RETURNING user_id, height_cm, weight_kg, age_years
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(profile)
    }

    pub async fn get(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT user_id, height_cm, weight_kg, age_years
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
        age_years: Option<i32>,
    ) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET height_cm = COALESCE($2, height_cm),
                weight_kg = COALESCE($3, weight_kg),
                age_years = COALESCE($4, age_years)
            WHERE user_id = $1
            RETURNING user_id, height_cm, weight_kg, age_years
            "#,
        )
        .bind(user_id)
        .bind(height_cm)
        .bind(weight_kg)
        .bind(age_years)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }
}
