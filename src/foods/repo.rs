use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::{Estimation, NutrientProfile};

/// One estimated or logged portion. Nutrient values are append-only:
/// written once at creation, never updated. The only mutable state is the
/// `archived` flag (draft estimate vs. confirmed log entry).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub initial_description: String,
    pub image_url: Option<String>,
    pub archived: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub nutrition: NutrientProfile,
    pub created_at: OffsetDateTime,
}

pub const FOOD_COLUMNS: &str = "id, user_id, name, initial_description, image_url, archived, \
     calories_min, calories_max, protein_min, protein_max, \
     total_fat_min, total_fat_max, saturated_fat_min, saturated_fat_max, \
     carbohydrates_min, carbohydrates_max, sugar_min, sugar_max, \
     fiber_min, fiber_max, cholesterol_min, cholesterol_max, \
     sodium_grams_min, sodium_grams_max, created_at";

/// Create exactly one Food from a validated estimation. Each call gets a
/// fresh id; retries create new rows, which is why failures upstream must
/// abort rather than re-run the write.
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    user_id: Uuid,
    estimation: &Estimation,
    initial_description: &str,
    image_url: Option<&str>,
    archived: bool,
) -> anyhow::Result<Food> {
    let n = &estimation.profile;
    let food = sqlx::query_as::<_, Food>(&format!(
        "INSERT INTO foods (id, user_id, name, initial_description, image_url, archived, \
             calories_min, calories_max, protein_min, protein_max, \
             total_fat_min, total_fat_max, saturated_fat_min, saturated_fat_max, \
             carbohydrates_min, carbohydrates_max, sugar_min, sugar_max, \
             fiber_min, fiber_max, cholesterol_min, cholesterol_max, \
             sodium_grams_min, sodium_grams_max) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21, $22, $23, $24) \
         RETURNING {FOOD_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(&estimation.name)
    .bind(initial_description)
    .bind(image_url)
    .bind(archived)
    .bind(n.calories_min)
    .bind(n.calories_max)
    .bind(n.protein_min)
    .bind(n.protein_max)
    .bind(n.total_fat_min)
    .bind(n.total_fat_max)
    .bind(n.saturated_fat_min)
    .bind(n.saturated_fat_max)
    .bind(n.carbohydrates_min)
    .bind(n.carbohydrates_max)
    .bind(n.sugar_min)
    .bind(n.sugar_max)
    .bind(n.fiber_min)
    .bind(n.fiber_max)
    .bind(n.cholesterol_min)
    .bind(n.cholesterol_max)
    .bind(n.sodium_grams_min)
    .bind(n.sodium_grams_max)
    .fetch_one(&mut **tx)
    .await?;
    Ok(food)
}

/// Owner-scoped fetch; a foreign id reads as absent.
pub async fn get_for_user(
    db: &PgPool,
    user_id: Uuid,
    food_id: Uuid,
) -> anyhow::Result<Option<Food>> {
    let food = sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods WHERE id = $1 AND user_id = $2"
    ))
    .bind(food_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(food)
}

/// Draft -> Logged transition. Idempotent: promoting an already-logged
/// food just returns it.
pub async fn mark_logged_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    food_id: Uuid,
) -> anyhow::Result<Option<Food>> {
    let food = sqlx::query_as::<_, Food>(&format!(
        "UPDATE foods SET archived = TRUE \
         WHERE id = $1 AND user_id = $2 \
         RETURNING {FOOD_COLUMNS}"
    ))
    .bind(food_id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(food)
}
