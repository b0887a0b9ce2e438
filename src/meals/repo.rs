use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::foods::repo::{Food, FOOD_COLUMNS};

/// Closed meal-slot enumeration. Stored as the `meal_type` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "meal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Other,
    #[sqlx(rename = "n/a")]
    #[serde(rename = "n/a")]
    Na,
}

impl MealType {
    /// Case-insensitive match against the closed set; anything else is an
    /// `InvalidMealType`.
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            "other" => Ok(Self::Other),
            "n/a" => Ok(Self::Na),
            _ => Err(ApiError::InvalidMealType),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
            Self::Other => "other",
            Self::Na => "n/a",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bucket of foods per `(owner, date, meal_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: String,
    pub meal_type: MealType,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

const MEAL_COLUMNS: &str = "id, user_id, name, description, meal_type, date, created_at";

/// Atomic find-or-create for the unique slot. A single upsert statement,
/// never check-then-insert: two concurrent first-logs for the same slot
/// converge on one row, and the conflict row lock serializes the rest of
/// each logging transaction against the other.
pub async fn find_or_create_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    date: Date,
    meal_type: MealType,
) -> anyhow::Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(&format!(
        "INSERT INTO meals (id, user_id, meal_type, date) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, date, meal_type) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING {MEAL_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(meal_type)
    .bind(date)
    .fetch_one(&mut **tx)
    .await?;
    Ok(meal)
}

/// Membership insert with set semantics: re-attaching the same food is a
/// no-op, so totals can never double-count. Returns whether a new row was
/// actually inserted.
pub async fn attach_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    meal_id: Uuid,
    food_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO meal_items (meal_id, food_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(meal_id)
    .bind(food_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrite the display name (when given) and replace the accumulated
/// description with the caller-computed append result.
pub async fn annotate_tx(
    tx: &mut Transaction<'_, Postgres>,
    meal_id: Uuid,
    name: Option<&str>,
    description: &str,
) -> anyhow::Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(&format!(
        "UPDATE meals \
         SET name = COALESCE($2, name), description = $3 \
         WHERE id = $1 \
         RETURNING {MEAL_COLUMNS}"
    ))
    .bind(meal_id)
    .bind(name)
    .bind(description)
    .fetch_one(&mut **tx)
    .await?;
    Ok(meal)
}

pub async fn get_for_user(
    db: &PgPool,
    user_id: Uuid,
    meal_id: Uuid,
) -> anyhow::Result<Option<Meal>> {
    let meal = sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1 AND user_id = $2"
    ))
    .bind(meal_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(meal)
}

/// All meals for the owner dated `as_of` or earlier, most recent first.
/// Future-dated meals are excluded.
pub async fn list_for_user(
    db: &PgPool,
    user_id: Uuid,
    as_of: Date,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, Meal>(&format!(
        "SELECT {MEAL_COLUMNS} FROM meals \
         WHERE user_id = $1 AND date <= $2 \
         ORDER BY date DESC, created_at DESC"
    ))
    .bind(user_id)
    .bind(as_of)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Current member set of a meal. Totals are folded over this at read
/// time, so they always reflect the latest membership.
pub async fn member_foods(db: &PgPool, meal_id: Uuid) -> anyhow::Result<Vec<Food>> {
    let rows = sqlx::query_as::<_, Food>(&format!(
        "SELECT {FOOD_COLUMNS} FROM foods f \
         JOIN meal_items mi ON mi.food_id = f.id \
         WHERE mi.meal_id = $1 \
         ORDER BY f.created_at ASC"
    ))
    .bind(meal_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod meal_type_tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        for raw in ["Breakfast", "breakfast", "BREAKFAST", " breakfast "] {
            assert_eq!(MealType::parse(raw).unwrap(), MealType::Breakfast);
        }
        assert_eq!(MealType::parse("n/a").unwrap(), MealType::Na);
        assert_eq!(MealType::parse("N/A").unwrap(), MealType::Na);
    }

    #[test]
    fn parse_rejects_values_outside_the_closed_set() {
        for raw in ["brunch", "supper", "", "meal"] {
            assert!(matches!(
                MealType::parse(raw),
                Err(ApiError::InvalidMealType)
            ));
        }
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for mt in [
            MealType::Breakfast,
            MealType::Lunch,
            MealType::Dinner,
            MealType::Snack,
            MealType::Other,
            MealType::Na,
        ] {
            assert_eq!(MealType::parse(mt.as_str()).unwrap(), mt);
        }
    }

    #[test]
    fn serializes_lowercase_with_na_slash() {
        assert_eq!(
            serde_json::to_string(&MealType::Lunch).unwrap(),
            r#""lunch""#
        );
        assert_eq!(serde_json::to_string(&MealType::Na).unwrap(), r#""n/a""#);
    }
}
