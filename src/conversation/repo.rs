use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn of follow-up dialogue about a meal. Append-only; there is no
/// aggregation over this log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MealMessage {
    pub id: Uuid,
    pub meal_id: Uuid,
    pub sender: String,
    pub body: String,
    pub created_at: OffsetDateTime,
}

pub async fn append(
    db: &PgPool,
    meal_id: Uuid,
    sender: Sender,
    body: &str,
) -> anyhow::Result<MealMessage> {
    let message = sqlx::query_as::<_, MealMessage>(
        r#"
        INSERT INTO meal_messages (meal_id, sender, body)
        VALUES ($1, $2, $3)
        RETURNING id, meal_id, sender, body, created_at
        "#,
    )
    .bind(meal_id)
    .bind(sender.as_str())
    .bind(body)
    .fetch_one(db)
    .await?;
    Ok(message)
}

pub async fn list_by_meal(db: &PgPool, meal_id: Uuid) -> anyhow::Result<Vec<MealMessage>> {
    let rows = sqlx::query_as::<_, MealMessage>(
        r#"
        SELECT id, meal_id, sender, body, created_at
          FROM meal_messages
         WHERE meal_id = $1
         ORDER BY created_at ASC
        "#,
    )
    .bind(meal_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
