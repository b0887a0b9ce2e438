use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::meals::repo::{Meal, MealType};
use crate::nutrition::NutrientProfile;

#[derive(Debug, Deserialize)]
pub struct MealListQuery {
    /// Optional YYYY-MM-DD cutoff; defaults to today (UTC).
    pub as_of: Option<String>,
}

/// Body of the totals request.
#[derive(Debug, Deserialize)]
pub struct TotalsRequest {
    pub meal_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MealSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub meal_type: MealType,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

impl From<Meal> for MealSummary {
    fn from(m: Meal) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            meal_type: m.meal_type,
            date: m.date,
            created_at: m.created_at,
        }
    }
}

/// Per-nutrient `(sum of mins, sum of maxes)` over the meal's current
/// member set.
#[derive(Debug, Serialize)]
pub struct MealTotalsResponse {
    pub meal_id: Uuid,
    pub name: String,
    pub meal_type: MealType,
    pub date: Date,
    pub item_count: usize,
    pub totals: NutrientProfile,
}
