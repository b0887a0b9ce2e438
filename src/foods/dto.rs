use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::foods::repo::Food;

/// POST /log-food body. `meal_type` and `date` are checked in the
/// service so their absence is a 400, not a body-shape rejection.
#[derive(Debug, Deserialize)]
pub struct LogFoodRequest {
    pub description: Option<String>,
    pub meal_type: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
    /// Overrides both the food name and the meal's display name.
    pub name: Option<String>,
    pub image_b64: Option<String>,
    pub content_type: Option<String>,
}

/// POST /estimate body — preview only, no meal attachment.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub description: Option<String>,
    pub name: Option<String>,
    pub image_b64: Option<String>,
    pub content_type: Option<String>,
}

/// POST /food/:id/log body — promotes a draft into a meal slot.
#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub meal_type: Option<String>,
    pub date: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoggedFoodResponse {
    #[serde(flatten)]
    pub food: Food,
    pub meal_id: Uuid,
}
