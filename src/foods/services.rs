use base64::Engine;
use bytes::Bytes;
use time::Date;
use tracing::info;
use uuid::Uuid;

use super::repo::{self, Food};
use crate::errors::ApiError;
use crate::images::services::upload_food_image;
use crate::meals::repo::{Meal, MealType};
use crate::meals::services::attach_food_tx;
use crate::nutrition::{prompt, validate, Estimation};
use crate::state::AppState;

/// Decoded inline image payload plus its content type.
#[derive(Debug)]
pub struct ImagePayload {
    pub body: Bytes,
    pub content_type: String,
}

pub fn decode_image(
    image_b64: Option<&str>,
    content_type: Option<&str>,
) -> Result<Option<ImagePayload>, ApiError> {
    let Some(b64) = image_b64.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ApiError::Validation("invalid base64 image".into()))?;
    Ok(Some(ImagePayload {
        body: Bytes::from(bytes),
        content_type: content_type
            .unwrap_or("application/octet-stream")
            .to_string(),
    }))
}

/// Build the prompt pair, call the collaborator once (time-bounded, no
/// retry), and validate the reply. Nothing is persisted until this has
/// fully succeeded.
async fn run_estimation(
    state: &AppState,
    description: &str,
    name_override: Option<&str>,
) -> Result<Estimation, ApiError> {
    let (system_prompt, user_message) = prompt::build_messages(description);
    let raw = state
        .estimator
        .complete(&system_prompt, &user_message, &[])
        .await?;
    validate::parse_estimation(&raw, name_override)
}

/// Preview flow: estimate and persist a draft (`archived = false`), no
/// meal attachment.
pub async fn estimate_only(
    state: &AppState,
    user_id: Uuid,
    description: &str,
    name_override: Option<&str>,
    image: Option<ImagePayload>,
) -> Result<Food, ApiError> {
    let estimation = run_estimation(state, description, name_override).await?;

    let food_id = Uuid::new_v4();
    let image_url = match image {
        Some(img) => Some(
            upload_food_image(state, user_id, food_id, img.body, &img.content_type).await?,
        ),
        None => None,
    };

    let mut tx = state.db.begin().await?;
    let food = repo::insert_tx(
        &mut tx,
        food_id,
        user_id,
        &estimation,
        description,
        image_url.as_deref(),
        false,
    )
    .await?;
    tx.commit().await?;

    info!(food_id = %food.id, user_id = %user_id, "draft estimate stored");
    Ok(food)
}

/// Confirmed-log flow: estimate, persist the Food (`archived = true`),
/// and attach it to its `(owner, date, meal_type)` bucket, all in one
/// transaction. The image upload happens before the transaction opens so
/// a storage failure leaves no partial Food/Meal pair.
pub async fn log_food(
    state: &AppState,
    user_id: Uuid,
    description: &str,
    meal_type: MealType,
    date: Date,
    name: Option<&str>,
    image: Option<ImagePayload>,
) -> Result<(Food, Meal), ApiError> {
    let estimation = run_estimation(state, description, name).await?;

    let food_id = Uuid::new_v4();
    let image_url = match image {
        Some(img) => Some(
            upload_food_image(state, user_id, food_id, img.body, &img.content_type).await?,
        ),
        None => None,
    };

    let mut tx = state.db.begin().await?;
    let food = repo::insert_tx(
        &mut tx,
        food_id,
        user_id,
        &estimation,
        description,
        image_url.as_deref(),
        true,
    )
    .await?;
    let meal = attach_food_tx(&mut tx, user_id, food.id, description, meal_type, date, name)
        .await?;
    tx.commit().await?;

    info!(
        food_id = %food.id,
        meal_id = %meal.id,
        meal_type = %meal.meal_type,
        date = %meal.date,
        "food logged"
    );
    Ok((food, meal))
}

/// Draft -> Logged: flip the archived flag and attach to the requested
/// slot. Re-promoting is harmless — membership is a set, so totals are
/// unchanged by a repeat.
pub async fn promote_draft(
    state: &AppState,
    user_id: Uuid,
    food_id: Uuid,
    meal_type: MealType,
    date: Date,
    name: Option<&str>,
) -> Result<(Food, Meal), ApiError> {
    let mut tx = state.db.begin().await?;
    let food = repo::mark_logged_tx(&mut tx, user_id, food_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Food".into()))?;
    let meal = attach_food_tx(
        &mut tx,
        user_id,
        food.id,
        &food.initial_description,
        meal_type,
        date,
        name,
    )
    .await?;
    tx.commit().await?;

    info!(food_id = %food.id, meal_id = %meal.id, "draft promoted");
    Ok((food, meal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::NutrientProfile;
    use crate::state::AppState;

    #[test]
    fn decode_image_absent_is_none() {
        assert!(decode_image(None, None).unwrap().is_none());
        assert!(decode_image(Some("  "), None).unwrap().is_none());
    }

    #[test]
    fn decode_image_accepts_standard_base64() {
        let img = decode_image(Some("aGVsbG8="), Some("image/png"))
            .unwrap()
            .unwrap();
        assert_eq!(&img.body[..], b"hello");
        assert_eq!(img.content_type, "image/png");
    }

    #[test]
    fn decode_image_defaults_the_content_type() {
        let img = decode_image(Some("aGVsbG8="), None).unwrap().unwrap();
        assert_eq!(img.content_type, "application/octet-stream");
    }

    #[test]
    fn decode_image_rejects_bad_base64() {
        let err = decode_image(Some("not base64!!!"), None).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn estimation_pipeline_against_fake_collaborator() {
        // End to end through builder + fake LLM + validator: the canned
        // reply estimates every nutrient at (280, 340).
        let state = AppState::fake();
        let est = run_estimation(&state, "grilled chicken breast, 200g", None)
            .await
            .unwrap();
        assert_eq!(est.name, "Grilled Chicken");
        assert_eq!(est.profile.calories_min, 280.0);
        assert_eq!(est.profile.calories_max, 340.0);

        // The single-food meal total equals the food's own range.
        let totals = NutrientProfile::sum([&est.profile]);
        assert_eq!(totals.calories_min, 280.0);
        assert_eq!(totals.calories_max, 340.0);
    }

    #[tokio::test]
    async fn estimation_pipeline_applies_name_override() {
        let state = AppState::fake();
        let est = run_estimation(&state, "leftover stew", Some("Tuesday Stew"))
            .await
            .unwrap();
        assert_eq!(est.name, "Tuesday Stew");
    }
}
