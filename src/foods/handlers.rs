use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{EstimateRequest, LogFoodRequest, LoggedFoodResponse, PromoteRequest};
use super::{repo, services};
use crate::{auth::jwt::AuthUser, errors::ApiError, meals::repo::MealType, meals::services::parse_date, state::AppState};

fn location_header(food_id: Uuid) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::LOCATION,
        format!("/food/{}", food_id)
            .parse()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("location header: {e}")))?,
    );
    Ok(headers)
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

/// POST /log-food — estimate the description, persist the Food as logged,
/// and attach it to the caller's `(date, meal_type)` bucket.
#[instrument(skip(state, payload))]
pub async fn log_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<LogFoodRequest>,
) -> Result<(StatusCode, HeaderMap, Json<LoggedFoodResponse>), ApiError> {
    let description = required(&payload.description, "description")?;
    let meal_type = MealType::parse(required(&payload.meal_type, "meal_type")?)?;
    let date = parse_date(required(&payload.date, "date")?)?;
    let image = services::decode_image(
        payload.image_b64.as_deref(),
        payload.content_type.as_deref(),
    )?;

    let (food, meal) = services::log_food(
        &state,
        user_id,
        description,
        meal_type,
        date,
        payload.name.as_deref(),
        image,
    )
    .await?;

    let headers = location_header(food.id)?;
    Ok((
        StatusCode::CREATED,
        headers,
        Json(LoggedFoodResponse {
            food,
            meal_id: meal.id,
        }),
    ))
}

/// POST /estimate — preview only: a draft Food, no meal attachment.
#[instrument(skip(state, payload))]
pub async fn estimate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<EstimateRequest>,
) -> Result<(StatusCode, HeaderMap, Json<repo::Food>), ApiError> {
    let description = required(&payload.description, "description")?;
    let image = services::decode_image(
        payload.image_b64.as_deref(),
        payload.content_type.as_deref(),
    )?;

    let food = services::estimate_only(
        &state,
        user_id,
        description,
        payload.name.as_deref(),
        image,
    )
    .await?;

    let headers = location_header(food.id)?;
    Ok((StatusCode::CREATED, headers, Json(food)))
}

/// POST /food/:id/log — promote a draft into a meal slot.
#[instrument(skip(state, payload))]
pub async fn promote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PromoteRequest>,
) -> Result<Json<LoggedFoodResponse>, ApiError> {
    let meal_type = MealType::parse(required(&payload.meal_type, "meal_type")?)?;
    let date = parse_date(required(&payload.date, "date")?)?;

    let (food, meal) = services::promote_draft(
        &state,
        user_id,
        id,
        meal_type,
        date,
        payload.name.as_deref(),
    )
    .await?;

    Ok(Json(LoggedFoodResponse {
        food,
        meal_id: meal.id,
    }))
}

/// GET /food/:id — owner-scoped single fetch.
#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<repo::Food>, ApiError> {
    let food = repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Food".into()))?;
    Ok(Json(food))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(matches!(
            required(&None, "date"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            required(&Some("   ".into()), "date"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn required_trims_present_values() {
        assert_eq!(required(&Some(" lunch ".into()), "meal_type").unwrap(), "lunch");
    }
}
