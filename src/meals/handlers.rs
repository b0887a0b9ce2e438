use axum::{
    extract::{Query, State},
    Json,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::dto::{MealListQuery, MealSummary, MealTotalsResponse, TotalsRequest};
use super::{repo, services};
use crate::{auth::jwt::AuthUser, errors::ApiError, state::AppState};

/// GET /meals — the caller's meals with `date <= as_of` (default today,
/// UTC), most recent first. Future-dated meals are never disclosed.
#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<MealListQuery>,
) -> Result<Json<Vec<MealSummary>>, ApiError> {
    let as_of = match q.as_of.as_deref() {
        Some(raw) => services::parse_date(raw)?,
        None => OffsetDateTime::now_utc().date(),
    };

    let meals = repo::list_for_user(&state.db, user_id, as_of).await?;
    Ok(Json(meals.into_iter().map(MealSummary::from).collect()))
}

/// POST /meals — aggregated nutrient totals for one meal.
#[instrument(skip(state, payload))]
pub async fn meal_totals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TotalsRequest>,
) -> Result<Json<MealTotalsResponse>, ApiError> {
    let meal_id = payload
        .meal_id
        .ok_or_else(|| ApiError::Validation("meal_id is required".into()))?;

    let totals = services::totals_for_meal(&state, user_id, meal_id).await?;
    Ok(Json(totals))
}
