use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, MealMessage, Sender};
use crate::{auth::jwt::AuthUser, errors::ApiError, meals, state::AppState};

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

/// GET /meals/:id/messages — the meal's dialogue log, oldest first.
#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MealMessage>>, ApiError> {
    let meal = meals::repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meal".into()))?;

    let messages = repo::list_by_meal(&state.db, meal.id).await?;
    Ok(Json(messages))
}

/// POST /meals/:id/messages — append one user turn.
#[instrument(skip(state, payload))]
pub async fn post_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MealMessage>), ApiError> {
    let body = payload.body.trim();
    if body.is_empty() {
        return Err(ApiError::Validation("body is required".into()));
    }

    let meal = meals::repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meal".into()))?;

    let message = repo::append(&state.db, meal.id, Sender::User, body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
