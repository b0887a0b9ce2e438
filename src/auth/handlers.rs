use axum::{
    extract::{FromRef, Path, State},
    Json,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ExistsResponse, LoginRequest, MeResponse, PasswordlessLoginRequest,
            PasswordlessRegisterRequest, PublicUser, RefreshRequest, RegisterRequest,
            UpdateProfileRequest,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, is_valid_email, verify_password},
        repo::{Profile, User},
    },
    errors::ApiError,
    state::AppState,
};

fn token_pair(keys: &JwtKeys, user: &User) -> Result<AuthResponse, ApiError> {
    let access_token = keys.sign_access(user.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        ApiError::Internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        ApiError::Internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email.clone(),
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;

    // One transaction: the identity record and its profile extension land
    // together, with no save-hook side effects.
    let mut tx = state.db.begin().await?;
    let user = User::create_with_password_tx(&mut tx, &payload.email, &hash).await?;
    Profile::create_tx(&mut tx, user.id).await?;
    tx.commit().await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized
        })?;

    let Some(stored_hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "password login against passwordless account");
        return Err(ApiError::Unauthorized);
    };

    if !verify_password(&payload.password, stored_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(token_pair(&keys, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn passwordless_register(
    State(state): State<AppState>,
    Json(mut payload): Json<PasswordlessRegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.external_id.trim().is_empty() {
        return Err(ApiError::Validation("external_id is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if User::find_by_external_id(&state.db, &payload.external_id)
        .await?
        .is_some()
    {
        warn!(external_id = %payload.external_id, "account already registered");
        return Err(ApiError::Conflict("Account already registered".into()));
    }
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let mut tx = state.db.begin().await?;
    let user = User::create_passwordless_tx(
        &mut tx,
        payload.external_id.trim(),
        &payload.email,
        payload.first_name.as_deref(),
        payload.last_name.as_deref(),
    )
    .await?;
    Profile::create_tx(&mut tx, user.id).await?;
    tx.commit().await?;

    info!(user_id = %user.id, "passwordless account created");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, &user)?))
}

#[instrument(skip(state, payload))]
pub async fn passwordless_login(
    State(state): State<AppState>,
    Json(payload): Json<PasswordlessLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = User::find_by_external_id(&state.db, payload.external_id.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Account".into()))?;

    if user.password_hash.is_some() {
        warn!(user_id = %user.id, "passwordless login against password account");
        return Err(ApiError::Conflict("Account already has a password".into()));
    }

    info!(user_id = %user.id, "passwordless login");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(token_pair(&keys, &user)?))
}

#[instrument(skip(state))]
pub async fn exists(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = User::find_by_external_id(&state.db, external_id.trim())
        .await?
        .is_some();
    Ok(Json(ExistsResponse { exists }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    let profile = Profile::get(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile".into()))?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        profile,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile = Profile::update(
        &state.db,
        user_id,
        payload.height_cm,
        payload.weight_kg,
        payload.age_years,
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Profile".into()))?;

    Ok(Json(profile))
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn test_public_user_serialization() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            email: "test@example.com".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("id"));
    }
}
