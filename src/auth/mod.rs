use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/passwordless/register", post(handlers::passwordless_register))
        .route("/auth/passwordless/login", post(handlers::passwordless_login))
        .route("/auth/exists/:external_id", get(handlers::exists))
        .route("/me", get(handlers::get_me).put(handlers::update_me))
}
