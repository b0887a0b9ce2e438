use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/log-food", post(handlers::log_food))
        .route("/estimate", post(handlers::estimate))
        .route("/food/:id", get(handlers::get_food))
        .route("/food/:id/log", post(handlers::promote))
}
