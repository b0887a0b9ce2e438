use axum::{routing::get, Router};

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

pub use repo::MealType;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/meals",
        get(handlers::list_meals).post(handlers::meal_totals),
    )
}
