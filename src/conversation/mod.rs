use axum::{routing::get, Router};

use crate::state::AppState;

pub mod handlers;
pub mod repo;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/meals/:id/messages",
        get(handlers::list_messages).post(handlers::post_message),
    )
}
