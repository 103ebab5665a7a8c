use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, handlers};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/horoscope", post(handlers::compute_horoscope))
        .with_state(state)
}
