use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{HoroscopeRequest, HoroscopeResponse},
};

pub async fn compute_horoscope(
    State(state): State<AppState>,
    payload: Result<Json<HoroscopeRequest>, JsonRejection>,
) -> AppResult<Json<HoroscopeResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;

    let response = state.horoscope_service.handle(request).await?;

    Ok(Json(response))
}
