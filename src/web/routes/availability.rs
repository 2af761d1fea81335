use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::models::{Day, WorkshopAvailability};
use crate::services::availability_service;
use crate::web::state::AppState;

pub async fn availability_handler(
    State(app): State<AppState>,
    Path(day): Path<u8>,
) -> Result<Json<Vec<WorkshopAvailability>>, (StatusCode, Json<Value>)> {
    let Some(day) = Day::from_number(day) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unknown_day", "detail": "day must be 1 or 2" })),
        ));
    };

    availability_service::remaining(&app.catalog, &app.cache, day, None)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(day = day.number(), error = %e, "availability read failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "storage_unavailable", "detail": e.to_string() })),
            )
        })
}
