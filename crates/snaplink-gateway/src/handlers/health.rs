use crate::model::{HealthResponse, WelcomeResponse};
use axum::Json;

pub async fn root_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to snaplink",
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
