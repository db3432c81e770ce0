use crate::error::{AppError, Result};
use crate::model::{CreateLinkRequest, LinkResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use snaplink_core::{ShortCode, ShortenerError};

/// A path segment that can never name a stored link is reported the same
/// way as a well-formed code nobody created.
fn path_code(short_code: String) -> std::result::Result<ShortCode, ShortenerError> {
    ShortCode::new(short_code.as_str()).map_err(|_| ShortenerError::NotFound(short_code))
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkResponse>)> {
    let Json(request) = request?;
    let link = state.shortener().shorten(&request.original_url).await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_link(link, state.base_url())),
    ))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = path_code(short_code)?;
    let resolved = state.shortener().resolve(&code).await?;

    let location = HeaderValue::from_bytes(resolved.original_url.as_bytes())
        .map_err(|_| AppError::Location(resolved.original_url.clone()))?;

    Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response())
}

pub async fn stats_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>> {
    let code = path_code(short_code)?;
    let link = state.shortener().stats(&code).await?;

    Ok(Json(LinkResponse::from_link(link, state.base_url())))
}
