//! Newsletter endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quill_common::AppResult;
use quill_core::SubscribeOutcome;
use serde::{Deserialize, Serialize};

use crate::{
    middleware::AppState,
    response::{Ack, ApiResponse},
};

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SubscribeAck {
    pub outcome: SubscribeOutcome,
}

async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> AppResult<ApiResponse<Ack<SubscribeAck>>> {
    let outcome = state.newsletter_service.subscribe(&req.email).await?;
    Ok(ApiResponse::ok(Ack::new(SubscribeAck { outcome })))
}

async fn unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> AppResult<ApiResponse<Ack<()>>> {
    state.newsletter_service.unsubscribe(&req.email).await?;
    Ok(ApiResponse::ok(Ack::new(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
}
