//! Router and request handlers.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::warn;

use chat_backend::{Backend, BackendError};
use orchestrator::{ChannelProvisioner, TriggerError, TriggerPipeline, TriggerRequest};
use reply_core::ReplyEngine;

use crate::identity::TokenRegistry;

/// Shared handler state. Cloning is cheap; the pipeline and provisioner
/// are shared.
pub struct AppState<B: Backend, E: ReplyEngine> {
    pub pipeline: Arc<TriggerPipeline<B, E>>,
    pub provisioner: Arc<ChannelProvisioner<B>>,
    pub tokens: Arc<TokenRegistry>,
}

impl<B: Backend, E: ReplyEngine> Clone for AppState<B, E> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            provisioner: Arc::clone(&self.provisioner),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReplyBody {
    reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DirectChannelRequest {
    #[serde(default)]
    members: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DirectChannelResponse {
    id: String,
    cid: String,
    created: bool,
}

/// Build the gateway router.
pub fn router<B, E>(state: AppState<B, E>) -> Router
where
    B: Backend + 'static,
    E: ReplyEngine + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/v1/assistant/message", post(assistant_message))
        .route("/v1/channels/direct", post(direct_channel))
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn assistant_message<B: Backend, E: ReplyEngine>(
    State(state): State<AppState<B, E>>,
    headers: HeaderMap,
    Json(request): Json<TriggerRequest>,
) -> Result<Json<ReplyBody>, ApiError> {
    let caller = state
        .tokens
        .resolve(&headers)
        .ok_or(ApiError::Unauthorized)?
        .clone();

    let reply = state.pipeline.handle(&caller, &request).await?;
    Ok(Json(ReplyBody { reply }))
}

async fn direct_channel<B: Backend, E: ReplyEngine>(
    State(state): State<AppState<B, E>>,
    headers: HeaderMap,
    Json(request): Json<DirectChannelRequest>,
) -> Result<Json<DirectChannelResponse>, ApiError> {
    let caller = state
        .tokens
        .resolve(&headers)
        .ok_or(ApiError::Unauthorized)?
        .clone();

    let [member_a, member_b] = request.members.as_slice() else {
        return Err(ApiError::BadRequest(
            "members must contain exactly two identities".to_string(),
        ));
    };

    let provisioned = state
        .provisioner
        .provision(member_a, member_b, &caller.id)
        .await?;

    Ok(Json(DirectChannelResponse {
        id: provisioned.channel.id.clone(),
        cid: provisioned.channel.cid(),
        created: provisioned.created,
    }))
}

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    BadRequest(String),
    Trigger(TriggerError),
    Backend(BackendError),
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        ApiError::Trigger(err)
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthorized => {
                warn!("Unauthorized request");
                (
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "Unauthorized".to_string(),
                )
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Trigger(err) => {
                warn!("Trigger rejected: {}", err);
                let status = StatusCode::from_u16(err.status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, err.reason(), err.to_string())
            }
            ApiError::Backend(err) => {
                warn!("Backend error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "backend_error",
                    err.to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });
        (status, Json(body)).into_response()
    }
}
