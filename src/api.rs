//! HTTP surface
//!
//! `GET /api/info?query=...` dispatches to the balance pipeline, `GET
//! /health` answers liveness probes. Errors are returned as
//! `{code, message, kind}`; causes of internal failures are logged, never
//! echoed to the caller.

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::error::Error as _;
use std::sync::Arc;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::InfoError;
use crate::multicall::ReadTransport;
use crate::request::{GenesisRequest, PairRequest, QueryPairs, RequestError};
use crate::response::VersionResponse;
use crate::rpc::Dialer;
use crate::service::InfoService;

const INTERNAL_MESSAGE: &str = "failed to fetch on-chain data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    pub kind: String,
}

impl ErrorBody {
    fn new(status: StatusCode, message: impl Into<String>, kind: &str) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            kind: kind.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Malformed(#[from] RequestError),

    #[error(transparent)]
    Core(#[from] InfoError),
}

/// `outer: inner: innermost`
fn error_chain(err: &InfoError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Malformed(e) => {
                warn!("Malformed request: {}", e);
                let status = StatusCode::BAD_REQUEST;
                (status, ErrorBody::new(status, e.to_string(), "malformed_request"))
            }
            ApiError::Core(e) => {
                error!("Request failed [{}]: {}", e.kind(), error_chain(e));
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, ErrorBody::new(status, INTERNAL_MESSAGE, e.kind()))
            }
        };
        (status, Json(body)).into_response()
    }
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!("Handler panicked: {}", detail);

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    (status, Json(ErrorBody::new(status, "internal server error", "panic"))).into_response()
}

pub fn router<D>(service: Arc<InfoService<D>>) -> Router
where
    D: Dialer + Send + Sync + 'static,
    D::Conn: ReadTransport + Send + Sync + 'static,
{
    Router::new()
        .route("/api/info", get(info_handler::<D>))
        .route("/health", get(health_check))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(cors::Any),
        )
        .with_state(service)
}

pub async fn info_handler<D>(
    State(service): State<Arc<InfoService<D>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ApiError>
where
    D: Dialer + Send + Sync + 'static,
    D::Conn: ReadTransport + Send + Sync + 'static,
{
    let query = QueryPairs::from(pairs);

    match query.get("query") {
        Some("version") => Ok(Json(VersionResponse::default()).into_response()),
        Some("get-genesis-balances") => {
            let request = GenesisRequest::from_query(&query)?;
            let response = service.genesis_balances(&request).await?;
            Ok(Json(response).into_response())
        }
        Some("get-pair-balance") => {
            let request = PairRequest::from_query(&query)?;
            let response = service.pair_balance(&request).await?;
            Ok(Json(response).into_response())
        }
        _ => Err(RequestError::UnknownQuery.into()),
    }
}

async fn health_check() -> &'static str {
    "ok"
}
