//! HTTP boundary: routes, request coercion and status mapping.
//!
//! Handlers turn untyped query strings and JSON bodies into typed calls on
//! [`Leaderboard`], run them on the blocking pool, and shape the JSON replies.

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, Path, Query, Request, State, rejection::PathRejection},
    http::{Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use highscore_core::{
    DateRange, Distribution, ExportReport, HealthReport, Leaderboard, RankReport, ScoreError,
    ScoreRecord, StatsReport, Submission, ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    leaderboard: Arc<Leaderboard>,
}

/// Error reply. Every variant renders as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound { path: String },
    MethodNotAllowed { method: String },
    SaveFailed,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotFound { path } => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Resource not found", "path": path }),
            ),
            ApiError::MethodNotAllowed { method } => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed", "method": method }),
            ),
            ApiError::SaveFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Save failed" }),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<ScoreError> for ApiError {
    fn from(e: ScoreError) -> Self {
        match e {
            ScoreError::Validation(v) => v.into(),
            ScoreError::Storage(_) => ApiError::SaveFailed,
        }
    }
}

/// `limit` / `days` query parameters.
///
/// Values that are not non-negative integers are ignored, and `days=0` means
/// no date filter.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
    days: Option<String>,
}

impl ListParams {
    /// An all-digit limit too large for `usize` saturates, so it is capped
    /// rather than ignored.
    pub fn limit(&self) -> Option<usize> {
        let raw = self.limit.as_deref()?;
        lenient(Some(raw)).or_else(|| {
            let digits = raw.trim();
            (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(usize::MAX)
        })
    }

    pub fn days(&self) -> Option<u32> {
        lenient::<u32>(self.days.as_deref()).filter(|d| *d > 0)
    }
}

fn lenient<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Coerce a submission body into `(score, timestamp)`.
pub fn parse_submission(body: &[u8]) -> Result<(i64, Option<String>), ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::MissingScore);
    }
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::InvalidJson)?;
    let fields = value.as_object().ok_or(ValidationError::MissingScore)?;

    let score = match fields.get("score") {
        None => return Err(ValidationError::MissingScore),
        // Integers past i64 are still integers; saturate so range validation rejects them.
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| huge_integer(body))
            .ok_or(ValidationError::NotAnInteger)?,
        Some(_) => return Err(ValidationError::NotAnInteger),
    };

    let timestamp = match fields.get("timestamp") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ValidationError::TimestampNotString),
    };

    Ok((score, timestamp))
}

#[derive(Deserialize)]
struct RawScore<'a> {
    #[serde(borrow)]
    score: &'a RawValue,
}

/// Saturated value of a `score` literal too wide for `u64`.
///
/// serde_json reads such literals as floats, so the raw token decides whether
/// it was written as an integer.
fn huge_integer(body: &[u8]) -> Option<i64> {
    let raw: RawScore<'_> = serde_json::from_slice(body).ok()?;
    let token = raw.score.get().trim();
    let (digits, negative) = match token.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (token, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub score: ScoreRecord,
    pub rank: usize,
    pub total_scores: usize,
}

impl From<Submission> for SubmitResponse {
    fn from(s: Submission) -> Self {
        Self {
            message: "Score saved successfully".to_string(),
            score: s.record,
            rank: s.rank,
            total_scores: s.total_scores,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_games: usize,
    pub highest_score: i64,
    pub lowest_score: i64,
    pub average_score: f64,
    pub median_score: f64,
    pub total_records: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl From<StatsReport> for StatsResponse {
    fn from(r: StatsReport) -> Self {
        Self {
            total_games: r.stats.count,
            highest_score: r.stats.max,
            lowest_score: r.stats.min,
            average_score: r.stats.mean,
            median_score: r.stats.median,
            total_records: r.total_records,
            date_range: r.stats.date_range,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RangeCount {
    pub range: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistributionResponse {
    pub ranges: Vec<RangeCount>,
    pub total: usize,
    pub bucket_size: i64,
}

impl From<Distribution> for DistributionResponse {
    fn from(d: Distribution) -> Self {
        Self {
            ranges: d
                .buckets
                .into_iter()
                .map(|b| RangeCount {
                    range: b.range,
                    count: b.count,
                })
                .collect(),
            total: d.total,
            bucket_size: d.bucket_size,
        }
    }
}

/// Build the API router.
pub fn router(leaderboard: Arc<Leaderboard>) -> Router {
    let state = AppState { leaderboard };

    Router::new()
        .route("/api/scores", get(get_scores).post(add_score))
        .route("/api/stats", get(get_stats))
        .route("/api/health", get(health_check))
        .route("/api/scores/rank/{score}", get(get_rank))
        .route("/api/scores/recent", get(get_recent_scores))
        .route("/api/scores/distribution", get(get_distribution))
        .route("/api/scores/export", get(export_scores))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C / SIGTERM.
pub async fn serve(addr: (&str, u16), leaderboard: Arc<Leaderboard>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}:{}", addr.0, addr.1))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        router(leaderboard).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("http server")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("stopped by user"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}

/// Log every request and its outcome. Health checks stay quiet.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let quiet = path == "/api/health";
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !quiet {
        tracing::info!("request: {method} {path} from {peer}");
    }
    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!("response: {method} {path} - {status}");
    } else if !quiet {
        tracing::info!("response: {method} {path} - {status}");
    }
    response
}

/// Run a leaderboard call on the blocking pool.
async fn run<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Leaderboard) -> T + Send + 'static,
    T: Send + 'static,
{
    let leaderboard = state.leaderboard.clone();
    tokio::task::spawn_blocking(move || f(&leaderboard))
        .await
        .map_err(|e| {
            tracing::error!("leaderboard task failed: {e}");
            ApiError::Internal(format!("Server error: {e}"))
        })
}

async fn get_scores(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScoreRecord>>, ApiError> {
    let (limit, days) = (params.limit(), params.days());
    let scores = run(&state, move |lb| lb.top(limit, days)).await?;
    Ok(Json(scores))
}

async fn add_score(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let (score, timestamp) = parse_submission(&body).inspect_err(|e| {
        tracing::warn!("rejected score submission: {e}");
    })?;
    let submission = run(&state, move |lb| lb.submit(score, timestamp)).await??;
    Ok((StatusCode::CREATED, Json(submission.into())))
}

async fn get_stats(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<StatsResponse>, ApiError> {
    let days = params.days();
    let report = run(&state, move |lb| lb.stats(days)).await?;
    Ok(Json(report.into()))
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthReport>, ApiError> {
    Ok(Json(run(&state, |lb| lb.health()).await?))
}

async fn get_rank(
    State(state): State<AppState>,
    score: Result<Path<i64>, PathRejection>,
) -> Result<Json<RankReport>, ApiError> {
    let Path(score) = score.map_err(|_| ApiError::from(ValidationError::NotAnInteger))?;
    let report = run(&state, move |lb| lb.rank_of(score)).await??;
    Ok(Json(report))
}

async fn get_recent_scores(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScoreRecord>>, ApiError> {
    let limit = params.limit();
    Ok(Json(run(&state, move |lb| lb.recent(limit)).await?))
}

async fn get_distribution(
    State(state): State<AppState>,
) -> Result<Json<DistributionResponse>, ApiError> {
    let d = run(&state, |lb| lb.distribution()).await?;
    Ok(Json(d.into()))
}

async fn export_scores(State(state): State<AppState>) -> Result<Json<ExportReport>, ApiError> {
    Ok(Json(run(&state, |lb| lb.export()).await?))
}

async fn not_found(uri: Uri) -> ApiError {
    tracing::warn!("404: {}", uri.path());
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    tracing::warn!("405: {method} {}", uri.path());
    ApiError::MethodNotAllowed {
        method: method.to_string(),
    }
}
