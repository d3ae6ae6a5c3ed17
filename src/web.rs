use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::card::{Card, CardRecord};
use crate::error::EngineError;
use crate::fsrs::Rating;
use crate::interval::{Interval, LabelledInterval};
use crate::params::Parameters;
use crate::review::{self, Stats};
use crate::scheduler::{PreviewReport, ScheduleResult, Scheduler};

// -- App state --

// Parameters are read-only for the server's lifetime, so handlers share them without a lock.
type SharedState = Arc<Scheduler>;

// -- Request and response bodies --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleRequest {
    card: Card,
    rating: i64,
    now: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    card: Card,
    now: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionRequest {
    cards: Vec<CardRecord>,
    now: Option<DateTime<Utc>>,
}

struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self.0, "rejected request");
        let body = serde_json::json!({ "error": self.0.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// -- Route handlers --

async fn schedule(
    State(scheduler): State<SharedState>,
    Json(req): Json<ScheduleRequest>,
) -> Result<Json<ScheduleResult>, ApiError> {
    let rating = Rating::try_from(req.rating)?;
    let now = req.now.unwrap_or_else(Utc::now);
    let result = scheduler.schedule_card(&req.card, rating, now)?;
    Ok(Json(result))
}

async fn preview(
    State(scheduler): State<SharedState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewReport>, ApiError> {
    let now = req.now.unwrap_or_else(Utc::now);
    let p = scheduler.preview_schedule(&req.card, now)?;
    Ok(Json(p.into()))
}

async fn due(Json(req): Json<CollectionRequest>) -> Json<Vec<CardRecord>> {
    let now = req.now.unwrap_or_else(Utc::now);
    let due = review::get_due_cards(&req.cards, now)
        .into_iter()
        .cloned()
        .collect();
    Json(due)
}

async fn stats(Json(req): Json<CollectionRequest>) -> Json<Stats> {
    let now = req.now.unwrap_or_else(Utc::now);
    Json(review::calculate_stats(&req.cards, now))
}

async fn parameters(State(scheduler): State<SharedState>) -> Json<Parameters> {
    Json(scheduler.params().clone())
}

async fn format(Path(days): Path<f64>) -> Json<LabelledInterval> {
    Json(Interval::from_days(days).into())
}

pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/schedule", post(schedule))
        .route("/preview", post(preview))
        .route("/due", post(due))
        .route("/stats", post(stats))
        .route("/parameters", get(parameters))
        .route("/format/{days}", get(format))
        .with_state(scheduler)
}

pub async fn serve(scheduler: Scheduler, port: u16) -> std::io::Result<()> {
    let app = router(Arc::new(scheduler));
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await
}
