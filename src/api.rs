// src/api.rs
//! HTTP surface: ingestion (plain JSON and Telegram webhook), entry queries,
//! and on-demand reports.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::app::AppState;
use crate::entry::Entry;
use crate::notify::{DeliveryOutcome, Destination};
use crate::scheduler::day_range;

pub const REPORT_COMMAND: &str = "/report_today";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ingest", post(ingest))
        .route("/entries", get(entries))
        .route("/report/today", get(report_today))
        .route("/report/today/send", post(report_today_send))
        .route("/telegram/webhook", post(telegram_webhook))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct IngestReq {
    pub text: String,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryOut {
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<DeliveryOutcome> for DeliveryOut {
    fn from(o: DeliveryOutcome) -> Self {
        match o {
            DeliveryOutcome::Delivered => Self {
                delivered: true,
                reason: None,
            },
            DeliveryOutcome::DeliveryFailed { reason } => Self {
                delivered: false,
                reason: Some(reason),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestResp {
    pub stored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Entry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<DeliveryOut>,
    /// `received_at` predated the newest stored entry and was raised to it.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub backdated: bool,
}

async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestReq>,
) -> (StatusCode, Json<IngestResp>) {
    let at = body.received_at.unwrap_or_else(Utc::now);
    match state.handle_post(&body.text, at).await {
        Some(h) => (
            StatusCode::CREATED,
            Json(IngestResp {
                stored: true,
                backdated: h.entry.timestamp != at,
                entry: Some(h.entry),
                alert: h.alert.map(DeliveryOut::from),
            }),
        ),
        None => (
            StatusCode::OK,
            Json(IngestResp {
                stored: false,
                entry: None,
                alert: None,
                backdated: false,
            }),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Missing bounds default to the current local day.
async fn entries(State(state): State<AppState>, Query(q): Query<RangeQuery>) -> Json<Vec<Entry>> {
    let (day_start, day_end) = day_range(Utc::now(), state.settings().tz);
    let start = q.start.unwrap_or(day_start);
    let end = q.end.unwrap_or(day_end);
    Json(state.pipeline().query_range(start, end))
}

async fn report_today(State(state): State<AppState>) -> String {
    state.today_report(Utc::now())
}

async fn report_today_send(State(state): State<AppState>) -> Json<DeliveryOut> {
    let outcome = state
        .send_today_report(Destination::Summary, Utc::now())
        .await;
    Json(outcome.into())
}

/* ----------------------------
Telegram webhook
---------------------------- */

#[derive(Debug, Deserialize)]
pub struct TgUpdate {
    #[serde(default)]
    pub message: Option<TgMessage>,
    #[serde(default)]
    pub channel_post: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TgMessage {
    pub chat: TgChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TgChat {
    pub id: i64,
}

fn is_report_command(text: &str) -> bool {
    let first = text.split_whitespace().next().unwrap_or_default();
    let cmd = first.split('@').next().unwrap_or_default();
    cmd == REPORT_COMMAND
}

/// Always answers 200 so Telegram does not redeliver.
async fn telegram_webhook(State(state): State<AppState>, Json(update): Json<TgUpdate>) -> StatusCode {
    let Some(msg) = update.message.or(update.channel_post) else {
        return StatusCode::OK;
    };
    let Some(text) = msg.text.or(msg.caption) else {
        return StatusCode::OK;
    };

    if is_report_command(&text) {
        let dest = match state.settings().summary_chat_id {
            Some(_) => Destination::Summary,
            None => Destination::Chat(msg.chat.id),
        };
        state.send_today_report(dest, Utc::now()).await;
        return StatusCode::OK;
    }

    if let Some(source) = state.settings().source_chat_id {
        if msg.chat.id != source {
            tracing::debug!(target: "ingest", chat = msg.chat.id, "post from foreign chat ignored");
            return StatusCode::OK;
        }
    }

    state.handle_post(&text, Utc::now()).await;
    StatusCode::OK
}
