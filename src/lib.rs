// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod app;
pub mod config;
pub mod entry;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::app::AppState;
pub use crate::config::{Catalog, Settings};
pub use crate::entry::{ActorName, Entry, Severity};
pub use crate::ingest::ColumnPipeline;
pub use crate::notify::{DeliveryOutcome, Destination, Notifier, NotifierMux, Routing};
pub use crate::report::{build_report, ReportRenderer};
pub use crate::store::EntryStore;

use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default, JSON when `LOG_FORMAT=json`. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("column_digest=info,warn"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing already initialized");
    }
}

/// Full application: catalog + settings from the environment, state,
/// HTTP routes and `/metrics`. Background jobs are left to the caller.
pub fn app() -> anyhow::Result<(AppState, axum::Router)> {
    let catalog = Arc::new(Catalog::load_default()?);
    let settings = Settings::from_env()?;
    let state = AppState::from_settings(catalog, settings);
    let metrics = crate::metrics::Metrics::init()?;
    let router = api::router(state.clone()).merge(metrics.router());
    Ok((state, router))
}
