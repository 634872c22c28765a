//! Column digest service: binary entrypoint.
//! Boots the Axum HTTP server plus the daily report (and optional reset) jobs.

use shuttle_axum::ShuttleAxum;

use column_digest::{app, init_tracing, scheduler};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    // Missing/invalid catalog is fatal.
    let (state, router) = app()?;

    let jobs = scheduler::spawn_all(&state);
    tracing::info!(
        target: "scheduler",
        jobs = jobs.len(),
        notifiers = ?state.mux().names(),
        "column digest started"
    );

    Ok(router.into())
}
