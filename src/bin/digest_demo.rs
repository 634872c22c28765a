//! Demo: pushes a few sample columns through the pipeline (log-only delivery)
//! and prints today's report.

use chrono::Utc;
use column_digest::notify::LogNotifier;
use column_digest::{init_tracing, AppState, Catalog, Notifier, NotifierMux, Settings};
use std::sync::Arc;

const SAMPLES: &[&str] = &[
    "🔴 Gobernadora / ESTATAL / El Heraldo de Chihuahua\nCuestionan compras de patrullas.\nhttps://www.elheraldodechihuahua.com.mx/local/nota-1",
    "🟢 Alcalde, JMAS / MUNICIPAL / Omnia\nAnuncian obras de agua potable en el sur.\nhttps://www.omnia.com.mx/noticia/2",
    "🟡 FGE / Entrelíneas\nRevisión de carpetas de investigación.",
    "🔴 Gobernadora / ESTATAL / El Heraldo de Chihuahua\nCuestionan compras de patrullas.\nhttps://www.elheraldodechihuahua.com.mx/local/nota-1",
    "not a column at all",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let catalog = Arc::new(Catalog::load_default()?);
    let settings = Settings::from_env()?;
    let log_only: Vec<Arc<dyn Notifier>> = vec![Arc::new(LogNotifier)];
    let mux = NotifierMux::new(log_only);
    let state = AppState::new(catalog, settings, mux);

    for raw in SAMPLES {
        match state.handle_post(raw, Utc::now()).await {
            Some(h) => println!(
                "stored {} [{}] alert={:?}",
                h.entry.outlet, h.entry.severity, h.alert
            ),
            None => println!("skipped"),
        }
    }

    println!("\n{}", state.today_report(Utc::now()));
    Ok(())
}
