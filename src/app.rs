// src/app.rs
//! Shared application state: pipeline + notifiers + settings, and the two
//! application-level flows built on them (post handling, report delivery).

use chrono::{DateTime, Utc};
use metrics::counter;
use std::sync::Arc;

use crate::config::{Catalog, Settings};
use crate::entry::Entry;
use crate::ingest::ColumnPipeline;
use crate::notify::{alert_for, DeliveryOutcome, Destination, NotifierMux};
use crate::scheduler::{day_range, report_title};
use crate::store::EntryStore;
use crate::text::anon_hash;

/// Result of handling one incoming post.
#[derive(Debug, Clone)]
pub struct Handled {
    pub entry: Entry,
    /// `None` when the entry did not warrant an alert.
    pub alert: Option<DeliveryOutcome>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pipeline: ColumnPipeline,
    mux: NotifierMux,
    settings: Arc<Settings>,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, settings: Settings, mux: NotifierMux) -> Self {
        let store = Arc::new(EntryStore::new());
        Self {
            pipeline: ColumnPipeline::new(catalog, store),
            mux,
            settings: Arc::new(settings),
        }
    }

    /// Notifiers derived from `settings`.
    pub fn from_settings(catalog: Arc<Catalog>, settings: Settings) -> Self {
        let mux = NotifierMux::from_settings(&settings);
        Self::new(catalog, settings, mux)
    }

    pub fn pipeline(&self) -> &ColumnPipeline {
        &self.pipeline
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mux(&self) -> &NotifierMux {
        &self.mux
    }

    /// Ingest a post and, for a new high-severity column, deliver its alert.
    pub async fn handle_post(&self, raw_text: &str, received_at: DateTime<Utc>) -> Option<Handled> {
        let entry = self.pipeline.ingest(raw_text, received_at)?;

        let alert = match alert_for(&entry) {
            Some(payload) => {
                let outcome = self.mux.deliver(Destination::Alerts, &payload.render()).await;
                if outcome.is_delivered() {
                    counter!("alerts_emitted_total").increment(1);
                }
                tracing::info!(
                    target: "notify",
                    id = %anon_hash(&entry.id),
                    severity = %entry.severity,
                    delivered = outcome.is_delivered(),
                    "alert handled"
                );
                Some(outcome)
            }
            None => None,
        };

        Some(Handled { entry, alert })
    }

    /// Entries of the local day containing `now`.
    pub fn today_entries(&self, now: DateTime<Utc>) -> Vec<Entry> {
        let (start, end) = day_range(now, self.settings.tz);
        self.pipeline.query_range(start, end)
    }

    pub fn today_report(&self, now: DateTime<Utc>) -> String {
        let entries = self.today_entries(now);
        let title = report_title(now, self.settings.tz);
        self.pipeline.build_report(&entries, &title)
    }

    pub async fn send_today_report(&self, dest: Destination, now: DateTime<Utc>) -> DeliveryOutcome {
        let text = self.today_report(now);
        let outcome = self.mux.deliver(dest, &text).await;
        if outcome.is_delivered() {
            counter!("reports_sent_total").increment(1);
        }
        tracing::info!(target: "notify", %dest, delivered = outcome.is_delivered(), "report sent");
        outcome
    }
}
