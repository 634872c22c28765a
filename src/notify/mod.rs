// src/notify/mod.rs
//! Outbound delivery: alert payloads, the `Notifier` seam and a fan-out mux.
//!
//! Delivery never aborts ingestion. The mux reports a `DeliveryOutcome` and
//! hands every failure to a caller-supplied handler (default: warn + counter).

pub mod alert;
pub mod discord;
pub mod slack;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

use crate::config::Settings;
use crate::text::anon_hash;

pub use alert::{alert_for, AlertPayload};
pub use discord::DiscordNotifier;
pub use slack::SlackNotifier;
pub use telegram::TelegramNotifier;

/// Logical target of a message; each notifier maps it to its own address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Summary,
    Alerts,
    Chat(i64),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Summary => f.write_str("summary"),
            Destination::Alerts => f.write_str("alerts"),
            Destination::Chat(id) => write!(f, "chat:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    DeliveryFailed { reason: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// What a notifier did with one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    Sent,
    /// The notifier has no address for this destination.
    NotRouted,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn send(&self, dest: &Destination, text: &str) -> Result<Routing>;
}

/// Writes a one-line record instead of sending anything.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, dest: &Destination, text: &str) -> Result<Routing> {
        tracing::info!(
            target: "notify",
            %dest,
            chars = text.chars().count(),
            text_hash = %anon_hash(text),
            "message (log only)"
        );
        Ok(Routing::Sent)
    }
}

/// `(notifier name, destination, reason)`
pub type FailureHandler = Arc<dyn Fn(&str, &Destination, &str) + Send + Sync>;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("notify_failures_total", "Failed deliveries per notifier.");
        describe_counter!("alerts_emitted_total", "Alerts delivered for high-severity columns.");
        describe_counter!("reports_sent_total", "Reports delivered (scheduled or on demand).");
    });
}

fn default_failure_handler() -> FailureHandler {
    Arc::new(|notifier: &str, dest: &Destination, reason: &str| {
        counter!("notify_failures_total", "notifier" => notifier.to_string()).increment(1);
        tracing::warn!(target: "notify", notifier, %dest, %reason, "delivery failed");
    })
}

/// Fans a message out to every configured notifier.
#[derive(Clone)]
pub struct NotifierMux {
    notifiers: Vec<Arc<dyn Notifier>>,
    on_failure: FailureHandler,
}

impl fmt::Debug for NotifierMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierMux")
            .field("notifiers", &self.names())
            .finish_non_exhaustive()
    }
}

impl NotifierMux {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        ensure_metrics_described();
        Self {
            notifiers,
            on_failure: default_failure_handler(),
        }
    }

    /// Telegram, Slack and Discord when their settings are present; the log
    /// notifier when none is.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
        if let Some(tg) = TelegramNotifier::from_settings(settings) {
            notifiers.push(Arc::new(tg));
        }
        if let Some(url) = &settings.slack_webhook {
            notifiers.push(Arc::new(SlackNotifier::new(url.clone())));
        }
        if let Some(url) = &settings.discord_webhook {
            notifiers.push(Arc::new(DiscordNotifier::new(url.clone())));
        }
        if notifiers.is_empty() {
            notifiers.push(Arc::new(LogNotifier));
        }
        let mux = Self::new(notifiers);
        tracing::info!(target: "notify", notifiers = ?mux.names(), "notifiers configured");
        mux
    }

    pub fn with_failure_handler(mut self, handler: FailureHandler) -> Self {
        self.on_failure = handler;
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Send to all notifiers. Any failure makes the outcome `DeliveryFailed`
    /// with the reasons joined; the others are still attempted. A message no
    /// notifier routes is `DeliveryFailed` too.
    pub async fn deliver(&self, dest: Destination, text: &str) -> DeliveryOutcome {
        let mut reasons: Vec<String> = Vec::new();
        let mut sent = 0usize;
        for n in &self.notifiers {
            match n.send(&dest, text).await {
                Ok(Routing::Sent) => sent += 1,
                Ok(Routing::NotRouted) => {}
                Err(e) => {
                    let reason = format!("{}: {e:#}", n.name());
                    (self.on_failure)(n.name(), &dest, &format!("{e:#}"));
                    reasons.push(reason);
                }
            }
        }
        if reasons.is_empty() && sent == 0 {
            let reason = format!("no notifier routes {dest}");
            (self.on_failure)("mux", &dest, &reason);
            reasons.push(reason);
        }
        if reasons.is_empty() {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::DeliveryFailed {
                reason: reasons.join("; "),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Records every send; fails when `fail` is set, routes nothing when
    /// `unrouted` is set.
    #[derive(Default)]
    pub(crate) struct Recording {
        pub sent: Mutex<Vec<(Destination, String)>>,
        pub fail: bool,
        pub unrouted: bool,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, dest: &Destination, text: &str) -> Result<Routing> {
            if self.fail {
                return Err(anyhow!("boom"));
            }
            if self.unrouted {
                return Ok(Routing::NotRouted);
            }
            self.sent
                .lock()
                .expect("recording mutex poisoned")
                .push((*dest, text.to_string()));
            Ok(Routing::Sent)
        }
    }

    #[tokio::test]
    async fn all_ok_is_delivered() {
        let rec = Arc::new(Recording::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![rec.clone(), Arc::new(LogNotifier)];
        let mux = NotifierMux::new(notifiers);
        let out = mux.deliver(Destination::Alerts, "hello").await;
        assert_eq!(out, DeliveryOutcome::Delivered);
        let sent = rec.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[(Destination::Alerts, "hello".to_string())]);
    }

    #[tokio::test]
    async fn failure_reaches_handler_and_others_still_run() {
        let failing = Arc::new(Recording {
            fail: true,
            ..Default::default()
        });
        let ok = Arc::new(Recording::default());
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let seen2 = seen.clone();

        let notifiers: Vec<Arc<dyn Notifier>> = vec![failing, ok.clone()];
        let mux = NotifierMux::new(notifiers).with_failure_handler(Arc::new(
            move |name: &str, dest: &Destination, reason: &str| {
                seen2.lock().unwrap().push(format!("{name}@{dest}: {reason}"));
            },
        ));

        let out = mux.deliver(Destination::Summary, "report").await;
        assert_eq!(
            out,
            DeliveryOutcome::DeliveryFailed {
                reason: "recording: boom".into()
            }
        );
        assert_eq!(seen.lock().unwrap().as_slice(), &["recording@summary: boom".to_string()]);
        assert_eq!(ok.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn nothing_routed_is_not_delivered() {
        let skipping = Arc::new(Recording {
            unrouted: true,
            ..Default::default()
        });
        let seen: Arc<Mutex<Vec<String>>> = Arc::default();
        let seen2 = seen.clone();
        let notifiers: Vec<Arc<dyn Notifier>> = vec![skipping];
        let mux = NotifierMux::new(notifiers).with_failure_handler(Arc::new(
            move |name: &str, _: &Destination, _: &str| seen2.lock().unwrap().push(name.to_string()),
        ));

        let out = mux.deliver(Destination::Alerts, "alert").await;
        assert_eq!(
            out,
            DeliveryOutcome::DeliveryFailed {
                reason: "no notifier routes alerts".into()
            }
        );
        assert_eq!(seen.lock().unwrap().as_slice(), &["mux".to_string()]);
    }

    #[tokio::test]
    async fn one_routed_notifier_is_enough() {
        let skipping = Arc::new(Recording {
            unrouted: true,
            ..Default::default()
        });
        let ok = Arc::new(Recording::default());
        let notifiers: Vec<Arc<dyn Notifier>> = vec![skipping, ok.clone()];
        let out = NotifierMux::new(notifiers).deliver(Destination::Alerts, "a").await;
        assert_eq!(out, DeliveryOutcome::Delivered);
        assert_eq!(ok.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn from_settings_falls_back_to_log() {
        let mux = NotifierMux::from_settings(&Settings::default());
        assert_eq!(mux.names(), vec!["log"]);
    }

    #[test]
    fn from_settings_picks_configured_channels() {
        let settings = Settings {
            telegram_token: Some("123:abc".into()),
            summary_chat_id: Some(-100),
            slack_webhook: Some("https://hooks.slack.invalid/x".into()),
            ..Settings::default()
        };
        let mux = NotifierMux::from_settings(&settings);
        assert_eq!(mux.names(), vec!["telegram", "slack"]);
    }
}
