use anyhow::{Context, Result};
use reqwest::Client;

use super::{Destination, Notifier, Routing};

/// Incoming-webhook notifier. One webhook serves the summary and alert
/// destinations; direct chat replies are not routed.
pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
}

impl SlackNotifier {
    pub fn new(url: String) -> Self {
        Self {
            webhook_url: url,
            client: Client::new(),
        }
    }
}

fn slack_text(dest: &Destination, text: &str) -> String {
    match dest {
        Destination::Alerts => format!("*Column alert*\n{text}"),
        Destination::Summary | Destination::Chat(_) => text.to_string(),
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, dest: &Destination, text: &str) -> Result<Routing> {
        if matches!(dest, Destination::Chat(_)) {
            return Ok(Routing::NotRouted);
        }
        let body = serde_json::json!({ "text": slack_text(dest, text) });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("slack post")?
            .error_for_status()
            .context("slack non-2xx")?;
        Ok(Routing::Sent)
    }
}
