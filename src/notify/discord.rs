use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Destination, Notifier, Routing};
use crate::text::truncate_chars;

/// Discord caps embed descriptions at 4096 characters.
const MAX_DESCRIPTION_CHARS: usize = 4000;

#[derive(Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordNotifier {
    pub fn new(webhook: String) -> Self {
        Self {
            webhook,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    async fn post_with_retries(&self, payload: &DiscordWebhookPayload) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.webhook)
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("Discord webhook HTTP error: {e}"),
                },
                Err(e) => anyhow!("Discord webhook request failed: {e}"),
            };

            if attempt >= self.max_retries {
                return Err(err);
            }
            tracing::debug!(target: "notify", attempt, "discord retry: {err:#}");
            tokio::time::sleep(backoff(attempt)).await;
        }
    }
}

/// 500ms, 1s, 2s, ...
fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt.saturating_sub(1)).min(6))
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, dest: &Destination, text: &str) -> Result<Routing> {
        if matches!(dest, Destination::Chat(_)) {
            return Ok(Routing::NotRouted);
        }
        let payload = DiscordWebhookPayload::for_message(dest, text);
        self.post_with_retries(&payload).await?;
        Ok(Routing::Sent)
    }
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct DiscordWebhookPayload {
    content: Option<String>,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordWebhookPayload {
    fn for_message(dest: &Destination, text: &str) -> Self {
        let title = match dest {
            Destination::Alerts => "Column alert",
            Destination::Summary | Destination::Chat(_) => "Column digest",
        };
        Self {
            content: None,
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: truncate_chars(text, MAX_DESCRIPTION_CHARS),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn payload_titles_follow_destination() {
        let p = DiscordWebhookPayload::for_message(&Destination::Alerts, "boom");
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["embeds"][0]["title"], "Column alert");
        assert_eq!(v["embeds"][0]["description"], "boom");
        assert!(v["content"].is_null());
    }

    #[tokio::test]
    async fn chat_replies_are_not_posted() {
        let discord = DiscordNotifier::new("http://127.0.0.1:9/unused".into()).with_retries(1);
        let r = discord.send(&Destination::Chat(42), "report").await.unwrap();
        assert_eq!(r, Routing::NotRouted);
    }

    #[test]
    fn long_reports_are_truncated() {
        let p = DiscordWebhookPayload::for_message(&Destination::Summary, &"x".repeat(5000));
        assert_eq!(p.embeds[0].description.chars().count(), MAX_DESCRIPTION_CHARS + 1);
    }
}
