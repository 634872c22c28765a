// src/notify/telegram.rs
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{Destination, Notifier, Routing};
use crate::config::Settings;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Bot API limit for one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    api_base: String,
    summary_chat: Option<i64>,
    alerts_chat: Option<i64>,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: String, summary_chat: Option<i64>, alerts_chat: Option<i64>) -> Self {
        Self {
            token,
            api_base: DEFAULT_API_BASE.to_string(),
            summary_chat,
            alerts_chat,
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Needs a token. Reports fall back to the source chat when no summary
    /// chat is configured.
    pub fn from_settings(s: &Settings) -> Option<Self> {
        let token = s.telegram_token.clone()?;
        Some(Self::new(
            token,
            s.summary_chat_id.or(s.source_chat_id),
            s.alerts_chat_id,
        ))
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// `None` means the destination is not wired for Telegram.
    pub fn chat_for(&self, dest: &Destination) -> Option<i64> {
        match dest {
            Destination::Summary => self.summary_chat,
            Destination::Alerts => self.alerts_chat,
            Destination::Chat(id) => Some(*id),
        }
    }

    async fn send_chunk(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let body = SendMessage {
            chat_id,
            text,
            disable_web_page_preview: true,
        };
        let rsp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("telegram sendMessage")?;

        let status = rsp.status();
        if !status.is_success() {
            let detail = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("telegram HTTP {status}: {detail}"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Split on line boundaries so every piece fits one message. A single line
/// longer than the limit is cut by characters.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut cur_len = 0usize;

    for line in text.split('\n') {
        let mut line_chars: Vec<char> = line.chars().collect();
        while line_chars.len() > max_chars {
            if !cur.is_empty() {
                out.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            let rest = line_chars.split_off(max_chars);
            out.push(line_chars.into_iter().collect());
            line_chars = rest;
        }

        let len = line_chars.len();
        let extra = if cur.is_empty() { len } else { len + 1 };
        if cur_len + extra > max_chars && !cur.is_empty() {
            out.push(std::mem::take(&mut cur));
            cur_len = 0;
        }
        if !cur.is_empty() {
            cur.push('\n');
            cur_len += 1;
        }
        cur.extend(line_chars);
        cur_len += len;
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, dest: &Destination, text: &str) -> Result<Routing> {
        let Some(chat_id) = self.chat_for(dest) else {
            tracing::debug!(target: "notify", %dest, "telegram: destination not configured");
            return Ok(Routing::NotRouted);
        };
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            self.send_chunk(chat_id, &chunk).await?;
        }
        Ok(Routing::Sent)
    }
}
