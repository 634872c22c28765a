// src/config/settings.rs
//! Runtime settings from the environment (`.env` is loaded by the binary).

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

pub const DEFAULT_LOCAL_TZ: &str = "America/Chihuahua";
pub const DEFAULT_REPORT_HOUR: u32 = 8;
pub const DEFAULT_REPORT_MINUTE: u32 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub tz: Tz,
    pub report_hour: u32,
    pub report_minute: u32,
    /// Clear the entry store at local midnight.
    pub reset_daily: bool,
    pub telegram_token: Option<String>,
    /// Only posts from this chat are ingested when set.
    pub source_chat_id: Option<i64>,
    pub summary_chat_id: Option<i64>,
    pub alerts_chat_id: Option<i64>,
    pub slack_webhook: Option<String>,
    pub discord_webhook: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Chihuahua,
            report_hour: DEFAULT_REPORT_HOUR,
            report_minute: DEFAULT_REPORT_MINUTE,
            reset_daily: false,
            telegram_token: None,
            source_chat_id: None,
            summary_chat_id: None,
            alerts_chat_id: None,
            slack_webhook: None,
            discord_webhook: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup (env in production, a map in tests).
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tz_name = non_empty("LOCAL_TZ").unwrap_or_else(|| DEFAULT_LOCAL_TZ.to_string());
        let tz: Tz = tz_name
            .parse()
            .map_err(|e| anyhow!("invalid LOCAL_TZ `{tz_name}`: {e}"))?;

        let report_hour = parse_num(non_empty("REPORT_HOUR"), "REPORT_HOUR", DEFAULT_REPORT_HOUR)?;
        let report_minute = parse_num(
            non_empty("REPORT_MINUTE"),
            "REPORT_MINUTE",
            DEFAULT_REPORT_MINUTE,
        )?;
        if report_hour > 23 || report_minute > 59 {
            return Err(anyhow!(
                "report time {report_hour:02}:{report_minute:02} is out of range"
            ));
        }

        let reset_daily = non_empty("RESET_DAILY")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            tz,
            report_hour,
            report_minute,
            reset_daily,
            telegram_token: non_empty("TELEGRAM_TOKEN"),
            source_chat_id: parse_chat(non_empty("SOURCE_CHAT_ID"), "SOURCE_CHAT_ID")?,
            summary_chat_id: parse_chat(non_empty("SUMMARY_CHAT_ID"), "SUMMARY_CHAT_ID")?,
            alerts_chat_id: parse_chat(non_empty("ALERTS_CHAT_ID"), "ALERTS_CHAT_ID")?,
            slack_webhook: non_empty("SLACK_WEBHOOK_URL"),
            discord_webhook: non_empty("DISCORD_WEBHOOK_URL"),
        })
    }
}

fn parse_num(raw: Option<String>, key: &str, default: u32) -> Result<u32> {
    match raw {
        Some(v) => v.parse().with_context(|| format!("{key} must be a number")),
        None => Ok(default),
    }
}

// Chat id 0 means "not configured".
fn parse_chat(raw: Option<String>, key: &str) -> Result<Option<i64>> {
    match raw {
        Some(v) => {
            let id: i64 = v.parse().with_context(|| format!("{key} must be an integer"))?;
            Ok((id != 0).then_some(id))
        }
        None => Ok(None),
    }
}
