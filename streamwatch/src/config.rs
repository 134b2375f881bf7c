//! Process configuration loaded from the environment.

use std::time::Duration;

use url::Url;

use crate::domain::ChatTarget;
use crate::logging::LogFormat;
use crate::sync::service::DEFAULT_SYNC_DEADLINE;
use crate::youtube::data::DEFAULT_API_BASE_URL;
use crate::youtube::feed::DEFAULT_FEED_BASE_URL;
use crate::{Error, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:streamwatch.db?mode=rwc";
pub const DEFAULT_UPCOMING_STALE_AFTER_HOURS: i64 = 72;
/// Ten years.
pub const MAX_UPCOMING_STALE_AFTER_HOURS: u64 = 24 * 365 * 10;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub youtube_api_key: String,
    /// Channels whose feeds are reconciled, in order.
    pub target_channel_ids: Vec<String>,
    pub chat_author_allowlist: Vec<String>,
    pub sentiment_api_key: String,
    pub static_target: Option<ChatTarget>,
    pub chat_max_results: Option<u32>,
    pub sync_deadline: Duration,
    pub upcoming_stale_after: chrono::Duration,
    pub pause_chat_while_live: bool,
    pub feed_base_url: String,
    pub api_base_url: String,
    pub sentiment_base_url: String,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to resolve variables. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let youtube_api_key =
            get("YOUTUBE_API_KEY").ok_or_else(|| Error::config("YOUTUBE_API_KEY is required"))?;

        let target_channel_ids = get("TARGET_CHANNEL_IDS")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        if target_channel_ids.is_empty() {
            return Err(Error::config("TARGET_CHANNEL_IDS is required"));
        }

        let chat_author_allowlist = get("CHAT_AUTHOR_ALLOWLIST")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| target_channel_ids.clone());

        let static_target = match get("STATIC_TARGET") {
            Some(raw) => Some(parse_static_target(&raw)?),
            None => None,
        };

        let chat_max_results = match get("CHAT_MAX_RESULTS") {
            Some(raw) => Some(parse_number::<u32>("CHAT_MAX_RESULTS", &raw)?),
            None => None,
        };

        let sync_deadline = match get("SYNC_DEADLINE_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("SYNC_DEADLINE_SECS", &raw)?),
            None => DEFAULT_SYNC_DEADLINE,
        };

        let upcoming_stale_after = match get("UPCOMING_STALE_AFTER_HOURS") {
            Some(raw) => parse_stale_after(&raw)?,
            None => chrono::Duration::hours(DEFAULT_UPCOMING_STALE_AFTER_HOURS),
        };

        let pause_chat_while_live = match get("PAUSE_CHAT_WHILE_LIVE") {
            Some(raw) => parse_bool("PAUSE_CHAT_WHILE_LIVE", &raw)?,
            None => false,
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("HTTP_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_HTTP_TIMEOUT,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|_| {
                Error::config(format!("LOG_FORMAT must be json or pretty, got {raw:?}"))
            })?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            sentiment_api_key: get("SENTIMENT_API_KEY").unwrap_or_else(|| youtube_api_key.clone()),
            youtube_api_key,
            target_channel_ids,
            chat_author_allowlist,
            static_target,
            chat_max_results,
            sync_deadline,
            upcoming_stale_after,
            pause_chat_while_live,
            feed_base_url: base_url(
                "YOUTUBE_FEED_BASE_URL",
                get("YOUTUBE_FEED_BASE_URL"),
                DEFAULT_FEED_BASE_URL,
            )?,
            api_base_url: base_url(
                "YOUTUBE_API_BASE_URL",
                get("YOUTUBE_API_BASE_URL"),
                DEFAULT_API_BASE_URL,
            )?,
            sentiment_base_url: base_url(
                "SENTIMENT_API_BASE_URL",
                get("SENTIMENT_API_BASE_URL"),
                sentiment::google::DEFAULT_BASE_URL,
            )?,
            http_timeout,
            log_format,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_static_target(raw: &str) -> Result<ChatTarget> {
    let target: ChatTarget = serde_json::from_str(raw)
        .map_err(|e| Error::config(format!("STATIC_TARGET is not valid JSON: {e}")))?;
    if target.source_id.is_empty() || target.chat_handle.is_empty() {
        return Err(Error::config("STATIC_TARGET needs a sourceId and a chatId"));
    }
    Ok(target)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| Error::config(format!("{key} must be a number, got {raw:?}")))
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    match parse_number::<u64>(key, raw)? {
        0 => Err(Error::config(format!("{key} must be greater than zero"))),
        value => Ok(value),
    }
}

fn parse_stale_after(raw: &str) -> Result<chrono::Duration> {
    const KEY: &str = "UPCOMING_STALE_AFTER_HOURS";
    let hours = parse_positive(KEY, raw)?;
    if hours > MAX_UPCOMING_STALE_AFTER_HOURS {
        return Err(Error::config(format!(
            "{KEY} must be at most {MAX_UPCOMING_STALE_AFTER_HOURS}, got {hours}"
        )));
    }
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .ok_or_else(|| Error::config(format!("{KEY} is out of range, got {hours}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{key} must be a boolean, got {raw:?}"))),
    }
}

fn base_url(key: &str, value: Option<String>, default: &str) -> Result<String> {
    let Some(value) = value else {
        return Ok(default.to_string());
    };
    let url = Url::parse(&value)
        .map_err(|e| Error::config(format!("{key} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!("{key} must be an http(s) URL")));
    }
    Ok(value.trim_end_matches('/').to_string())
}
