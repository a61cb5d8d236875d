//! Environment-driven settings.
//!
//! Every value has a default, so an empty environment yields a runnable local
//! setup. `.env` loading is left to the binary.
//!
//! # Retry backoff
//!
//! `RETRY_BACKOFF_SECS` alone gives the linear schedule `base * (n + 1)`.
//! Setting `RETRY_BACKOFF_MULTIPLIER` switches to `base * multiplier^n`, and
//! `RETRY_BACKOFF_MAX_SECS` caps either schedule.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::app::{AnalysisPool, BackoffPolicy, EngineConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub kafka: KafkaSettings,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    /// Exponential growth factor; `None` keeps the linear schedule.
    pub retry_backoff_multiplier: Option<f64>,
    pub retry_backoff_max: Option<Duration>,
    pub poll_batch_size: usize,
    pub poll_timeout: Duration,
    pub worker_processes: usize,
    pub upload_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |var: &str, default: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let kafka = KafkaSettings {
            brokers: text("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            topic: text("KAFKA_TOPIC", "file-uploads"),
            group_id: text("KAFKA_GROUP_ID", "file-classifier"),
        };

        let max_retries: u32 = parse(&lookup, "MAX_RETRIES", 3)?;
        let backoff_secs: u64 = parse(&lookup, "RETRY_BACKOFF_SECS", 5)?;
        let multiplier: Option<f64> = parse_optional(&lookup, "RETRY_BACKOFF_MULTIPLIER")?;
        let max_backoff_secs: Option<u64> = parse_optional(&lookup, "RETRY_BACKOFF_MAX_SECS")?;
        let poll_batch_size: usize = parse(&lookup, "POLL_BATCH_SIZE", 100)?;
        let poll_timeout_ms: u64 = parse(&lookup, "POLL_TIMEOUT_MS", 1000)?;
        let worker_processes: usize =
            parse(&lookup, "WORKER_PROCESSES", AnalysisPool::default_workers())?;
        let log_format: LogFormat = parse(&lookup, "LOG_FORMAT", LogFormat::Text)?;

        if poll_batch_size == 0 {
            return Err(invalid("POLL_BATCH_SIZE", "0", "must be at least 1"));
        }
        if worker_processes == 0 {
            return Err(invalid("WORKER_PROCESSES", "0", "must be at least 1"));
        }
        if let Some(m) = multiplier.filter(|m| !m.is_finite() || *m < 1.0) {
            return Err(invalid(
                "RETRY_BACKOFF_MULTIPLIER",
                &m.to_string(),
                "must be a finite number of at least 1.0",
            ));
        }
        if max_backoff_secs == Some(0) {
            return Err(invalid("RETRY_BACKOFF_MAX_SECS", "0", "must be at least 1"));
        }
        if kafka.topic.contains(char::is_whitespace) {
            return Err(invalid("KAFKA_TOPIC", &kafka.topic, "topic names cannot contain whitespace"));
        }

        Ok(Self {
            kafka,
            max_retries,
            retry_backoff: Duration::from_secs(backoff_secs),
            retry_backoff_multiplier: multiplier,
            retry_backoff_max: max_backoff_secs.map(Duration::from_secs),
            poll_batch_size,
            poll_timeout: Duration::from_millis(poll_timeout_ms),
            worker_processes,
            upload_dir: PathBuf::from(text("UPLOAD_DIR", "../upload/uploads")),
            log_format,
        })
    }

    pub fn backoff(&self) -> BackoffPolicy {
        let policy = match self.retry_backoff_multiplier {
            Some(multiplier) => BackoffPolicy::exponential(self.retry_backoff, multiplier),
            None => BackoffPolicy::linear(self.retry_backoff),
        };
        match self.retry_backoff_max {
            Some(cap) => policy.with_max_delay(cap),
            None => policy,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_retries: self.max_retries,
            backoff: self.backoff(),
            batch_size: self.poll_batch_size,
            poll_timeout: self.poll_timeout,
        }
    }
}

fn parse<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
        _ => Ok(default),
    }
}

/// Like [`parse`], for settings with no default.
fn parse_optional<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(var, &raw, &e.to_string())),
        _ => Ok(None),
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
