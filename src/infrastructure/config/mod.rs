use crate::infrastructure::backends::{BackendKey, RetryPolicy};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Upstream Qwen3-TTS inference server
    pub upstream_url: String,
    pub upstream_timeout_secs: u64,
    pub backends: Vec<BackendKey>,
    pub backend_load_attempts: u32,
    pub backend_load_retry_delay_secs: u64,
    // Job queue
    pub job_store_capacity: usize,
    pub job_queue_max_pending: usize,
    pub max_text_chars: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            upstream_url: env::var("TTS_UPSTREAM_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8001".to_string()),
            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
            backends: match env::var("TTS_BACKENDS") {
                Ok(list) => parse_backends(&list)?,
                Err(_) => BackendKey::all(),
            },
            backend_load_attempts: env::var("BACKEND_LOAD_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            backend_load_retry_delay_secs: env::var("BACKEND_LOAD_RETRY_DELAY_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            job_store_capacity: env::var("JOB_STORE_CAPACITY")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            job_queue_max_pending: env::var("JOB_QUEUE_MAX_PENDING")
                .unwrap_or_else(|_| "32".to_string())
                .parse()?,
            max_text_chars: env::var("MAX_TEXT_CHARS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.backend_load_attempts.max(1),
            delay: Duration::from_secs(self.backend_load_retry_delay_secs),
        }
    }
}

/// Parse a comma separated checkpoint list such as `custom-voice-0.6B,voice-design-1.7B`.
/// Duplicates are dropped, order is kept.
pub fn parse_backends(list: &str) -> Result<Vec<BackendKey>, Box<dyn std::error::Error>> {
    let mut keys = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let key: BackendKey = item.parse()?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    if keys.is_empty() {
        return Err("TTS_BACKENDS must name at least one backend".into());
    }
    Ok(keys)
}
