use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub translate_url: String,
    pub speech_url: String,
    pub speech_api_key: Option<String>,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("LINGUA_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LINGUA_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port: u16 = var("LINGUA_PORT", "3000")
            .parse()
            .context("LINGUA_PORT must be a port number")?;
        let timeout_secs: u64 = var("LINGUA_UPSTREAM_TIMEOUT_SECS", "30")
            .parse()
            .context("LINGUA_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            host: var("LINGUA_HOST", "0.0.0.0"),
            port,
            db_path: var("LINGUA_DB_PATH", "translations.db").into(),
            jwt_secret,
            translate_url: var("LINGUA_TRANSLATE_URL", "https://translate.googleapis.com"),
            speech_url: var("LINGUA_SPEECH_URL", "http://www.google.com"),
            speech_api_key: get("LINGUA_SPEECH_API_KEY").filter(|k| !k.is_empty()),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
