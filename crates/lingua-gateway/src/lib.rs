//! Call-throughs to the upstream translation and speech-recognition services.
//!
//! Each call is a single request/response. There is no retry; the only
//! protection against a stuck upstream is the client-wide timeout.

pub mod speech;
pub mod translate;
pub mod wav;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use lingua_types::Language;
use thiserror::Error;

pub use speech::GoogleSpeechRecognizer;
pub use translate::GoogleTranslator;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("unexpected upstream response: {0}")]
    Malformed(String),
    #[error("upstream produced no transcript")]
    NoTranscript,
    #[error("unsupported audio: {0}")]
    UnsupportedAudio(String),
    #[error("failed to read audio: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, src: Language, dest: Language) -> Result<String, GatewayError>;
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe the WAV file at `audio`. `language` is a hint for the
    /// spoken language.
    async fn recognize(&self, audio: &Path, language: Language) -> Result<String, GatewayError>;
}

/// HTTP client shared by both gateways.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("lingua/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
