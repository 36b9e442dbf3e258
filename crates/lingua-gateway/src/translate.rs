use async_trait::async_trait;
use lingua_types::Language;
use serde_json::Value;
use tracing::debug;

use crate::{GatewayError, Translator};

/// Client for the public `translate_a/single` endpoint (`client=gtx`).
pub struct GoogleTranslator {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, src: Language, dest: Language) -> Result<String, GatewayError> {
        let url = format!("{}/translate_a/single", self.base_url);
        debug!("Translating {} chars {} -> {}", text.chars().count(), src.code(), dest.code());

        let response = self
            .client
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", src.code()),
                ("tl", dest.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }

        let body: Value = response.json().await?;
        parse_gtx_response(&body)
    }
}

/// The response is a nested array: `[[["<translated>", "<original>", ...], ...], ...]`.
/// Long inputs are split into several segments which are concatenated.
pub fn parse_gtx_response(body: &Value) -> Result<String, GatewayError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::Malformed("missing segment list".into()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(GatewayError::Malformed("no translated segments".into()));
    }

    Ok(translated)
}
