use std::path::Path;

use async_trait::async_trait;
use lingua_types::Language;
use serde::Deserialize;
use tracing::debug;

use crate::{GatewayError, SpeechRecognizer, wav};

/// Client for the Chromium speech endpoint (`speech-api/v2/recognize`).
pub struct GoogleSpeechRecognizer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleSpeechRecognizer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleSpeechRecognizer {
    async fn recognize(&self, audio: &Path, language: Language) -> Result<String, GatewayError> {
        let bytes = tokio::fs::read(audio).await?;
        let pcm = wav::decode(&bytes)?;
        debug!(
            "Recognizing {} samples at {} Hz ({})",
            pcm.samples.len(),
            pcm.sample_rate,
            locale(language)
        );

        let url = format!("{}/speech-api/v2/recognize", self.base_url);
        let mut query = vec![
            ("client", "chromium"),
            ("lang", locale(language)),
            ("output", "json"),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        let response = self
            .client
            .post(url)
            .query(&query)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("audio/l16; rate={}", pcm.sample_rate),
            )
            .body(pcm.to_le_bytes())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status));
        }

        let body = response.text().await?;
        parse_recognition_response(&body)
    }
}

/// BCP-47 locale the recognizer expects for each language.
pub fn locale(language: Language) -> &'static str {
    match language {
        Language::English => "en-US",
        Language::Hindi => "hi-IN",
        Language::Telugu => "te-IN",
        Language::Tamil => "ta-IN",
        Language::Kannada => "kn-IN",
        Language::Malayalam => "ml-IN",
        Language::Marathi => "mr-IN",
        Language::Bengali => "bn-IN",
        Language::Gujarati => "gu-IN",
        Language::Punjabi => "pa-IN",
        Language::Urdu => "ur-IN",
        Language::Spanish => "es-ES",
        Language::French => "fr-FR",
        Language::German => "de-DE",
        Language::Chinese => "zh-CN",
    }
}

#[derive(Debug, Deserialize)]
struct RecognitionLine {
    #[serde(default)]
    result: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternative: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    transcript: String,
    confidence: Option<f64>,
}

/// The endpoint streams one JSON object per line and usually leads with an
/// empty `{"result":[]}`. The first non-empty result wins; within it the
/// alternative carrying a confidence score is preferred.
pub fn parse_recognition_response(body: &str) -> Result<String, GatewayError> {
    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed: RecognitionLine =
            serde_json::from_str(line).map_err(|e| GatewayError::Malformed(e.to_string()))?;

        let Some(result) = parsed.result.into_iter().next() else {
            continue;
        };

        let best = result
            .alternative
            .iter()
            .find(|alt| alt.confidence.is_some())
            .or_else(|| result.alternative.first());

        if let Some(alt) = best {
            let transcript = alt.transcript.trim();
            if !transcript.is_empty() {
                return Ok(transcript.to_string());
            }
        }
    }

    Err(GatewayError::NoTranscript)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    use axum::{
        Router,
        body::Bytes,
        extract::Query,
        http::{HeaderMap, header},
        routing::post,
    };

    #[test]
    fn skips_leading_empty_result() {
        let body = r#"{"result":[]}
{"result":[{"alternative":[{"transcript":"hello world","confidence":0.92},{"transcript":"yellow world"}],"final":true}],"result_index":0}
"#;
        assert_eq!(parse_recognition_response(body).unwrap(), "hello world");
    }

    #[test]
    fn prefers_alternative_with_confidence() {
        let body = r#"{"result":[{"alternative":[{"transcript":"first"},{"transcript":"second","confidence":0.5}]}]}"#;
        assert_eq!(parse_recognition_response(body).unwrap(), "second");
    }

    #[test]
    fn empty_responses_have_no_transcript() {
        assert!(matches!(parse_recognition_response(""), Err(GatewayError::NoTranscript)));
        assert!(matches!(
            parse_recognition_response("{\"result\":[]}\n"),
            Err(GatewayError::NoTranscript)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse_recognition_response("<html>"), Err(GatewayError::Malformed(_))));
    }

    #[tokio::test]
    async fn posts_pcm_with_sample_rate() {
        let app = Router::new().route(
            "/speech-api/v2/recognize",
            post(
                |Query(params): Query<HashMap<String, String>>, headers: HeaderMap, body: Bytes| async move {
                    assert_eq!(params["lang"], "hi-IN");
                    assert_eq!(params["key"], "test-key");
                    assert_eq!(headers[header::CONTENT_TYPE], "audio/l16; rate=16000");
                    assert_eq!(body.len(), 6);
                    "{\"result\":[]}\n{\"result\":[{\"alternative\":[{\"transcript\":\"namaste\"}]}]}\n"
                },
            ),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&wav::encode_pcm16(16_000, 1, &[1, 2, 3])).unwrap();

        let client = crate::build_client(std::time::Duration::from_secs(5)).unwrap();
        let recognizer =
            GoogleSpeechRecognizer::new(client, format!("http://{addr}"), Some("test-key".into()));

        let text = recognizer.recognize(file.path(), Language::Hindi).await.unwrap();
        assert_eq!(text, "namaste");
    }

    #[tokio::test]
    async fn undecodable_audio_never_reaches_upstream() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(b"definitely not audio").unwrap();

        let client = crate::build_client(std::time::Duration::from_secs(5)).unwrap();
        let recognizer = GoogleSpeechRecognizer::new(client, "http://127.0.0.1:9", None);

        let err = recognizer.recognize(file.path(), Language::English).await.unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedAudio(_)));
    }
}
