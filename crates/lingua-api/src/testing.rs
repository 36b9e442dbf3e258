//! Fakes for the upstream gateways.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lingua_db::Database;
use lingua_gateway::{GatewayError, SpeechRecognizer, Translator};
use lingua_types::Language;

use crate::session::SessionFlow;

pub(crate) type Call = (String, &'static str, &'static str);

pub(crate) struct FakeTranslator {
    reply: Option<String>,
    echo: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeTranslator {
    pub(crate) fn returning(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()), echo: false, calls: Mutex::new(Vec::new()) }
    }

    /// Replies with `"<dest code>:<text>"`.
    pub(crate) fn echo() -> Self {
        Self { reply: None, echo: true, calls: Mutex::new(Vec::new()) }
    }

    pub(crate) fn fails() -> Self {
        Self { reply: None, echo: false, calls: Mutex::new(Vec::new()) }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str, src: Language, dest: Language) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push((text.to_string(), src.code(), dest.code()));
        if self.echo {
            return Ok(format!("{}:{}", dest.code(), text));
        }
        self.reply
            .clone()
            .ok_or_else(|| GatewayError::Malformed("upstream down".into()))
    }
}

pub(crate) struct FakeRecognizer {
    transcript: Option<String>,
    staged: Mutex<Option<PathBuf>>,
}

impl FakeRecognizer {
    pub(crate) fn hears(transcript: &str) -> Self {
        Self { transcript: Some(transcript.to_string()), staged: Mutex::new(None) }
    }

    pub(crate) fn fails() -> Self {
        Self { transcript: None, staged: Mutex::new(None) }
    }

    /// Path of the file the recognizer was handed, if it was called.
    pub(crate) fn staged_path(&self) -> Option<PathBuf> {
        self.staged.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn recognize(&self, audio: &Path, _language: Language) -> Result<String, GatewayError> {
        assert!(audio.exists(), "staged upload must exist while recognizing");
        *self.staged.lock().unwrap() = Some(audio.to_path_buf());
        self.transcript.clone().ok_or(GatewayError::NoTranscript)
    }
}

pub(crate) fn flow_with(
    translator: FakeTranslator,
    recognizer: FakeRecognizer,
) -> (SessionFlow, Arc<FakeTranslator>, Arc<FakeRecognizer>) {
    let translator = Arc::new(translator);
    let recognizer = Arc::new(recognizer);
    let flow = SessionFlow::new(
        Database::open_in_memory().unwrap(),
        translator.clone(),
        recognizer.clone(),
    );
    (flow, translator, recognizer)
}

/// A short, valid mono 16 kHz WAV.
pub(crate) fn wav_bytes() -> Vec<u8> {
    let samples: [i16; 4] = [0, 512, -512, 0];
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&16_000u32.to_le_bytes());
    out.extend_from_slice(&32_000u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
