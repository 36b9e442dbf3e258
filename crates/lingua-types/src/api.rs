use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Language;
use crate::models::TranslationRecord;

// -- JWT Claims --

/// Session token claims. Holding a valid token is what makes a request
/// authenticated; `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub lang: Language,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub preferred_language: Language,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub preferred_language: Language,
    pub token: String,
}

// -- Languages --

#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub name: Language,
    pub code: &'static str,
}

// -- Translations --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateRequest {
    pub text: String,
    pub src_lang: Language,
    /// Falls back to the user's preferred language.
    pub dest_lang: Option<Language>,
}

#[derive(Debug, Deserialize)]
pub struct AudioTranslateQuery {
    pub src_lang: Language,
    pub dest_lang: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub id: i64,
    pub original_text: String,
    pub translated_text: String,
    pub src_lang: Language,
    pub dest_lang: Language,
    pub timestamp: DateTime<Utc>,
}

impl From<TranslationRecord> for TranslationResponse {
    fn from(record: TranslationRecord) -> Self {
        Self {
            id: record.id,
            original_text: record.original_text,
            translated_text: record.translated_text,
            src_lang: record.src_lang,
            dest_lang: record.dest_lang,
            timestamp: record.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AudioTranslationResponse {
    pub recognized_text: String,
    pub translation: TranslationResponse,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
