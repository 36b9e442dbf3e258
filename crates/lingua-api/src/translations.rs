use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use lingua_types::Language;
use lingua_types::api::{
    AudioTranslateQuery, AudioTranslationResponse, Claims, LanguageEntry, TranslateRequest,
    TranslationResponse,
};

use crate::auth::AppState;
use crate::error::FlowError;
use crate::extract::{ApiJson, ApiQuery};
use crate::session::{AuthUser, DEFAULT_HISTORY_LIMIT};

/// 25 MB upload limit for audio
pub const MAX_AUDIO_SIZE: usize = 25 * 1024 * 1024;

const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_HISTORY_LIMIT
}

pub async fn list_languages() -> Json<Vec<LanguageEntry>> {
    Json(
        Language::ALL
            .into_iter()
            .map(|name| LanguageEntry { name, code: name.code() })
            .collect(),
    )
}

/// POST /translate
pub async fn translate_text(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<TranslateRequest>,
) -> Result<impl IntoResponse, FlowError> {
    let user = AuthUser::from_claims(claims);
    let record = state
        .flow
        .translate_text(&user, &req.text, req.src_lang, req.dest_lang)
        .await?;

    Ok((StatusCode::CREATED, Json(TranslationResponse::from(record))))
}

/// POST /translate/audio — raw WAV body, languages in the query string.
pub async fn translate_audio(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<AudioTranslateQuery>,
    bytes: Bytes,
) -> Result<impl IntoResponse, FlowError> {
    if bytes.is_empty() {
        return Err(FlowError::EmptyInput);
    }
    if bytes.len() > MAX_AUDIO_SIZE {
        return Err(FlowError::InvalidInput("Audio upload too large".into()));
    }

    let user = AuthUser::from_claims(claims);
    let out = state
        .flow
        .translate_audio(&user, &bytes, query.src_lang, query.dest_lang)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AudioTranslationResponse {
            recognized_text: out.recognized_text,
            translation: out.record.into(),
        }),
    ))
}

/// GET /history?limit=N — newest first.
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Json<Vec<TranslationResponse>>, FlowError> {
    if query.limit == 0 {
        return Err(FlowError::InvalidInput("limit must be at least 1".into()));
    }
    let limit = query.limit.min(MAX_HISTORY_LIMIT);

    let user = AuthUser::from_claims(claims);
    let records = state.flow.history(&user, limit).await?;

    Ok(Json(records.into_iter().map(TranslationResponse::from).collect()))
}
