use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::error;

use lingua_types::Language;
use lingua_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::FlowError;
use crate::extract::ApiJson;
use crate::session::SessionFlow;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub flow: SessionFlow,
    pub jwt_secret: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, FlowError> {
    let user_id = state
        .flow
        .register(&req.username, &req.password, req.preferred_language)
        .await?;

    let token = create_token(&state.jwt_secret, user_id, &req.username, req.preferred_language)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, FlowError> {
    let user = state.flow.login(&req.username, &req.password).await?;

    let token = create_token(
        &state.jwt_secret,
        user.user_id(),
        user.username(),
        user.preferred_language(),
    )?;

    Ok(Json(LoginResponse {
        user_id: user.user_id(),
        username: user.username().to_string(),
        preferred_language: user.preferred_language(),
        token,
    }))
}

fn create_token(secret: &str, user_id: i64, username: &str, lang: Language) -> Result<String, FlowError> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        lang,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to sign session token: {}", e);
        FlowError::Internal
    })
}
