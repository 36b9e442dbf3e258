use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;

use lingua_types::api::ErrorResponse;

/// Everything a user action can fail with. None of these end the session;
/// the client reports the message and the user may try again.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Username already exists")]
    UsernameTaken,
    /// Unknown user and wrong password are deliberately indistinguishable.
    #[error("Invalid credentials")]
    AuthFailed,
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Could not recognize audio")]
    RecognitionFailed,
    #[error("Translation service unavailable")]
    TranslationUnavailable,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Nothing to translate")]
    EmptyInput,
    #[error("Unsupported audio: {0}")]
    UnsupportedAudio(String),
    #[error("Internal error")]
    Internal,
}

impl FlowError {
    pub fn status(&self) -> StatusCode {
        match self {
            FlowError::UsernameTaken => StatusCode::CONFLICT,
            FlowError::AuthFailed | FlowError::Unauthenticated => StatusCode::UNAUTHORIZED,
            FlowError::RecognitionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::TranslationUnavailable => StatusCode::BAD_GATEWAY,
            FlowError::InvalidInput(_) | FlowError::EmptyInput | FlowError::UnsupportedAudio(_) => {
                StatusCode::BAD_REQUEST
            }
            FlowError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for FlowError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        FlowError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for FlowError {
    fn from(rejection: QueryRejection) -> Self {
        debug!("Rejected query string: {}", rejection.body_text());
        FlowError::InvalidInput(rejection.body_text())
    }
}
