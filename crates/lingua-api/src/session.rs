//! Session flow: the only path from a user action to the stores and the
//! upstream gateways.
//!
//! A session is either anonymous or authenticated. The authenticated state is
//! the [`AuthUser`] value, obtainable only through [`SessionFlow::login`] (or
//! by verifying a token minted from one). Every gated operation takes
//! `&AuthUser`, so an anonymous caller cannot reach history, translation or
//! recognition at all.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{error, info, warn};

use lingua_db::Database;
use lingua_gateway::{GatewayError, SpeechRecognizer, Translator, wav};
use lingua_types::Language;
use lingua_types::api::Claims;
use lingua_types::models::TranslationRecord;

use crate::credentials;
use crate::error::FlowError;

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// An authenticated user. Carried explicitly into every gated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    user_id: i64,
    username: String,
    preferred_language: Language,
}

impl AuthUser {
    /// Only valid for claims whose token signature has been verified.
    pub(crate) fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            preferred_language: claims.lang,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn preferred_language(&self) -> Language {
        self.preferred_language
    }
}

#[derive(Debug)]
pub struct AudioTranslation {
    pub recognized_text: String,
    pub record: TranslationRecord,
}

pub struct SessionFlow {
    db: Arc<Database>,
    translator: Arc<dyn Translator>,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl SessionFlow {
    pub fn new(
        db: Database,
        translator: Arc<dyn Translator>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        Self {
            db: Arc::new(db),
            translator,
            recognizer,
        }
    }

    // -- Anonymous --

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        preferred_language: Language,
    ) -> Result<i64, FlowError> {
        if username.trim().is_empty() {
            return Err(FlowError::InvalidInput("Username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(FlowError::InvalidInput("Password must not be empty".into()));
        }

        let name = username.to_string();
        let password = password.to_string();
        let created = self
            .blocking(move |db| {
                let hash = credentials::hash_password(&password)?;
                db.create_user(&name, &hash, preferred_language)
            })
            .await?;

        match created {
            Some(id) => {
                info!("Registered user {} (id {})", username, id);
                Ok(id)
            }
            None => Err(FlowError::UsernameTaken),
        }
    }

    /// The `Anonymous -> Authenticated` transition.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthUser, FlowError> {
        let name = username.to_string();
        let password = password.to_string();
        let user = self
            .blocking(move |db| {
                let row = db.get_user_by_username(&name)?;
                let matched = credentials::verify_account(&password, row.as_ref().map(|r| r.password.as_str()))?;
                let Some(row) = row.filter(|_| matched) else {
                    return Ok(None);
                };
                let preferred_language: Language = row.preferred_lang.parse()?;
                Ok(Some(AuthUser {
                    user_id: row.id,
                    username: row.username,
                    preferred_language,
                }))
            })
            .await?;

        match user {
            Some(user) => {
                info!("User {} logged in", user.username);
                Ok(user)
            }
            None => {
                warn!("Failed login attempt for {}", username);
                Err(FlowError::AuthFailed)
            }
        }
    }

    // -- Authenticated --

    /// Translate `text` and record it. `dest` defaults to the user's
    /// preferred language. Nothing is recorded unless translation succeeds.
    pub async fn translate_text(
        &self,
        user: &AuthUser,
        text: &str,
        src: Language,
        dest: Option<Language>,
    ) -> Result<TranslationRecord, FlowError> {
        if text.trim().is_empty() {
            return Err(FlowError::EmptyInput);
        }
        let dest = dest.unwrap_or(user.preferred_language);

        let translated = self.translator.translate(text, src, dest).await.map_err(|e| {
            warn!("Translation {} -> {} failed for user {}: {}", src, dest, user.user_id, e);
            FlowError::TranslationUnavailable
        })?;

        let user_id = user.user_id;
        let original = text.to_string();
        let record = self
            .blocking(move |db| db.insert_translation(user_id, &original, &translated, src, dest))
            .await?;

        info!("Recorded translation {} for user {}", record.id, user_id);
        Ok(record)
    }

    /// Recognize speech in a WAV upload, then translate it as text.
    ///
    /// The upload is staged in a temporary file for the recognizer; the file
    /// is removed on every exit path when the guard drops.
    pub async fn translate_audio(
        &self,
        user: &AuthUser,
        audio: &[u8],
        src: Language,
        dest: Option<Language>,
    ) -> Result<AudioTranslation, FlowError> {
        if !wav::is_wav(audio) {
            return Err(FlowError::UnsupportedAudio("expected a WAV file".into()));
        }

        let staged = stage_upload(audio.to_vec()).await?;
        let recognized = self.recognize_staged(staged.path(), src).await;
        drop(staged);

        let recognized_text = recognized?;
        info!("Recognized {} chars of speech for user {}", recognized_text.chars().count(), user.user_id);

        let record = self.translate_text(user, &recognized_text, src, dest).await?;
        Ok(AudioTranslation {
            recognized_text,
            record,
        })
    }

    pub async fn history(&self, user: &AuthUser, limit: u32) -> Result<Vec<TranslationRecord>, FlowError> {
        let user_id = user.user_id;
        self.blocking(move |db| db.recent_translations(user_id, limit)).await
    }

    async fn recognize_staged(&self, path: &Path, language: Language) -> Result<String, FlowError> {
        match self.recognizer.recognize(path, language).await {
            Ok(text) => Ok(text),
            Err(GatewayError::UnsupportedAudio(reason)) => Err(FlowError::UnsupportedAudio(reason)),
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                Err(FlowError::RecognitionFailed)
            }
        }
    }

    /// Run storage work off the async runtime.
    async fn blocking<F, T>(&self, f: F) -> Result<T, FlowError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                FlowError::Internal
            })?
            .map_err(|e| {
                error!("Storage error: {:#}", e);
                FlowError::Internal
            })
    }
}

async fn stage_upload(audio: Vec<u8>) -> Result<NamedTempFile, FlowError> {
    tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("lingua-upload-")
            .suffix(".wav")
            .tempfile()?;
        file.write_all(&audio)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        FlowError::Internal
    })?
    .map_err(|e| {
        error!("Failed to stage audio upload: {}", e);
        FlowError::Internal
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRecognizer, FakeTranslator, flow_with, wav_bytes};

    async fn alice(flow: &SessionFlow) -> AuthUser {
        flow.register("alice", "pw123", Language::Hindi).await.unwrap();
        flow.login("alice", "pw123").await.unwrap()
    }

    #[tokio::test]
    async fn registering_twice_is_rejected() {
        let (flow, _, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());

        assert!(flow.register("alice", "pw123", Language::Hindi).await.is_ok());
        let second = flow.register("alice", "different", Language::French).await;
        assert!(matches!(second, Err(FlowError::UsernameTaken)));

        // First registration still holds.
        let user = flow.login("alice", "pw123").await.unwrap();
        assert_eq!(user.preferred_language(), Language::Hindi);
    }

    #[tokio::test]
    async fn empty_credentials_are_invalid() {
        let (flow, _, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        assert!(matches!(flow.register("  ", "pw", Language::English).await, Err(FlowError::InvalidInput(_))));
        assert!(matches!(flow.register("bob", "", Language::English).await, Err(FlowError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn login_returns_the_registered_user() {
        let (flow, _, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        let id = flow.register("alice", "pw123", Language::Hindi).await.unwrap();
        let bob = flow.register("bob", "hunter2", Language::German).await.unwrap();

        let user = flow.login("alice", "pw123").await.unwrap();
        assert_eq!(user.user_id(), id);
        assert_eq!(user.username(), "alice");

        assert_eq!(flow.login("bob", "hunter2").await.unwrap().user_id(), bob);
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let (flow, _, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        flow.register("alice", "pw123", Language::Hindi).await.unwrap();

        let wrong_password = flow.login("alice", "pw1234").await.unwrap_err();
        let no_such_user = flow.login("mallory", "pw123").await.unwrap_err();

        assert!(matches!(wrong_password, FlowError::AuthFailed));
        assert!(matches!(no_such_user, FlowError::AuthFailed));
        assert_eq!(wrong_password.to_string(), no_such_user.to_string());
    }

    #[tokio::test]
    async fn unknown_user_costs_a_hash_check() {
        use std::time::Instant;

        let (flow, _, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        flow.register("alice", "pw123", Language::Hindi).await.unwrap();
        // Warm up the stand-in hash.
        let _ = flow.login("nobody", "pw123").await;

        let start = Instant::now();
        let _ = flow.login("alice", "wrong").await;
        let wrong_password = start.elapsed();

        let start = Instant::now();
        let _ = flow.login("mallory", "wrong").await;
        let no_such_user = start.elapsed();

        // Both paths run one Argon2 verification; a skipped hash is orders of
        // magnitude faster.
        assert!(
            no_such_user * 10 >= wrong_password,
            "unknown user {no_such_user:?} vs wrong password {wrong_password:?}"
        );
    }

    #[tokio::test]
    async fn text_translation_is_recorded_first_in_history() {
        let (flow, translator, _) =
            flow_with(FakeTranslator::returning("नमस्ते"), FakeRecognizer::fails());
        let user = alice(&flow).await;

        let record = flow
            .translate_text(&user, "hello", Language::English, Some(Language::Hindi))
            .await
            .unwrap();
        assert_eq!(record.translated_text, "नमस्ते");
        assert_eq!(translator.calls(), vec![("hello".to_string(), "en", "hi")]);

        let history = flow.history(&user, DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(history.len(), 1);
        let first = &history[0];
        assert_eq!(first.original_text, "hello");
        assert_eq!(first.translated_text, "नमस्ते");
        assert_eq!(first.src_lang, Language::English);
        assert_eq!(first.dest_lang, Language::Hindi);
        assert_eq!(first, &record);
    }

    #[tokio::test]
    async fn destination_defaults_to_preferred_language() {
        let (flow, translator, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        let user = alice(&flow).await;

        let record = flow.translate_text(&user, "hello", Language::English, None).await.unwrap();
        assert_eq!(record.dest_lang, Language::Hindi);
        assert_eq!(translator.calls()[0].2, "hi");
    }

    #[tokio::test]
    async fn failed_translation_writes_nothing() {
        let (flow, _, _) = flow_with(FakeTranslator::fails(), FakeRecognizer::fails());
        let user = alice(&flow).await;

        let err = flow
            .translate_text(&user, "hello", Language::English, Some(Language::Tamil))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::TranslationUnavailable));
        assert!(flow.history(&user, DEFAULT_HISTORY_LIMIT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_gateway() {
        let (flow, translator, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        let user = alice(&flow).await;

        let err = flow.translate_text(&user, " \n\t", Language::English, None).await.unwrap_err();
        assert!(matches!(err, FlowError::EmptyInput));
        assert!(translator.calls().is_empty());
    }

    #[tokio::test]
    async fn history_is_capped_and_newest_first() {
        let (flow, _, _) = flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        let user = alice(&flow).await;

        for i in 0..12 {
            flow.translate_text(&user, &format!("line {i}"), Language::English, None)
                .await
                .unwrap();
        }

        let history = flow.history(&user, DEFAULT_HISTORY_LIMIT).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].original_text, "line 11");
        assert!(history.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn audio_is_recognized_then_translated() {
        let (flow, translator, recognizer) =
            flow_with(FakeTranslator::returning("bonjour"), FakeRecognizer::hears("hello"));
        let user = alice(&flow).await;

        let out = flow
            .translate_audio(&user, &wav_bytes(), Language::English, Some(Language::French))
            .await
            .unwrap();

        assert_eq!(out.recognized_text, "hello");
        assert_eq!(out.record.original_text, "hello");
        assert_eq!(out.record.translated_text, "bonjour");
        assert_eq!(translator.calls(), vec![("hello".to_string(), "en", "fr")]);

        let staged = recognizer.staged_path().unwrap();
        assert_eq!(staged.extension().unwrap(), "wav");
        assert!(!staged.exists());
    }

    #[tokio::test]
    async fn unrecognized_audio_records_nothing_and_session_survives() {
        let (flow, translator, recognizer) =
            flow_with(FakeTranslator::echo(), FakeRecognizer::fails());
        let user = alice(&flow).await;

        let err = flow
            .translate_audio(&user, &wav_bytes(), Language::English, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::RecognitionFailed));
        assert!(translator.calls().is_empty());
        assert!(flow.history(&user, DEFAULT_HISTORY_LIMIT).await.unwrap().is_empty());
        assert!(!recognizer.staged_path().unwrap().exists());

        // Still authenticated: the same user can keep translating.
        flow.translate_text(&user, "hello", Language::English, None).await.unwrap();
        assert_eq!(flow.history(&user, DEFAULT_HISTORY_LIMIT).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_wav_upload_is_rejected_before_staging() {
        let (flow, _, recognizer) = flow_with(FakeTranslator::echo(), FakeRecognizer::hears("x"));
        let user = alice(&flow).await;

        let err = flow
            .translate_audio(&user, b"ID3 mp3 bytes", Language::English, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::UnsupportedAudio(_)));
        assert!(recognizer.staged_path().is_none());
    }

    #[tokio::test]
    async fn legacy_accounts_can_log_in() {
        use sha2::{Digest, Sha256};

        let db = Database::open_in_memory().unwrap();
        let digest = hex::encode(Sha256::digest(b"pw123"));
        let id = db.create_user("legacy", &digest, Language::Tamil).unwrap().unwrap();
        let flow = SessionFlow::new(
            db,
            Arc::new(FakeTranslator::echo()),
            Arc::new(FakeRecognizer::fails()),
        );

        let user = flow.login("legacy", "pw123").await.unwrap();
        assert_eq!(user.user_id(), id);
        assert_eq!(user.preferred_language(), Language::Tamil);
        assert!(matches!(flow.login("legacy", "nope").await, Err(FlowError::AuthFailed)));
    }
}
