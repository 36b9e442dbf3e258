use chrono::{DateTime, Utc};

use crate::Language;

/// One completed translation. Records are immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRecord {
    pub id: i64,
    pub user_id: i64,
    pub original_text: String,
    pub translated_text: String,
    pub src_lang: Language,
    pub dest_lang: Language,
    pub timestamp: DateTime<Utc>,
}
