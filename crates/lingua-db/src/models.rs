/// Database row types — these map directly to SQLite rows.
/// Language columns stay as raw text here; conversion into the typed
/// models happens in `queries`.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub preferred_lang: String,
}

pub struct TranslationRow {
    pub id: i64,
    pub user_id: i64,
    pub original_text: String,
    pub translated_text: String,
    pub src_lang: String,
    pub dest_lang: String,
    pub timestamp: String,
}
