use crate::Database;
use crate::models::{TranslationRow, UserRow};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Utc};
use lingua_types::Language;
use lingua_types::models::TranslationRecord;
use rusqlite::{Connection, Row};

const TRANSLATION_COLUMNS: &str =
    "id, user_id, original_text, translated_text, src_lang, dest_lang, timestamp";

impl Database {
    // -- Users --

    /// Inserts a new account. Returns `None` when the username is already
    /// taken; the existing row is left untouched.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        preferred_lang: Language,
    ) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, preferred_lang) VALUES (?1, ?2, ?3)",
                (username, password_hash, preferred_lang.name()),
            );

            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    // -- Translations --

    pub fn insert_translation(
        &self,
        user_id: i64,
        original_text: &str,
        translated_text: &str,
        src_lang: Language,
        dest_lang: Language,
    ) -> Result<TranslationRecord> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO translations (user_id, original_text, translated_text, src_lang, dest_lang)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    user_id,
                    original_text,
                    translated_text,
                    src_lang.name(),
                    dest_lang.name()
                ],
            )?;
            let id = conn.last_insert_rowid();

            let row = conn.query_row(
                &format!("SELECT {TRANSLATION_COLUMNS} FROM translations WHERE id = ?1"),
                [id],
                translation_row,
            )?;
            row.try_into()
        })
    }

    /// Most recent translations for a user, newest first. Ids are strictly
    /// increasing, so they order records even within the same second.
    pub fn recent_translations(&self, user_id: i64, limit: u32) -> Result<Vec<TranslationRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRANSLATION_COLUMNS} FROM translations
                 WHERE user_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2"
            ))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], translation_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(TranslationRecord::try_from).collect()
        })
    }
}

fn query_user<P: rusqlite::ToSql>(conn: &Connection, predicate: &str, value: P) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, password, preferred_lang FROM users WHERE {predicate}"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                preferred_lang: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn translation_row(row: &Row<'_>) -> rusqlite::Result<TranslationRow> {
    Ok(TranslationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        original_text: row.get(2)?,
        translated_text: row.get(3)?,
        src_lang: row.get(4)?,
        dest_lang: row.get(5)?,
        timestamp: row.get(6)?,
    })
}

impl TryFrom<TranslationRow> for TranslationRecord {
    type Error = anyhow::Error;

    fn try_from(row: TranslationRow) -> Result<Self> {
        Ok(TranslationRecord {
            id: row.id,
            user_id: row.user_id,
            src_lang: row.src_lang.parse()?,
            dest_lang: row.dest_lang.parse()?,
            timestamp: parse_timestamp(&row.timestamp)
                .with_context(|| format!("translation {} has a bad timestamp", row.id))?,
            original_text: row.original_text,
            translated_text: row.translated_text,
        })
    }
}

/// SQLite `CURRENT_TIMESTAMP` is UTC `YYYY-MM-DD HH:MM:SS`.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|_| anyhow!("Unrecognised timestamp: {}", raw))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
