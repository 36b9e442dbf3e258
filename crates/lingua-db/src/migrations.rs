use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Brings the schema up to date. Version 1 uses `IF NOT EXISTS` so databases
/// created by earlier releases (same table layout, no version table) are
/// adopted as-is.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, translations)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                preferred_lang  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS translations (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id         INTEGER NOT NULL REFERENCES users(id),
                original_text   TEXT NOT NULL,
                translated_text TEXT NOT NULL,
                src_lang        TEXT NOT NULL,
                dest_lang       TEXT NOT NULL,
                timestamp       DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    if version < 2 {
        info!("Running migration v2 (history index)");
        conn.execute_batch(
            "
            CREATE INDEX IF NOT EXISTS idx_translations_user
                ON translations(user_id, id);

            INSERT INTO schema_version (version) VALUES (2);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
