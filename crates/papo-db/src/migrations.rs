use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (participants, messages)");
        conn.execute_batch(
            "
            CREATE TABLE participants (
                name            TEXT PRIMARY KEY,
                last_activity   INTEGER NOT NULL
            );

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                from_name   TEXT NOT NULL,
                to_name     TEXT NOT NULL,
                text        TEXT NOT NULL,
                kind        TEXT NOT NULL,
                time        TEXT NOT NULL
            );

            CREATE INDEX idx_messages_to ON messages(to_name, id);
            CREATE INDEX idx_messages_from ON messages(from_name, id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
