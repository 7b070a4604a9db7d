use crate::Database;
use crate::models::{MessageRow, ParticipantRow};
use anyhow::Result;
use papo_types::models::BROADCAST;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Participants --

    /// Inserts unless the name is taken. Returns whether a row was written.
    pub fn insert_participant(&self, name: &str, last_activity_ms: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO participants (name, last_activity) VALUES (?1, ?2)",
                rusqlite::params![name, last_activity_ms],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn touch_participant(&self, name: &str, last_activity_ms: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE participants SET last_activity = ?2 WHERE name = ?1",
                rusqlite::params![name, last_activity_ms],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn delete_participant(&self, name: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM participants WHERE name = ?1", [name])?;
            Ok(changed == 1)
        })
    }

    pub fn get_participant(&self, name: &str) -> Result<Option<ParticipantRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT name, last_activity FROM participants WHERE name = ?1",
                    [name],
                    |row| {
                        Ok(ParticipantRow {
                            name: row.get(0)?,
                            last_activity: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_participants(&self) -> Result<Vec<ParticipantRow>> {
        self.with_conn(query_participants)
    }

    // -- Messages --

    /// Appends a message and returns its sequence id.
    pub fn insert_message(
        &self,
        from: &str,
        to: &str,
        text: &str,
        kind: &str,
        time: &str,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (from_name, to_name, text, kind, time) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![from, to, text, kind, time],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first. With a perspective, only messages addressed to that user,
    /// broadcast, or sent by them.
    pub fn get_messages(&self, perspective: Option<&str>, limit: Option<u32>) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, perspective, limit))
    }
}

fn query_participants(conn: &Connection) -> Result<Vec<ParticipantRow>> {
    let mut stmt = conn.prepare("SELECT name, last_activity FROM participants ORDER BY name")?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ParticipantRow {
                name: row.get(0)?,
                last_activity: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_messages(conn: &Connection, perspective: Option<&str>, limit: Option<u32>) -> Result<Vec<MessageRow>> {
    // SQLite treats a negative LIMIT as "no limit"
    let limit = limit.map(i64::from).unwrap_or(-1);

    let mut stmt = conn.prepare(
        "SELECT id, from_name, to_name, text, kind, time
         FROM messages
         WHERE ?1 IS NULL OR to_name = ?1 OR to_name = ?2 OR from_name = ?1
         ORDER BY id DESC
         LIMIT ?3",
    )?;

    let rows = stmt
        .query_map(rusqlite::params![perspective, BROADCAST, limit], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                from_name: row.get(1)?,
                to_name: row.get(2)?,
                text: row.get(3)?,
                kind: row.get(4)?,
                time: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
