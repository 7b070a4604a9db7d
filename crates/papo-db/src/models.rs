//! Database row types. They map directly to SQLite rows and are converted
//! into the shared models at the store boundary.

use anyhow::{Result, anyhow};
use chrono::DateTime;
use papo_types::models::{Message, Participant};

pub struct ParticipantRow {
    pub name: String,
    /// Epoch milliseconds.
    pub last_activity: i64,
}

impl ParticipantRow {
    pub fn into_participant(self) -> Result<Participant> {
        let last_activity = DateTime::from_timestamp_millis(self.last_activity)
            .ok_or_else(|| anyhow!("Corrupt last_activity {} for '{}'", self.last_activity, self.name))?;
        Ok(Participant {
            name: self.name,
            last_activity,
        })
    }
}

pub struct MessageRow {
    pub id: i64,
    pub from_name: String,
    pub to_name: String,
    pub text: String,
    pub kind: String,
    pub time: String,
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message> {
        let kind = self
            .kind
            .parse()
            .map_err(|e| anyhow!("Corrupt message {}: {}", self.id, e))?;
        Ok(Message {
            id: self.id,
            from: self.from_name,
            to: self.to_name,
            text: self.text,
            kind,
            time: self.time,
        })
    }
}
