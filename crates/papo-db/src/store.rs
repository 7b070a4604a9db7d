//! Persistence interface consumed by the chat core.
//!
//! All operations are synchronous. Callers on an async runtime are expected
//! to hop onto the blocking pool before calling in.

use chrono::{DateTime, Utc};
use thiserror::Error;

use papo_types::models::{Message, MessageId, NewMessage, Participant};

use crate::Database;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Unavailable(format!("{:#}", e))
    }
}

/// Append-only message log.
pub trait MessageLog: Send + Sync {
    /// Stores `message` at the next sequence position and returns that position.
    fn append_message(&self, message: &NewMessage, time: &str) -> Result<MessageId, StoreError>;

    /// Newest first. When `perspective` is set, keeps only messages sent to
    /// that user, sent by them, or broadcast. `limit` truncates after filtering.
    fn messages(&self, perspective: Option<&str>, limit: Option<u32>) -> Result<Vec<Message>, StoreError>;
}

/// Participant liveness table, keyed by name.
pub trait ParticipantTable: Send + Sync {
    /// Conditional insert. `Ok(false)` means the name is already present.
    fn insert_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// `Ok(false)` means no such participant.
    fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    fn remove_participant(&self, name: &str) -> Result<bool, StoreError>;

    fn participant(&self, name: &str) -> Result<Option<Participant>, StoreError>;

    fn participants(&self) -> Result<Vec<Participant>, StoreError>;
}

pub trait Store: MessageLog + ParticipantTable {}

impl<T: MessageLog + ParticipantTable> Store for T {}

impl MessageLog for Database {
    fn append_message(&self, message: &NewMessage, time: &str) -> Result<MessageId, StoreError> {
        let id = self.insert_message(
            &message.from,
            &message.to,
            &message.text,
            message.kind.as_str(),
            time,
        )?;
        Ok(id)
    }

    fn messages(&self, perspective: Option<&str>, limit: Option<u32>) -> Result<Vec<Message>, StoreError> {
        let rows = self.get_messages(perspective, limit)?;
        let messages = rows
            .into_iter()
            .map(|row| row.into_message())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(messages)
    }
}

impl ParticipantTable for Database {
    fn insert_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(Database::insert_participant(self, name, at.timestamp_millis())?)
    }

    fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(Database::touch_participant(self, name, at.timestamp_millis())?)
    }

    fn remove_participant(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.delete_participant(name)?)
    }

    fn participant(&self, name: &str) -> Result<Option<Participant>, StoreError> {
        let participant = self
            .get_participant(name)?
            .map(|row| row.into_participant())
            .transpose()?;
        Ok(participant)
    }

    fn participants(&self) -> Result<Vec<Participant>, StoreError> {
        let participants = self
            .get_participants()?
            .into_iter()
            .map(|row| row.into_participant())
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(participants)
    }
}
