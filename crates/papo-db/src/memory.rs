use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use papo_types::models::{Message, MessageId, NewMessage, Participant};

use crate::store::{MessageLog, ParticipantTable, StoreError};

/// Process-local store. Same semantics as [`crate::Database`], nothing
/// survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    participants: BTreeMap<String, DateTime<Utc>>,
    messages: Vec<Message>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {}", e)))
    }
}

impl MessageLog for MemoryStore {
    fn append_message(&self, message: &NewMessage, time: &str) -> Result<MessageId, StoreError> {
        let mut inner = self.write()?;
        let id = inner.messages.len() as MessageId + 1;
        inner.messages.push(Message {
            id,
            from: message.from.clone(),
            to: message.to.clone(),
            text: message.text.clone(),
            kind: message.kind,
            time: time.to_string(),
        });
        Ok(id)
    }

    fn messages(&self, perspective: Option<&str>, limit: Option<u32>) -> Result<Vec<Message>, StoreError> {
        let inner = self.read()?;
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        let messages = inner
            .messages
            .iter()
            .rev()
            .filter(|m| perspective.is_none_or(|user| m.is_visible_to(user)))
            .take(limit)
            .cloned()
            .collect();
        Ok(messages)
    }
}

impl ParticipantTable for MemoryStore {
    fn insert_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        if inner.participants.contains_key(name) {
            return Ok(false);
        }
        inner.participants.insert(name.to_string(), at);
        Ok(true)
    }

    fn touch_participant(&self, name: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut inner = self.write()?;
        match inner.participants.get_mut(name) {
            Some(last) => {
                *last = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_participant(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.participants.remove(name).is_some())
    }

    fn participant(&self, name: &str) -> Result<Option<Participant>, StoreError> {
        let inner = self.read()?;
        Ok(inner.participants.get(name).map(|at| Participant {
            name: name.to_string(),
            last_activity: *at,
        }))
    }

    fn participants(&self) -> Result<Vec<Participant>, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .participants
            .iter()
            .map(|(name, at)| Participant {
                name: name.clone(),
                last_activity: *at,
            })
            .collect())
    }
}
