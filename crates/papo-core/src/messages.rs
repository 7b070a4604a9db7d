use std::sync::{Arc, Mutex};

use papo_db::Store;
use papo_types::models::{BROADCAST, Message, MessageId, NewMessage};

use crate::clock::Clock;
use crate::error::{ChatError, ChatResult};

const TIME_FORMAT: &str = "%H:%M:%S";

/// Addressed view over the message log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Only messages this user may see. `None` returns everything.
    pub perspective: Option<String>,
    /// Most recent N after filtering. Must be positive.
    pub limit: Option<i64>,
}

impl MessageFilter {
    pub fn for_user(user: &str) -> Self {
        Self {
            perspective: Some(user.to_string()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parses the textual form a transport receives, e.g. `?limit=50`.
    pub fn parse_limit(raw: &str) -> ChatResult<i64> {
        let limit = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ChatError::InvalidQuery(format!("limit '{}' is not an integer", raw)))?;
        check_limit(limit)?;
        Ok(limit)
    }
}

fn check_limit(limit: i64) -> ChatResult<u32> {
    if limit <= 0 {
        return Err(ChatError::InvalidQuery(format!("limit must be positive, got {}", limit)));
    }
    Ok(u32::try_from(limit).unwrap_or(u32::MAX))
}

/// Append-only log of chat events, ordered by insertion.
#[derive(Clone)]
pub struct MessageStore {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    // Keeps `time` non-decreasing in id order.
    append_lock: Arc<Mutex<()>>,
}

impl MessageStore {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn append(&self, message: NewMessage) -> ChatResult<MessageId> {
        validate(&message)?;

        let _guard = self.append_lock.lock().unwrap_or_else(|e| e.into_inner());
        let time = self.clock.now().format(TIME_FORMAT).to_string();
        let id = self.store.append_message(&message, &time)?;

        tracing::debug!(id, from = %message.from, to = %message.to, kind = %message.kind, "Message stored");
        Ok(id)
    }

    /// Newest first.
    pub fn query(&self, filter: &MessageFilter) -> ChatResult<Vec<Message>> {
        let limit = filter.limit.map(check_limit).transpose()?;
        let messages = self.store.messages(filter.perspective.as_deref(), limit)?;
        Ok(messages)
    }
}

fn validate(message: &NewMessage) -> ChatResult<()> {
    if message.from.trim().is_empty() {
        return Err(ChatError::InvalidMessage("sender is empty".into()));
    }
    if message.from == BROADCAST {
        return Err(ChatError::InvalidMessage(format!("'{}' cannot send messages", BROADCAST)));
    }
    if message.to.trim().is_empty() {
        return Err(ChatError::InvalidMessage("recipient is empty".into()));
    }
    if message.text.trim().is_empty() {
        return Err(ChatError::InvalidMessage("text is empty".into()));
    }
    Ok(())
}
