use std::sync::Arc;

use papo_db::Store;
use papo_types::models::{BROADCAST, Message, MessageId, MessageKind, NewMessage, Participant};

use crate::clock::Clock;
use crate::error::{ChatError, ChatResult};
use crate::messages::{MessageFilter, MessageStore};
use crate::presence::PresenceRegistry;

pub const MAX_NAME_LEN: usize = 64;

/// Operations exposed to request handlers.
///
/// Cheap to clone; all clones share the same registry and log.
#[derive(Clone)]
pub struct Session {
    registry: Arc<PresenceRegistry>,
    messages: MessageStore,
}

impl Session {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let messages = MessageStore::new(store.clone(), clock.clone());
        let registry = Arc::new(PresenceRegistry::new(store, messages.clone(), clock));
        Self { registry, messages }
    }

    /// Handle for the sweeper.
    pub fn registry(&self) -> Arc<PresenceRegistry> {
        self.registry.clone()
    }

    pub fn join(&self, name: &str) -> ChatResult<Participant> {
        validate_name(name)?;
        self.registry.register(name)
    }

    pub fn heartbeat(&self, name: &str) -> ChatResult<()> {
        self.registry.heartbeat(name)
    }

    pub fn list_participants(&self) -> ChatResult<Vec<Participant>> {
        self.registry.list()
    }

    /// Posts a user message. `kind` is the raw wire value; `status` is
    /// reserved for system notices.
    pub fn post_message(&self, from: &str, to: &str, text: &str, kind: &str) -> ChatResult<MessageId> {
        let kind = kind
            .parse::<MessageKind>()
            .map_err(|e| ChatError::InvalidMessage(e.to_string()))?;
        if kind == MessageKind::Status {
            return Err(ChatError::InvalidMessage("status messages are reserved".into()));
        }
        if to.trim().is_empty() {
            return Err(ChatError::InvalidMessage("recipient is empty".into()));
        }
        if text.trim().is_empty() {
            return Err(ChatError::InvalidMessage("text is empty".into()));
        }

        self.registry.post_as(NewMessage {
            from: from.to_string(),
            to: to.to_string(),
            text: text.to_string(),
            kind,
        })
    }

    /// Messages visible to `user`, newest first.
    pub fn list_messages(&self, user: Option<&str>, limit: Option<&str>) -> ChatResult<Vec<Message>> {
        let user = user
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ChatError::InvalidQuery("no user given".into()))?;
        let limit = limit.map(MessageFilter::parse_limit).transpose()?;

        if !self.registry.is_registered(user)? {
            return Err(ChatError::InvalidQuery(format!("'{}' is not a participant", user)));
        }

        self.messages.query(&MessageFilter {
            perspective: Some(user.to_string()),
            limit,
        })
    }
}

fn validate_name(name: &str) -> ChatResult<()> {
    if name.trim().is_empty() {
        return Err(ChatError::InvalidName("name is empty".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ChatError::InvalidName(format!("name is longer than {} characters", MAX_NAME_LEN)));
    }
    if name.chars().any(char::is_control) {
        return Err(ChatError::InvalidName("name contains control characters".into()));
    }
    if name == BROADCAST {
        return Err(ChatError::InvalidName(format!("'{}' is reserved", BROADCAST)));
    }
    Ok(())
}
