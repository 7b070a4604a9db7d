use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recipient value meaning "visible to every participant".
pub const BROADCAST: &str = "Todos";

/// Position of a message in the log. Strictly increasing by insertion.
pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Chat,
    PrivateChat,
    /// System notices (joins and departures). Never accepted from users.
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::PrivateChat => "private_chat",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown message kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for MessageKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Self::Chat),
            "private_chat" => Ok(Self::PrivateChat),
            "status" => Ok(Self::Status),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// A message as stored. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    /// Insertion time, `HH:MM:SS`.
    pub time: String,
}

impl Message {
    /// Whether `user` is allowed to see this message.
    pub fn is_visible_to(&self, user: &str) -> bool {
        self.to == user || self.to == BROADCAST || self.from == user
    }
}

/// A message before the log has assigned it an id and a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

impl NewMessage {
    pub fn status(from: &str, text: &str) -> Self {
        Self {
            from: from.to_string(),
            to: BROADCAST.to_string(),
            text: text.to_string(),
            kind: MessageKind::Status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_wire_names() {
        assert_eq!("chat".parse::<MessageKind>(), Ok(MessageKind::Chat));
        assert_eq!("private_chat".parse::<MessageKind>(), Ok(MessageKind::PrivateChat));
        assert_eq!("status".parse::<MessageKind>(), Ok(MessageKind::Status));
        assert!("Chat".parse::<MessageKind>().is_err());
        assert!("".parse::<MessageKind>().is_err());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&MessageKind::PrivateChat).unwrap();
        assert_eq!(json, "\"private_chat\"");
    }

    #[test]
    fn visibility_rules() {
        let msg = Message {
            id: 1,
            from: "Ann".into(),
            to: "Bob".into(),
            text: "hi".into(),
            kind: MessageKind::PrivateChat,
            time: "10:00:00".into(),
        };
        assert!(msg.is_visible_to("Ann"));
        assert!(msg.is_visible_to("Bob"));
        assert!(!msg.is_visible_to("Cid"));

        let notice = Message { to: BROADCAST.into(), ..msg };
        assert!(notice.is_visible_to("Cid"));
    }
}
