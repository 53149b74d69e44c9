use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Agreement, Document, Message, Persona, Project};

/// One of the five full-collection streams kept in sync between contexts
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Messages,
    Projects,
    Documents,
    Personas,
    Agreements,
}

impl StreamKind {
    pub const ALL: [StreamKind; 5] = [
        StreamKind::Messages,
        StreamKind::Projects,
        StreamKind::Documents,
        StreamKind::Personas,
        StreamKind::Agreements,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StreamKind::Messages => "messages",
            StreamKind::Projects => "projects",
            StreamKind::Documents => "documents",
            StreamKind::Personas => "personas",
            StreamKind::Agreements => "agreements",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A full replacement value stamped with the wall-clock time (ms) it was published at
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VersionedPayload<T> {
    pub data: T,
    pub timestamp: i64,
}

/// Ephemeral "is this user typing" signal
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSignal {
    pub user_id: String,
    pub name: String,
    pub is_typing: bool,
}

impl PresenceSignal {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, is_typing: bool) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            is_typing,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum SyncMessage {
    #[serde(rename = "messages")]
    Messages(VersionedPayload<Vec<Message>>),
    #[serde(rename = "projects")]
    Projects(VersionedPayload<Vec<Project>>),
    #[serde(rename = "documents")]
    Documents(VersionedPayload<Vec<Document>>),
    #[serde(rename = "personas")]
    Personas(VersionedPayload<Vec<Persona>>),
    #[serde(rename = "agreements")]
    Agreements(VersionedPayload<Vec<Agreement>>),
    #[serde(rename = "typing")]
    Typing(PresenceSignal),
}

impl SyncMessage {
    /// The collection stream this message replaces, `None` for presence
    pub fn stream(&self) -> Option<StreamKind> {
        match self {
            SyncMessage::Messages(_) => Some(StreamKind::Messages),
            SyncMessage::Projects(_) => Some(StreamKind::Projects),
            SyncMessage::Documents(_) => Some(StreamKind::Documents),
            SyncMessage::Personas(_) => Some(StreamKind::Personas),
            SyncMessage::Agreements(_) => Some(StreamKind::Agreements),
            SyncMessage::Typing(_) => None,
        }
    }

    pub fn timestamp(&self) -> Option<i64> {
        match self {
            SyncMessage::Messages(p) => Some(p.timestamp),
            SyncMessage::Projects(p) => Some(p.timestamp),
            SyncMessage::Documents(p) => Some(p.timestamp),
            SyncMessage::Personas(p) => Some(p.timestamp),
            SyncMessage::Agreements(p) => Some(p.timestamp),
            SyncMessage::Typing(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.stream().map(StreamKind::as_str).unwrap_or("typing")
    }
}

/// Element type of a synchronized collection.
///
/// Ties an element type to its stream so the coordinator can stay generic:
/// `broadcast::<Project>(projects)` picks the stream from the type.
pub trait StreamItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: StreamKind;

    fn into_message(payload: VersionedPayload<Vec<Self>>) -> SyncMessage;
}

macro_rules! stream_item {
    ($ty:ty, $kind:ident) => {
        impl StreamItem for $ty {
            const KIND: StreamKind = StreamKind::$kind;

            fn into_message(payload: VersionedPayload<Vec<Self>>) -> SyncMessage {
                SyncMessage::$kind(payload)
            }
        }
    };
}

stream_item!(Message, Messages);
stream_item!(Project, Projects);
stream_item!(Document, Documents);
stream_item!(Persona, Personas);
stream_item!(Agreement, Agreements);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_message_is_tagged_by_kind() {
        let msg = SyncMessage::Personas(VersionedPayload { data: Vec::new(), timestamp: 42 });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, json!({"kind": "personas", "data": [], "timestamp": 42}));
    }

    #[test]
    fn presence_message_uses_camel_case_fields() {
        let msg = SyncMessage::Typing(PresenceSignal::new("user-2", "Marcus Johnson", true));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({"kind": "typing", "userId": "user-2", "name": "Marcus Johnson", "isTyping": true})
        );
        assert_eq!(msg.stream(), None);
        assert_eq!(msg.label(), "typing");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let raw = r#"{"kind": "calendar", "data": [], "timestamp": 1}"#;
        assert!(serde_json::from_str::<SyncMessage>(raw).is_err());
    }

    #[test]
    fn stream_indices_are_dense() {
        for (i, kind) in StreamKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(<Document as StreamItem>::KIND, StreamKind::Documents);
    }
}
