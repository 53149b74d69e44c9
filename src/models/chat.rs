use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, base64::Base64};

/// Who authored a chat message
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    File,
}

/// A file attached to a chat message. Inline bytes travel as base64.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde_as(as = "Option<Base64>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    pub mime_type: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Proposed,
    Accepted,
    Rejected,
}

/// An agreement the assistant proposed inside a chat message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgreementProposal {
    pub title: String,
    pub content: String,
    pub status: ProposalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<Vec<String>>,
}

/// A chat message. `user_id` is either a workspace user id or `gemini` for the assistant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_thinking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement_proposal: Option<AgreementProposal>,
}

impl Message {
    pub fn from_user(id: impl Into<String>, user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            role: Role::User,
            attachments: None,
            is_thinking: None,
            agreement_proposal: None,
        }
    }

    pub fn from_assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            ..Self::from_user(id, ASSISTANT_USER_ID, content)
        }
    }
}

pub const ASSISTANT_USER_ID: &str = "gemini";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_bytes_travel_as_base64() {
        let attachment = Attachment {
            id: "a-1".to_string(),
            kind: AttachmentKind::Image,
            name: "logo.png".to_string(),
            url: None,
            data: Some(b"hi".to_vec()),
            mime_type: "image/png".to_string(),
        };
        let json = serde_json::to_value(&attachment).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["data"], "aGk=");
        assert_eq!(json["mimeType"], "image/png");
        assert!(json.get("url").is_none());
    }

    #[test]
    fn message_accepts_camel_case_payload() {
        let raw = r#"{
            "id": "0",
            "userId": "gemini",
            "role": "model",
            "content": "Welcome",
            "timestamp": "2024-05-01T10:00:00Z",
            "agreementProposal": {"title": "Q3", "content": "Ship it", "status": "proposed"}
        }"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.role, Role::Model);
        assert_eq!(msg.user_id, ASSISTANT_USER_ID);
        let proposal = msg.agreement_proposal.unwrap();
        assert_eq!(proposal.status, ProposalStatus::Proposed);
        assert!(proposal.approved_by.is_none());
    }
}
