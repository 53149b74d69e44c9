use serde::{Deserialize, Serialize};

use super::channel::Envelope;
use super::error::{ChannelError, ChannelResult};

/// How envelopes are framed on a WebSocket. JSON rides text frames, CBOR binary frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    #[default]
    Json,
    Cbor,
}

/// An encoded envelope ready to be put on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

pub fn encode(envelope: &Envelope, format: WireFormat) -> ChannelResult<Frame> {
    match format {
        WireFormat::Json => serde_json::to_string(envelope)
            .map(Frame::Text)
            .map_err(|e| ChannelError::Codec(e.to_string())),
        WireFormat::Cbor => serde_cbor::to_vec(envelope)
            .map(Frame::Binary)
            .map_err(|e| ChannelError::Codec(e.to_string())),
    }
}

pub fn decode_text(text: &str) -> ChannelResult<Envelope> {
    serde_json::from_str(text).map_err(|e| ChannelError::Codec(e.to_string()))
}

pub fn decode_binary(bytes: &[u8]) -> ChannelResult<Envelope> {
    serde_cbor::from_slice(bytes).map_err(|e| ChannelError::Codec(e.to_string()))
}

pub fn decode(frame: &Frame) -> ChannelResult<Envelope> {
    match frame {
        Frame::Text(text) => decode_text(text),
        Frame::Binary(bytes) => decode_binary(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, DocumentSource, PresenceSignal, SyncMessage, VersionedPayload};
    use uuid::Uuid;

    fn documents_envelope() -> Envelope {
        Envelope {
            origin: Uuid::new_v4(),
            message: SyncMessage::Documents(VersionedPayload {
                data: vec![Document {
                    id: "doc-1".to_string(),
                    name: "Brand Guidelines".to_string(),
                    content: "Primary color is blue".to_string(),
                    source: DocumentSource::Gdrive,
                    is_active: true,
                }],
                timestamp: 1_700_000_000_000,
            }),
        }
    }

    #[test]
    fn json_frame_is_flat() {
        let envelope = documents_envelope();
        let Frame::Text(text) = encode(&envelope, WireFormat::Json).unwrap() else {
            panic!("json must produce a text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["kind"], "documents");
        assert_eq!(value["timestamp"], 1_700_000_000_000i64);
        assert_eq!(value["origin"], envelope.origin.to_string());
        assert_eq!(value["data"][0]["isActive"], true);
    }

    #[test]
    fn cbor_frame_decodes_to_same_envelope() {
        let envelope = Envelope {
            origin: Uuid::new_v4(),
            message: SyncMessage::Typing(PresenceSignal::new("user-3", "Elena Rodriguez", false)),
        };
        let frame = encode(&envelope, WireFormat::Cbor).unwrap();
        assert!(matches!(frame, Frame::Binary(_)));
        assert_eq!(decode(&frame).unwrap(), envelope);
    }

    #[test]
    fn malformed_text_is_a_codec_error() {
        let err = decode_text(r#"{"origin": "not-a-uuid", "kind": "typing"}"#).unwrap_err();
        assert!(matches!(err, ChannelError::Codec(_)));
    }
}
