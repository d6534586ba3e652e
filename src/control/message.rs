//! Control channel wire types.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

/// Inbound message: `{ "type": "...", "payload": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ControlMessage {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            Error::control_with_context(
                format!("malformed control message: {}", e),
                ErrorContext::new()
                    .with_details(raw.chars().take(200).collect::<String>())
                    .with_source("control_channel"),
            )
        })
    }

    pub fn command(&self) -> ControlCommand {
        ControlCommand::parse(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    SkipWaiting,
    ClearCache,
    GetCacheSize,
    Unknown(String),
}

impl ControlCommand {
    pub const SKIP_WAITING: &'static str = "SKIP_WAITING";
    pub const CLEAR_CACHE: &'static str = "CLEAR_CACHE";
    pub const GET_CACHE_SIZE: &'static str = "GET_CACHE_SIZE";

    pub fn parse(kind: &str) -> Self {
        match kind {
            Self::SKIP_WAITING => ControlCommand::SkipWaiting,
            Self::CLEAR_CACHE => ControlCommand::ClearCache,
            Self::GET_CACHE_SIZE => ControlCommand::GetCacheSize,
            other => ControlCommand::Unknown(other.to_string()),
        }
    }

    /// Whether the command produces a reply.
    pub fn expects_reply(&self) -> bool {
        matches!(self, ControlCommand::ClearCache | ControlCommand::GetCacheSize)
    }
}

/// Outbound reply, one per request that carries a reply port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    Cleared {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    CacheSize {
        size: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl ControlReply {
    pub fn cleared() -> Self {
        ControlReply::Cleared {
            success: true,
            error: None,
        }
    }

    pub fn clear_failed(error: impl Into<String>) -> Self {
        ControlReply::Cleared {
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn size(size: u64) -> Self {
        ControlReply::CacheSize { size, error: None }
    }

    /// Sizing failed; `size` is reported as 0 alongside the error.
    pub fn size_failed(error: impl Into<String>) -> Self {
        ControlReply::CacheSize {
            size: 0,
            error: Some(error.into()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_known_commands() {
        let msg = ControlMessage::from_json(r#"{"type":"CLEAR_CACHE"}"#).unwrap();
        assert_eq!(msg.command(), ControlCommand::ClearCache);
        let msg = ControlMessage::from_json(r#"{"type":"GET_CACHE_SIZE","payload":{}}"#).unwrap();
        assert_eq!(msg.command(), ControlCommand::GetCacheSize);
        assert_eq!(msg.payload, Some(json!({})));
        assert_eq!(
            ControlMessage::new("SKIP_WAITING").command(),
            ControlCommand::SkipWaiting
        );
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let msg = ControlMessage::from_json(r#"{"type":"PING"}"#).unwrap();
        assert_eq!(msg.command(), ControlCommand::Unknown("PING".into()));
        assert!(!msg.command().expects_reply());
    }

    #[test]
    fn test_missing_type_is_a_control_error() {
        let err = ControlMessage::from_json(r#"{"payload":1}"#).unwrap_err();
        assert!(matches!(err, Error::Control { .. }));
    }

    #[test]
    fn test_reply_wire_format() {
        assert_eq!(
            serde_json::to_value(ControlReply::cleared()).unwrap(),
            json!({"success": true})
        );
        assert_eq!(
            serde_json::to_value(ControlReply::clear_failed("disk full")).unwrap(),
            json!({"success": false, "error": "disk full"})
        );
        assert_eq!(ControlReply::size(1024).to_json().unwrap(), r#"{"size":1024}"#);
        assert_eq!(
            serde_json::to_value(ControlReply::size_failed("io")).unwrap(),
            json!({"size": 0, "error": "io"})
        );
    }
}
