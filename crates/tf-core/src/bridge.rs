//! Message Bridge wire types
//!
//! The extension's control surface sends one message kind, a settings
//! refresh carrying an optional partial patch. Decoding lives here; the
//! owning [`FilterContext`](crate::context::FilterContext) merges the patch
//! and re-filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FilterError, Result};
use crate::settings::SettingsPatch;
use crate::types::FilterState;

pub const REFRESH_FILTER: &str = "refreshFilter";
/// Tag used by older popup builds
pub const LEGACY_SETTINGS_UPDATED: &str = "SETTINGS_UPDATED";

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    RefreshFilter { settings: Option<SettingsPatch> },
}

impl InboundMessage {
    /// Decode `{ type, settings? }`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| FilterError::UnknownMessage("<missing>".to_string()))?;

        match kind {
            REFRESH_FILTER | LEGACY_SETTINGS_UPDATED => {
                let settings = match value.get("settings") {
                    None | Some(Value::Null) => None,
                    Some(patch) => Some(SettingsPatch::deserialize(patch)?),
                };
                Ok(Self::RefreshFilter { settings })
            }
            other => Err(FilterError::UnknownMessage(other.to_string())),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }
}

/// Outbound message shape, for the TypeScript side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct RefreshMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
}

/// Acknowledgement sent back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RefreshResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: &FilterError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// New state: the current one with the patch's fields overwritten.
pub fn merge_patch(current: &FilterState, patch: Option<&SettingsPatch>) -> FilterState {
    let mut next = current.clone();
    if let Some(patch) = patch {
        patch.apply(&mut next);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Mode;

    #[test]
    fn test_decode_refresh_with_patch() {
        let msg = InboundMessage::from_json(
            r#"{ "type": "refreshFilter", "settings": { "keywords": [{ "color": "red", "value": "rust" }] } }"#,
        )
        .unwrap();
        let InboundMessage::RefreshFilter { settings } = msg;
        assert_eq!(settings.unwrap().keywords.unwrap()[0].value, "rust");
    }

    #[test]
    fn test_decode_refresh_without_patch() {
        let msg = InboundMessage::from_json(r#"{ "type": "refreshFilter" }"#).unwrap();
        assert_eq!(msg, InboundMessage::RefreshFilter { settings: None });
    }

    #[test]
    fn test_decode_legacy_tag() {
        let msg = InboundMessage::from_json(
            r#"{ "type": "SETTINGS_UPDATED", "settings": { "keywords": ["a"], "enabled": true } }"#,
        )
        .unwrap();
        assert!(matches!(msg, InboundMessage::RefreshFilter { settings: Some(_) }));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = InboundMessage::from_json(r#"{ "type": "ping" }"#).unwrap_err();
        assert!(matches!(err, FilterError::UnknownMessage(ref t) if t == "ping"));
        assert!(InboundMessage::from_json(r#"{ "settings": {} }"#).is_err());
    }

    #[test]
    fn test_bad_patch_rejected() {
        let err = InboundMessage::from_json(r#"{ "type": "refreshFilter", "settings": { "mode": 3 } }"#)
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidSettings(_)));
    }

    #[test]
    fn test_merge_patch_is_shallow() {
        let current = FilterState {
            keywords: vec!["a".to_string()],
            ..FilterState::default()
        };
        let patch = SettingsPatch {
            mode: Some(Mode::Exclude),
            ..SettingsPatch::default()
        };
        let next = merge_patch(&current, Some(&patch));
        assert_eq!(next.keywords, vec!["a"]);
        assert_eq!(next.mode, Mode::Exclude);
        assert_eq!(merge_patch(&current, None), current);
    }

    #[test]
    fn test_response_wire_shape() {
        assert_eq!(serde_json::to_string(&RefreshResponse::ok()).unwrap(), r#"{"success":true}"#);
        let failed = RefreshResponse::failed(&FilterError::UnknownMessage("x".to_string()));
        assert_eq!(failed.error.as_deref(), Some("Unknown message type: x"));
    }
}
