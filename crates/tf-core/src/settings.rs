//! Settings Store Adapter
//!
//! Wire format of the `filterSettings` record kept in the extension's
//! synchronized key-value store, partial patches of it, and the store
//! abstraction the engine reads it through.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::types::{ChannelFilterType, FilterState, MatchType, Mode};

/// Key of the settings record in the store.
pub const STORAGE_KEY: &str = "filterSettings";

// =============================================================================
// Wire Types
// =============================================================================

/// A keyword or channel entry as the popup stores it.
///
/// Bare strings, as written by older popup versions, decode with an empty
/// color.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(from = "TagRepr")]
pub struct TagInfo {
    pub color: String,
    pub value: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Tagged {
        #[serde(default)]
        color: String,
        value: String,
    },
    Plain(String),
}

impl From<TagRepr> for TagInfo {
    fn from(repr: TagRepr) -> Self {
        match repr {
            TagRepr::Tagged { color, value } => Self { color, value },
            TagRepr::Plain(value) => Self {
                color: String::new(),
                value,
            },
        }
    }
}

/// The stored settings record. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    #[serde(default)]
    pub keywords: Vec<TagInfo>,
    #[serde(default)]
    pub channels: Vec<TagInfo>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub channel_filter_type: ChannelFilterType,
    /// Older records carry `enabled` instead of `disabled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl SettingsRecord {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Normalised engine state for this record.
    pub fn to_state(&self) -> FilterState {
        FilterState {
            keywords: normalize_rules(&self.keywords),
            channels: normalize_rules(&self.channels),
            mode: self.mode,
            match_type: self.match_type,
            channel_filter_type: self.channel_filter_type,
            disabled: self.disabled || self.enabled == Some(false),
        }
    }

    /// Record for a state. Colors are not part of the state and come back
    /// empty.
    pub fn from_state(state: &FilterState) -> Self {
        let tags = |rules: &[String]| {
            rules
                .iter()
                .map(|value| TagInfo {
                    color: String::new(),
                    value: value.clone(),
                })
                .collect()
        };
        Self {
            keywords: tags(&state.keywords),
            channels: tags(&state.channels),
            disabled: state.disabled,
            mode: state.mode,
            match_type: state.match_type,
            channel_filter_type: state.channel_filter_type,
            enabled: None,
        }
    }
}

/// Partial settings carried by a refresh message. Present fields overwrite.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<TagInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<TagInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_filter_type: Option<ChannelFilterType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl SettingsPatch {
    /// Shallow merge into `state`, field by field.
    pub fn apply(&self, state: &mut FilterState) {
        if let Some(keywords) = &self.keywords {
            state.keywords = normalize_rules(keywords);
        }
        if let Some(channels) = &self.channels {
            state.channels = normalize_rules(channels);
        }
        if let Some(enabled) = self.enabled {
            state.disabled = !enabled;
        }
        if let Some(disabled) = self.disabled {
            state.disabled = disabled;
        }
        if let Some(mode) = self.mode {
            state.mode = mode;
        }
        if let Some(match_type) = self.match_type {
            state.match_type = match_type;
        }
        if let Some(channel_filter_type) = self.channel_filter_type {
            state.channel_filter_type = channel_filter_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Trim, drop empties and case-insensitive duplicates, keep order.
fn normalize_rules(tags: &[TagInfo]) -> Vec<String> {
    let mut seen = Vec::<String>::with_capacity(tags.len());
    let mut out = Vec::with_capacity(tags.len());
    for tag in tags {
        let value = tag.value.trim();
        if value.is_empty() {
            continue;
        }
        let folded = value.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        out.push(value.to_string());
    }
    out
}

// =============================================================================
// Store
// =============================================================================

/// The external synchronized key-value store holding the record.
pub trait SettingsStore {
    /// Read the record; `None` if it was never written.
    fn load(&self) -> Result<Option<SettingsRecord>>;

    fn save(&mut self, record: &SettingsRecord) -> Result<()>;
}

/// Load the engine state, falling back to defaults on a missing or
/// unreadable record.
pub fn load_state<S: SettingsStore + ?Sized>(store: &S) -> FilterState {
    match store.load() {
        Ok(Some(record)) => record.to_state(),
        Ok(None) => FilterState::default(),
        Err(e) => {
            log::warn!("using default settings: {}", e);
            FilterState::default()
        }
    }
}

/// Store backed by a map of JSON values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: &SettingsRecord) -> Result<Self> {
        let mut store = Self::new();
        store.save(record)?;
        Ok(store)
    }

    /// Put an arbitrary value under `key`, bypassing validation.
    pub fn insert_raw(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<SettingsRecord>> {
        match self.values.get(STORAGE_KEY) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| FilterError::Store(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&mut self, record: &SettingsRecord) -> Result<()> {
        let value = serde_json::to_value(record).map_err(|e| FilterError::Store(e.to_string()))?;
        self.values.insert(STORAGE_KEY.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_popup_record() {
        let record = SettingsRecord::from_json(
            r#"{
                "keywords": [{ "color": "red", "value": "React" }, { "color": "blue", "value": " rust " }],
                "channels": [{ "color": "gold", "value": "Acme" }],
                "disabled": false,
                "mode": "exclude"
            }"#,
        )
        .unwrap();
        let state = record.to_state();
        assert_eq!(state.keywords, vec!["React", "rust"]);
        assert_eq!(state.channels, vec!["Acme"]);
        assert_eq!(state.mode, Mode::Exclude);
        assert_eq!(state.match_type, MatchType::Contains);
    }

    #[test]
    fn test_decode_tolerates_ui_violations() {
        let record = SettingsRecord::from_json(
            r#"{ "keywords": ["go", "", "  ", "Go", { "value": "rust" }], "matchType": "wholeWord" }"#,
        )
        .unwrap();
        let state = record.to_state();
        assert_eq!(state.keywords, vec!["go", "rust"]);
        assert_eq!(state.match_type, MatchType::WholeWord);
    }

    #[test]
    fn test_legacy_enabled_flag() {
        let record = SettingsRecord::from_json(r#"{ "keywords": [], "enabled": false }"#).unwrap();
        assert!(record.to_state().disabled);
    }

    #[test]
    fn test_invalid_mode_is_error() {
        let err = SettingsRecord::from_json(r#"{ "mode": "sometimes" }"#).unwrap_err();
        assert!(matches!(err, FilterError::InvalidSettings(_)));
    }

    #[test]
    fn test_patch_overwrites_present_fields_only() {
        let mut state = FilterState {
            keywords: vec!["a".to_string()],
            channels: vec!["b".to_string()],
            ..FilterState::default()
        };
        let patch: SettingsPatch =
            serde_json::from_value(json!({ "channels": [], "mode": "exclude" })).unwrap();
        patch.apply(&mut state);

        assert_eq!(state.keywords, vec!["a"]);
        assert!(state.channels.is_empty());
        assert_eq!(state.mode, Mode::Exclude);
        assert!(!patch.is_empty());
        assert!(SettingsPatch::default().is_empty());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(load_state(&store), FilterState::default());

        let state = FilterState {
            keywords: vec!["react".to_string()],
            disabled: true,
            ..FilterState::default()
        };
        store.save(&SettingsRecord::from_state(&state)).unwrap();
        assert_eq!(load_state(&store), state);
    }

    #[test]
    fn test_corrupt_store_falls_back_to_default() {
        let mut store = MemoryStore::new();
        store.insert_raw(STORAGE_KEY, json!({ "keywords": 42 }));
        assert!(matches!(store.load(), Err(FilterError::Store(_))));
        assert_eq!(load_state(&store), FilterState::default());
    }
}
