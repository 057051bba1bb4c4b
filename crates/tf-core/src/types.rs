//! Core type definitions for TubeFilter
//!
//! These types are shared by the matcher, the render controller and the
//! settings wire format.

use serde::{Deserialize, Serialize};

// =============================================================================
// Filter Mode
// =============================================================================

/// Whether a rule match shows or hides a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only videos matching a rule are shown
    #[default]
    Include,
    /// Videos matching a rule are hidden
    Exclude,
}

// =============================================================================
// Keyword Match Type
// =============================================================================

/// How a keyword is compared against the `title channel` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    /// Substring test
    #[default]
    Contains,
    /// Full-string equality
    Exact,
    /// Word-boundary test with the keyword taken literally
    WholeWord,
}

// =============================================================================
// Channel Filter Type
// =============================================================================

/// Polarity of the channel comparison, independent of [`Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum ChannelFilterType {
    #[default]
    Include,
    /// Inverts the channel match result
    Exclude,
}

// =============================================================================
// Filter State
// =============================================================================

/// The live rule set. Replaced wholesale on every settings update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Keyword rules, in display order
    pub keywords: Vec<String>,
    /// Channel rules, in display order
    pub channels: Vec<String>,
    pub mode: Mode,
    pub match_type: MatchType,
    pub channel_filter_type: ChannelFilterType,
    /// Global kill switch: show everything, highlight nothing
    pub disabled: bool,
}

impl FilterState {
    /// True when neither keyword nor channel rules are configured.
    #[inline]
    pub fn has_no_rules(&self) -> bool {
        self.keywords.is_empty() && self.channels.is_empty()
    }
}

// =============================================================================
// Video Descriptor
// =============================================================================

/// Title and channel extracted from one tile during a pass.
///
/// Fields default to empty when the markup is missing so that matching can
/// fail open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDescriptor<N> {
    pub title: String,
    pub channel: String,
    pub title_handle: Option<N>,
    pub channel_handle: Option<N>,
}

impl<N> VideoDescriptor<N> {
    /// Descriptor carrying only text, with no element handles.
    pub fn from_text(title: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            channel: channel.into(),
            title_handle: None,
            channel_handle: None,
        }
    }
}

impl<N> Default for VideoDescriptor<N> {
    fn default() -> Self {
        Self {
            title: String::new(),
            channel: String::new(),
            title_handle: None,
            channel_handle: None,
        }
    }
}

// =============================================================================
// Pass Statistics
// =============================================================================

/// Counters collected over one complete filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassStats {
    pub scanned: usize,
    pub shown: usize,
    pub hidden: usize,
    pub highlighted: usize,
    pub shelves_hidden: usize,
    pub batches: usize,
}
