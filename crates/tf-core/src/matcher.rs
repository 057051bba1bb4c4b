//! Core Matching Engine
//!
//! Decides, for a title/channel pair, whether a tile is shown. Every tile of
//! every pass goes through here, so rules are folded and whole-word
//! patterns compiled once per [`FilterState`] rather than per tile.

use regex::{Regex, RegexBuilder};

use crate::error::{FilterError, Result};
use crate::types::{ChannelFilterType, FilterState, MatchType, Mode, VideoDescriptor};

// =============================================================================
// Matcher
// =============================================================================

/// Rule set prepared for repeated matching.
#[derive(Debug, Clone)]
pub struct Matcher {
    /// Case-folded, empty entries removed
    keywords: Vec<String>,
    /// Case-folded, empty entries removed
    channels: Vec<String>,
    /// One pattern per keyword, only for `MatchType::WholeWord`
    word_patterns: Vec<Regex>,
    has_rules: bool,
    mode: Mode,
    match_type: MatchType,
    channel_filter_type: ChannelFilterType,
}

impl Matcher {
    /// Prepare a matcher for the given state.
    pub fn new(state: &FilterState) -> Result<Self> {
        let keywords = fold_rules(&state.keywords);
        let channels = fold_rules(&state.channels);
        // A list holding only empty strings counts as unconfigured.
        let has_rules = !keywords.is_empty() || !channels.is_empty();

        let word_patterns = if state.match_type == MatchType::WholeWord {
            keywords
                .iter()
                .map(|keyword| build_word_pattern(keyword))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            keywords,
            channels,
            word_patterns,
            has_rules,
            mode: state.mode,
            match_type: state.match_type,
            channel_filter_type: state.channel_filter_type,
        })
    }

    /// True if any keyword matches the space-joined `title channel` text.
    pub fn matches_keyword(&self, title: &str, channel: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }

        let text = format!("{} {}", title, channel).to_lowercase();
        match self.match_type {
            MatchType::Contains => self.keywords.iter().any(|k| text.contains(k.as_str())),
            MatchType::Exact => self.keywords.iter().any(|k| text == *k),
            MatchType::WholeWord => self.word_patterns.iter().any(|p| p.is_match(&text)),
        }
    }

    /// True if any configured channel name is contained in `channel`,
    /// inverted when the channel filter type is `Exclude`.
    pub fn matches_channel(&self, channel: &str) -> bool {
        if self.channels.is_empty() {
            return false;
        }

        let channel = channel.to_lowercase();
        let found = self.channels.iter().any(|c| channel.contains(c.as_str()));
        match self.channel_filter_type {
            ChannelFilterType::Include => found,
            ChannelFilterType::Exclude => !found,
        }
    }

    /// Final visibility decision for one tile.
    pub fn should_show(&self, title: &str, channel: &str) -> bool {
        if !self.has_rules {
            return true;
        }

        let has_match = self.matches_keyword(title, channel) || self.matches_channel(channel);
        match self.mode {
            Mode::Include => has_match,
            Mode::Exclude => !has_match,
        }
    }

    /// Decision for an extracted descriptor.
    #[inline]
    pub fn should_show_video<N>(&self, video: &VideoDescriptor<N>) -> bool {
        self.should_show(&video.title, &video.channel)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn channel_filter_type(&self) -> ChannelFilterType {
        self.channel_filter_type
    }

    /// Folded keyword terms.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Folded channel terms.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }
}

// =============================================================================
// Stateless helpers
// =============================================================================

/// One-shot keyword test. A rule set that fails to compile matches nothing.
pub fn matches_keyword(title: &str, channel: &str, state: &FilterState) -> bool {
    Matcher::new(state)
        .map(|m| m.matches_keyword(title, channel))
        .unwrap_or(false)
}

/// One-shot channel test.
pub fn matches_channel(channel: &str, state: &FilterState) -> bool {
    Matcher::new(state)
        .map(|m| m.matches_channel(channel))
        .unwrap_or(false)
}

/// One-shot visibility decision. Shows the video if the rules cannot be
/// prepared.
pub fn should_show<N>(video: &VideoDescriptor<N>, state: &FilterState) -> bool {
    match Matcher::new(state) {
        Ok(matcher) => matcher.should_show_video(video),
        Err(e) => {
            log::warn!("showing video, rules unusable: {}", e);
            true
        }
    }
}

fn fold_rules(rules: &[String]) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| !rule.trim().is_empty())
        .map(|rule| rule.to_lowercase())
        .collect()
}

fn build_word_pattern(keyword: &str) -> Result<Regex> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword)))
        .case_insensitive(true)
        .build()
        .map_err(|source| FilterError::Pattern {
            keyword: keyword.to_string(),
            source,
        })
}
