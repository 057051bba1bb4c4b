//! Render Controller
//!
//! Applies visibility and highlight decisions to tiles in fixed-size
//! batches, then sweeps shelf sections. Every write is guarded by a
//! comparison with the current DOM state, so repeating a pass with the same
//! rules writes nothing.

use std::borrow::Cow;

use crate::config::EngineConfig;
use crate::dom::DomPort;
use crate::highlight::{escape_html, highlight_spans};
use crate::matcher::Matcher;
use crate::scanner::extract_video_descriptor;
use crate::types::{ChannelFilterType, Mode, PassStats};

// =============================================================================
// Rules
// =============================================================================

/// The decision source for a batch, read fresh at batch start.
#[derive(Debug, Clone, Copy)]
pub enum Rules<'a> {
    /// Kill switch: restore everything, highlight nothing
    Disabled,
    /// Rules could not be prepared: show every tile, highlight nothing
    Unusable,
    Active(&'a Matcher),
}

/// Progress of an incremental pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// More batches remain; yield to the host and call again
    Pending,
    Complete(PassStats),
}

// =============================================================================
// Filter Pass
// =============================================================================

/// An in-flight pass over a fixed list of tiles.
#[derive(Debug, Clone)]
pub struct FilterPass<N> {
    tiles: Vec<N>,
    cursor: usize,
    stats: PassStats,
}

impl<N: Clone> FilterPass<N> {
    pub fn new(tiles: Vec<N>) -> Self {
        let stats = PassStats {
            scanned: tiles.len(),
            ..PassStats::default()
        };
        Self {
            tiles,
            cursor: 0,
            stats,
        }
    }

    /// Tiles not yet processed.
    pub fn remaining(&self) -> usize {
        self.tiles.len() - self.cursor
    }

    /// Process the next batch with the rules current right now.
    ///
    /// Finishes with the shelf sweep once the last batch is done. A
    /// `Disabled` batch restores the whole page and finishes immediately.
    pub fn run_batch<D>(&mut self, dom: &mut D, config: &EngineConfig, rules: Rules<'_>) -> PassStatus
    where
        D: DomPort<Node = N>,
    {
        if let Rules::Disabled = rules {
            restore_all(dom, config);
            self.cursor = self.tiles.len();
            return PassStatus::Complete(self.stats);
        }

        let end = (self.cursor + config.batch_size.max(1)).min(self.tiles.len());
        for tile in &self.tiles[self.cursor..end] {
            let outcome = apply_tile(dom, tile, config, rules);
            if outcome.shown {
                self.stats.shown += 1;
            } else {
                self.stats.hidden += 1;
            }
            if outcome.highlighted {
                self.stats.highlighted += 1;
            }
        }
        self.cursor = end;
        self.stats.batches += 1;
        log::debug!("batch {} done, {} tiles left", self.stats.batches, self.remaining());

        if self.remaining() > 0 {
            return PassStatus::Pending;
        }

        self.stats.shelves_hidden = sweep_shelves(dom, config);
        PassStatus::Complete(self.stats)
    }
}

/// Run a whole pass over `tiles` without yielding between batches.
pub fn apply_filter_pass<D: DomPort>(
    dom: &mut D,
    tiles: Vec<D::Node>,
    config: &EngineConfig,
    rules: Rules<'_>,
) -> PassStats {
    let mut pass = FilterPass::new(tiles);
    loop {
        if let PassStatus::Complete(stats) = pass.run_batch(dom, config, rules) {
            return stats;
        }
    }
}

// =============================================================================
// Per-tile decisions
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileOutcome {
    shown: bool,
    highlighted: bool,
}

fn apply_tile<D: DomPort>(dom: &mut D, tile: &D::Node, config: &EngineConfig, rules: Rules<'_>) -> TileOutcome {
    let hidden_attr = config.markers.hidden_tile_attr.as_str();
    let video = extract_video_descriptor(dom, tile, &config.selectors);

    let matcher = match rules {
        Rules::Active(matcher) => matcher,
        Rules::Disabled | Rules::Unusable => {
            set_tile_hidden(dom, tile, hidden_attr, false);
            return TileOutcome {
                shown: true,
                highlighted: false,
            };
        }
    };

    // Nothing to judge: a shell whose text has not been filled in yet.
    if video.title_handle.is_none() && video.channel_handle.is_none() {
        set_tile_hidden(dom, tile, hidden_attr, false);
        return TileOutcome {
            shown: true,
            highlighted: false,
        };
    }

    if !matcher.should_show_video(&video) {
        set_tile_hidden(dom, tile, hidden_attr, true);
        return TileOutcome {
            shown: false,
            highlighted: false,
        };
    }

    set_tile_hidden(dom, tile, hidden_attr, false);

    let class = config.markers.highlight_class.as_str();
    let mut highlighted = false;
    if let Some(handle) = &video.title_handle {
        let terms = highlight_terms(matcher, false);
        highlighted |= refresh_highlight(dom, handle, &terms, class);
    }
    if let Some(handle) = &video.channel_handle {
        let terms = highlight_terms(matcher, true);
        highlighted |= refresh_highlight(dom, handle, &terms, class);
    }

    TileOutcome {
        shown: true,
        highlighted,
    }
}

/// Set or clear the engine's hidden marker. Tiles without the marker are
/// never touched when shown, so elements the page hid itself stay hidden.
fn set_tile_hidden<D: DomPort>(dom: &mut D, tile: &D::Node, attr: &str, hidden: bool) {
    let marked = dom.has_attr(tile, attr);
    if hidden && !marked {
        dom.set_attr(tile, attr, "true");
        dom.set_hidden(tile, true);
    } else if !hidden && marked {
        dom.remove_attr(tile, attr);
        dom.set_hidden(tile, false);
    }
}

/// Terms highlighted on a title, or on a channel name.
///
/// Exclude mode hides matches rather than surfacing them, so it gets none.
fn highlight_terms(matcher: &Matcher, for_channel: bool) -> Vec<&str> {
    if matcher.mode() == Mode::Exclude {
        return Vec::new();
    }
    let mut terms: Vec<&str> = matcher.keywords().iter().map(String::as_str).collect();
    if for_channel && matcher.channel_filter_type() == ChannelFilterType::Include {
        terms.extend(matcher.channels().iter().map(String::as_str));
    }
    terms
}

/// Bring one text element's highlight markup in line with `terms`.
///
/// Returns true if the element ends up highlighted. Writes only when the
/// wanted markup differs from what is there.
fn refresh_highlight<D: DomPort>(dom: &mut D, node: &D::Node, terms: &[&str], class: &str) -> bool {
    let Some(text) = dom.text(node) else {
        return false;
    };
    let current = dom.markup(node).unwrap_or_default();

    match highlight_spans(&text, terms, class) {
        Cow::Owned(markup) => {
            if current != markup {
                dom.set_markup(node, &markup);
            }
            true
        }
        Cow::Borrowed(_) => {
            if carries_highlight(&current, class) && current != escape_html(&text) {
                dom.set_text(node, &text);
            }
            false
        }
    }
}

fn carries_highlight(markup: &str, class: &str) -> bool {
    markup.contains(&format!("class=\"{}\"", class))
}

// =============================================================================
// Shelves and restore
// =============================================================================

/// Hide each marked shelf with no visible tile left; restore the rest.
///
/// Only shelves whose label contains a configured term take part. Returns
/// the number of shelves left hidden.
pub fn sweep_shelves<D: DomPort>(dom: &mut D, config: &EngineConfig) -> usize {
    let selectors = &config.selectors;
    let tile_attr = config.markers.hidden_tile_attr.as_str();
    let section_attr = config.markers.hidden_section_attr.as_str();
    let terms: Vec<String> = selectors
        .shelf_terms
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    if terms.is_empty() {
        return 0;
    }

    let mut hidden = 0;
    for shelf in dom.query_all(&selectors.shelf) {
        let label = dom
            .query_first_within(&shelf, &selectors.shelf_label)
            .and_then(|node| dom.text(&node))
            .unwrap_or_default()
            .to_lowercase();
        if !terms.iter().any(|term| label.contains(term.as_str())) {
            continue;
        }

        let visible = dom
            .query_within(&shelf, &selectors.tile)
            .iter()
            .filter(|tile| !dom.has_attr(tile, tile_attr))
            .count();
        let marked = dom.has_attr(&shelf, section_attr);

        if visible == 0 {
            if !marked {
                dom.set_attr(&shelf, section_attr, "true");
                dom.set_hidden(&shelf, true);
            }
            hidden += 1;
        } else if marked {
            dom.remove_attr(&shelf, section_attr);
            dom.set_hidden(&shelf, false);
        }
    }
    hidden
}

/// Undo everything the engine wrote: hidden tiles, hidden shelves and
/// highlight markup.
pub fn restore_all<D: DomPort>(dom: &mut D, config: &EngineConfig) {
    let markers = &config.markers;

    for tile in dom.query_all(&format!("[{}]", markers.hidden_tile_attr)) {
        dom.remove_attr(&tile, &markers.hidden_tile_attr);
        dom.set_hidden(&tile, false);
    }
    for shelf in dom.query_all(&format!("[{}]", markers.hidden_section_attr)) {
        dom.remove_attr(&shelf, &markers.hidden_section_attr);
        dom.set_hidden(&shelf, false);
    }

    let mut restored = 0usize;
    for tile in dom.query_all(&config.selectors.tile) {
        let video = extract_video_descriptor(dom, &tile, &config.selectors);
        for handle in video.title_handle.iter().chain(video.channel_handle.iter()) {
            if refresh_highlight(dom, handle, &[], &markers.highlight_class) {
                restored += 1;
            }
        }
    }
    log::debug!("restored page ({} highlighted elements left)", restored);
}
