//! Engine configuration: DOM selectors, marker names and pass tuning.
//!
//! None of this is user-facing. The defaults describe YouTube's current
//! markup and are overridable for tests and for markup changes.

// =============================================================================
// Selectors
// =============================================================================

/// CSS selectors used to locate tiles, their text and shelf sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Matches one video (or shorts/ad) tile
    pub tile: String,
    /// Primary title selector, looked up inside a tile
    pub title: String,
    /// Tried in order when the primary title selector finds nothing
    pub title_fallbacks: Vec<String>,
    /// Primary channel selector, looked up inside a tile
    pub channel: String,
    /// Tried in order, first non-blank text wins
    pub channel_fallbacks: Vec<String>,
    /// Shelf-like containers grouping several tiles
    pub shelf: String,
    /// Heading element inside a shelf
    pub shelf_label: String,
    /// Label terms that make a shelf eligible for the empty-shelf sweep
    pub shelf_terms: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            tile: [
                "ytd-rich-item-renderer",
                "ytd-video-renderer",
                "ytd-compact-video-renderer",
                "ytd-grid-video-renderer",
                "ytd-reel-item-renderer",
                "ytm-shorts-lockup-view-model",
            ]
            .join(", "),
            title: "#video-title".to_string(),
            title_fallbacks: Vec::new(),
            channel: "ytd-channel-name #text".to_string(),
            channel_fallbacks: vec![
                "#channel-name a".to_string(),
                "#byline a".to_string(),
                ".ytd-channel-name a".to_string(),
                "#text.ytd-channel-name".to_string(),
            ],
            shelf: "ytd-rich-shelf-renderer, ytd-reel-shelf-renderer, ytd-rich-section-renderer"
                .to_string(),
            shelf_label: "#title".to_string(),
            shelf_terms: vec!["Shorts".to_string()],
        }
    }
}

// =============================================================================
// Markers
// =============================================================================

/// Names of the attributes and class the engine leaves in the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerConfig {
    /// Set on tiles this engine hid
    pub hidden_tile_attr: String,
    /// Set on shelves this engine hid
    pub hidden_section_attr: String,
    /// Class of the `<span>` wrapped around highlighted text
    pub highlight_class: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            hidden_tile_attr: "data-tf-hidden".to_string(),
            hidden_section_attr: "data-tf-section-hidden".to_string(),
            highlight_class: "tf-highlight".to_string(),
        }
    }
}

// =============================================================================
// Engine Config
// =============================================================================

pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Everything the filter context needs besides the rules themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub selectors: SelectorConfig,
    pub markers: MarkerConfig,
    /// Tiles processed per scheduling yield
    pub batch_size: usize,
    /// Quiet period before a mutation burst triggers a pass
    pub debounce_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            markers: MarkerConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl EngineConfig {
    pub fn with_selectors(mut self, selectors: SelectorConfig) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_markers(mut self, markers: MarkerConfig) -> Self {
        self.markers = markers;
        self
    }

    /// A batch size of zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }
}
