//! TubeFilter Core Library
//!
//! This crate provides the filtering engine behind the TubeFilter extension,
//! which hides or shows video tiles on listing pages according to user
//! keyword and channel rules.
//!
//! # Architecture
//!
//! The engine never touches the browser itself. Page access goes through the
//! [`dom::DomPort`] trait, time through [`watcher::Clock`], so every part of a
//! filter cycle runs (and is tested) against the in-memory DOM. The wasm
//! crate supplies the real implementations.
//!
//! # Modules
//!
//! - `types`: FilterState and the rule enums
//! - `config`: selectors, DOM markers, batch size and debounce window
//! - `error`: FilterError
//! - `settings`: stored settings record, patches, store adapter
//! - `matcher`: show/hide decisions
//! - `highlight`: highlight markup for matched text
//! - `dom`: DOM port, mutation records, in-memory DOM and page fixtures
//! - `scanner`: tile discovery and title/channel extraction
//! - `render`: batched visibility/highlight writes and the shelf sweep
//! - `watcher`: mutation debounce state machine and clocks
//! - `bridge`: inbound refresh messages and responses
//! - `context`: the per-page owning context tying it all together

pub mod bridge;
pub mod config;
pub mod context;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod matcher;
pub mod render;
pub mod scanner;
pub mod settings;
pub mod types;
pub mod watcher;

// Re-export commonly used types
pub use bridge::{InboundMessage, RefreshResponse};
pub use config::EngineConfig;
pub use context::FilterContext;
pub use dom::DomPort;
pub use error::{FilterError, Result};
pub use highlight::highlight_spans;
pub use matcher::{matches_channel, matches_keyword, should_show, Matcher};
pub use render::{apply_filter_pass, PassStatus};
pub use settings::{SettingsPatch, SettingsRecord, SettingsStore};
pub use types::{ChannelFilterType, FilterState, MatchType, Mode, PassStats, VideoDescriptor};
pub use watcher::{Clock, ManualClock, SystemClock, WatchDirective};
