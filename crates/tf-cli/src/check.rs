use serde::Serialize;

use tf_core::dom::PageFixture;
use tf_core::scanner::extract_video_descriptor;
use tf_core::{DomPort, EngineConfig, FilterContext, PassStats, SettingsRecord, SystemClock};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileReport {
    pub title: String,
    pub channel: String,
    pub shown: bool,
    /// Title markup, when the pass highlighted it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub tiles: Vec<TileReport>,
    pub shelves_hidden: usize,
    pub batches: usize,
    /// Set when the rules could not be prepared and the page was left visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_error: Option<String>,
}

/// Run one full pass of `record` over a fixture page.
pub fn check_page(record: &SettingsRecord, page: &PageFixture, config: EngineConfig) -> CheckReport {
    let built = page.build();
    let mut ctx = FilterContext::new(built.dom, SystemClock::default(), config);
    let rules_error = ctx.replace_state(record.to_state()).err().map(|e| e.to_string());
    let stats: PassStats = ctx.run_pass();
    log::debug!("pass finished: {:?}", stats);

    let dom = ctx.dom();
    let selectors = &ctx.config().selectors;
    let class = &ctx.config().markers.highlight_class;
    let tiles = built
        .tiles
        .iter()
        .map(|tile| {
            let video = extract_video_descriptor(dom, tile, selectors);
            let highlighted = video
                .title_handle
                .as_ref()
                .and_then(|handle| dom.markup(handle))
                .filter(|markup| markup.contains(class.as_str()));
            TileReport {
                title: video.title,
                channel: video.channel,
                shown: !dom.is_hidden(*tile),
                highlighted,
            }
        })
        .collect();

    CheckReport {
        tiles,
        shelves_hidden: stats.shelves_hidden,
        batches: stats.batches,
        rules_error,
    }
}
