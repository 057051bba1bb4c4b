//! Filter Context
//!
//! The single owning object for one page lifetime: DOM port, clock, live
//! [`FilterState`] with its prepared [`Matcher`], the mutation watcher and
//! the in-flight pass. Hosts drive it from three events: animation frames
//! ([`FilterContext::step`]), observer callbacks and timer expiry
//! ([`FilterContext::on_mutations`], [`FilterContext::on_timer`]) and
//! refresh messages ([`FilterContext::handle_message`]).

use serde_json::Value;

use crate::bridge::{merge_patch, InboundMessage, RefreshResponse};
use crate::config::EngineConfig;
use crate::dom::{DomPort, MutationRecord};
use crate::error::Result;
use crate::matcher::Matcher;
use crate::render::{restore_all, FilterPass, PassStatus, Rules};
use crate::scanner::scan_tiles;
use crate::settings::{load_state, SettingsStore};
use crate::types::{FilterState, PassStats};
use crate::watcher::{Clock, MutationWatcher, WatchDirective};

pub struct FilterContext<D: DomPort, C: Clock> {
    dom: D,
    clock: C,
    config: EngineConfig,
    state: FilterState,
    /// `None` when the current state's rules could not be prepared
    matcher: Option<Matcher>,
    watcher: MutationWatcher,
    pass: Option<FilterPass<D::Node>>,
    last_stats: Option<PassStats>,
}

impl<D: DomPort, C: Clock> FilterContext<D, C> {
    /// Context with default settings and no pass in flight.
    pub fn new(dom: D, clock: C, config: EngineConfig) -> Self {
        let watcher = MutationWatcher::new(config.debounce_ms);
        let state = FilterState::default();
        let matcher = Matcher::new(&state).ok();
        Self {
            dom,
            clock,
            config,
            state,
            matcher,
            watcher,
            pass: None,
            last_stats: None,
        }
    }

    /// Replace the live state with whatever the store holds.
    pub fn load_settings<S: SettingsStore + ?Sized>(&mut self, store: &S) {
        if let Err(e) = self.replace_state(load_state(store)) {
            log::warn!("stored rules unusable, showing everything: {}", e);
        }
    }

    /// Swap in a new state wholesale and prepare its matcher.
    ///
    /// On error the state is still installed but every tile is shown
    /// unhighlighted until a usable state arrives.
    pub fn replace_state(&mut self, state: FilterState) -> Result<()> {
        log::info!(
            "settings replaced: {} keywords, {} channels, mode {:?}, disabled {}",
            state.keywords.len(),
            state.channels.len(),
            state.mode,
            state.disabled
        );
        let prepared = Matcher::new(&state);
        self.state = state;
        match prepared {
            Ok(matcher) => {
                self.matcher = Some(matcher);
                Ok(())
            }
            Err(e) => {
                self.matcher = None;
                Err(e)
            }
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn watcher(&self) -> &MutationWatcher {
        &self.watcher
    }

    /// Stats of the most recently completed pass.
    pub fn last_stats(&self) -> Option<PassStats> {
        self.last_stats
    }

    pub fn is_pass_pending(&self) -> bool {
        self.pass.is_some()
    }

    // =========================================================================
    // Passes
    // =========================================================================

    /// Begin a full pass, superseding any pass still in flight.
    ///
    /// A full pass covers every tile, so a pending debounce is dropped. When
    /// disabled, the page is restored synchronously and no pass is left
    /// pending. Otherwise the host should call [`Self::step`] once per
    /// animation frame until it reports completion.
    pub fn start_pass(&mut self) -> PassStatus {
        self.watcher.reset();
        if self.state.disabled {
            self.pass = None;
            restore_all(&mut self.dom, &self.config);
            let stats = PassStats::default();
            self.last_stats = Some(stats);
            log::debug!("filter disabled, page restored");
            return PassStatus::Complete(stats);
        }

        let tiles = scan_tiles(&self.dom, &self.config.selectors);
        log::debug!("pass started over {} tiles", tiles.len());
        self.pass = Some(FilterPass::new(tiles));
        PassStatus::Pending
    }

    /// Run the next batch of the in-flight pass with the current rules.
    ///
    /// Returns `None` when no pass is in flight.
    pub fn step(&mut self) -> Option<PassStatus> {
        let mut pass = self.pass.take()?;

        let rules = if self.state.disabled {
            Rules::Disabled
        } else {
            match &self.matcher {
                Some(matcher) => Rules::Active(matcher),
                None => Rules::Unusable,
            }
        };
        let status = pass.run_batch(&mut self.dom, &self.config, rules);

        match status {
            PassStatus::Pending => self.pass = Some(pass),
            PassStatus::Complete(stats) => {
                log::debug!(
                    "pass complete: {} shown, {} hidden, {} highlighted, {} shelves hidden",
                    stats.shown,
                    stats.hidden,
                    stats.highlighted,
                    stats.shelves_hidden
                );
                self.last_stats = Some(stats);
            }
        }
        Some(status)
    }

    /// Start a pass and run it to completion without yielding.
    pub fn run_pass(&mut self) -> PassStats {
        if let PassStatus::Complete(stats) = self.start_pass() {
            return stats;
        }
        loop {
            match self.step() {
                Some(PassStatus::Pending) => continue,
                Some(PassStatus::Complete(stats)) => return stats,
                None => return self.last_stats.unwrap_or_default(),
            }
        }
    }

    // =========================================================================
    // Mutation watching
    // =========================================================================

    /// Feed observer records; returns what to do with the debounce timer.
    pub fn on_mutations(&mut self, records: &[MutationRecord<D::Node>]) -> WatchDirective {
        let now = self.clock.now_ms();
        self.watcher
            .observe(&self.dom, records, &self.config.selectors.tile, now)
    }

    /// Debounce timer expired. Starts a pass when the quiet period is over.
    pub fn on_timer(&mut self) -> WatchDirective {
        let directive = self.watcher.on_timer(self.clock.now_ms());
        if directive == WatchDirective::Fire {
            self.start_pass();
        }
        directive
    }

    // =========================================================================
    // Message bridge
    // =========================================================================

    /// Handle an inbound message: merge its patch, then start a fresh pass.
    ///
    /// Never fails across the boundary; problems come back in the response.
    pub fn handle_message(&mut self, message: &Value) -> RefreshResponse {
        let InboundMessage::RefreshFilter { settings } = match InboundMessage::from_value(message) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("rejected message: {}", e);
                return RefreshResponse::failed(&e);
            }
        };

        let next = merge_patch(&self.state, settings.as_ref());
        let prepared = self.replace_state(next);
        self.start_pass();

        match prepared {
            Ok(()) => RefreshResponse::ok(),
            Err(e) => {
                log::warn!("refreshed rules unusable, showing everything: {}", e);
                RefreshResponse::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{add_tile, MemoryDom, PageFixture, TileFixture};
    use crate::settings::{MemoryStore, SettingsRecord};
    use crate::types::Mode;
    use crate::watcher::ManualClock;
    use serde_json::json;

    fn context(titles: &[&str]) -> FilterContext<MemoryDom, ManualClock> {
        let built = PageFixture {
            tiles: titles.iter().map(|t| TileFixture::new(t, "Channel")).collect(),
            shelves: Vec::new(),
        }
        .build();
        FilterContext::new(built.dom, ManualClock::new(), EngineConfig::default())
    }

    fn hidden_titles(ctx: &FilterContext<MemoryDom, ManualClock>) -> Vec<String> {
        let dom = ctx.dom();
        dom.query_all("[data-tf-hidden]")
            .iter()
            .filter_map(|tile| dom.query_first_within(tile, "#video-title"))
            .filter_map(|title| dom.text(&title))
            .collect()
    }

    #[test]
    fn test_load_settings_from_store() {
        let mut ctx = context(&["Learning React", "Cooking Pasta"]);
        let record = SettingsRecord::from_json(r#"{ "keywords": [{ "color": "red", "value": "react" }] }"#).unwrap();
        ctx.load_settings(&MemoryStore::with_record(&record).unwrap());

        assert_eq!(ctx.state().keywords, vec!["react"]);
        ctx.run_pass();
        assert_eq!(hidden_titles(&ctx), vec!["Cooking Pasta"]);
    }

    #[test]
    fn test_message_merges_and_refilters() {
        let mut ctx = context(&["Learning React", "Cooking Pasta"]);
        let response = ctx.handle_message(&json!({
            "type": "refreshFilter",
            "settings": { "keywords": [{ "color": "red", "value": "react" }], "mode": "exclude" }
        }));
        assert!(response.success);
        assert!(ctx.is_pass_pending());

        while let Some(PassStatus::Pending) = ctx.step() {}
        assert_eq!(hidden_titles(&ctx), vec!["Learning React"]);
    }

    #[test]
    fn test_unknown_message_reports_failure() {
        let mut ctx = context(&["A"]);
        let response = ctx.handle_message(&json!({ "type": "nope" }));
        assert!(!response.success);
        assert!(!ctx.is_pass_pending());
    }

    #[test]
    fn test_refresh_without_patch_still_refilters() {
        let mut ctx = context(&["A"]);
        assert!(ctx.handle_message(&json!({ "type": "refreshFilter" })).success);
        assert!(ctx.is_pass_pending());
    }

    #[test]
    fn test_new_pass_supersedes_in_flight_pass() {
        let titles: Vec<String> = (0..30).map(|i| format!("item {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let mut ctx = context(&refs);
        ctx.replace_state(FilterState {
            keywords: vec!["nothing".to_string()],
            ..FilterState::default()
        })
        .unwrap();

        ctx.start_pass();
        ctx.step();
        assert_eq!(hidden_titles(&ctx).len(), 10);

        ctx.handle_message(&json!({ "type": "refreshFilter", "settings": { "keywords": ["item"] } }));
        let stats = loop {
            match ctx.step() {
                Some(PassStatus::Complete(stats)) => break stats,
                Some(PassStatus::Pending) => {}
                None => panic!("pass vanished"),
            }
        };
        assert_eq!(stats.scanned, 30);
        assert!(hidden_titles(&ctx).is_empty());
    }

    #[test]
    fn test_disable_mid_pass_restores_on_next_batch() {
        let titles: Vec<String> = (0..30).map(|i| format!("item {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let mut ctx = context(&refs);
        ctx.replace_state(FilterState {
            keywords: vec!["nothing".to_string()],
            ..FilterState::default()
        })
        .unwrap();

        ctx.start_pass();
        ctx.step();
        let mut disabled = ctx.state().clone();
        disabled.disabled = true;
        ctx.replace_state(disabled).unwrap();

        assert!(matches!(ctx.step(), Some(PassStatus::Complete(_))));
        assert!(hidden_titles(&ctx).is_empty());
        assert_eq!(ctx.step(), None);
    }

    #[test]
    fn test_disable_then_enable_rederives_from_rules() {
        let mut ctx = context(&["Learning React", "Cooking Pasta"]);
        ctx.handle_message(&json!({ "type": "refreshFilter", "settings": { "keywords": ["pasta"] } }));
        while let Some(PassStatus::Pending) = ctx.step() {}
        assert_eq!(hidden_titles(&ctx), vec!["Learning React"]);

        ctx.handle_message(&json!({ "type": "refreshFilter", "settings": { "disabled": true } }));
        assert!(!ctx.is_pass_pending());
        assert!(hidden_titles(&ctx).is_empty());

        ctx.handle_message(&json!({
            "type": "refreshFilter",
            "settings": { "disabled": false, "keywords": ["react"] }
        }));
        while let Some(PassStatus::Pending) = ctx.step() {}
        assert_eq!(hidden_titles(&ctx), vec!["Cooking Pasta"]);
    }

    #[test]
    fn test_mutations_debounce_into_one_pass() {
        let mut ctx = context(&["Learning React"]);
        ctx.replace_state(FilterState {
            keywords: vec!["react".to_string()],
            mode: Mode::Include,
            ..FilterState::default()
        })
        .unwrap();
        ctx.run_pass();

        let root = ctx.dom().root();
        let late = add_tile(ctx.dom_mut(), root, &TileFixture::new("Cooking Pasta", "Chef"));
        assert_eq!(
            ctx.on_mutations(&[MutationRecord::child_list(vec![late])]),
            WatchDirective::Arm(300)
        );
        assert_eq!(ctx.on_timer(), WatchDirective::Arm(300));
        assert!(!ctx.is_pass_pending());

        ctx.clock.advance(300);
        assert_eq!(ctx.on_timer(), WatchDirective::Fire);
        assert!(ctx.is_pass_pending());
        while let Some(PassStatus::Pending) = ctx.step() {}
        assert!(ctx.dom().is_hidden(late));
    }

    #[test]
    fn test_own_writes_do_not_retrigger() {
        let mut ctx = context(&["Learning React"]);
        ctx.handle_message(&json!({ "type": "refreshFilter", "settings": { "keywords": ["react"] } }));
        while let Some(PassStatus::Pending) = ctx.step() {}

        // Highlighting replaced the title's children and set attributes:
        // neither adds a tile.
        let title = ctx.dom().query_all("#video-title")[0];
        let records = vec![MutationRecord::child_list(vec![title]), MutationRecord::attributes()];
        assert_eq!(ctx.on_mutations(&records), WatchDirective::None);
    }

    #[test]
    fn test_refresh_drops_pending_debounce() {
        let mut ctx = context(&["Learning React"]);
        let root = ctx.dom().root();
        let late = add_tile(ctx.dom_mut(), root, &TileFixture::new("Cooking Pasta", "Chef"));
        assert_eq!(
            ctx.on_mutations(&[MutationRecord::child_list(vec![late])]),
            WatchDirective::Arm(300)
        );

        ctx.handle_message(&json!({ "type": "refreshFilter", "settings": { "keywords": ["react"] } }));
        while let Some(PassStatus::Pending) = ctx.step() {}
        assert!(ctx.dom().is_hidden(late));

        ctx.clock.advance(300);
        assert_eq!(ctx.on_timer(), WatchDirective::None);
        assert!(!ctx.is_pass_pending());
    }
}
