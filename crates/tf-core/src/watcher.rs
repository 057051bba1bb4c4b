//! Mutation Watcher
//!
//! Debounce state machine between the page's `MutationObserver` and the
//! filter pass. Only child-list mutations that add a tile (or a subtree
//! containing one) count; the engine's own attribute, style and text
//! writes never qualify, so passes cannot retrigger themselves.
//!
//! Time comes from a [`Clock`] so tests drive the debounce deterministically.

use std::cell::Cell;
use std::time::Instant;

use crate::dom::{DomPort, MutationKind, MutationRecord};

// =============================================================================
// Clock
// =============================================================================

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`Instant`]. Not usable on `wasm32-unknown-unknown`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// =============================================================================
// Watcher
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchState {
    #[default]
    Idle,
    /// A pass is due at `deadline` unless more tiles arrive first
    Debouncing { deadline: u64 },
}

/// What the host should do with its timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchDirective {
    /// Nothing to do
    None,
    /// (Re)arm the timer to fire after this many milliseconds
    Arm(u64),
    /// Run a full filter pass now
    Fire,
}

#[derive(Debug, Clone)]
pub struct MutationWatcher {
    debounce_ms: u64,
    state: WatchState,
}

impl MutationWatcher {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            state: WatchState::Idle,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Feed one observer callback's worth of records.
    ///
    /// Qualifying records start or restart the debounce window; anything
    /// else leaves the state untouched.
    pub fn observe<D: DomPort>(
        &mut self,
        dom: &D,
        records: &[MutationRecord<D::Node>],
        tile_selector: &str,
        now: u64,
    ) -> WatchDirective {
        if !adds_tiles(dom, records, tile_selector) {
            return WatchDirective::None;
        }

        if let WatchState::Debouncing { .. } = self.state {
            log::debug!("tile mutations coalesced, debounce restarted");
        }
        self.state = WatchState::Debouncing {
            deadline: now + self.debounce_ms,
        };
        WatchDirective::Arm(self.debounce_ms)
    }

    /// Called when the host timer fires.
    pub fn on_timer(&mut self, now: u64) -> WatchDirective {
        match self.state {
            WatchState::Idle => WatchDirective::None,
            WatchState::Debouncing { deadline } if now >= deadline => {
                self.state = WatchState::Idle;
                WatchDirective::Fire
            }
            WatchState::Debouncing { deadline } => WatchDirective::Arm(deadline - now),
        }
    }

    /// Drop any pending pass.
    pub fn reset(&mut self) {
        self.state = WatchState::Idle;
    }
}

/// True if any child-list record added a tile or a subtree holding one.
pub fn adds_tiles<D: DomPort>(dom: &D, records: &[MutationRecord<D::Node>], tile_selector: &str) -> bool {
    records
        .iter()
        .filter(|record| record.kind == MutationKind::ChildList)
        .flat_map(|record| record.added.iter())
        .any(|node| dom.matches(node, tile_selector) || dom.query_first_within(node, tile_selector).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use crate::dom::MemoryDom;

    fn setup() -> (MemoryDom, String) {
        (MemoryDom::new(), SelectorConfig::default().tile)
    }

    #[test]
    fn test_tile_addition_arms_timer() {
        let (mut dom, sel) = setup();
        let root = dom.root();
        let tile = dom.append(root, "ytd-rich-item-renderer");
        let mut watcher = MutationWatcher::new(300);

        let directive = watcher.observe(&dom, &[MutationRecord::child_list(vec![tile])], &sel, 0);
        assert_eq!(directive, WatchDirective::Arm(300));
        assert_eq!(watcher.state(), WatchState::Debouncing { deadline: 300 });
    }

    #[test]
    fn test_container_holding_tile_qualifies() {
        let (mut dom, sel) = setup();
        let root = dom.root();
        let section = dom.append(root, "div#contents");
        dom.append(section, "ytd-video-renderer");
        assert!(adds_tiles(&dom, &[MutationRecord::child_list(vec![section])], &sel));
    }

    #[test]
    fn test_irrelevant_mutations_ignored() {
        let (mut dom, sel) = setup();
        let root = dom.root();
        let span = dom.append(root, "span.tf-highlight");
        let mut watcher = MutationWatcher::new(300);

        let records = vec![
            MutationRecord::attributes(),
            MutationRecord::child_list(vec![span]),
            MutationRecord::child_list(Vec::new()),
        ];
        assert_eq!(watcher.observe(&dom, &records, &sel, 0), WatchDirective::None);
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn test_coalescing_and_fire() {
        let (mut dom, sel) = setup();
        let root = dom.root();
        let tile = dom.append(root, "ytd-rich-item-renderer");
        let records = vec![MutationRecord::child_list(vec![tile])];
        let clock = ManualClock::new();
        let mut watcher = MutationWatcher::new(300);

        watcher.observe(&dom, &records, &sel, clock.now_ms());
        clock.advance(200);
        watcher.observe(&dom, &records, &sel, clock.now_ms());

        // The first timer fires at 300ms but the window was pushed to 500ms.
        clock.advance(100);
        assert_eq!(watcher.on_timer(clock.now_ms()), WatchDirective::Arm(200));
        clock.advance(200);
        assert_eq!(watcher.on_timer(clock.now_ms()), WatchDirective::Fire);
        assert_eq!(watcher.state(), WatchState::Idle);
        assert_eq!(watcher.on_timer(clock.now_ms()), WatchDirective::None);
    }
}
