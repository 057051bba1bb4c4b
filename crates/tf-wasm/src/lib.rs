//! WebAssembly bindings for TubeFilter
//!
//! Owns the one [`FilterContext`] per page and wires it to the browser: a
//! `MutationObserver` for new tiles, `setTimeout` for the debounce window and
//! `requestAnimationFrame` for batch scheduling.

mod dom;
mod logger;

use std::cell::RefCell;

use serde::Serialize;
use tf_core::{
    highlight_spans, EngineConfig, FilterContext, FilterState, PassStatus, RefreshResponse,
    SettingsRecord, WatchDirective,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MutationObserver, MutationObserverInit, Window};

pub use dom::{PerformanceClock, WebDom};

const HIGHLIGHT_CLASS: &str = "tf-highlight";

struct Host {
    window: Window,
    ctx: FilterContext<WebDom, PerformanceClock>,
    observer: MutationObserver,
    timer: Option<i32>,
    frame: Option<i32>,
    _on_mutations: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
    on_timer: Closure<dyn FnMut()>,
    on_frame: Closure<dyn FnMut()>,
}

thread_local! {
    static HOST: RefCell<Option<Host>> = const { RefCell::new(None) };
}

fn with_host<R>(f: impl FnOnce(&mut Host) -> R) -> Option<R> {
    HOST.with(|host| host.borrow_mut().as_mut().map(f))
}

// =============================================================================
// JSON boundary
// =============================================================================

fn js_to_json(value: &JsValue) -> Result<serde_json::Value, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(serde_json::Value::Null);
    }
    let text: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&text).map_err(|e| JsValue::from_str(&format!("Invalid value: {}", e)))
}

fn json_to_js<T: Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|text| js_sys::JSON::parse(&text).ok())
        .unwrap_or(JsValue::NULL)
}

fn decode_settings(value: &JsValue) -> Result<FilterState, JsValue> {
    let json = js_to_json(value)?;
    if json.is_null() {
        return Ok(FilterState::default());
    }
    let record: SettingsRecord = serde_json::from_value(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid settings: {}", e)))?;
    Ok(record.to_state())
}

// =============================================================================
// Scheduling
// =============================================================================

impl Host {
    fn schedule_frame(&mut self) {
        if self.frame.is_some() || !self.ctx.is_pass_pending() {
            return;
        }
        match self
            .window
            .request_animation_frame(self.on_frame.as_ref().unchecked_ref())
        {
            Ok(handle) => self.frame = Some(handle),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
    }

    fn arm_timer(&mut self, ms: u64) {
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let delay = i32::try_from(ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(self.on_timer.as_ref().unchecked_ref(), delay)
        {
            Ok(handle) => self.timer = Some(handle),
            Err(e) => log::error!("setTimeout failed: {:?}", e),
        }
    }

    fn apply(&mut self, directive: WatchDirective) {
        match directive {
            WatchDirective::None => {}
            WatchDirective::Arm(ms) => self.arm_timer(ms),
            WatchDirective::Fire => self.schedule_frame(),
        }
    }

    fn begin_pass(&mut self) {
        if self.ctx.start_pass() == PassStatus::Pending {
            self.schedule_frame();
        }
    }

    fn shutdown(&mut self) {
        self.observer.disconnect();
        if let Some(handle) = self.timer.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        if let Some(handle) = self.frame.take() {
            let _ = self.window.cancel_animation_frame(handle);
        }
    }
}

fn on_frame() {
    with_host(|host| {
        host.frame = None;
        if host.ctx.step() == Some(PassStatus::Pending) {
            host.schedule_frame();
        }
    });
}

fn on_timer() {
    with_host(|host| {
        host.timer = None;
        let directive = host.ctx.on_timer();
        host.apply(directive);
    });
}

fn on_mutations(records: js_sys::Array) {
    let records = dom::convert_records(&records);
    with_host(|host| {
        let directive = host.ctx.on_mutations(&records);
        host.apply(directive);
    });
}

// =============================================================================
// Exports
// =============================================================================

/// Start filtering the current page with the given stored settings record.
#[wasm_bindgen]
pub fn start(settings: JsValue) -> Result<(), JsValue> {
    if is_started() {
        return Err(JsValue::from_str("Already started. Call stop() first."));
    }
    logger::init(log::LevelFilter::Warn);

    let state = decode_settings(&settings)?;
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
    let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;
    let body = document.body().ok_or_else(|| JsValue::from_str("No document body"))?;

    let mut ctx = FilterContext::new(WebDom::new(document), PerformanceClock::new(), EngineConfig::default());
    if let Err(e) = ctx.replace_state(state) {
        log::warn!("stored rules unusable, showing everything: {}", e);
    }

    let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
        |records: js_sys::Array, _observer: MutationObserver| on_mutations(records),
    );
    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer.observe_with_options(&body, &init)?;

    let host = Host {
        window,
        ctx,
        observer,
        timer: None,
        frame: None,
        _on_mutations: callback,
        on_timer: Closure::<dyn FnMut()>::new(on_timer),
        on_frame: Closure::<dyn FnMut()>::new(on_frame),
    };
    HOST.with(|slot| *slot.borrow_mut() = Some(host));
    with_host(Host::begin_pass);
    log::info!("filter started");
    Ok(())
}

/// Disconnect the observer and drop the context.
#[wasm_bindgen]
pub fn stop() {
    let host = HOST.with(|slot| slot.borrow_mut().take());
    if let Some(mut host) = host {
        host.shutdown();
    }
}

#[wasm_bindgen]
pub fn is_started() -> bool {
    HOST.with(|slot| slot.borrow().is_some())
}

/// Handle a `refreshFilter` message. Resolves to `{ success, error? }`.
#[wasm_bindgen]
pub fn handle_message(message: JsValue) -> js_sys::Promise {
    let response = match js_to_json(&message) {
        Ok(value) => with_host(|host| {
            let response = host.ctx.handle_message(&value);
            host.schedule_frame();
            response
        })
        .unwrap_or_else(|| RefreshResponse {
            success: false,
            error: Some("Not started".to_string()),
        }),
        Err(e) => RefreshResponse {
            success: false,
            error: e.as_string(),
        },
    };
    js_sys::Promise::resolve(&json_to_js(&response))
}

/// Re-run the filter over the whole page with the current settings.
#[wasm_bindgen]
pub fn refresh() -> bool {
    with_host(Host::begin_pass).is_some()
}

/// Stats of the most recent completed pass, or `null`.
#[wasm_bindgen]
pub fn last_stats() -> JsValue {
    with_host(|host| host.ctx.last_stats())
        .flatten()
        .map(|stats| {
            let result = js_sys::Object::new();
            let _ = js_sys::Reflect::set(&result, &"scanned".into(), &JsValue::from(stats.scanned as u32));
            let _ = js_sys::Reflect::set(&result, &"shown".into(), &JsValue::from(stats.shown as u32));
            let _ = js_sys::Reflect::set(&result, &"hidden".into(), &JsValue::from(stats.hidden as u32));
            let _ = js_sys::Reflect::set(&result, &"highlighted".into(), &JsValue::from(stats.highlighted as u32));
            let _ = js_sys::Reflect::set(&result, &"shelvesHidden".into(), &JsValue::from(stats.shelves_hidden as u32));
            let _ = js_sys::Reflect::set(&result, &"batches".into(), &JsValue::from(stats.batches as u32));
            JsValue::from(result)
        })
        .unwrap_or(JsValue::NULL)
}

/// Show/hide decision for one title and channel under a settings record.
#[wasm_bindgen]
pub fn should_show_js(title: &str, channel: &str, settings: JsValue) -> Result<bool, JsValue> {
    let state = decode_settings(&settings)?;
    let video = tf_core::VideoDescriptor::<()>::from_text(title, channel);
    Ok(tf_core::should_show(&video, &state))
}

/// Highlight markup for `text` given an array of keyword strings.
#[wasm_bindgen]
pub fn highlight_js(text: &str, keywords: JsValue) -> String {
    let keywords: Vec<String> = js_sys::Array::from(&keywords)
        .iter()
        .filter_map(|value| value.as_string())
        .collect();
    highlight_spans(text, &keywords, HIGHLIGHT_CLASS).into_owned()
}

/// Console log level: off, error, warn, info, debug or trace.
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::init(logger::parse_level(level));
}
