//! `web-sys` implementations of the engine's DOM port and clock.

use tf_core::dom::{DomPort, MutationKind, MutationRecord};
use tf_core::Clock;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, NodeList, Performance};

/// The live page document.
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

fn elements(list: Result<NodeList, wasm_bindgen::JsValue>) -> Vec<Element> {
    let Ok(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

impl DomPort for WebDom {
    type Node = Element;

    fn query_all(&self, selector: &str) -> Vec<Element> {
        elements(self.document.query_selector_all(selector))
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        elements(root.query_selector_all(selector))
    }

    fn query_first_within(&self, root: &Element, selector: &str) -> Option<Element> {
        root.query_selector(selector).ok().flatten()
    }

    fn matches(&self, node: &Element, selector: &str) -> bool {
        node.matches(selector).unwrap_or(false)
    }

    fn text(&self, node: &Element) -> Option<String> {
        node.text_content()
    }

    fn markup(&self, node: &Element) -> Option<String> {
        Some(node.inner_html())
    }

    fn set_markup(&mut self, node: &Element, markup: &str) {
        node.set_inner_html(markup);
    }

    fn set_text(&mut self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn has_attr(&self, node: &Element, name: &str) -> bool {
        node.has_attribute(name)
    }

    fn set_attr(&mut self, node: &Element, name: &str, value: &str) {
        let _ = node.set_attribute(name, value);
    }

    fn remove_attr(&mut self, node: &Element, name: &str) {
        let _ = node.remove_attribute(name);
    }

    fn set_hidden(&mut self, node: &Element, hidden: bool) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            let _ = element
                .style()
                .set_property("display", if hidden { "none" } else { "" });
        }
    }
}

/// Convert observer records, keeping only element nodes.
pub fn convert_records(records: &js_sys::Array) -> Vec<MutationRecord<Element>> {
    records
        .iter()
        .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
        .map(|record| {
            let added = record.added_nodes();
            MutationRecord {
                kind: MutationKind::from(record.type_().as_str()),
                added: (0..added.length())
                    .filter_map(|i| added.get(i))
                    .filter_map(|node| node.dyn_into::<Element>().ok())
                    .collect(),
            }
        })
        .collect()
}

/// `performance.now()`, truncated to whole milliseconds.
pub struct PerformanceClock {
    performance: Option<Performance>,
}

impl PerformanceClock {
    pub fn new() -> Self {
        Self {
            performance: web_sys::window().and_then(|w| w.performance()),
        }
    }
}

impl Default for PerformanceClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> u64 {
        self.performance
            .as_ref()
            .map(|p| p.now().max(0.0) as u64)
            .unwrap_or(0)
    }
}
