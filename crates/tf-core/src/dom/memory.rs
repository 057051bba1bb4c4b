//! In-memory DOM
//!
//! An arena of element nodes implementing [`DomPort`]. Used by the unit
//! tests and the CLI to run real passes without a browser. Every write is
//! counted so tests can assert the engine skips redundant writes.

use std::collections::BTreeMap;

use super::selector::{Complex, Compound, SelectorList};
use super::DomPort;
use crate::highlight::escape_html;

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    markup: Option<String>,
    hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<NodeData>,
    writes: usize,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create a document holding only a `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                tag: "body".to_string(),
                ..NodeData::default()
            }],
            writes: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append an element described as `tag#id.class` under `parent`.
    pub fn append(&mut self, parent: NodeId, shape: &str) -> NodeId {
        let compound = Compound::parse(shape);
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: compound.tag.unwrap_or_else(|| "div".to_string()),
            id: compound.id,
            classes: compound.classes,
            attrs: compound.attrs.into_iter().map(|a| (a, String::new())).collect(),
            parent: Some(parent),
            ..NodeData::default()
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append an element carrying text content.
    pub fn append_text(&mut self, parent: NodeId, shape: &str, text: &str) -> NodeId {
        let id = self.append(parent, shape);
        self.nodes[id.0].text = text.to_string();
        id
    }

    /// Whether the node is currently `display: none`.
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes[node.0].hidden
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    /// Number of mutating calls made through the port.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Detach a node from its parent.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        while let Some(parent) = self.nodes[current.0].parent {
            current = parent;
        }
        current == self.root()
    }

    fn descendants(&self, root: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[root.0].children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let data = &self.nodes[node.0];
        if let Some(tag) = &compound.tag {
            if !data.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if data.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        compound.classes.iter().all(|c| data.classes.contains(c))
            && compound.attrs.iter().all(|a| data.attrs.contains_key(a))
    }

    fn matches_complex(&self, node: NodeId, complex: &Complex) -> bool {
        let Some((last, ancestors)) = complex.parts.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }

        // Descendant combinators only: greedy right-to-left is exact.
        let mut current = self.nodes[node.0].parent;
        for compound in ancestors.iter().rev() {
            loop {
                match current {
                    Some(candidate) => {
                        current = self.nodes[candidate.0].parent;
                        if self.matches_compound(candidate, compound) {
                            break;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }

    fn matches_list(&self, node: NodeId, list: &SelectorList) -> bool {
        list.alternatives.iter().any(|alt| self.matches_complex(node, alt))
    }

    fn text_content(&self, node: NodeId, out: &mut String) {
        let data = &self.nodes[node.0];
        out.push_str(&data.text);
        for &child in &data.children {
            self.text_content(child, out);
        }
    }

    fn detach_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }
}

impl DomPort for MemoryDom {
    type Node = NodeId;

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.query_within(&self.root(), selector)
    }

    fn query_within(&self, root: &NodeId, selector: &str) -> Vec<NodeId> {
        let list = SelectorList::parse(selector);
        if list.is_empty() || !self.is_attached(*root) {
            return Vec::new();
        }
        let mut all = Vec::new();
        self.descendants(*root, &mut all);
        all.retain(|node| self.matches_list(*node, &list));
        all
    }

    fn matches(&self, node: &NodeId, selector: &str) -> bool {
        self.matches_list(*node, &SelectorList::parse(selector))
    }

    fn text(&self, node: &NodeId) -> Option<String> {
        let mut out = String::new();
        self.text_content(*node, &mut out);
        Some(out)
    }

    fn markup(&self, node: &NodeId) -> Option<String> {
        let data = &self.nodes[node.0];
        match &data.markup {
            Some(markup) => Some(markup.clone()),
            None => self.text(node).map(|text| escape_html(&text).into_owned()),
        }
    }

    fn set_markup(&mut self, node: &NodeId, markup: &str) {
        self.writes += 1;
        self.detach_children(*node);
        let data = &mut self.nodes[node.0];
        data.text = markup_to_text(markup);
        data.markup = Some(markup.to_string());
    }

    fn set_text(&mut self, node: &NodeId, text: &str) {
        self.writes += 1;
        self.detach_children(*node);
        let data = &mut self.nodes[node.0];
        data.text = text.to_string();
        data.markup = None;
    }

    fn has_attr(&self, node: &NodeId, name: &str) -> bool {
        self.nodes[node.0].attrs.contains_key(name)
    }

    fn set_attr(&mut self, node: &NodeId, name: &str, value: &str) {
        self.writes += 1;
        self.nodes[node.0].attrs.insert(name.to_string(), value.to_string());
    }

    fn remove_attr(&mut self, node: &NodeId, name: &str) {
        self.writes += 1;
        self.nodes[node.0].attrs.remove(name);
    }

    fn set_hidden(&mut self, node: &NodeId, hidden: bool) {
        self.writes += 1;
        self.nodes[node.0].hidden = hidden;
    }
}

/// Strip tags and decode the entities `escape_html` produces.
fn markup_to_text(markup: &str) -> String {
    let mut stripped = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => stripped.push(ch),
            _ => {}
        }
    }
    stripped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MemoryDom, NodeId, NodeId) {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let tile = dom.append(root, "ytd-rich-item-renderer");
        dom.append_text(tile, "a#video-title", "Learning Rust");
        let name = dom.append(tile, "ytd-channel-name");
        let text = dom.append_text(name, "span#text", "Rustacean Station");
        (dom, tile, text)
    }

    #[test]
    fn test_query_descendant_selector() {
        let (dom, _, text) = sample();
        assert_eq!(dom.query_all("ytd-channel-name #text"), vec![text]);
        assert!(dom.query_all("ytd-video-renderer #text").is_empty());
    }

    #[test]
    fn test_query_within_and_list() {
        let (dom, tile, _) = sample();
        let found = dom.query_within(&tile, "#video-title, #text");
        assert_eq!(found.len(), 2);
        assert_eq!(dom.text(&found[0]).as_deref(), Some("Learning Rust"));
    }

    #[test]
    fn test_text_is_concatenated() {
        let (dom, tile, _) = sample();
        assert_eq!(dom.text(&tile).as_deref(), Some("Learning RustRustacean Station"));
    }

    #[test]
    fn test_markup_roundtrip_through_text() {
        let (mut dom, _, text) = sample();
        dom.set_markup(&text, "<span class=\"x\">Rust</span> &amp; friends");
        assert_eq!(dom.text(&text).as_deref(), Some("Rust & friends"));
        assert_eq!(dom.markup(&text).as_deref(), Some("<span class=\"x\">Rust</span> &amp; friends"));

        dom.set_text(&text, "a < b");
        assert_eq!(dom.markup(&text).as_deref(), Some("a &lt; b"));
    }

    #[test]
    fn test_attrs_and_visibility_count_writes() {
        let (mut dom, tile, _) = sample();
        dom.set_attr(&tile, "data-tf-hidden", "true");
        dom.set_hidden(&tile, true);
        assert!(dom.matches(&tile, "[data-tf-hidden]"));
        assert!(dom.is_hidden(tile));
        dom.remove_attr(&tile, "data-tf-hidden");
        assert!(!dom.has_attr(&tile, "data-tf-hidden"));
        assert_eq!(dom.write_count(), 3);
    }

    #[test]
    fn test_removed_subtree_not_queried() {
        let (mut dom, tile, _) = sample();
        dom.remove(tile);
        assert!(dom.query_all("#video-title").is_empty());
    }
}
