//! DOM port
//!
//! The engine never touches a browser directly. Everything it reads from or
//! writes to the page goes through [`DomPort`], implemented over `web-sys`
//! by the wasm crate and over [`MemoryDom`] for tests and the CLI.

mod fixture;
mod memory;
mod selector;

pub use fixture::{add_tile, BuiltPage, PageFixture, ShelfFixture, TileFixture};
pub use memory::{MemoryDom, NodeId};
pub use selector::SelectorList;

// =============================================================================
// Port
// =============================================================================

/// Element access needed by the scanner, render controller and watcher.
///
/// Lookups never fail: a missing element is `None` or an empty list.
pub trait DomPort {
    /// Element handle. Cheap to clone.
    type Node: Clone;

    /// All elements in the document matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Descendants of `root` matching `selector`, in document order.
    fn query_within(&self, root: &Self::Node, selector: &str) -> Vec<Self::Node>;

    /// First descendant of `root` matching `selector`.
    fn query_first_within(&self, root: &Self::Node, selector: &str) -> Option<Self::Node> {
        self.query_within(root, selector).into_iter().next()
    }

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: &Self::Node, selector: &str) -> bool;

    /// Concatenated text of the node and its descendants.
    fn text(&self, node: &Self::Node) -> Option<String>;

    /// Serialized inner markup of the node.
    fn markup(&self, node: &Self::Node) -> Option<String>;

    /// Replace the node's content with the given markup.
    fn set_markup(&mut self, node: &Self::Node, markup: &str);

    /// Replace the node's content with plain text.
    fn set_text(&mut self, node: &Self::Node, text: &str);

    fn has_attr(&self, node: &Self::Node, name: &str) -> bool;

    fn set_attr(&mut self, node: &Self::Node, name: &str, value: &str);

    fn remove_attr(&mut self, node: &Self::Node, name: &str);

    /// Hide the node (`display: none`) or restore its default display.
    fn set_hidden(&mut self, node: &Self::Node, hidden: bool);
}

// =============================================================================
// Mutation Records
// =============================================================================

/// Kind of a DOM mutation, as reported by a `MutationObserver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// From a `MutationRecord.type` string.
impl From<&str> for MutationKind {
    fn from(kind: &str) -> Self {
        match kind {
            "childList" => Self::ChildList,
            "attributes" => Self::Attributes,
            _ => Self::CharacterData,
        }
    }
}

/// One observed mutation: its kind and the element nodes it added.
#[derive(Debug, Clone)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub added: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn child_list(added: Vec<N>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added,
        }
    }

    pub fn attributes() -> Self {
        Self {
            kind: MutationKind::Attributes,
            added: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_kind_from_record_type() {
        assert_eq!(MutationKind::from("childList"), MutationKind::ChildList);
        assert_eq!(MutationKind::from("attributes"), MutationKind::Attributes);
        assert_eq!(MutationKind::from("characterData"), MutationKind::CharacterData);
    }
}
