//! JSON page fixtures for the in-memory DOM.
//!
//! A fixture lists tiles and shelves by their text; [`PageFixture::build`]
//! lays them out with the same element structure YouTube uses, so the
//! default selectors find them.

use serde::{Deserialize, Serialize};

use super::memory::{MemoryDom, NodeId};
use crate::error::Result;

/// One video tile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileFixture {
    /// Omitted to model a tile whose title markup is missing
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Put the channel under `#byline a` instead of `ytd-channel-name`
    #[serde(default)]
    pub byline: bool,
}

impl TileFixture {
    pub fn new(title: &str, channel: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            channel: Some(channel.to_string()),
            byline: false,
        }
    }
}

/// A labelled shelf grouping tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfFixture {
    pub label: String,
    #[serde(default)]
    pub tiles: Vec<TileFixture>,
}

/// A whole listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub tiles: Vec<TileFixture>,
    #[serde(default)]
    pub shelves: Vec<ShelfFixture>,
}

/// A built fixture with handles to what was created.
#[derive(Debug, Clone)]
pub struct BuiltPage {
    pub dom: MemoryDom,
    /// Every tile, in document order
    pub tiles: Vec<NodeId>,
    pub shelves: Vec<NodeId>,
}

impl PageFixture {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn build(&self) -> BuiltPage {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let mut tiles = Vec::new();
        let mut shelves = Vec::new();

        let contents = dom.append(root, "div#contents");
        for tile in &self.tiles {
            tiles.push(add_tile(&mut dom, contents, tile));
        }

        for shelf in &self.shelves {
            let node = dom.append(root, "ytd-rich-shelf-renderer");
            dom.append_text(node, "h2#title", &shelf.label);
            let items = dom.append(node, "div#contents");
            for tile in &shelf.tiles {
                tiles.push(add_tile(&mut dom, items, tile));
            }
            shelves.push(node);
        }

        BuiltPage { dom, tiles, shelves }
    }
}

/// Append one tile with YouTube's title/channel layout.
pub fn add_tile(dom: &mut MemoryDom, parent: NodeId, tile: &TileFixture) -> NodeId {
    let node = dom.append(parent, "ytd-rich-item-renderer");
    if let Some(title) = &tile.title {
        dom.append_text(node, "a#video-title", title);
    }
    if let Some(channel) = &tile.channel {
        if tile.byline {
            let byline = dom.append(node, "div#byline");
            dom.append_text(byline, "a", channel);
        } else {
            let name = dom.append(node, "ytd-channel-name");
            dom.append_text(name, "yt-formatted-string#text", channel);
        }
    }
    node
}
