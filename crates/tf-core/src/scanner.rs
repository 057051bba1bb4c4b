//! Tile scanner
//!
//! Finds tiles and pulls title/channel text out of them. Missing or
//! alternate markup yields empty fields, never an error.

use crate::config::SelectorConfig;
use crate::dom::DomPort;
use crate::types::VideoDescriptor;

/// All tiles currently in the document.
pub fn scan_tiles<D: DomPort>(dom: &D, selectors: &SelectorConfig) -> Vec<D::Node> {
    dom.query_all(&selectors.tile)
}

/// Extract title and channel from one tile.
pub fn extract_video_descriptor<D: DomPort>(
    dom: &D,
    tile: &D::Node,
    selectors: &SelectorConfig,
) -> VideoDescriptor<D::Node> {
    let (title, title_handle) = lookup_text(dom, tile, &selectors.title, &selectors.title_fallbacks);
    let (channel, channel_handle) =
        lookup_text(dom, tile, &selectors.channel, &selectors.channel_fallbacks);

    VideoDescriptor {
        title,
        channel,
        title_handle,
        channel_handle,
    }
}

/// Primary selector first, then each fallback until one yields non-blank
/// text. Returns empty text and no handle when nothing does.
fn lookup_text<D: DomPort>(
    dom: &D,
    tile: &D::Node,
    primary: &str,
    fallbacks: &[String],
) -> (String, Option<D::Node>) {
    std::iter::once(primary)
        .chain(fallbacks.iter().map(String::as_str))
        .filter(|selector| !selector.trim().is_empty())
        .find_map(|selector| {
            let node = dom.query_first_within(tile, selector)?;
            let text = dom.text(&node)?;
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some((text.to_string(), Some(node)))
            }
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{add_tile, MemoryDom, TileFixture};

    #[test]
    fn test_extract_primary() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let tile = add_tile(&mut dom, root, &TileFixture::new("  Learning React  ", "Dev Ed"));
        let video = extract_video_descriptor(&dom, &tile, &SelectorConfig::default());
        assert_eq!(video.title, "Learning React");
        assert_eq!(video.channel, "Dev Ed");
        assert!(video.title_handle.is_some());
        assert!(video.channel_handle.is_some());
    }

    #[test]
    fn test_channel_fallback_chain() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let tile = add_tile(
            &mut dom,
            root,
            &TileFixture {
                title: Some("Title".to_string()),
                channel: Some("Byline Channel".to_string()),
                byline: true,
            },
        );
        let video = extract_video_descriptor(&dom, &tile, &SelectorConfig::default());
        assert_eq!(video.channel, "Byline Channel");
    }

    #[test]
    fn test_blank_primary_falls_through() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let tile = dom.append(root, "ytd-video-renderer");
        let name = dom.append(tile, "ytd-channel-name");
        dom.append_text(name, "span#text", "   ");
        let byline = dom.append(tile, "div#byline");
        dom.append_text(byline, "a", "Real Name");

        let video = extract_video_descriptor(&dom, &tile, &SelectorConfig::default());
        assert_eq!(video.channel, "Real Name");
    }

    #[test]
    fn test_missing_markup_is_empty() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let tile = dom.append(root, "ytd-rich-item-renderer");
        let video = extract_video_descriptor(&dom, &tile, &SelectorConfig::default());
        assert_eq!(video.title, "");
        assert_eq!(video.channel, "");
        assert!(video.title_handle.is_none());
    }

    #[test]
    fn test_scan_tiles_matches_any_tile_kind() {
        let mut dom = MemoryDom::new();
        let root = dom.root();
        dom.append(root, "ytd-rich-item-renderer");
        dom.append(root, "ytd-compact-video-renderer");
        dom.append(root, "div");
        assert_eq!(scan_tiles(&dom, &SelectorConfig::default()).len(), 2);
    }
}
