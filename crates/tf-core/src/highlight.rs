//! Keyword highlighting
//!
//! Produces HTML markup for a title or channel element. Text runs are
//! escaped on output so page text can never smuggle markup through a
//! rewrite.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

/// Highlight output under construction: plain text runs and marker tags.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Text(String),
    Open,
    Close,
}

/// Wrap every case-insensitive occurrence of each keyword in a highlight span.
///
/// Keywords are applied one after another, so a later keyword can match
/// inside the text of an earlier one's span and nest markers. Matching only
/// ever sees text, never the markers or escape sequences, so the result is
/// well-formed and its text content equals `text`. Empty keywords are
/// skipped.
///
/// Returns `Cow::Borrowed(text)` when nothing matched, so callers can skip
/// the DOM write entirely.
pub fn highlight_spans<'a, S: AsRef<str>>(text: &'a str, keywords: &[S], class: &str) -> Cow<'a, str> {
    if text.is_empty() || keywords.is_empty() {
        return Cow::Borrowed(text);
    }

    let mut pieces = vec![Piece::Text(text.to_string())];
    let mut matched = false;

    for keyword in keywords {
        let keyword = keyword.as_ref();
        if keyword.is_empty() {
            continue;
        }

        let pattern = match RegexBuilder::new(&regex::escape(keyword))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(e) => {
                log::warn!("skipping highlight for '{}': {}", keyword, e);
                continue;
            }
        };

        let mut next = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match piece {
                Piece::Text(run) if pattern.is_match(&run) => {
                    matched = true;
                    split_run(&run, &pattern, &mut next);
                }
                other => next.push(other),
            }
        }
        pieces = next;
    }

    if !matched {
        return Cow::Borrowed(text);
    }

    let open = format!("<span class=\"{}\">", escape_html(class).replace('"', "&quot;"));
    let mut out = String::with_capacity(text.len() + 32);
    for piece in &pieces {
        match piece {
            Piece::Text(run) => out.push_str(&escape_html(run)),
            Piece::Open => out.push_str(&open),
            Piece::Close => out.push_str("</span>"),
        }
    }
    Cow::Owned(out)
}

fn split_run(run: &str, pattern: &Regex, out: &mut Vec<Piece>) {
    let mut last = 0;
    for found in pattern.find_iter(run) {
        if found.start() > last {
            out.push(Piece::Text(run[last..found.start()].to_string()));
        }
        out.push(Piece::Open);
        out.push(Piece::Text(found.as_str().to_string()));
        out.push(Piece::Close);
        last = found.end();
    }
    if last < run.len() {
        out.push(Piece::Text(run[last..].to_string()));
    }
}

/// Escape text for use as element content.
///
/// Only `&`, `<`, `>` and U+00A0 are replaced, matching how browsers
/// serialize text nodes, so escaped text compares equal to the element's
/// `innerHTML`.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '\u{a0}']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
