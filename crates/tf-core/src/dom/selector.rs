//! Minimal CSS selector support for the in-memory DOM.
//!
//! Handles selector lists (`a, b`), the descendant combinator, and compound
//! selectors built from a tag (or `*`), `#id`, `.class` and `[attr]`. That
//! covers every selector the engine is configured with.

/// One `tag#id.class[attr]` unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<String>,
}

impl Compound {
    pub fn parse(text: &str) -> Self {
        let mut compound = Compound::default();
        let mut chars = text.chars().peekable();
        let mut tag = String::new();

        while let Some(&ch) = chars.peek() {
            if matches!(ch, '#' | '.' | '[') {
                break;
            }
            tag.push(ch);
            chars.next();
        }
        if !tag.is_empty() && tag != "*" {
            compound.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some(sigil) = chars.next() {
            let mut name = String::new();
            match sigil {
                '[' => {
                    for ch in chars.by_ref() {
                        if ch == ']' {
                            break;
                        }
                        name.push(ch);
                    }
                    // Only presence is checked: `[name="v"]` keeps `name`.
                    let attr = name.split('=').next().unwrap_or("").trim();
                    if !attr.is_empty() {
                        compound.attrs.push(attr.to_string());
                    }
                }
                '#' | '.' => {
                    while let Some(&ch) = chars.peek() {
                        if matches!(ch, '#' | '.' | '[') {
                            break;
                        }
                        name.push(ch);
                        chars.next();
                    }
                    if sigil == '#' {
                        compound.id = Some(name);
                    } else {
                        compound.classes.push(name);
                    }
                }
                _ => {}
            }
        }

        compound
    }
}

/// Compounds joined by descendant combinators, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Complex {
    pub parts: Vec<Compound>,
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub(crate) alternatives: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Self {
        let alternatives = selector
            .split(',')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .map(|alt| Complex {
                parts: alt.split_whitespace().map(Compound::parse).collect(),
            })
            .collect();
        Self { alternatives }
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}
