//! Path expressions addressing nodes inside JSON-like documents.
//!
//! A path is a dot-separated list of keys. Array positions attach to the
//! preceding key in brackets, so `items[0][*1].name` walks `items`, then
//! element `0`, then element `1` (marked order-independent), then `name`.
//! Literal dots and brackets inside key names are escaped with a backslash.
//! A key named `""` that is indexed is written with a dot before its
//! brackets (`.[0]`, `a..[0]`), since a bare `[0]` addresses the current array.
//!
//! Parsing happens in three stages that are exposed individually so callers
//! can test them in isolation: [`parse_key_path`] splits on unescaped dots,
//! [`extract_key_and_indices`] separates a segment's key from its trailing
//! index groups, and [`parse_index`] interprets a single index body.
//! [`KeyPath::parse`] composes all three.

mod index;
mod render;
mod segment;

pub use index::{parse_index, IndexSpec};
pub use render::{escape_key, NodePath, PathComponent};
pub use segment::extract_key_and_indices;

use std::fmt;

use thiserror::Error;

/// Authoring mistakes found while parsing a path expression.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PathError {
    #[error("unterminated '[' in path segment '{segment}'")]
    UnterminatedBracket { segment: String },
    #[error("unmatched ']' in path segment '{segment}'")]
    UnmatchedClosingBracket { segment: String },
    #[error("nested '[' in path segment '{segment}'")]
    NestedBracket { segment: String },
    #[error("invalid array index '[{raw}]': expected '*', an integer, or '*' followed by an integer")]
    InvalidIndex { raw: String },
    #[error("index-only segment '{segment}' is only allowed at the start of a path")]
    DetachedIndex { segment: String },
}

/// Split `path` on unescaped dots.
///
/// Segments are returned raw: escape sequences are preserved so that
/// [`extract_key_and_indices`] can still tell escaped brackets from index
/// delimiters. `None` addresses the top-level node and yields no segments.
pub fn parse_key_path(path: Option<&str>) -> Vec<String> {
    let Some(path) = path else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in path.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }
        match ch {
            '\\' => {
                current.push(ch);
                escaped = true;
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    segments.push(current);
    segments
}

/// One dot-separated piece of a path: an optional key plus the array
/// positions that follow it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathSegment {
    pub key: Option<String>,
    pub indices: Vec<IndexSpec>,
}

/// Fully parsed path expression.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// The path addressing the top-level node.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path expression. `None` addresses the top-level node.
    pub fn parse(path: Option<&str>) -> Result<Self, PathError> {
        let mut segments = Vec::new();

        for (position, raw) in parse_key_path(path).into_iter().enumerate() {
            let (key, raw_indices) = extract_key_and_indices(&raw)?;
            let indices = raw_indices
                .iter()
                .map(|body| parse_index(body))
                .collect::<Result<Vec<_>, _>>()?;

            if key.is_none() && position > 0 {
                // `.[n]` after an empty key indexes into that key.
                match segments.last_mut() {
                    Some(PathSegment {
                        key: Some(previous),
                        indices: previous_indices,
                    }) if previous.is_empty() && previous_indices.is_empty() => {
                        *previous_indices = indices;
                        continue;
                    }
                    _ => return Err(PathError::DetachedIndex { segment: raw }),
                }
            }
            segments.push(PathSegment { key, indices });
        }

        Ok(KeyPath { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            if let Some(key) = &segment.key {
                f.write_str(&escape_key(key))?;
                if key.is_empty() && !segment.indices.is_empty() {
                    f.write_str(".")?;
                }
            }
            for index in &segment.indices {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}
