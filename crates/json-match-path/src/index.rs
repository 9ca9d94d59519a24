use std::fmt;

use crate::PathError;

/// Interpretation of a bracketed index body.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum IndexSpec {
    /// `[*]`: every element of the array is order-independent.
    Wildcard,
    /// `[n]` or `[*n]`: the element at expected-side position `n`, optionally
    /// marked order-independent.
    Position { index: usize, wildcard: bool },
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexSpec::Wildcard => f.write_str("*"),
            IndexSpec::Position {
                index,
                wildcard: true,
            } => write!(f, "*{index}"),
            IndexSpec::Position {
                index,
                wildcard: false,
            } => write!(f, "{index}"),
        }
    }
}

/// Parse the body of an index group (the text between `[` and `]`).
pub fn parse_index(raw: &str) -> Result<IndexSpec, PathError> {
    if raw == "*" {
        return Ok(IndexSpec::Wildcard);
    }

    let (wildcard, digits) = match raw.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PathError::InvalidIndex {
            raw: raw.to_string(),
        });
    }

    let index = digits.parse::<usize>().map_err(|_| PathError::InvalidIndex {
        raw: raw.to_string(),
    })?;

    Ok(IndexSpec::Position { index, wildcard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_index_forms() {
        assert_eq!(parse_index("*"), Ok(IndexSpec::Wildcard));
        assert_eq!(
            parse_index("12"),
            Ok(IndexSpec::Position {
                index: 12,
                wildcard: false
            })
        );
        assert_eq!(
            parse_index("*3"),
            Ok(IndexSpec::Position {
                index: 3,
                wildcard: true
            })
        );
    }

    #[test]
    fn rejects_malformed_bodies() {
        for raw in ["", "**", "*x", "a", "-1", "+1", " 1", "1.5", "99999999999999999999999"] {
            assert!(
                matches!(parse_index(raw), Err(PathError::InvalidIndex { .. })),
                "expected '{raw}' to be rejected"
            );
        }
    }
}
