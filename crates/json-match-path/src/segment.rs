use crate::PathError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    Normal,
    Escape,
    Bracket,
    BracketEscape,
}

#[derive(Debug)]
enum Token {
    Text(String),
    Group(String),
}

/// Separate a raw segment into its named key and trailing index bodies.
///
/// Only the trailing run of bracket groups counts as indices; a group
/// followed by more key text stays part of the key verbatim. Escapes are
/// resolved in the returned key and kept in the index bodies. A segment made
/// only of index groups yields `None` for the key.
pub fn extract_key_and_indices(segment: &str) -> Result<(Option<String>, Vec<String>), PathError> {
    let tokens = tokenize(segment)?;

    let trailing = tokens
        .iter()
        .rev()
        .take_while(|token| matches!(token, Token::Group(_)))
        .count();
    let split_at = tokens.len() - trailing;

    let mut key = String::new();
    let mut has_text = false;
    for token in &tokens[..split_at] {
        match token {
            Token::Text(text) => {
                has_text = true;
                key.push_str(text);
            }
            Token::Group(body) => {
                key.push('[');
                key.push_str(body);
                key.push(']');
            }
        }
    }

    let indices: Vec<String> = tokens[split_at..]
        .iter()
        .filter_map(|token| match token {
            Token::Group(body) => Some(body.clone()),
            Token::Text(_) => None,
        })
        .collect();

    let key = if has_text || split_at > 0 || indices.is_empty() {
        Some(key)
    } else {
        None
    };

    Ok((key, indices))
}

fn tokenize(segment: &str) -> Result<Vec<Token>, PathError> {
    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut state = State::Normal;

    for ch in segment.chars() {
        state = match (state, ch) {
            (State::Normal, '\\') => State::Escape,
            (State::Normal, '[') => {
                if !buffer.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut buffer)));
                }
                State::Bracket
            }
            (State::Normal, ']') => {
                return Err(PathError::UnmatchedClosingBracket {
                    segment: segment.to_string(),
                })
            }
            (State::Normal, _) => {
                buffer.push(ch);
                State::Normal
            }
            (State::Escape, _) => {
                buffer.push(ch);
                State::Normal
            }
            (State::Bracket, '\\') => {
                buffer.push(ch);
                State::BracketEscape
            }
            (State::Bracket, '[') => {
                return Err(PathError::NestedBracket {
                    segment: segment.to_string(),
                })
            }
            (State::Bracket, ']') => {
                tokens.push(Token::Group(std::mem::take(&mut buffer)));
                State::Normal
            }
            (State::Bracket, _) => {
                buffer.push(ch);
                State::Bracket
            }
            (State::BracketEscape, _) => {
                buffer.push(ch);
                State::Bracket
            }
        };
    }

    match state {
        State::Bracket | State::BracketEscape => Err(PathError::UnterminatedBracket {
            segment: segment.to_string(),
        }),
        // A dangling backslash is dropped.
        State::Normal | State::Escape => {
            if !buffer.is_empty() {
                tokens.push(Token::Text(buffer));
            }
            Ok(tokens)
        }
    }
}
