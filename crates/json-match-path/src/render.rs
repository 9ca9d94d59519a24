use std::fmt;

/// Escape a key name so it survives [`crate::parse_key_path`] and
/// [`crate::extract_key_and_indices`] unchanged.
pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        if matches!(ch, '\\' | '.' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A concrete step taken while walking a document.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PathComponent {
    Key(String),
    Index(usize),
}

/// Location of a node inside a document, rendered in path-expression syntax.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct NodePath {
    components: Vec<PathComponent>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, key: &str) -> Self {
        let mut components = self.components.clone();
        components.push(PathComponent::Key(key.to_string()));
        NodePath { components }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut components = self.components.clone();
        components.push(PathComponent::Index(index));
        NodePath { components }
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut previous: Option<&PathComponent> = None;
        for component in &self.components {
            match component {
                PathComponent::Key(key) => {
                    if previous.is_some() {
                        f.write_str(".")?;
                    }
                    f.write_str(&escape_key(key))?;
                }
                PathComponent::Index(index) => {
                    if matches!(previous, Some(PathComponent::Key(key)) if key.is_empty()) {
                        f.write_str(".")?;
                    }
                    write!(f, "[{index}]")?;
                }
            }
            previous = Some(component);
        }
        Ok(())
    }
}
