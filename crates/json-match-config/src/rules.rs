use std::fmt;
use std::ops::{Index, IndexMut};

use json_match_path::{KeyPath, PathError};
use thiserror::Error;

/// Closed set of comparison rules.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum RuleKind {
    WildcardMatch,
    CollectionEqualCount,
    KeyMustBeAbsent,
    PrimitiveExactMatch,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::WildcardMatch,
        RuleKind::CollectionEqualCount,
        RuleKind::KeyMustBeAbsent,
        RuleKind::PrimitiveExactMatch,
    ];

    fn slot(self) -> usize {
        match self {
            RuleKind::WildcardMatch => 0,
            RuleKind::CollectionEqualCount => 1,
            RuleKind::KeyMustBeAbsent => 2,
            RuleKind::PrimitiveExactMatch => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::WildcardMatch => "wildcard-match",
            RuleKind::CollectionEqualCount => "collection-equal-count",
            RuleKind::KeyMustBeAbsent => "key-must-be-absent",
            RuleKind::PrimitiveExactMatch => "primitive-exact-match",
        }
    }

    /// Scope used when a declaration does not name one.
    pub fn default_scope(self) -> Scope {
        match self {
            RuleKind::PrimitiveExactMatch => Scope::Subtree,
            _ => Scope::SingleNode,
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuleKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "wildcard-match" => Ok(RuleKind::WildcardMatch),
            "collection-equal-count" => Ok(RuleKind::CollectionEqualCount),
            "key-must-be-absent" => Ok(RuleKind::KeyMustBeAbsent),
            "primitive-exact-match" => Ok(RuleKind::PrimitiveExactMatch),
            _ => Err(()),
        }
    }
}

/// How far a declaration reaches from the node it addresses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Scope {
    /// Only the addressed node.
    SingleNode,
    /// The addressed node and every descendant without its own override.
    Subtree,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::SingleNode => "single-node",
            Scope::Subtree => "subtree",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single-node" => Ok(Scope::SingleNode),
            "subtree" => Ok(Scope::Subtree),
            _ => Err(()),
        }
    }
}

/// Value stored for one rule kind at one node.
///
/// `keys` is only meaningful for [`RuleKind::KeyMustBeAbsent`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RuleSetting {
    pub active: bool,
    pub keys: Vec<String>,
}

impl RuleSetting {
    pub fn new(active: bool) -> Self {
        RuleSetting {
            active,
            keys: Vec::new(),
        }
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }
}

/// Total mapping from every [`RuleKind`] to a `T`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuleTable<T> {
    slots: [T; 4],
}

impl<T> RuleTable<T> {
    pub fn from_fn(mut init: impl FnMut(RuleKind) -> T) -> Self {
        RuleTable {
            slots: std::array::from_fn(|slot| init(RuleKind::ALL[slot])),
        }
    }

    pub fn get(&self, kind: RuleKind) -> &T {
        &self.slots[kind.slot()]
    }

    pub fn set(&mut self, kind: RuleKind, value: T) {
        self.slots[kind.slot()] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleKind, &T)> {
        RuleKind::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T: Default> Default for RuleTable<T> {
    fn default() -> Self {
        RuleTable::from_fn(|_| T::default())
    }
}

impl<T> Index<RuleKind> for RuleTable<T> {
    type Output = T;

    fn index(&self, kind: RuleKind) -> &T {
        self.get(kind)
    }
}

impl<T> IndexMut<RuleKind> for RuleTable<T> {
    fn index_mut(&mut self, kind: RuleKind) -> &mut T {
        &mut self.slots[kind.slot()]
    }
}

/// Top-level comparison mode. Only the primitive default differs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MatchMode {
    Exact,
    Type,
}

impl MatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Type => "type",
        }
    }

    /// Subtree defaults seeded into the top-level node.
    pub fn defaults(self) -> RuleTable<RuleSetting> {
        RuleTable::from_fn(|kind| match kind {
            RuleKind::PrimitiveExactMatch => RuleSetting::new(self == MatchMode::Exact),
            _ => RuleSetting::new(false),
        })
    }

    /// The mode a shorthand path list switches to.
    pub fn opposite(self) -> MatchMode {
        match self {
            MatchMode::Exact => MatchMode::Type,
            MatchMode::Type => MatchMode::Exact,
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MatchMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "exact" => Ok(MatchMode::Exact),
            "type" => Ok(MatchMode::Type),
            _ => Err(()),
        }
    }
}

/// Authoring mistakes in a rule declaration.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RuleError {
    #[error("invalid path '{path}' in {kind} rule: {source}")]
    InvalidPath {
        kind: RuleKind,
        path: String,
        source: PathError,
    },
    #[error("active key-must-be-absent rule has no key names")]
    MissingAbsentKeys,
}

/// Declarative rule: a kind, the nodes it addresses, its setting and reach.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rule {
    pub kind: RuleKind,
    /// `None` addresses the top-level node. An empty list does the same.
    pub paths: Vec<Option<String>>,
    pub active: bool,
    pub scope: Scope,
    pub keys: Vec<String>,
}

impl Rule {
    /// A rule of `kind` with its defaults, addressing the top-level node.
    pub fn new(kind: RuleKind) -> Self {
        Rule {
            kind,
            paths: Vec::new(),
            active: true,
            scope: kind.default_scope(),
            keys: Vec::new(),
        }
    }

    pub fn wildcard_match<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Rule::new(RuleKind::WildcardMatch).at_paths(paths)
    }

    pub fn collection_equal_count<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Rule::new(RuleKind::CollectionEqualCount).at_paths(paths)
    }

    pub fn key_must_be_absent<I, P, K, S>(paths: I, keys: K) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = Rule::new(RuleKind::KeyMustBeAbsent).at_paths(paths);
        rule.keys = keys.into_iter().map(Into::into).collect();
        rule
    }

    /// Literal value comparison for the addressed subtrees.
    pub fn value_exact_match<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Rule::new(RuleKind::PrimitiveExactMatch).at_paths(paths)
    }

    /// Type-only comparison for the addressed subtrees.
    pub fn value_type_match<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Rule::new(RuleKind::PrimitiveExactMatch)
            .at_paths(paths)
            .with_active(false)
    }

    pub fn at_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| Some(path.into())));
        self
    }

    pub fn at_root(mut self) -> Self {
        self.paths.push(None);
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Paths this rule applies to, with an empty list meaning the top-level node.
    pub fn targets(&self) -> Vec<Option<&str>> {
        if self.paths.is_empty() {
            return vec![None];
        }
        self.paths.iter().map(|path| path.as_deref()).collect()
    }

    pub fn setting(&self) -> RuleSetting {
        RuleSetting::new(self.active).with_keys(self.keys.clone())
    }

    /// Check the declaration and parse every target path.
    pub fn parsed_targets(&self) -> Result<Vec<KeyPath>, RuleError> {
        if self.kind == RuleKind::KeyMustBeAbsent && self.active && self.keys.is_empty() {
            return Err(RuleError::MissingAbsentKeys);
        }

        self.targets()
            .into_iter()
            .map(|path| {
                KeyPath::parse(path).map_err(|source| RuleError::InvalidPath {
                    kind: self.kind,
                    path: path.unwrap_or_default().to_string(),
                    source,
                })
            })
            .collect()
    }
}
