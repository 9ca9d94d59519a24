//! Structural comparison of an expected document against an actual one.
//!
//! Rule declarations are first materialised into a [`ConfigTree`] that
//! mirrors the addressed part of the document. The comparator then walks
//! expected and actual in lock-step, resolving the effective rules for each
//! node from that tree.

mod absent;
mod apply;
mod compare;
mod suggest;
mod tree;

use json_match_config::{Config, MatchMode, Rule, RuleError, RuleKind};
use json_match_format::{Mismatch, Report};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub use apply::{apply_rule, apply_rules};
pub use suggest::{closest_key, SUGGESTION_THRESHOLD};
pub use tree::{ConfigNode, ConfigTree, Cursor, NodeId};

use compare::{Sink, Walker};

/// Errors raised while preparing a comparison.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("rule #{index} ({kind}): {source}")]
    InvalidRule {
        index: usize,
        kind: RuleKind,
        #[source]
        source: RuleError,
    },
}

/// A prepared comparison: mode defaults plus every rule declaration.
///
/// Building is the only fallible step, so one matcher can be reused for any
/// number of document pairs.
#[derive(Clone, Debug)]
pub struct Matcher {
    tree: ConfigTree,
    mode: MatchMode,
    suggestions: bool,
}

impl Matcher {
    pub fn build(mode: MatchMode, rules: &[Rule]) -> Result<Self, CompareError> {
        let mut tree = ConfigTree::new(mode.defaults());
        apply_rules(&mut tree, rules)?;
        debug!(
            mode = mode.as_str(),
            rules = rules.len(),
            nodes = tree.len(),
            "built rule tree"
        );
        Ok(Matcher {
            tree,
            mode,
            suggestions: true,
        })
    }

    /// Build from a loaded configuration, honouring its mode, rules and
    /// suggestion setting.
    pub fn from_config(config: &Config) -> Result<Self, CompareError> {
        Ok(Matcher::build(config.matching.mode, &config.rule_list())?
            .with_suggestions(config.report.suggestions))
    }

    /// Toggle "did you mean" hints for missing keys.
    pub fn with_suggestions(mut self, enabled: bool) -> Self {
        self.suggestions = enabled;
        self
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Compare and collect every mismatch.
    pub fn compare(&self, expected: &Value, actual: &Value) -> Report {
        let mut mismatches: Vec<Mismatch> = Vec::new();
        let walker = Walker::new(&self.tree, self.suggestions);
        walker.run(expected, actual, &mut Sink::collecting(&mut mismatches));
        debug!(mismatches = mismatches.len(), "comparison finished");
        Report::new(self.mode, mismatches)
    }

    /// Boolean-only comparison. Stops at the first failure.
    pub fn matches(&self, expected: &Value, actual: &Value) -> bool {
        Walker::new(&self.tree, false).run(expected, actual, &mut Sink::silent())
    }
}

/// One-shot comparison with the given mode and rules.
pub fn compare(
    mode: MatchMode,
    rules: &[Rule],
    expected: &Value,
    actual: &Value,
) -> Result<Report, CompareError> {
    Ok(Matcher::build(mode, rules)?.compare(expected, actual))
}
