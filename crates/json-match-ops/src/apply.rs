use json_match_config::{Rule, RuleError, RuleKind, RuleSetting, Scope};
use json_match_path::{IndexSpec, KeyPath};

use crate::tree::{ConfigTree, NodeId};
use crate::CompareError;

/// Apply declarations in order. Later declarations overwrite earlier ones
/// that address the same node, kind and scope.
pub fn apply_rules(tree: &mut ConfigTree, rules: &[Rule]) -> Result<(), CompareError> {
    for (index, rule) in rules.iter().enumerate() {
        apply_rule(tree, rule).map_err(|source| CompareError::InvalidRule {
            index,
            kind: rule.kind,
            source,
        })?;
    }
    Ok(())
}

/// Materialise one declaration into the tree.
///
/// A subtree-scoped declaration also becomes the terminal node's own
/// override, so that it outranks a single-node setting inherited from an
/// enclosing array. A later subtree declaration on an ancestor replaces it.
pub fn apply_rule(tree: &mut ConfigTree, rule: &Rule) -> Result<(), RuleError> {
    let targets = rule.parsed_targets()?;
    let setting = rule.setting();

    for path in &targets {
        let terminal = walk_or_create(tree, path);
        match rule.scope {
            Scope::Subtree => tree.declare_subtree_rule(terminal, rule.kind, setting.clone()),
            Scope::SingleNode => tree.set_node_rule(terminal, rule.kind, setting.clone()),
        }
    }

    Ok(())
}

fn walk_or_create(tree: &mut ConfigTree, path: &KeyPath) -> NodeId {
    let mut current = ConfigTree::ROOT;

    for segment in path.segments() {
        if let Some(key) = &segment.key {
            current = tree.child_or_insert(current, key);
        }
        for index in &segment.indices {
            match *index {
                IndexSpec::Wildcard => {
                    tree.set_node_rule(current, RuleKind::WildcardMatch, RuleSetting::new(true));
                }
                IndexSpec::Position { index, wildcard } => {
                    current = tree.child_or_insert(current, &index.to_string());
                    if wildcard {
                        tree.set_node_rule(
                            current,
                            RuleKind::WildcardMatch,
                            RuleSetting::new(true),
                        );
                    }
                }
            }
        }
    }

    current
}
