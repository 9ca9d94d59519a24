//! Forbidden-key checks.
//!
//! Maps the expected document addresses are checked during the walk, under
//! the rule context of the expected node they were paired with. Branches
//! only the actual document has are swept separately, so a forbidden key is
//! reported even where the expected document says nothing.

use json_match_config::RuleKind;
use json_match_format::{Mismatch, Violation};
use json_match_path::NodePath;
use serde_json::{Map, Value};

use crate::compare::Sink;
use crate::tree::{ConfigTree, Cursor};

/// Report every forbidden key of `actual` under the rule at `cursor`.
pub(crate) fn check_forbidden_keys(
    tree: &ConfigTree,
    cursor: Cursor<'_>,
    actual: &Map<String, Value>,
    path: &NodePath,
    sink: &mut Sink<'_>,
) -> bool {
    let setting = tree.local(cursor, RuleKind::KeyMustBeAbsent);
    if !setting.active {
        return true;
    }

    let mut clean = true;
    for key in &setting.keys {
        if let Some(present) = actual.get(key) {
            sink.push(|| {
                Mismatch::new(
                    path.clone(),
                    Violation::KeyPresent { key: key.clone() },
                    None,
                    Some(present),
                )
            });
            clean = false;
            if sink.is_silent() {
                return false;
            }
        }
    }
    clean
}

/// Check a branch of the actual document that nothing expected addresses.
/// Array positions here are actual positions, since nothing was paired.
pub(crate) fn sweep_unaddressed<'t>(
    tree: &'t ConfigTree,
    cursor: Cursor<'t>,
    actual: &Value,
    path: &NodePath,
    sink: &mut Sink<'_>,
) -> bool {
    if !reaches_rules(tree, cursor) {
        return true;
    }

    let mut clean = true;
    match actual {
        Value::Object(map) => {
            if !check_forbidden_keys(tree, cursor, map, path, sink) {
                clean = false;
                if sink.is_silent() {
                    return false;
                }
            }
            for (key, child) in map {
                let next = tree.descend(cursor, key);
                if !sweep_unaddressed(tree, next, child, &path.key(key), sink) {
                    clean = false;
                    if sink.is_silent() {
                        return false;
                    }
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let next = tree.descend(cursor, &index.to_string());
                if !sweep_unaddressed(tree, next, child, &path.index(index), sink) {
                    clean = false;
                    if sink.is_silent() {
                        return false;
                    }
                }
            }
        }
        _ => {}
    }
    clean
}

/// Configured nodes may hold overrides further down. Past the configured
/// part only an inherited active rule can still fire.
fn reaches_rules(tree: &ConfigTree, cursor: Cursor<'_>) -> bool {
    match cursor {
        Cursor::Node(_) => true,
        Cursor::Detached(_) => tree.local(cursor, RuleKind::KeyMustBeAbsent).active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply_rules;
    use json_match_config::{MatchMode, Rule, Scope};
    use serde_json::json;

    fn tree_for(rules: &[Rule]) -> ConfigTree {
        let mut tree = ConfigTree::new(MatchMode::Type.defaults());
        apply_rules(&mut tree, rules).expect("valid rules");
        tree
    }

    fn sweep(rules: &[Rule], actual: Value) -> Vec<Mismatch> {
        let tree = tree_for(rules);
        let mut mismatches = Vec::new();
        sweep_unaddressed(
            &tree,
            tree.root(),
            &actual,
            &NodePath::root(),
            &mut Sink::collecting(&mut mismatches),
        );
        mismatches
    }

    #[test]
    fn single_node_rule_only_checks_its_node() {
        let found = sweep(
            &[Rule::key_must_be_absent(["user"], ["password"])],
            json!({"user": {"name": "a", "nested": {"password": "x"}}}),
        );
        assert!(found.is_empty());
    }

    #[test]
    fn subtree_rule_reaches_unconfigured_descendants() {
        let found = sweep(
            &[Rule::key_must_be_absent(["user"], ["password"]).with_scope(Scope::Subtree)],
            json!({"user": {"devices": [{"password": "x"}]}}),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.to_string(), "user.devices[0]");
        assert_eq!(found[0].actual, Some(json!("x")));
    }

    #[test]
    fn silent_sweep_stops_at_the_first_forbidden_key() {
        let tree = tree_for(&[Rule::key_must_be_absent(Vec::<String>::new(), ["a", "b"])
            .with_scope(Scope::Subtree)]);
        let actual = json!({"nested": {"a": 1, "b": 2}});
        assert!(!sweep_unaddressed(
            &tree,
            tree.root(),
            &actual,
            &NodePath::root(),
            &mut Sink::silent(),
        ));
        assert!(sweep_unaddressed(
            &tree,
            tree.root(),
            &json!({"nested": {"c": 1}}),
            &NodePath::root(),
            &mut Sink::silent(),
        ));
    }

    #[test]
    fn inactive_rule_reports_nothing() {
        let tree = tree_for(&[Rule::key_must_be_absent(["m"], ["x"]).with_active(false)]);
        let actual = json!({"x": 1});
        let map = actual.as_object().expect("object");
        let cursor = tree.descend(tree.root(), "m");
        assert!(check_forbidden_keys(
            &tree,
            cursor,
            map,
            &NodePath::root().key("m"),
            &mut Sink::silent(),
        ));
    }
}
