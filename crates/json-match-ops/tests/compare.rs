use json_match_config::{MatchMode, Rule, RuleError, RuleKind, Scope};
use json_match_format::Violation;
use json_match_ops::{compare, CompareError, Matcher};
use json_match_test_support::{doc, failures};
use pretty_assertions::assert_eq;
use serde_json::json;

fn run(mode: MatchMode, rules: &[Rule], expected: &str, actual: &str) -> Vec<(String, &'static str)> {
    let report = compare(mode, rules, &doc(expected), &doc(actual)).expect("valid rules");
    failures(&report)
}

fn passes(mode: MatchMode, rules: &[Rule], expected: &str, actual: &str) -> bool {
    Matcher::build(mode, rules)
        .expect("valid rules")
        .matches(&doc(expected), &doc(actual))
}

#[test]
fn wildcard_subtree_rule_frees_element_positions() {
    let rules = [Rule::wildcard_match(["key1"]).with_scope(Scope::Subtree)];
    assert!(passes(
        MatchMode::Type,
        &rules,
        r#"{"key1": [{"nest1": 1}]}"#,
        r#"{"key1": [{"nest1": 2}, {"nest1": 1}]}"#,
    ));
}

#[test]
fn equal_count_at_root_reports_both_sizes() {
    let report = compare(
        MatchMode::Type,
        &[Rule::new(RuleKind::CollectionEqualCount)],
        &json!([1]),
        &json!([1, 2]),
    )
    .expect("valid rules");

    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(
        report.mismatches[0].violation,
        Violation::CollectionCount {
            expected: 1,
            actual: 2,
            exact: true,
        }
    );
    assert_eq!(report.mismatches[0].location(), "<root>");
}

#[test]
fn extra_actual_elements_are_admitted_by_default() {
    assert!(passes(MatchMode::Exact, &[], "[1]", "[1, 2, 3]"));
    assert!(passes(MatchMode::Exact, &[], r#"{"a": 1}"#, r#"{"a": 1, "b": 2}"#));
    assert_eq!(
        run(MatchMode::Exact, &[], "[1, 2]", "[1]"),
        vec![("<root>".to_string(), "collection-minimum-count")]
    );
}

#[test]
fn per_index_primitive_mode_flips_one_element() {
    let type_at_zero = [Rule::value_type_match(["[0]"])];
    assert!(passes(MatchMode::Exact, &type_at_zero, "[1]", "[2]"));

    let exact_at_zero = [Rule::value_exact_match(["[0]"])];
    assert_eq!(
        run(MatchMode::Type, &exact_at_zero, "[1]", "[2]"),
        vec![("[0]".to_string(), "primitive-exact-match")]
    );
}

#[test]
fn array_level_primitive_rule_reaches_every_element() {
    let rules = [Rule::value_exact_match(["list"])];
    assert_eq!(
        run(MatchMode::Type, &rules, r#"{"list": [1, 2]}"#, r#"{"list": [1, 3]}"#),
        vec![("list[1]".to_string(), "primitive-exact-match")]
    );
}

#[test]
fn single_node_rules_stay_on_their_node() {
    let rules = [Rule::collection_equal_count(["a"])];
    assert!(passes(
        MatchMode::Type,
        &rules,
        r#"{"a": {"b": [1]}}"#,
        r#"{"a": {"b": [1, 2]}}"#,
    ));
    assert_eq!(
        run(MatchMode::Type, &rules, r#"{"a": {"x": 1}}"#, r#"{"a": {"x": 1, "y": 2}}"#),
        vec![("a".to_string(), "collection-equal-count")]
    );
}

#[test]
fn single_node_override_keeps_the_inherited_subtree_default() {
    let rules = [
        Rule::collection_equal_count(["a"]).with_scope(Scope::Subtree),
        Rule::collection_equal_count(["a.b"]).with_active(false),
    ];
    let expected = r#"{"a": {"b": {"c": [1]}}}"#;

    assert!(passes(
        MatchMode::Type,
        &rules,
        expected,
        r#"{"a": {"b": {"c": [1], "extra": true}}}"#,
    ));
    assert_eq!(
        run(MatchMode::Type, &rules, expected, r#"{"a": {"b": {"c": [1, 2]}}}"#),
        vec![("a.b.c".to_string(), "collection-equal-count")]
    );
}

#[test]
fn absent_key_rule_without_keys_is_an_authoring_error() {
    let rule = Rule::key_must_be_absent(["a"], Vec::<String>::new());
    let err = Matcher::build(MatchMode::Type, &[rule]).expect_err("authoring error");
    assert!(matches!(
        err,
        CompareError::InvalidRule {
            index: 0,
            kind: RuleKind::KeyMustBeAbsent,
            source: RuleError::MissingAbsentKeys,
        }
    ));
}

#[test]
fn malformed_paths_are_authoring_errors() {
    let err = Matcher::build(MatchMode::Exact, &[Rule::wildcard_match(["items[x]"])])
        .expect_err("bad index");
    assert!(matches!(
        err,
        CompareError::InvalidRule {
            source: RuleError::InvalidPath { .. },
            ..
        }
    ));
}

#[test]
fn applying_rules_twice_changes_nothing() {
    let rules = vec![
        Rule::wildcard_match(["items"]),
        Rule::value_exact_match(["items[*0].id"]),
        Rule::collection_equal_count(["meta"]).with_scope(Scope::Subtree),
        Rule::key_must_be_absent(["meta"], ["secret"]),
    ];
    let doubled: Vec<Rule> = rules.iter().chain(rules.iter()).cloned().collect();

    let once = Matcher::build(MatchMode::Type, &rules).expect("valid rules");
    let twice = Matcher::build(MatchMode::Type, &doubled).expect("valid rules");
    assert_eq!(once.tree().len(), twice.tree().len());

    let expected = doc(r#"{"items": [{"id": 2}, {"id": 1}], "meta": {"tags": ["a"]}}"#);
    let actuals = [
        r#"{"items": [{"id": 1}, {"id": 2}], "meta": {"tags": ["b"]}}"#,
        r#"{"items": [{"id": 3}, {"id": 1}], "meta": {"tags": ["a", "b"]}}"#,
        r#"{"items": [{"id": 2}, {"id": 1}], "meta": {"tags": ["a"], "secret": 1}}"#,
    ];
    for actual in actuals {
        let actual = doc(actual);
        assert_eq!(once.compare(&expected, &actual), twice.compare(&expected, &actual));
    }
}

#[test]
fn null_expected_is_vacuous_and_null_actual_is_missing() {
    assert!(passes(MatchMode::Exact, &[], r#"{"a": null}"#, r#"{}"#));
    assert!(passes(MatchMode::Exact, &[], "null", r#"{"anything": 1}"#));
    assert_eq!(
        run(MatchMode::Exact, &[], r#"{"a": 1}"#, r#"{"a": null}"#),
        vec![("a".to_string(), "required-value")]
    );
}

#[test]
fn integers_and_floats_are_different_types() {
    assert_eq!(
        run(MatchMode::Type, &[], r#"{"n": 1}"#, r#"{"n": 1.0}"#),
        vec![("n".to_string(), "type-match")]
    );
}

#[test]
fn type_mismatch_ignores_primitive_mode() {
    let rules = [Rule::value_type_match(Vec::<String>::new()).at_root()];
    assert_eq!(
        run(MatchMode::Exact, &rules, r#"{"a": [1]}"#, r#"{"a": {"0": 1}}"#),
        vec![("a".to_string(), "type-match")]
    );
}

#[test]
fn every_mismatch_is_collected() {
    assert_eq!(
        run(
            MatchMode::Exact,
            &[],
            r#"{"a": 1, "b": "x", "c": {"d": true}}"#,
            r#"{"a": "1", "b": "y", "c": {"d": false}}"#,
        ),
        vec![
            ("a".to_string(), "type-match"),
            ("b".to_string(), "primitive-exact-match"),
            ("c.d".to_string(), "primitive-exact-match"),
        ]
    );
}

#[test]
fn missing_keys_suggest_near_misses() {
    let report = compare(
        MatchMode::Type,
        &[],
        &json!({"username": "x"}),
        &json!({"usernme": "x"}),
    )
    .expect("valid rules");
    assert_eq!(
        report.mismatches[0].message(),
        "at username: required value missing (did you mean 'usernme'?)"
    );

    let quiet = Matcher::build(MatchMode::Type, &[])
        .expect("valid rules")
        .with_suggestions(false)
        .compare(&json!({"username": "x"}), &json!({"usernme": "x"}));
    assert_eq!(
        quiet.mismatches[0].violation,
        Violation::MissingValue { suggestion: None }
    );
}

#[test]
fn escaped_keys_address_literal_names() {
    let rules = [Rule::value_exact_match([r"a\.b"])];
    assert_eq!(
        run(MatchMode::Type, &rules, r#"{"a.b": 1}"#, r#"{"a.b": 2}"#),
        vec![(r"a\.b".to_string(), "primitive-exact-match")]
    );
}

#[test]
fn whole_array_wildcard_marker_ignores_order() {
    let rules = [Rule::collection_equal_count(["items[*]"])];
    assert!(passes(
        MatchMode::Exact,
        &rules,
        r#"{"items": [2, 1]}"#,
        r#"{"items": [1, 2]}"#,
    ));
    assert_eq!(
        run(MatchMode::Exact, &rules, r#"{"items": [2, 1]}"#, r#"{"items": [1, 2, 3]}"#),
        vec![("items".to_string(), "collection-equal-count")]
    );
}

#[test]
fn indexed_wildcard_only_frees_that_element() {
    let rules = [Rule::wildcard_match(["[*1]"])];
    assert!(passes(MatchMode::Exact, &rules, "[0, 9]", "[0, 7, 9]"));
    assert!(!passes(MatchMode::Exact, &[], "[0, 9]", "[0, 7, 9]"));
    assert!(!passes(MatchMode::Exact, &rules, "[9, 0]", "[0, 9]"));
}

#[test]
fn wildcard_root_rule_applies_to_top_level_array() {
    let rules = [Rule::new(RuleKind::WildcardMatch)];
    assert!(passes(MatchMode::Exact, &rules, "[3, 1, 2]", "[1, 2, 3]"));
}

#[test]
fn greedy_assignment_can_miss_a_valid_pairing() {
    let rules = [Rule::new(RuleKind::WildcardMatch)];
    let report = compare(
        MatchMode::Type,
        &rules,
        &json!([{"a": 1}, {"a": 1, "b": 2}]),
        &json!([{"a": 1, "b": 2}, {"a": 1}]),
    )
    .expect("valid rules");

    assert_eq!(report.mismatches.len(), 1);
    assert_eq!(report.mismatches[0].location(), "[1]");
    assert_eq!(
        report.mismatches[0].violation,
        Violation::NoWildcardCandidate { remaining: vec![1] }
    );
}

#[test]
fn fixed_positions_are_removed_from_the_wildcard_pool() {
    let rules = [Rule::wildcard_match(["[*1]"])];
    let report = compare(MatchMode::Exact, &rules, &json!([1, 1]), &json!([1, 2]))
        .expect("valid rules");
    assert_eq!(
        report.mismatches[0].violation,
        Violation::NoWildcardCandidate { remaining: vec![1] }
    );
}

#[test]
fn rejected_wildcard_candidates_leave_no_trace() {
    let rules = [Rule::new(RuleKind::WildcardMatch)];
    let report = compare(
        MatchMode::Exact,
        &rules,
        &json!([{"id": 2}]),
        &json!([{"id": 1}, {"id": 2}]),
    )
    .expect("valid rules");
    assert!(report.matched());
}

#[test]
fn forbidden_keys_are_checked_outside_the_expected_document() {
    let rules = [Rule::key_must_be_absent(["user"], ["password"])];
    assert_eq!(
        run(
            MatchMode::Type,
            &rules,
            r#"{"id": 1}"#,
            r#"{"id": 1, "user": {"password": "hunter2"}}"#,
        ),
        vec![("user".to_string(), "key-must-be-absent")]
    );
    assert!(passes(
        MatchMode::Type,
        &rules,
        r#"{"id": 1}"#,
        r#"{"id": 1, "user": {"name": "a"}}"#,
    ));
}

#[test]
fn inactive_absent_rule_may_omit_keys() {
    let rules = [
        Rule::key_must_be_absent(["a"], ["x"]).with_scope(Scope::Subtree),
        Rule::key_must_be_absent(["a.b"], Vec::<String>::new()).with_active(false),
    ];
    assert_eq!(
        run(
            MatchMode::Type,
            &rules,
            "{}",
            r#"{"a": {"b": {"x": 1, "c": {"x": 2}}}}"#,
        ),
        vec![("a.b.c".to_string(), "key-must-be-absent")]
    );
}

#[test]
fn forbidden_keys_follow_the_wildcard_pairing() {
    let rules = [
        Rule::wildcard_match(["items"]),
        Rule::key_must_be_absent(["items[0]"], ["secret"]),
    ];
    let expected = r#"{"items": [{"id": 2}]}"#;

    // The unpaired element is not the one the rule names.
    let clean_pairing = r#"{"items": [{"id": 1, "secret": 1}, {"id": 2}]}"#;
    assert!(passes(MatchMode::Exact, &rules, expected, clean_pairing));
    assert!(run(MatchMode::Exact, &rules, expected, clean_pairing).is_empty());

    // The only candidate carrying the right id holds the forbidden key.
    assert_eq!(
        run(
            MatchMode::Exact,
            &rules,
            expected,
            r#"{"items": [{"id": 1}, {"id": 2, "secret": 1}]}"#,
        ),
        vec![("items[0]".to_string(), "wildcard-match")]
    );
}

#[test]
fn wildcard_search_skips_candidates_with_forbidden_keys() {
    let rules = [
        Rule::new(RuleKind::WildcardMatch),
        Rule::key_must_be_absent(["[0]"], ["debug"]),
    ];
    let report = compare(
        MatchMode::Type,
        &rules,
        &json!([{"id": 1}]),
        &json!([{"id": 7, "debug": true}, {"id": 8}]),
    )
    .expect("valid rules");
    assert!(report.matched());
}

#[test]
fn unpaired_elements_are_checked_against_array_wide_rules() {
    let rules = [Rule::key_must_be_absent(["items"], ["secret"]).with_scope(Scope::Subtree)];
    assert_eq!(
        run(
            MatchMode::Type,
            &rules,
            r#"{"items": [{"id": 1}]}"#,
            r#"{"items": [{"id": 1}, {"id": 2, "secret": 1}]}"#,
        ),
        vec![("items[1]".to_string(), "key-must-be-absent")]
    );

    let counted = [
        rules[0].clone(),
        Rule::collection_equal_count(["items"]),
    ];
    assert_eq!(
        run(
            MatchMode::Type,
            &counted,
            r#"{"items": [{"id": 1}]}"#,
            r#"{"items": [{"secret": 1}, {"id": 2}]}"#,
        ),
        vec![
            ("items".to_string(), "collection-equal-count"),
            ("items[0]".to_string(), "key-must-be-absent"),
        ]
    );
}

#[test]
fn later_root_subtree_rule_wins_for_maps_and_arrays_alike() {
    let expected = r#"{"list": [1], "m": {"x": 1}}"#;
    let actual = r#"{"list": [2], "m": {"x": 2}}"#;
    let both = vec![
        ("list[0]".to_string(), "primitive-exact-match"),
        ("m.x".to_string(), "primitive-exact-match"),
    ];

    for earlier in ["list", "m"] {
        let rules = [
            Rule::value_type_match([earlier]),
            Rule::value_exact_match(Vec::<String>::new()).at_root(),
        ];
        assert_eq!(run(MatchMode::Type, &rules, expected, actual), both);
    }

    // A single-node override is not replaced by the later subtree rule.
    let pinned = [
        Rule::value_type_match(["list"]).with_scope(Scope::SingleNode),
        Rule::value_exact_match(Vec::<String>::new()).at_root(),
    ];
    assert_eq!(
        run(MatchMode::Type, &pinned, expected, actual),
        vec![("m.x".to_string(), "primitive-exact-match")]
    );
}

#[test]
fn null_wildcard_elements_take_no_candidate() {
    let rules = [Rule::new(RuleKind::WildcardMatch)];
    assert!(passes(MatchMode::Exact, &rules, "[null, 5]", "[5, 6]"));
    assert!(run(MatchMode::Exact, &rules, "[null, 5]", "[5, 6]").is_empty());
}
