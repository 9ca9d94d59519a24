//! Structural assertions over JSON documents.
//!
//! `expected` describes the part of `actual` a test cares about. Keys only
//! present in `actual` are ignored, `null` in `expected` matches anything,
//! and rule declarations relax or tighten the comparison for chosen paths.
//!
//! ```no_run
//! use json_match_core::{assert_type_match, Rule};
//! use serde_json::json;
//!
//! assert_type_match(
//!     &json!({"items": [{"id": 1}]}),
//!     &json!({"items": [{"id": 7, "name": "b"}, {"id": 3}]}),
//!     &[Rule::wildcard_match(["items"])],
//! );
//! ```

pub mod reporter;

use json_match_format::{Mismatch, Renderer, Report};
use json_match_ops::Matcher;
use serde_json::Value;

pub use json_match_config::{MatchMode, Rule, RuleKind, Scope};
pub use json_match_format::Violation;
pub use json_match_ops::CompareError;
pub use reporter::{CollectingReporter, Failure, PanicReporter, Reporter};

/// Run one comparison and route failures through `reporter`.
///
/// Returns `true` when `actual` satisfies `expected` under `mode` and `rules`.
pub fn check(
    mode: MatchMode,
    expected: &Value,
    actual: &Value,
    rules: &[Rule],
    reporter: &mut dyn Reporter,
) -> bool {
    match evaluate(mode, expected, actual, rules) {
        Ok(report) => {
            let renderer = Renderer::default();
            for mismatch in &report.mismatches {
                reporter.fail(&renderer.render_mismatch(mismatch), Some(mismatch));
            }
            report.matched()
        }
        Err(err) => {
            let mismatch = Mismatch::authoring(err.to_string());
            reporter.fail(&mismatch.message(), Some(&mismatch));
            false
        }
    }
}

/// Build the full report without reporting anything.
pub fn evaluate(
    mode: MatchMode,
    expected: &Value,
    actual: &Value,
    rules: &[Rule],
) -> Result<Report, CompareError> {
    Ok(Matcher::build(mode, rules)?.compare(expected, actual))
}

pub fn assert_exact_match_with(
    expected: &Value,
    actual: &Value,
    rules: &[Rule],
    reporter: &mut dyn Reporter,
) -> bool {
    check(MatchMode::Exact, expected, actual, rules, reporter)
}

pub fn assert_type_match_with(
    expected: &Value,
    actual: &Value,
    rules: &[Rule],
    reporter: &mut dyn Reporter,
) -> bool {
    check(MatchMode::Type, expected, actual, rules, reporter)
}

/// Scalars must be equal unless a rule says otherwise. Panics with the full
/// report on failure.
pub fn assert_exact_match(expected: &Value, actual: &Value, rules: &[Rule]) {
    assert_or_panic(MatchMode::Exact, expected, actual, rules);
}

/// Scalars only need matching types unless a rule says otherwise. Panics
/// with the full report on failure.
pub fn assert_type_match(expected: &Value, actual: &Value, rules: &[Rule]) {
    assert_or_panic(MatchMode::Type, expected, actual, rules);
}

/// Exact match, except type-only comparison below each of `type_match_paths`.
pub fn assert_exact_match_except<I, P>(expected: &Value, actual: &Value, type_match_paths: I)
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let rules = shorthand_rules(MatchMode::Exact, type_match_paths);
    assert_exact_match(expected, actual, &rules);
}

/// Type match, except literal comparison below each of `exact_match_paths`.
pub fn assert_type_match_except<I, P>(expected: &Value, actual: &Value, exact_match_paths: I)
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let rules = shorthand_rules(MatchMode::Type, exact_match_paths);
    assert_type_match(expected, actual, &rules);
}

/// Rules flipping each path to the opposite of `mode`. No paths means no rules.
pub fn shorthand_rules<I, P>(mode: MatchMode, paths: I) -> Vec<Rule>
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
    if paths.is_empty() {
        return Vec::new();
    }
    let rule = match mode.opposite() {
        MatchMode::Exact => Rule::value_exact_match(paths),
        MatchMode::Type => Rule::value_type_match(paths),
    };
    vec![rule]
}

fn assert_or_panic(mode: MatchMode, expected: &Value, actual: &Value, rules: &[Rule]) {
    match evaluate(mode, expected, actual, rules) {
        Ok(report) if report.matched() => {}
        Ok(report) => panic!("{}", Renderer::default().render_plain(&report)),
        Err(err) => panic!("{}", Mismatch::authoring(err.to_string()).message()),
    }
}
