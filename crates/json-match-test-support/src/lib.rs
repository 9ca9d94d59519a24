//! Shared test harness utilities for json-match crates.

use json_match_format::Report;
use serde_json::Value;

/// Parse an inline JSON fixture.
pub fn doc(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|err| panic!("invalid fixture {text:?}: {err}"))
}

/// `(location, rule)` pairs of every mismatch, in report order.
pub fn failures(report: &Report) -> Vec<(String, &'static str)> {
    report
        .mismatches
        .iter()
        .map(|mismatch| (mismatch.location(), mismatch.violation.rule()))
        .collect()
}
