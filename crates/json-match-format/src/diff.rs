use serde_json::Value;
use similar::TextDiff;

/// Unified diff of the pretty-printed documents, or `None` when they render
/// identically.
pub fn render_document_diff(expected: &Value, actual: &Value) -> Option<String> {
    let original = format!("{expected:#}\n");
    let modified = format!("{actual:#}\n");
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original.as_str(), modified.as_str());
    let rendered = diff
        .unified_diff()
        .header("expected", "actual")
        .to_string();
    Some(rendered)
}
