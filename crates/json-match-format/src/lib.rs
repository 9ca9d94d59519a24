//! Mismatch records and report renderers for json-match.
//!
//! The comparison engine produces [`Mismatch`] values; this crate turns a
//! batch of them into plain text for terminals and test failures, or JSON for
//! tooling.

mod diff;

pub use diff::render_document_diff;

use std::fmt;

use chrono::Utc;
use json_match_config::{Config, MatchMode, ReportFormat, ReportSettings};
use json_match_path::NodePath;
use serde::Serialize;
use serde_json::Value;

const ROOT_LABEL: &str = "<root>";

/// Runtime type class of a JSON value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(number) if number.is_f64() => ValueType::Float,
            Value::Number(_) => ValueType::Integer,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::Object => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong at a node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Violation {
    MissingValue {
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
    TypeMismatch {
        expected: ValueType,
        actual: ValueType,
    },
    ValueMismatch,
    CollectionCount {
        expected: usize,
        actual: usize,
        exact: bool,
    },
    NoWildcardCandidate {
        remaining: Vec<usize>,
    },
    KeyPresent {
        key: String,
    },
    Authoring {
        message: String,
    },
}

impl Violation {
    /// Short identifier of the rule or check that failed.
    pub fn rule(&self) -> &'static str {
        match self {
            Violation::MissingValue { .. } => "required-value",
            Violation::TypeMismatch { .. } => "type-match",
            Violation::ValueMismatch => "primitive-exact-match",
            Violation::CollectionCount { exact: true, .. } => "collection-equal-count",
            Violation::CollectionCount { exact: false, .. } => "collection-minimum-count",
            Violation::NoWildcardCandidate { .. } => "wildcard-match",
            Violation::KeyPresent { .. } => "key-must-be-absent",
            Violation::Authoring { .. } => "authoring",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Violation::MissingValue {
                suggestion: Some(suggestion),
            } => format!("required value missing (did you mean '{suggestion}'?)"),
            Violation::MissingValue { suggestion: None } => "required value missing".to_string(),
            Violation::TypeMismatch { expected, actual } => {
                format!("type mismatch: expected {expected}, actual {actual}")
            }
            Violation::ValueMismatch => "value mismatch".to_string(),
            Violation::CollectionCount {
                expected,
                actual,
                exact: true,
            } => format!("expected exactly {expected} element(s), actual has {actual}"),
            Violation::CollectionCount {
                expected,
                actual,
                exact: false,
            } => format!("expected at least {expected} element(s), actual has {actual}"),
            Violation::NoWildcardCandidate { remaining } => {
                let pool: Vec<String> = remaining.iter().map(usize::to_string).collect();
                format!(
                    "no candidate available among unmatched actual indices [{}]",
                    pool.join(", ")
                )
            }
            Violation::KeyPresent { key } => format!("key '{key}' must be absent"),
            Violation::Authoring { message } => format!("invalid rule declaration: {message}"),
        }
    }
}

/// One failed check, located in the document.
#[derive(Clone, Debug, PartialEq)]
pub struct Mismatch {
    pub path: NodePath,
    pub violation: Violation,
    pub expected: Option<Value>,
    pub actual: Option<Value>,
}

impl Mismatch {
    pub fn new(
        path: NodePath,
        violation: Violation,
        expected: Option<&Value>,
        actual: Option<&Value>,
    ) -> Self {
        Mismatch {
            path,
            violation,
            expected: expected.cloned(),
            actual: actual.cloned(),
        }
    }

    pub fn authoring(message: impl Into<String>) -> Self {
        Mismatch {
            path: NodePath::root(),
            violation: Violation::Authoring {
                message: message.into(),
            },
            expected: None,
            actual: None,
        }
    }

    /// Location label, with the top-level node spelled out.
    pub fn location(&self) -> String {
        if self.path.is_root() {
            ROOT_LABEL.to_string()
        } else {
            self.path.to_string()
        }
    }

    /// One-line narration used for host failure messages.
    pub fn message(&self) -> String {
        format!("at {}: {}", self.location(), self.violation.describe())
    }
}

/// Outcome of one comparison.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub mode: MatchMode,
    pub mismatches: Vec<Mismatch>,
}

impl Report {
    pub fn new(mode: MatchMode, mismatches: Vec<Mismatch>) -> Self {
        Report { mode, mismatches }
    }

    pub fn matched(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    matched: bool,
    mode: &'a str,
    generated_at: String,
    mismatch_count: usize,
    mismatches: Vec<JsonMismatch<'a>>,
}

#[derive(Serialize)]
struct JsonMismatch<'a> {
    path: String,
    rule: &'static str,
    message: String,
    violation: &'a Violation,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<&'a Value>,
}

impl<'a> JsonMismatch<'a> {
    fn from_mismatch(mismatch: &'a Mismatch) -> Self {
        JsonMismatch {
            path: mismatch.path.to_string(),
            rule: mismatch.violation.rule(),
            message: mismatch.violation.describe(),
            violation: &mismatch.violation,
            expected: mismatch.expected.as_ref(),
            actual: mismatch.actual.as_ref(),
        }
    }
}

/// Renders reports according to [`ReportSettings`].
#[derive(Clone, Debug)]
pub struct Renderer {
    settings: ReportSettings,
}

impl Renderer {
    /// Build a renderer from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.report.clone())
    }

    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    pub fn render(&self, report: &Report) -> String {
        match self.settings.format {
            ReportFormat::Plain => self.render_plain(report),
            ReportFormat::Json => self.render_json(report),
        }
    }

    pub fn render_plain(&self, report: &Report) -> String {
        if report.matched() {
            return format!("json-match: {} comparison passed\n", report.mode);
        }

        let mut output = format!(
            "json-match: {} comparison failed with {} mismatch(es)\n",
            report.mode,
            report.mismatches.len()
        );
        for mismatch in &report.mismatches {
            output.push('\n');
            output.push_str(&self.render_mismatch(mismatch));
        }
        output
    }

    /// Multi-line narration of a single mismatch.
    pub fn render_mismatch(&self, mismatch: &Mismatch) -> String {
        let mut block = format!(
            "  at {}: {}\n    rule: {}\n",
            mismatch.location(),
            mismatch.violation.describe(),
            mismatch.violation.rule()
        );
        if let Some(expected) = &mismatch.expected {
            block.push_str(&format!("    expected: {}\n", self.quote(expected)));
        }
        if let Some(actual) = &mismatch.actual {
            block.push_str(&format!("    actual:   {}\n", self.quote(actual)));
        }
        block
    }

    pub fn render_json(&self, report: &Report) -> String {
        let payload = JsonReport {
            matched: report.matched(),
            mode: report.mode.as_str(),
            generated_at: Utc::now().to_rfc3339(),
            mismatch_count: report.mismatches.len(),
            mismatches: report
                .mismatches
                .iter()
                .map(JsonMismatch::from_mismatch)
                .collect(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => rendered,
            Err(err) => format!("{{\"error\": \"failed to render report: {err}\"}}"),
        }
    }

    fn quote(&self, value: &Value) -> String {
        truncate(&value.to_string(), self.settings.max_value_chars)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(ReportSettings::default())
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
