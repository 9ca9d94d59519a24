//! Rule declarations and layered configuration for the json-match toolkit.
//!
//! Rules can be declared in code through [`Rule`] or in `.json-match.toml`
//! files. The loader resolves files using the precedence stack
//! override flag → working directory → git root → built-in defaults, and
//! normalises them into typed settings so the comparison engine never
//! touches raw TOML.

mod rules;

pub use rules::{MatchMode, Rule, RuleError, RuleKind, RuleSetting, RuleTable, Scope};

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".json-match.toml";
const DEFAULT_MAX_VALUE_CHARS: usize = 120;
const MIN_VALUE_CHARS: usize = 8;

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub matching: MatchSettings,
    pub report: ReportSettings,
    pub rules: Vec<ConfiguredRule>,
    pub sources: ConfigSources,
}

impl Config {
    /// Rule declarations in application order.
    pub fn rule_list(&self) -> Vec<Rule> {
        self.rules.iter().map(|entry| entry.rule.clone()).collect()
    }
}

/// Settings that select the comparison mode.
#[derive(Clone, Debug)]
pub struct MatchSettings {
    pub mode: MatchMode,
}

/// Settings that shape rendered reports.
#[derive(Clone, Debug)]
pub struct ReportSettings {
    pub format: ReportFormat,
    pub max_value_chars: usize,
    pub suggestions: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            format: ReportFormat::Plain,
            max_value_chars: DEFAULT_MAX_VALUE_CHARS,
            suggestions: true,
        }
    }
}

/// Output format for comparison reports.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReportFormat {
    Plain,
    Json,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReportFormat::Plain => "plain",
            ReportFormat::Json => "json",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "plain" => Ok(ReportFormat::Plain),
            "json" => Ok(ReportFormat::Json),
            _ => Err(()),
        }
    }
}

/// Rule declaration together with the layer that supplied it.
#[derive(Clone, Debug)]
pub struct ConfiguredRule {
    pub rule: Rule,
    pub source: ConfigSource,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn default() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    pub fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(ConfigSource::default()));

        let mut source_layers = vec![ConfigSource::default()];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            matching: resolved.matching,
            report: resolved.report,
            rules: resolved.rules,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Parse a single TOML document on top of the built-in defaults, without
    /// consulting the filesystem.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let source = ConfigSource {
            kind: ConfigSourceKind::Override,
            path: None,
        };
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(ConfigSource::default()));
        let layer = parse_layer(contents, source.clone()).map_err(|err| match err {
            LayerParseError::Parse { source } => ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            },
        })?;
        merged.merge(layer);

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            matching: resolved.matching,
            report: resolved.report,
            rules: resolved.rules,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default(), source],
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(ConfigSource::default()));
        let resolved = merged.finalize().unwrap_or_else(|err| {
            panic!("built-in json-match defaults are invalid: {err}");
        });
        Config {
            matching: resolved.matching,
            report: resolved.report,
            rules: resolved.rules,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default()],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|err| match err {
        LayerParseError::Parse { source } => ConfigError::Parse {
            path: path.into(),
            source,
        },
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, LayerParseError> {
    let raw: RawConfig =
        toml::from_str(contents).map_err(|source| LayerParseError::Parse { source })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        mode: Some(Located::new("type".into(), source.clone())),
        format: Some(Located::new("plain".into(), source.clone())),
        max_value_chars: Some(Located::new(DEFAULT_MAX_VALUE_CHARS, source.clone())),
        suggestions: Some(Located::new(true, source)),
        rules: Vec::new(),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Debug)]
enum LayerParseError {
    Parse { source: toml::de::Error },
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    mode: Option<Located<String>>,
    format: Option<Located<String>>,
    max_value_chars: Option<Located<usize>>,
    suggestions: Option<Located<bool>>,
    rules: Vec<Located<RawRule>>,
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        if other.mode.is_some() {
            self.mode = other.mode;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.max_value_chars.is_some() {
            self.max_value_chars = other.max_value_chars;
        }
        if other.suggestions.is_some() {
            self.suggestions = other.suggestions;
        }
        // Later layers are applied later, so their declarations win.
        self.rules.extend(other.rules);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let mode = match self.mode {
            Some(located) => match located.value.parse::<MatchMode>() {
                Ok(mode) => mode,
                Err(()) => {
                    errors.push(ConfigValidationError::new(
                        Some(located.source),
                        format!(
                            "match.mode must be 'exact' or 'type' (received '{}')",
                            located.value
                        ),
                    ));
                    MatchMode::Type
                }
            },
            None => MatchMode::Type,
        };

        let format = match self.format {
            Some(located) => match located.value.parse::<ReportFormat>() {
                Ok(format) => format,
                Err(()) => {
                    errors.push(ConfigValidationError::new(
                        Some(located.source),
                        format!(
                            "report.format must be 'plain' or 'json' (received '{}')",
                            located.value
                        ),
                    ));
                    ReportFormat::Plain
                }
            },
            None => ReportFormat::Plain,
        };

        let max_value_chars = match self.max_value_chars {
            Some(located) if located.value < MIN_VALUE_CHARS => {
                errors.push(ConfigValidationError::new(
                    Some(located.source),
                    format!(
                        "report.max_value_chars must be at least {MIN_VALUE_CHARS} (received {})",
                        located.value
                    ),
                ));
                DEFAULT_MAX_VALUE_CHARS
            }
            Some(located) => located.value,
            None => DEFAULT_MAX_VALUE_CHARS,
        };

        let suggestions = self.suggestions.map(|located| located.value).unwrap_or(true);
        let rules = parse_rules(self.rules, &mut errors);

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            matching: MatchSettings { mode },
            report: ReportSettings {
                format,
                max_value_chars,
                suggestions,
            },
            rules,
        })
    }
}

#[derive(Debug)]
struct ResolvedConfig {
    matching: MatchSettings,
    report: ReportSettings,
    rules: Vec<ConfiguredRule>,
}

fn parse_rules(
    entries: Vec<Located<RawRule>>,
    errors: &mut Vec<ConfigValidationError>,
) -> Vec<ConfiguredRule> {
    let mut rules = Vec::new();

    for (position, entry) in entries.into_iter().enumerate() {
        let Located { value: raw, source } = entry;
        let context = format!("rules[{position}]");

        let kind = match raw.kind.parse::<RuleKind>() {
            Ok(kind) => kind,
            Err(()) => {
                errors.push(
                    ConfigValidationError::new(
                        Some(source.clone()),
                        format!("unknown rule kind '{}'", raw.kind),
                    )
                    .with_context(context),
                );
                continue;
            }
        };

        let mut rule = Rule::new(kind);
        if let Some(paths) = raw.paths {
            rule = rule.at_paths(paths);
        }
        if let Some(active) = raw.active {
            rule = rule.with_active(active);
        }
        if let Some(scope) = raw.scope {
            match scope.parse::<Scope>() {
                Ok(scope) => rule = rule.with_scope(scope),
                Err(()) => {
                    errors.push(
                        ConfigValidationError::new(
                            Some(source.clone()),
                            format!("scope must be 'single-node' or 'subtree' (received '{scope}')"),
                        )
                        .with_context(context),
                    );
                    continue;
                }
            }
        }
        if let Some(keys) = raw.keys {
            if kind != RuleKind::KeyMustBeAbsent {
                errors.push(
                    ConfigValidationError::new(
                        Some(source.clone()),
                        format!("keys are only accepted by key-must-be-absent rules, not {kind}"),
                    )
                    .with_context(context),
                );
                continue;
            }
            rule.keys = keys;
        }

        if let Err(err) = rule.parsed_targets() {
            errors.push(
                ConfigValidationError::new(Some(source.clone()), err.to_string())
                    .with_context(context),
            );
            continue;
        }

        rules.push(ConfiguredRule { rule, source });
    }

    rules
}

/// Aggregated validation failures.
#[derive(Debug)]
pub struct ConfigValidationErrors(Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {error}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Single validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, rename = "match")]
    matching: Option<RawMatch>,
    #[serde(default)]
    report: Option<RawReport>,
    #[serde(default)]
    rules: Vec<RawRule>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let mut partial = PartialConfig::default();
        if let Some(matching) = self.matching {
            partial.mode = matching
                .mode
                .map(|value| Located::new(value, source.clone()));
        }
        if let Some(report) = self.report {
            partial.format = report
                .format
                .map(|value| Located::new(value, source.clone()));
            partial.max_value_chars = report
                .max_value_chars
                .map(|value| Located::new(value, source.clone()));
            partial.suggestions = report
                .suggestions
                .map(|value| Located::new(value, source.clone()));
        }
        partial.rules = self
            .rules
            .into_iter()
            .map(|rule| Located::new(rule, source.clone()))
            .collect();
        partial
    }
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    max_value_chars: Option<usize>,
    #[serde(default)]
    suggestions: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawRule {
    kind: String,
    #[serde(default)]
    paths: Option<Vec<String>>,
    #[serde(default)]
    active: Option<bool>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    keys: Option<Vec<String>>,
}
