//! Engine settings and the keys the core recognizes.

use crate::errors::EngineError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log severity levels, ordered from least to most severe.
///
/// `None` sorts above every real level and is only meaningful as a
/// threshold value (it disables failure tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very fine-grained diagnostics.
    Trace,
    /// Debugging information.
    Debug,
    /// Normal operational messages.
    Information,
    /// Something unexpected but recoverable.
    Warning,
    /// A failure.
    Error,
    /// Not a real level; disables the failure threshold.
    None,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "Trace",
            Self::Debug => "Debug",
            Self::Information => "Information",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::None => "None",
        };
        write!(f, "{name}")
    }
}

impl FromStr for LogLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "information" | "info" => Ok(Self::Information),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "none" => Ok(Self::None),
            other => Err(EngineError::execution(format!("unknown log level '{other}'"))),
        }
    }
}

/// A log record captured by the failure threshold tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// The record's severity.
    pub level: LogLevel,
    /// The rendered message.
    pub message: String,
}

/// Output-directory cleaning behavior applied at the start of each
/// execution and on disposal.
///
/// The `Self` setting value parses to [`CleanMode::Written`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    /// Leave the output directory untouched.
    #[default]
    None,
    /// Delete only the files the engine wrote during its previous
    /// execution.
    #[serde(rename = "self")]
    Written,
    /// Wipe the entire output directory.
    Full,
}

impl FromStr for CleanMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "self" => Ok(Self::Written),
            "full" => Ok(Self::Full),
            other => Err(EngineError::execution(format!("unknown clean mode '{other}'"))),
        }
    }
}

/// Engine settings.
///
/// The core reads four keys; everything else is kept verbatim and exposed
/// to modules through the execution context.
#[derive(Debug, Clone)]
pub struct Settings {
    failure_log_level: LogLevel,
    clean_mode: CleanMode,
    analyzers: Vec<String>,
    use_string_content_files: bool,
    extra: IndexMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            failure_log_level: LogLevel::Error,
            clean_mode: CleanMode::None,
            analyzers: Vec::new(),
            use_string_content_files: false,
            extra: IndexMap::new(),
        }
    }
}

impl Settings {
    /// Creates settings with defaults (`FailureLogLevel = Error`,
    /// `CleanMode = None`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum log level that turns the execution into a failure.
    #[must_use]
    pub fn with_failure_log_level(mut self, level: LogLevel) -> Self {
        self.failure_log_level = level;
        self
    }

    /// Sets the clean mode.
    #[must_use]
    pub fn with_clean_mode(mut self, mode: CleanMode) -> Self {
        self.clean_mode = mode;
        self
    }

    /// Adds an analyzer activation entry (`"name"`, `"name=level"`, or
    /// `"All=level"`).
    #[must_use]
    pub fn with_analyzer(mut self, entry: impl Into<String>) -> Self {
        self.analyzers.push(entry.into());
        self
    }

    /// Spills string content to temp files instead of memory.
    #[must_use]
    pub fn with_string_content_files(mut self, enabled: bool) -> Self {
        self.use_string_content_files = enabled;
        self
    }

    /// Stores an arbitrary setting, recognizing the core keys
    /// `FailureLogLevel`, `CleanMode`, `Analyzers`, and
    /// `UseStringContentFiles` (case-insensitive).
    pub fn set(
        &mut self,
        key: impl AsRef<str>,
        value: serde_json::Value,
    ) -> Result<(), EngineError> {
        let key = key.as_ref();
        if key.eq_ignore_ascii_case("FailureLogLevel") {
            self.failure_log_level = expect_str(key, &value)?.parse()?;
        } else if key.eq_ignore_ascii_case("CleanMode") {
            self.clean_mode = expect_str(key, &value)?.parse()?;
        } else if key.eq_ignore_ascii_case("Analyzers") {
            self.analyzers = match value {
                serde_json::Value::String(s) => vec![s],
                serde_json::Value::Array(items) => items
                    .into_iter()
                    .map(|v| {
                        v.as_str().map(String::from).ok_or_else(|| {
                            EngineError::execution("Analyzers entries must be strings")
                        })
                    })
                    .collect::<Result<_, _>>()?,
                other => {
                    return Err(EngineError::execution(format!(
                        "Analyzers must be a string or array, got {other}"
                    )))
                }
            };
        } else if key.eq_ignore_ascii_case("UseStringContentFiles") {
            self.use_string_content_files = value.as_bool().ok_or_else(|| {
                EngineError::execution("UseStringContentFiles must be a boolean")
            })?;
        } else {
            self.extra.insert(key.to_string(), value);
        }
        Ok(())
    }

    /// Returns an unrecognized setting by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// The failure threshold level.
    #[must_use]
    pub fn failure_log_level(&self) -> LogLevel {
        self.failure_log_level
    }

    /// The configured clean mode.
    #[must_use]
    pub fn clean_mode(&self) -> CleanMode {
        self.clean_mode
    }

    /// The raw analyzer activation entries.
    #[must_use]
    pub fn analyzers(&self) -> &[String] {
        &self.analyzers
    }

    /// Whether string content should be spilled to temp files.
    #[must_use]
    pub fn use_string_content_files(&self) -> bool {
        self.use_string_content_files
    }
}

fn expect_str<'a>(key: &str, value: &'a serde_json::Value) -> Result<&'a str, EngineError> {
    value
        .as_str()
        .ok_or_else(|| EngineError::execution(format!("setting '{key}' must be a string")))
}
