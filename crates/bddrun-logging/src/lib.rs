//! Leveled logging for bddrun.
//!
//! Everything goes to stderr so that stdout stays free for machine-readable
//! output. A [`Logger`] can also capture entries into a shared
//! [`LogCollector`], which is how the engine tests look at what was logged.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// True if a threshold of `self` lets a message at `level` through.
    pub fn allows(self, level: LogLevel) -> bool {
        level <= self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Overrides of `level` for single components such as `engine`.
    #[serde(default)]
    pub component_levels: HashMap<String, LogLevel>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            component_levels: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    pub fn effective_level(&self, component: Option<&str>) -> LogLevel {
        component
            .and_then(|c| self.component_levels.get(c).copied())
            .unwrap_or(self.level)
    }

    pub fn should_log(&self, level: LogLevel, component: Option<&str>) -> bool {
        self.effective_level(component).allows(level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339.
    pub timestamp: String,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level,
            component: component.map(str::to_string),
            message: message.into(),
        }
    }

    /// One output line, without the trailing newline.
    pub fn format(&self, format: LogFormat, timestamps: bool) -> String {
        match format {
            LogFormat::Json => serde_json::to_string(self).unwrap_or_else(|_| self.message.clone()),
            LogFormat::Plain => {
                let mut line = String::new();
                if timestamps {
                    line.push_str(&self.timestamp);
                    line.push(' ');
                }
                line.push_str(&format!("{:<5}", self.level.as_str()));
                if let Some(c) = &self.component {
                    line.push_str(&format!(" [{c}]"));
                }
                line.push(' ');
                line.push_str(&self.message);
                line
            }
            LogFormat::Compact => {
                let initial = &self.level.as_str()[..1];
                match &self.component {
                    Some(c) => format!("{initial} {c}: {}", self.message),
                    None => format!("{initial} {}", self.message),
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct LogCollector {
    entries: Vec<LogEntry>,
}

impl LogCollector {
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn filter_by_level(&self, level: LogLevel) -> Vec<&LogEntry> {
        self.entries.iter().filter(|e| e.level == level).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Cheap to clone; clones share the config and the collector.
#[derive(Debug, Clone)]
pub struct Logger {
    config: Arc<LoggingConfig>,
    component: Option<Arc<str>>,
    stderr: bool,
    collector: Option<Arc<Mutex<LogCollector>>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl Logger {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config: Arc::new(config),
            component: None,
            stderr: true,
            collector: None,
        }
    }

    /// Writes nothing and keeps every entry that passes the level filter.
    pub fn capturing(config: LoggingConfig) -> (Self, Arc<Mutex<LogCollector>>) {
        let collector = Arc::new(Mutex::new(LogCollector::default()));
        let logger = Self {
            config: Arc::new(config),
            component: None,
            stderr: false,
            collector: Some(Arc::clone(&collector)),
        };
        (logger, collector)
    }

    /// Drops everything.
    pub fn silent() -> Self {
        Self {
            config: Arc::new(LoggingConfig::default()),
            component: None,
            stderr: false,
            collector: None,
        }
    }

    pub fn for_component(&self, component: &str) -> Self {
        Self {
            component: Some(Arc::from(component)),
            ..self.clone()
        }
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.config.should_log(level, self.component.as_deref())
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) || (!self.stderr && self.collector.is_none()) {
            return;
        }
        let entry = LogEntry::new(level, self.component.as_deref(), message);
        if self.stderr {
            let line = entry.format(self.config.format, self.config.timestamps);
            // A closed stderr is not worth failing a run over.
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        }
        if let Some(collector) = &self.collector
            && let Ok(mut guard) = collector.lock()
        {
            guard.push(entry);
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }
}
