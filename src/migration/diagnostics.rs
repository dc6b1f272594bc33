// Leveled messages collected while converting a resource.

use colored::Colorize;
use std::fmt;

/// Target of the tracing events mirroring diagnostics.
pub const TRACING_TARGET: &str = "diagnostics";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    /// Dotted location in the source resource the message refers to.
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level.as_str(), self.path, self.message)
    }
}

impl Diagnostic {
    /// Renders the diagnostic with a colored level tag for terminal output.
    pub fn colored(&self) -> String {
        let tag = match self.level {
            Level::Info => self.level.as_str().cyan(),
            Level::Warn => self.level.as_str().yellow().bold(),
            Level::Error => self.level.as_str().red().bold(),
        };
        format!("{tag} {}: {}", self.path.bold(), self.message)
    }
}

/// Ordered transcript of a conversion. Every entry is also emitted as a tracing event.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, path: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            level,
            path: path.into(),
            message: message.into(),
        };
        match level {
            Level::Info => tracing::info!(target: TRACING_TARGET, path = %diagnostic.path, "{}", diagnostic.message),
            Level::Warn => tracing::warn!(target: TRACING_TARGET, path = %diagnostic.path, "{}", diagnostic.message),
            Level::Error => tracing::error!(target: TRACING_TARGET, path = %diagnostic.path, "{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Level::Info, path, message);
    }

    pub fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Level::Warn, path, message);
    }

    pub fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Level::Error, path, message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.level == Level::Error)
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries.iter().filter(|d| d.level == level).count()
    }
}
