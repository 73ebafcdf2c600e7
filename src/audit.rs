//! JSONL audit log of explained commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::explain::Explanation;
use crate::shell::ParseError;

/// Longest command kept in a record.
const MAX_COMMAND_LEN: usize = 200;

/// An audit log entry.
#[derive(Debug, Serialize)]
pub struct AuditEntry {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// The command, truncated.
    pub command: String,
    /// Number of pipeline stages (0 on parse error).
    pub stages: usize,
    /// Rule ids of the warnings raised.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Parse error kind, when the command could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl AuditEntry {
    /// Create an entry for an explained command.
    pub fn explained(explanation: &Explanation) -> Self {
        Self {
            timestamp: Utc::now(),
            command: truncate_string(&explanation.command, MAX_COMMAND_LEN),
            stages: explanation.stages.len(),
            warnings: explanation.warnings.iter().map(|w| w.rule.clone()).collect(),
            parse_error: None,
        }
    }

    /// Create an entry for a command that failed to parse.
    pub fn rejected(command: &str, error: &ParseError) -> Self {
        Self {
            timestamp: Utc::now(),
            command: truncate_string(command, MAX_COMMAND_LEN),
            stages: 0,
            warnings: Vec::new(),
            parse_error: Some(error.kind().to_string()),
        }
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len - 3;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Audit logger for writing entries to a file.
pub struct AuditLogger {
    file: File,
}

impl AuditLogger {
    /// Open or create an audit log file, creating parent directories.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }

    /// Write an audit entry to the log.
    pub fn log(&mut self, entry: &AuditEntry) -> std::io::Result<()> {
        let json = serde_json::to_string(entry)?;
        writeln!(self.file, "{}", json)?;
        self.file.flush()
    }
}
