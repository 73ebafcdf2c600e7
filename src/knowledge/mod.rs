//! Command knowledge: built-in table, user store, layered lookup.

mod builtin;
mod store;

pub use builtin::{BuiltinKnowledge, builtin_commands};
pub use store::{CustomCommandStore, StoreError, default_store_path, parse_flag_spec};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How risky a command is to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl DangerLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DangerLevel::Low => "low",
            DangerLevel::Medium => "medium",
            DangerLevel::High => "high",
            DangerLevel::Critical => "critical",
        }
    }

    /// High and critical commands get a warning of their own.
    pub fn is_severe(self) -> bool {
        self >= DangerLevel::High
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DangerLevel {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(DangerLevel::Low),
            "medium" => Ok(DangerLevel::Medium),
            "high" => Ok(DangerLevel::High),
            "critical" => Ok(DangerLevel::Critical),
            _ => Err(StoreError::InvalidDangerLevel(s.to_string())),
        }
    }
}

/// What the knowledge base knows about one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub description: String,
    pub danger_level: DangerLevel,
    /// Flag spelling to description.
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

impl CommandInfo {
    pub fn new(description: impl Into<String>, danger_level: DangerLevel) -> Self {
        Self {
            description: description.into(),
            danger_level,
            flags: BTreeMap::new(),
        }
    }

    pub fn with_flag(mut self, spelling: impl Into<String>, description: impl Into<String>) -> Self {
        self.flags.insert(spelling.into(), description.into());
        self
    }
}

/// Read-only command lookup.
pub trait KnowledgeBase {
    fn lookup(&self, command: &str) -> Option<&CommandInfo>;
}

impl KnowledgeBase for BTreeMap<String, CommandInfo> {
    fn lookup(&self, command: &str) -> Option<&CommandInfo> {
        self.get(command)
    }
}

/// User entries layered over the built-in table.
#[derive(Debug, Clone, Default)]
pub struct LayeredKnowledge {
    builtin: BuiltinKnowledge,
    custom: BTreeMap<String, CommandInfo>,
}

impl LayeredKnowledge {
    pub fn new(custom: BTreeMap<String, CommandInfo>) -> Self {
        Self {
            builtin: BuiltinKnowledge,
            custom,
        }
    }

    pub fn custom_len(&self) -> usize {
        self.custom.len()
    }
}

impl KnowledgeBase for LayeredKnowledge {
    fn lookup(&self, command: &str) -> Option<&CommandInfo> {
        self.custom
            .get(command)
            .or_else(|| self.builtin.lookup(command))
    }
}
