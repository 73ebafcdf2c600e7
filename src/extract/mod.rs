//! Dynamic flag extraction for commands missing from the knowledge base.
//!
//! Extraction is two strict stages: acquire raw text from a [`HelpSource`]
//! (`command --help`, then the manual page), then parse it with the fixed
//! heuristics in [`parser`]. Any acquisition failure collapses to an empty
//! result; extraction never aborts an explanation.

mod parser;
mod source;

pub use parser::{extract_summary, parse_help_text};
pub use source::{
    DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT, HelpError, HelpOutput, HelpSource, ProbeLimits,
    SystemHelpSource, clean_manual_text, is_plausible_command_name,
};

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// A flag mined from help text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagEntry {
    /// e.g. `-v` or `--verbose`.
    pub spelling: String,
    pub description: String,
    /// Inferred from a placeholder on the definition line.
    pub takes_value: bool,
}

/// Flag spelling to entry.
pub type FlagMap = BTreeMap<String, FlagEntry>;

/// Everything mined from one command's help text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedHelp {
    pub summary: Option<String>,
    pub flags: FlagMap,
}

impl ExtractedHelp {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.flags.is_empty()
    }
}

/// Obtain help text: `command --help`, falling back to the manual page.
///
/// Returns `None` when neither source yields non-empty text.
pub fn fetch_help_text(command: &str, source: &dyn HelpSource) -> Option<String> {
    match source.run_help(command, &["--help"]) {
        Ok(output) if output.succeeded() && !output.stdout.trim().is_empty() => {
            return Some(output.stdout);
        }
        Ok(output) => debug!(command, exit_code = output.exit_code, "--help gave no usable output"),
        Err(err) => debug!(command, error = %err, "--help probe failed"),
    }

    match source.run_manual(command) {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            debug!(command, "manual page is empty");
            None
        }
        Err(err) => {
            debug!(command, error = %err, "manual probe failed");
            None
        }
    }
}

/// Extract the summary line and flags for `command`.
pub fn extract_help(command: &str, source: &dyn HelpSource) -> ExtractedHelp {
    let Some(text) = fetch_help_text(command, source) else {
        return ExtractedHelp::default();
    };
    let help = ExtractedHelp {
        summary: extract_summary(&text),
        flags: parse_help_text(&text),
    };
    debug!(command, flags = help.flags.len(), "extracted help");
    help
}

/// Extract only the flag map for `command`.
pub fn extract_flags(command: &str, source: &dyn HelpSource) -> FlagMap {
    extract_help(command, source).flags
}
