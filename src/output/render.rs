//! Human-readable and JSON rendering of explanations.

use std::fmt::Write;

use crate::explain::{Explanation, StageExplanation};
use crate::shell::ParseError;

/// Render as plain text: `Command:`, `Explanation:`, `Notes:`, `Warnings:` blocks.
pub fn render_text(explanation: &Explanation) -> String {
    let mut out = format!("Command: {}\n", explanation.command);

    if !explanation.stages.is_empty() {
        out.push_str("\nExplanation:\n");
        for stage in &explanation.stages {
            render_stage(&mut out, stage);
        }
    }

    if !explanation.notes.is_empty() {
        out.push_str("\nNotes:\n");
        for note in &explanation.notes {
            let _ = writeln!(out, "{note}");
        }
    }

    if !explanation.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for warning in &explanation.warnings {
            let _ = writeln!(out, "[{}] {}", warning.severity, warning.message);
        }
    }

    out
}

fn render_stage(out: &mut String, stage: &StageExplanation) {
    let _ = writeln!(out, "{}: {}", stage.command, stage.summary);

    for flag in &stage.flags {
        let spelling = match &flag.value {
            Some(value) => format!("{} {value}", flag.flag),
            None => flag.flag.clone(),
        };
        let description = flag
            .description
            .as_deref()
            .unwrap_or("(no description available)");
        let _ = writeln!(out, "  {spelling}: {description}");
    }

    if let Some(pattern) = &stage.pattern {
        let _ = writeln!(out, "  Pattern '{}': {}", pattern.pattern, pattern.meaning);
    }

    if !stage.arguments.is_empty() {
        let _ = writeln!(out, "Arguments: {}", stage.arguments.join(", "));
    }

    for redirection in &stage.redirections {
        let _ = writeln!(out, "  {redirection}");
    }

    if let Some(connector) = &stage.connector {
        let _ = writeln!(out, "{connector}");
    }
}

/// Render as pretty-printed JSON.
pub fn render_json(explanation: &Explanation) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(explanation)
}

/// The one-line message printed for unparseable input.
pub fn format_parse_error(err: &ParseError) -> String {
    format!("cannot parse command: {err}")
}
