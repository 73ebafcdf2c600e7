//! Risk patterns in a decomposed command line.
//!
//! Every stage is unwrapped first, so `sudo rm -rf /` is checked as
//! `rm -rf /`. Commands handed to `sh -c` are parsed and checked too.

mod disk;
mod download;
mod rm;
mod sensitive;

pub use disk::{check_dd, check_mkfs};
pub use download::{INTERPRETERS, check_remote_script};
pub use rm::check_rm;
pub use sensitive::{DangerRules, SensitivePattern, check_sensitive_reads};

use serde::Serialize;
use tracing::debug;

use crate::knowledge::DangerLevel;
use crate::shell::{
    Connector, Pipeline, PipelineStage, RedirectOp, parse_pipeline, shell_payload, strip_wrappers,
};

/// Maximum nesting of `sh -c '...'` payloads to inspect.
const MAX_PAYLOAD_DEPTH: usize = 3;

/// A risk found in the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Stable rule id, e.g. `rm.system_path`.
    pub rule: String,
    pub message: String,
    pub severity: DangerLevel,
}

impl Warning {
    pub fn new(rule: impl Into<String>, severity: DangerLevel, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Scan `pipeline` (parsed from `raw`) for dangerous patterns.
pub fn detect(raw: &str, pipeline: &Pipeline, rules: &DangerRules) -> Vec<Warning> {
    let mut warnings = Vec::new();
    detect_into(raw, pipeline, rules, 0, &mut warnings);

    let mut seen = std::collections::HashSet::new();
    warnings.retain(|w| seen.insert((w.rule.clone(), w.message.clone())));
    warnings
}

fn detect_into(
    raw: &str,
    pipeline: &Pipeline,
    rules: &DangerRules,
    depth: usize,
    warnings: &mut Vec<Warning>,
) {
    if is_fork_bomb(raw) {
        warnings.push(Warning::new(
            "fork_bomb",
            DangerLevel::Critical,
            "This is a fork bomb and will likely crash your system.",
        ));
    }

    let stages: Vec<PipelineStage> = pipeline.stages.iter().map(strip_wrappers).collect();

    for (i, stage) in stages.iter().enumerate() {
        warnings.extend(check_rm(stage));
        warnings.extend(check_dd(stage));
        warnings.extend(check_mkfs(stage));
        warnings.extend(check_sensitive_reads(stage, rules));
        warnings.extend(check_dev_null(stage));

        if pipeline.connector_after(i) == Some(Connector::Pipe) {
            if let Some(next) = stages.get(i + 1) {
                warnings.extend(check_remote_script(stage, next));
            }
        }

        if depth >= MAX_PAYLOAD_DEPTH {
            continue;
        }
        if let Some(payload) = shell_payload(stage) {
            match parse_pipeline(payload) {
                Ok(inner) => detect_into(payload, &inner, rules, depth + 1, warnings),
                Err(e) => debug!(payload, error = %e, "shell payload not parseable"),
            }
        }
    }
}

/// `:(){ :|:& };:` in any spacing.
fn is_fork_bomb(raw: &str) -> bool {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.contains(":(){:|:&};:")
}

fn check_dev_null(stage: &PipelineStage) -> Vec<Warning> {
    stage
        .redirections
        .iter()
        .filter(|r| r.target == "/dev/null")
        .filter_map(|r| match r.operator {
            RedirectOp::Stdout | RedirectOp::StdoutAppend => Some(Warning::new(
                "redirect.dev_null",
                DangerLevel::Low,
                "Redirecting output to /dev/null will hide all output.",
            )),
            RedirectOp::Stderr | RedirectOp::StderrAppend => Some(Warning::new(
                "redirect.dev_null",
                DangerLevel::Low,
                "Redirecting errors to /dev/null will hide all error messages.",
            )),
            RedirectOp::Stdin => None,
        })
        .collect()
}
