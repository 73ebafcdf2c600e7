//! Sensitive file reads.

use regex::Regex;
use std::collections::BTreeSet;

use crate::knowledge::DangerLevel;
use crate::shell::{PipelineStage, RedirectOp};

use super::Warning;

/// Commands that print file content.
const READ_COMMANDS: &[&str] = &["cat", "less", "more", "head", "tail", "sed", "awk", "grep", "cut"];

/// Built-in sensitive paths: (pattern, description, severity).
const SENSITIVE_FILES: &[(&str, &str, DangerLevel)] = &[
    (
        r"^/etc/shadow$",
        "Contains password hashes for system users (highly sensitive)",
        DangerLevel::High,
    ),
    (
        r"^/etc/gshadow$",
        "Contains group password hashes (highly sensitive)",
        DangerLevel::High,
    ),
    (
        r"^/etc/passwd$",
        "Contains user account information (less sensitive but still private)",
        DangerLevel::Medium,
    ),
    (
        r"(^|/)\.ssh/id_(rsa|dsa|ecdsa|ed25519)$",
        "Private SSH key (highly sensitive)",
        DangerLevel::High,
    ),
];

/// A compiled sensitive-path pattern.
#[derive(Debug, Clone)]
pub struct SensitivePattern {
    pub regex: Regex,
    pub description: String,
    pub severity: DangerLevel,
}

impl SensitivePattern {
    pub fn new(
        pattern: &str,
        description: impl Into<String>,
        severity: DangerLevel,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            description: description.into(),
            severity,
        })
    }
}

/// What counts as a sensitive read: patterns plus read commands.
#[derive(Debug, Clone)]
pub struct DangerRules {
    sensitive: Vec<SensitivePattern>,
    read_commands: BTreeSet<String>,
}

impl Default for DangerRules {
    fn default() -> Self {
        let sensitive = SENSITIVE_FILES
            .iter()
            .filter_map(|(pattern, description, severity)| {
                SensitivePattern::new(pattern, *description, *severity).ok()
            })
            .collect();
        Self {
            sensitive,
            read_commands: READ_COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl DangerRules {
    /// Built-in rules extended with user patterns and read commands.
    pub fn with_extra(
        patterns: impl IntoIterator<Item = SensitivePattern>,
        read_commands: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut rules = Self::default();
        rules.sensitive.extend(patterns);
        rules.read_commands.extend(read_commands);
        rules
    }

    pub fn is_read_command(&self, command: &str) -> bool {
        self.read_commands.contains(command)
    }

    /// The first pattern matching `path`.
    pub fn sensitive_match(&self, path: &str) -> Option<&SensitivePattern> {
        self.sensitive.iter().find(|p| p.regex.is_match(path))
    }
}

/// A read command given a sensitive file as argument or stdin.
pub fn check_sensitive_reads(stage: &PipelineStage, rules: &DangerRules) -> Vec<Warning> {
    if !rules.is_read_command(&stage.command) {
        return Vec::new();
    }

    let stdin_targets = stage
        .redirections
        .iter()
        .filter(|r| r.operator == RedirectOp::Stdin)
        .map(|r| r.target.as_str());

    stage
        .args()
        .into_iter()
        .filter(|a| !a.starts_with('-'))
        .chain(stdin_targets)
        .filter_map(|path| {
            rules.sensitive_match(path).map(|p| {
                Warning::new(
                    "sensitive.read",
                    p.severity,
                    format!("Reading sensitive file: {path}. {}.", p.description),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parse_pipeline;

    fn check(input: &str, rules: &DangerRules) -> Vec<Warning> {
        let pipeline = parse_pipeline(input).unwrap();
        check_sensitive_reads(&pipeline.stages[0], rules)
    }

    #[test]
    fn test_cat_shadow() {
        let warnings = check("cat /etc/shadow", &DangerRules::default());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, DangerLevel::High);
        assert_eq!(
            warnings[0].message,
            "Reading sensitive file: /etc/shadow. Contains password hashes for system users (highly sensitive)."
        );
    }

    #[test]
    fn test_ssh_keys() {
        let rules = DangerRules::default();
        assert_eq!(check("head ~/.ssh/id_rsa", &rules).len(), 1);
        assert_eq!(check("less /root/.ssh/id_ed25519", &rules).len(), 1);
        assert!(check("cat ~/.ssh/id_rsa.pub", &rules).is_empty());
    }

    #[test]
    fn test_stdin_redirect() {
        assert_eq!(check("grep root < /etc/passwd", &DangerRules::default()).len(), 1);
    }

    #[test]
    fn test_not_a_read_command() {
        assert!(check("ls /etc/shadow", &DangerRules::default()).is_empty());
    }

    #[test]
    fn test_extra_rules() {
        let rules = DangerRules::with_extra(
            [SensitivePattern::new(r"\.env\b", "Environment secrets", DangerLevel::High).unwrap()],
            ["bat".to_string()],
        );
        assert_eq!(check("bat .env.local", &rules).len(), 1);
        assert!(check("bat environment.ts", &rules).is_empty());
        assert_eq!(check("cat /etc/shadow", &rules).len(), 1);
    }
}
