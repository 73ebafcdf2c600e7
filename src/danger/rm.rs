//! rm on the filesystem root or top-level system directories.

use crate::knowledge::DangerLevel;
use crate::shell::PipelineStage;

use super::Warning;

/// Top-level directories whose recursive removal wrecks the system.
const SYSTEM_PATHS: &[&str] = &[
    "/bin", "/boot", "/dev", "/etc", "/home", "/lib", "/lib64", "/opt", "/proc", "/root", "/sbin",
    "/srv", "/sys", "/usr", "/var",
];

/// Check a (wrapper-stripped) stage for `rm -r` on a system path.
pub fn check_rm(stage: &PipelineStage) -> Option<Warning> {
    if stage.command != "rm" {
        return None;
    }

    let mut has_recursive = false;
    let mut no_preserve_root = false;
    let mut paths = Vec::new();
    let mut end_of_options = false;

    for word in stage.args() {
        if end_of_options || !word.starts_with('-') || word == "-" {
            paths.push(word);
        } else if word == "--" {
            end_of_options = true;
        } else if word == "--recursive" {
            has_recursive = true;
        } else if word == "--no-preserve-root" {
            no_preserve_root = true;
        } else if !word.starts_with("--") && (word.contains('r') || word.contains('R')) {
            has_recursive = true;
        }
    }

    if !has_recursive {
        return None;
    }

    paths.iter().find_map(|path| check_rm_path(path, no_preserve_root))
}

fn check_rm_path(path: &str, no_preserve_root: bool) -> Option<Warning> {
    let normalized = normalize(path);

    if matches!(normalized, "/" | "/*") {
        let message = if no_preserve_root {
            "The command 'rm -rf /' with --no-preserve-root will delete all files on your system."
        } else {
            "The command 'rm -rf /' will delete all files on your system."
        };
        return Some(Warning::new("rm.system_path", DangerLevel::Critical, message));
    }

    let top = normalized.strip_suffix("/*").unwrap_or(normalized);
    if SYSTEM_PATHS.contains(&top) {
        return Some(Warning::new(
            "rm.system_path",
            DangerLevel::Critical,
            format!("Recursively removing system path '{path}' can make the system unusable."),
        ));
    }

    if matches!(normalized, "~" | "~/*" | "$HOME" | "$HOME/*") {
        return Some(Warning::new(
            "rm.home",
            DangerLevel::High,
            format!("Recursively removing '{path}' deletes your entire home directory."),
        ));
    }

    None
}

/// Collapse repeated and trailing slashes: `//etc/` -> `/etc`.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        return "/";
    }
    let leading = trimmed.len() - trimmed.trim_start_matches('/').len();
    if leading > 1 {
        &trimmed[leading - 1..]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parse_pipeline;

    fn check(input: &str) -> Option<Warning> {
        let pipeline = parse_pipeline(input).unwrap();
        check_rm(&pipeline.stages[0])
    }

    #[test]
    fn test_rm_rf_root() {
        let warning = check("rm -rf /").unwrap();
        assert_eq!(warning.rule, "rm.system_path");
        assert_eq!(warning.severity, DangerLevel::Critical);
    }

    #[test]
    fn test_rm_rf_root_variants() {
        assert!(check("rm -rf /*").is_some());
        assert!(check("rm -fr //").is_some());
        assert!(check("rm -r -f /").is_some());
        assert!(check("rm --recursive --force /").is_some());
        assert!(check("rm -R /").is_some());
    }

    #[test]
    fn test_no_preserve_root() {
        let warning = check("rm -rf --no-preserve-root /").unwrap();
        assert!(warning.message.contains("--no-preserve-root"));
    }

    #[test]
    fn test_rm_rf_system_dirs() {
        assert!(check("rm -rf /etc").is_some());
        assert!(check("rm -rf /usr/").is_some());
        assert!(check("rm -rf /var/*").is_some());
    }

    #[test]
    fn test_rm_rf_home() {
        assert_eq!(check("rm -rf ~").unwrap().rule, "rm.home");
        assert_eq!(check("rm -rf $HOME/*").unwrap().rule, "rm.home");
    }

    #[test]
    fn test_rm_rf_subdirectory_is_fine() {
        assert!(check("rm -rf /var/log/app").is_none());
        assert!(check("rm -rf build/").is_none());
        assert!(check("rm -rf /tmp/cache").is_none());
    }

    #[test]
    fn test_rm_no_recursive() {
        assert!(check("rm /etc/passwd").is_none());
        assert!(check("rm -f /").is_none());
    }

    #[test]
    fn test_after_double_dash_is_path() {
        assert!(check("rm -rf -- /").is_some());
        assert!(check("rm -- -rf").is_none());
    }

    #[test]
    fn test_other_command() {
        assert!(check("ls -R /").is_none());
    }
}
