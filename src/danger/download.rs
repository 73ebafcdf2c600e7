//! Downloads piped straight into an interpreter.

use crate::knowledge::DangerLevel;
use crate::shell::PipelineStage;

use super::Warning;

/// Programs that execute whatever arrives on stdin.
pub const INTERPRETERS: &[&str] = &[
    "bash", "sh", "zsh", "python", "python3", "perl", "ruby", "node", "php",
];

const DOWNLOADERS: &[&str] = &["curl", "wget"];

const SCRIPT_EXTENSIONS: &[&str] = &[".py", ".sh", ".bash", ".pl", ".rb", ".js", ".php"];

const SUSPICIOUS_HOST_WORDS: &[&str] = &["attacker", "malware", "evil"];

/// `download | next`: warn when `next` is an interpreter.
pub fn check_remote_script(download: &PipelineStage, next: &PipelineStage) -> Vec<Warning> {
    if !DOWNLOADERS.contains(&download.command.as_str())
        || !INTERPRETERS.contains(&next.command.as_str())
    {
        return Vec::new();
    }

    let mut warnings = vec![Warning::new(
        "pipe.remote_script",
        DangerLevel::High,
        "Downloading and executing a script from the internet can be dangerous.",
    )];

    let Some(url) = download_url(download) else {
        return warnings;
    };
    let lower = url.to_ascii_lowercase();
    if SCRIPT_EXTENSIONS.iter().any(|ext| lower.contains(ext)) {
        warnings.push(Warning::new(
            "pipe.script_file",
            DangerLevel::Critical,
            format!(
                "This command downloads a script file ({url}) and pipes it to an interpreter. This could execute malicious code!"
            ),
        ));
    } else if SUSPICIOUS_HOST_WORDS.iter().any(|word| lower.contains(word)) {
        warnings.push(Warning::new(
            "pipe.suspicious_url",
            DangerLevel::Critical,
            format!(
                "This command downloads from a suspicious URL ({url}) and pipes it to an interpreter. This is likely malicious!"
            ),
        ));
    }
    warnings
}

/// The argument naming what is downloaded: a URL if any, else the first positional.
fn download_url(stage: &PipelineStage) -> Option<&str> {
    let args = stage.args();
    args.iter()
        .find(|a| a.contains("://"))
        .or_else(|| args.iter().find(|a| !a.starts_with('-')))
        .copied()
}
