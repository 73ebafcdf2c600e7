//! Acquisition of `--help` and manual text from the system.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Default wall-clock limit for one probe.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default cap on captured bytes per stream.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 256 * 1024;

/// Environment for probes: no pagers, no colors, no GUI helpers.
const PROBE_ENV: &[(&str, &str)] = &[
    ("DISPLAY", ""),
    ("WAYLAND_DISPLAY", ""),
    ("BROWSER", "true"),
    ("TERM", "dumb"),
    ("NO_COLOR", "1"),
    ("PAGER", "cat"),
    ("MANPAGER", "cat"),
    ("GIT_PAGER", "cat"),
    ("SYSTEMD_PAGER", "cat"),
    ("MANWIDTH", "100"),
];

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Invalid ANSI escape regex"));

/// Errors while obtaining help text. Callers treat all of them as "no output".
#[derive(Debug, Error)]
pub enum HelpError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("refusing to probe `{0}`: not a plain command name")]
    Rejected(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Output of a `command --help` style invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpOutput {
    pub stdout: String,
    /// Exit status; -1 when the process was terminated by a signal.
    pub exit_code: i32,
}

impl HelpOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Process-execution collaborator used by the flag extractor.
pub trait HelpSource {
    /// Run `command args...` and capture its output.
    fn run_help(&self, command: &str, args: &[&str]) -> Result<HelpOutput, HelpError>;

    /// Render the manual page for `command` as plain text.
    fn run_manual(&self, command: &str) -> Result<String, HelpError>;
}

/// Ceilings applied to every probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Default for ProbeLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// [`HelpSource`] that runs real processes found on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct SystemHelpSource {
    limits: ProbeLimits,
}

impl SystemHelpSource {
    pub fn new(limits: ProbeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ProbeLimits {
        self.limits
    }
}

impl HelpSource for SystemHelpSource {
    fn run_help(&self, command: &str, args: &[&str]) -> Result<HelpOutput, HelpError> {
        let program = resolve_command(command)?;
        let captured = run_captured(&program, args, self.limits)?;
        // Some tools print their help on stderr
        let stdout = if captured.stdout.trim().is_empty() && captured.exit_code == 0 {
            captured.stderr
        } else {
            captured.stdout
        };
        Ok(HelpOutput {
            stdout,
            exit_code: captured.exit_code,
        })
    }

    fn run_manual(&self, command: &str) -> Result<String, HelpError> {
        resolve_command(command)?;
        let man = which::which("man").map_err(|_| HelpError::NotFound("man".to_string()))?;
        let captured = run_captured(&man, &[command], self.limits)?;
        if captured.exit_code != 0 {
            debug!(command, exit_code = captured.exit_code, "man exited unsuccessfully");
            return Ok(String::new());
        }
        Ok(clean_manual_text(&captured.stdout))
    }
}

/// A plain command name: no path separators, no leading dash.
pub fn is_plausible_command_name(command: &str) -> bool {
    !command.is_empty()
        && !command.starts_with('-')
        && command
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '_' | '-'))
}

/// Locate `command` on `PATH`; only plain names are eligible.
fn resolve_command(command: &str) -> Result<PathBuf, HelpError> {
    if !is_plausible_command_name(command) {
        return Err(HelpError::Rejected(command.to_string()));
    }
    which::which(command).map_err(|_| HelpError::NotFound(command.to_string()))
}

/// Remove man overstrike sequences (`X\bX`, `_\bX`) and ANSI escapes.
pub fn clean_manual_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\u{8}' {
            out.pop();
        } else {
            out.push(c);
        }
    }
    ANSI_ESCAPE.replace_all(&out, "").into_owned()
}

#[derive(Debug)]
struct Captured {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

fn run_captured(program: &Path, args: &[&str], limits: ProbeLimits) -> Result<Captured, HelpError> {
    let label = program.display().to_string();
    debug!(program = %label, ?args, "probing");

    let mut child = Command::new(program)
        .args(args)
        .envs(PROBE_ENV.iter().copied())
        .env_remove("MAN_KEEP_FORMATTING")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| HelpError::Spawn {
            program: label.clone(),
            source,
        })?;

    let deadline = Instant::now() + limits.timeout;

    // Drain both pipes on helper threads so a chatty child never blocks.
    let stdout_reader = child
        .stdout
        .take()
        .map(|pipe| spawn_reader(pipe, limits.max_output_bytes));
    let stderr_reader = child
        .stderr
        .take()
        .map(|pipe| spawn_reader(pipe, limits.max_output_bytes));

    let status = match wait_until(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(HelpError::TimedOut {
                program: label,
                timeout: limits.timeout,
            });
        }
        Err(source) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(HelpError::Spawn {
                program: label,
                source,
            });
        }
    };

    Ok(Captured {
        stdout: collect_output(stdout_reader, deadline),
        stderr: collect_output(stderr_reader, deadline),
        exit_code: status.code().unwrap_or(-1),
    })
}

/// Forward the first `cap` bytes in chunks, discard the rest.
fn spawn_reader<R: Read + Send + 'static>(mut pipe: R, cap: usize) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        let mut sent = 0;
        loop {
            let n = match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            };
            let keep = n.min(cap - sent);
            if keep > 0 {
                if tx.send(chunk[..keep].to_vec()).is_err() {
                    break;
                }
                sent += keep;
            }
        }
    });
    rx
}

/// Gather chunks until the writer side closes or `deadline` passes.
///
/// A pipe still held open by a background grandchild is cut off at the
/// deadline; whatever arrived by then is kept.
fn collect_output(reader: Option<Receiver<Vec<u8>>>, deadline: Instant) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    let mut bytes = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match reader.recv_timeout(remaining) {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!("output pipe still open at deadline; truncating");
                break;
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
