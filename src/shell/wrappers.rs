//! Strip wrapper commands (sudo, env, nohup, ...) from a stage.

use super::pipeline::PipelineStage;
use super::tokenizer::Token;

/// Commands that run another command given as their arguments.
const WRAPPER_COMMANDS: &[&str] = &[
    "sudo", "doas", "env", "nohup", "nice", "ionice", "timeout", "time", "strace", "ltrace",
    "watch", "command", "exec",
];

/// Shells whose `-c` argument is itself a command line.
const SHELLS: &[&str] = &["bash", "sh", "zsh", "dash", "ksh"];

/// Maximum depth for recursive wrapper stripping.
const MAX_STRIP_DEPTH: usize = 5;

/// Whether `command` is a known wrapper.
pub fn is_wrapper(command: &str) -> bool {
    WRAPPER_COMMANDS.contains(&command)
}

/// Remove wrapper commands and their options, returning the wrapped stage.
///
/// Redirections stay with the result. A wrapper with nothing left to run
/// is returned unchanged.
///
/// - `sudo -u root rm -rf /x` -> `rm -rf /x`
/// - `env FOO=bar ls` -> `ls`
/// - `timeout -s KILL 5 make` -> `make`
pub fn strip_wrappers(stage: &PipelineStage) -> PipelineStage {
    let mut current = stage.clone();
    for _ in 0..MAX_STRIP_DEPTH {
        if !is_wrapper(&current.command) {
            break;
        }
        let start = wrapped_start(&current.command, &current.arguments);
        let mut rest = current.arguments[start.min(current.arguments.len())..].iter();
        let Some(command) = rest.next() else {
            break;
        };
        current = PipelineStage {
            command: command.text.clone(),
            arguments: rest.cloned().collect(),
            redirections: current.redirections,
        };
    }
    current
}

/// The command string passed to `sh -c` style invocations.
pub fn shell_payload(stage: &PipelineStage) -> Option<&str> {
    if !SHELLS.contains(&stage.command.as_str()) {
        return None;
    }
    let mut args = stage.arguments.iter();
    while let Some(arg) = args.next() {
        let text = arg.text.as_str();
        // -c, or a cluster like -xc / -lc
        if text.starts_with('-') && !text.starts_with("--") && text.contains('c') {
            return args.next().map(|t| t.text.as_str());
        }
    }
    None
}

/// Index of the first argument that belongs to the wrapped command.
fn wrapped_start(wrapper: &str, args: &[Token]) -> usize {
    let words: Vec<&str> = args.iter().map(|t| t.text.as_str()).collect();
    let mut start = 0;

    match wrapper {
        "sudo" | "doas" => {
            while start < words.len() {
                let w = words[start];
                if w == "--" {
                    start += 1;
                    break;
                }
                if w.starts_with('-') {
                    // Options that take arguments
                    if matches!(w, "-u" | "-g" | "-C" | "-D" | "-h" | "-p" | "-r" | "-t") {
                        start += 2;
                    } else {
                        start += 1;
                    }
                } else {
                    break;
                }
            }
        }
        "env" => {
            while start < words.len() {
                let w = words[start];
                if matches!(w, "-u" | "--unset" | "-C" | "--chdir") {
                    start += 2;
                } else if w.starts_with('-') || w.contains('=') {
                    start += 1;
                } else {
                    break;
                }
            }
        }
        "timeout" => {
            // timeout [options] duration command...
            while start < words.len() {
                let w = words[start];
                if w.starts_with('-') {
                    if matches!(w, "-s" | "--signal" | "-k" | "--kill-after") {
                        start += 2;
                    } else {
                        start += 1;
                    }
                } else {
                    start += 1;
                    break;
                }
            }
        }
        "nice" | "ionice" => {
            while start < words.len() {
                let w = words[start];
                if w.starts_with('-') {
                    if matches!(w, "-n" | "-c") {
                        start += 2;
                    } else {
                        start += 1;
                    }
                } else {
                    break;
                }
            }
        }
        "watch" => {
            while start < words.len() {
                let w = words[start];
                if matches!(w, "-n" | "--interval" | "-d" | "--differences") {
                    start += 2;
                } else if w.starts_with('-') {
                    start += 1;
                } else {
                    break;
                }
            }
        }
        _ => {
            while start < words.len() && words[start].starts_with('-') {
                start += 1;
            }
        }
    }

    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::parse_pipeline;

    fn stripped(input: &str) -> (String, Vec<String>) {
        let pipeline = parse_pipeline(input).unwrap();
        let stage = strip_wrappers(&pipeline.stages[0]);
        let args = stage.args().into_iter().map(String::from).collect();
        (stage.command, args)
    }

    #[test]
    fn test_strip_sudo() {
        assert_eq!(stripped("sudo ls -la"), ("ls".to_string(), vec!["-la".to_string()]));
    }

    #[test]
    fn test_strip_sudo_with_user() {
        assert_eq!(stripped("sudo -u root rm -rf /x").0, "rm");
    }

    #[test]
    fn test_strip_env() {
        assert_eq!(stripped("env FOO=bar ls").0, "ls");
    }

    #[test]
    fn test_strip_timeout() {
        assert_eq!(stripped("timeout -s KILL 5 make all").0, "make");
    }

    #[test]
    fn test_strip_nested() {
        assert_eq!(stripped("sudo env FOO=bar nice -n 5 rm x").0, "rm");
    }

    #[test]
    fn test_keeps_redirections() {
        let pipeline = parse_pipeline("sudo tee /etc/hosts > /dev/null").unwrap();
        let stage = strip_wrappers(&pipeline.stages[0]);
        assert_eq!(stage.command, "tee");
        assert_eq!(stage.redirections.len(), 1);
    }

    #[test]
    fn test_bare_wrapper_unchanged() {
        assert_eq!(stripped("sudo -v").0, "sudo");
        assert_eq!(stripped("nohup").0, "nohup");
    }

    #[test]
    fn test_no_wrapper() {
        assert_eq!(stripped("ls -la").0, "ls");
    }

    #[test]
    fn test_max_depth() {
        let (command, _) = stripped("sudo sudo sudo sudo sudo sudo ls");
        assert_eq!(command, "sudo");
    }

    #[test]
    fn test_shell_payload() {
        let pipeline = parse_pipeline("bash -c 'rm -rf /'").unwrap();
        assert_eq!(shell_payload(&pipeline.stages[0]), Some("rm -rf /"));
        let pipeline = parse_pipeline("sh -xc 'echo hi'").unwrap();
        assert_eq!(shell_payload(&pipeline.stages[0]), Some("echo hi"));
        let pipeline = parse_pipeline("bash script.sh").unwrap();
        assert_eq!(shell_payload(&pipeline.stages[0]), None);
    }
}
