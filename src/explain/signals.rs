//! Signal arguments of kill-style commands.

/// (number, name, description) for the signals worth naming.
const SIGNALS: &[(u32, &str, &str)] = &[
    (1, "SIGHUP", "Hangup detected on controlling terminal or death of controlling process"),
    (2, "SIGINT", "Interrupt from keyboard (Ctrl+C)"),
    (3, "SIGQUIT", "Quit from keyboard (core dump)"),
    (6, "SIGABRT", "Abort signal from abort(3)"),
    (9, "SIGKILL", "Kill signal (cannot be caught or ignored)"),
    (11, "SIGSEGV", "Invalid memory reference"),
    (13, "SIGPIPE", "Broken pipe: write to pipe with no readers"),
    (14, "SIGALRM", "Timer signal from alarm(2)"),
    (15, "SIGTERM", "Termination signal"),
    (18, "SIGCONT", "Continue if stopped"),
    (19, "SIGSTOP", "Stop process (cannot be caught or ignored)"),
];

/// Commands whose dash arguments may be signals.
pub const KILL_COMMANDS: &[&str] = &["kill", "killall", "pkill"];

/// A resolved signal argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalArg {
    /// How the signal was written, e.g. `-9` or `-s KILL`.
    pub spelling: String,
    pub name: &'static str,
    pub description: &'static str,
    /// Whether the following argument was consumed as the signal value.
    pub consumed_next: bool,
}

impl SignalArg {
    /// `send SIGKILL (Kill signal (cannot be caught or ignored))`.
    pub fn explain(&self) -> String {
        format!("send {} ({})", self.name, self.description)
    }
}

/// Look up a signal by number (`9`) or name (`kill`, `SIGKILL`).
pub fn resolve_signal(value: &str) -> Option<(&'static str, &'static str)> {
    if let Ok(number) = value.parse::<u32>() {
        return SIGNALS
            .iter()
            .find(|(n, _, _)| *n == number)
            .map(|(_, name, desc)| (*name, *desc));
    }
    let upper = value.to_ascii_uppercase();
    let name = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    SIGNALS
        .iter()
        .find(|(_, n, _)| *n == name)
        .map(|(_, name, desc)| (*name, *desc))
}

/// Interpret `arg` (and possibly `next`) as a signal selection.
///
/// Forms: `-9`, `-KILL`, `-SIGKILL`, `-s NAME`, `-s N`, `--signal NAME`,
/// `--signal=NAME`.
pub fn explain_signal_arg(arg: &str, next: Option<&str>) -> Option<SignalArg> {
    let build = |spelling: String, value: &str, consumed_next: bool| {
        resolve_signal(value).map(|(name, description)| SignalArg {
            spelling,
            name,
            description,
            consumed_next,
        })
    };

    if matches!(arg, "-s" | "--signal") {
        let value = next?;
        return build(format!("{arg} {value}"), value, true);
    }
    if let Some(value) = arg.strip_prefix("--signal=") {
        return build(arg.to_string(), value, false);
    }
    let payload = arg.strip_prefix('-').filter(|p| !p.is_empty() && !p.starts_with('-'))?;
    build(arg.to_string(), payload, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_signal() {
        let sig = explain_signal_arg("-9", None).unwrap();
        assert_eq!(sig.name, "SIGKILL");
        assert_eq!(sig.explain(), "send SIGKILL (Kill signal (cannot be caught or ignored))");
        assert!(!sig.consumed_next);
    }

    #[test]
    fn test_named_signal() {
        assert_eq!(explain_signal_arg("-KILL", None).unwrap().name, "SIGKILL");
        assert_eq!(explain_signal_arg("-SIGTERM", None).unwrap().name, "SIGTERM");
        assert_eq!(explain_signal_arg("-hup", None).unwrap().name, "SIGHUP");
    }

    #[test]
    fn test_signal_option_with_value() {
        let sig = explain_signal_arg("-s", Some("KILL")).unwrap();
        assert_eq!(sig.spelling, "-s KILL");
        assert!(sig.consumed_next);
        assert_eq!(explain_signal_arg("-s", Some("15")).unwrap().name, "SIGTERM");
        assert_eq!(explain_signal_arg("--signal", Some("INT")).unwrap().name, "SIGINT");
        assert_eq!(explain_signal_arg("--signal=HUP", None).unwrap().name, "SIGHUP");
    }

    #[test]
    fn test_not_a_signal() {
        assert!(explain_signal_arg("-s", None).is_none());
        assert!(explain_signal_arg("-l", None).is_none());
        assert!(explain_signal_arg("-99", None).is_none());
        assert!(explain_signal_arg("1234", None).is_none());
        assert!(explain_signal_arg("--", None).is_none());
        assert!(explain_signal_arg("-", None).is_none());
    }
}
