//! Built-in descriptions of well-known commands.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use super::{CommandInfo, DangerLevel, KnowledgeBase};

static BUILTIN: Lazy<BTreeMap<String, CommandInfo>> = Lazy::new(|| {
    use DangerLevel::*;

    let entries = [
        (
            "sudo",
            CommandInfo::new("Executes a command with superuser (root) privileges.", High),
        ),
        (
            "rm",
            CommandInfo::new("Removes (deletes) files or directories.", Medium)
                .with_flag("-r", "Removes directories and their contents recursively.")
                .with_flag("-R", "Removes directories and their contents recursively.")
                .with_flag(
                    "-f",
                    "Forces the removal of files without prompting for confirmation.",
                )
                .with_flag("-i", "Prompts for confirmation before every removal."),
        ),
        (
            "ls",
            CommandInfo::new("Lists directory contents.", Low)
                .with_flag("-l", "Uses a long listing format.")
                .with_flag(
                    "-a",
                    "Shows all files, including hidden files (starting with '.').",
                )
                .with_flag(
                    "-h",
                    "With -l, prints sizes in human readable format (e.g., 1K 234M 2G).",
                ),
        ),
        (
            "chmod",
            CommandInfo::new("Changes the permissions of a file or directory.", Low)
                .with_flag("-R", "Changes files and directories recursively."),
        ),
        (
            "chown",
            CommandInfo::new("Changes the owner and group of a file or directory.", Medium)
                .with_flag("-R", "Changes files and directories recursively."),
        ),
        (
            "curl",
            CommandInfo::new(
                "Transfers data from or to a server, using one of the supported protocols (HTTP, HTTPS, FTP, etc.).",
                Medium,
            ),
        ),
        ("wget", CommandInfo::new("A non-interactive network downloader.", Medium)),
        (
            "bash",
            CommandInfo::new("The Bourne-Again SHell, a command language interpreter.", Medium),
        ),
        ("sh", CommandInfo::new("The standard command language interpreter.", Medium)),
        (
            "grep",
            CommandInfo::new("Searches for patterns in text files.", Low)
                .with_flag("-i", "Ignores case distinctions in patterns and data.")
                .with_flag(
                    "-v",
                    "Inverts the sense of matching, to select non-matching lines.",
                )
                .with_flag("-r", "Recursively searches subdirectories."),
        ),
        (
            "find",
            CommandInfo::new("Searches for files in a directory hierarchy.", Low)
                .with_flag("-name", "Searches for files with a specific name.")
                .with_flag(
                    "-type",
                    "Searches for files of a specific type (e.g., f for file, d for directory).",
                )
                .with_flag("-delete", "Deletes found files. This is a dangerous flag."),
        ),
        (
            "awk",
            CommandInfo::new("A versatile programming language for working on files.", Low)
                .with_flag("-F", "Specifies a field separator."),
        ),
        (
            "kill",
            CommandInfo::new("Sends a signal to a process, by default SIGTERM.", Medium)
                .with_flag("-l", "Lists signal names.")
                .with_flag("-s", "Specifies the signal to send."),
        ),
        (
            "cat",
            CommandInfo::new("Concatenates files and prints them on standard output.", Low)
                .with_flag("-n", "Numbers all output lines."),
        ),
        (
            "dd",
            CommandInfo::new(
                "Copies and converts raw data between files and devices.",
                High,
            ),
        ),
        (
            "mkfs",
            CommandInfo::new("Builds a filesystem on a device, erasing its contents.", Critical),
        ),
    ];

    entries
        .into_iter()
        .map(|(name, info)| (name.to_string(), info))
        .collect()
});

/// The built-in command table.
pub fn builtin_commands() -> &'static BTreeMap<String, CommandInfo> {
    &BUILTIN
}

/// [`KnowledgeBase`] over the built-in table only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinKnowledge;

impl KnowledgeBase for BuiltinKnowledge {
    fn lookup(&self, command: &str) -> Option<&CommandInfo> {
        BUILTIN.get(command)
    }
}
