//! Heuristic parsing of free-form help and manual text.
//!
//! A flag-definition line starts (after indentation) with one or more flag
//! spellings joined by a comma or a single space, each optionally followed
//! by a value placeholder. Its description is the rest of the line, or the
//! following prose lines up to a blank line, a header, or the next flag.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{FlagEntry, FlagMap};

/// `--[no-]color` registers both `--color` and `--no-color`.
static NEGATABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^--\[no-?\]([A-Za-z0-9][A-Za-z0-9_-]*)").expect("Invalid negatable flag regex")
});

/// The head of a flag-definition line.
#[derive(Debug, PartialEq, Eq)]
struct Definition {
    spellings: Vec<String>,
    takes_value: bool,
    inline: Option<String>,
}

/// Parse help text into a map of flag spelling to entry.
///
/// The first occurrence of a spelling wins.
pub fn parse_help_text(text: &str) -> FlagMap {
    let mut flags = FlagMap::new();
    let mut pending: Option<Definition> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(definition) = parse_definition(line) {
            finish_pending(&mut flags, &mut pending, &mut body);
            if definition.inline.is_some() {
                register(&mut flags, definition, None);
            } else {
                pending = Some(definition);
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || is_section_header(line) {
            finish_pending(&mut flags, &mut pending, &mut body);
            continue;
        }
        if pending.is_some() {
            body.push(trimmed);
        }
    }
    finish_pending(&mut flags, &mut pending, &mut body);

    flags
}

/// One-line description of the command itself.
///
/// Man pages: the line after `NAME`, without the `name - ` prefix, or else
/// the first line of `DESCRIPTION`.
/// `--help` output: the first prose line that is not a usage line.
pub fn extract_summary(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();

    if let Some(name_line) = first_line_of_section(&lines, "NAME") {
        let summary = name_line
            .split_once(" - ")
            .map(|(_, description)| description)
            .unwrap_or(name_line);
        return Some(summary.trim().to_string());
    }
    if let Some(description) = first_line_of_section(&lines, "DESCRIPTION") {
        return Some(description.to_string());
    }

    let mut in_usage = false;
    for line in &lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            in_usage = false;
            continue;
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("usage") {
            in_usage = true;
            continue;
        }
        // Wrapped usage lines are indented under `usage:`
        if in_usage && line.starts_with(char::is_whitespace) {
            continue;
        }
        in_usage = false;
        if lower.starts_with("or:")
            || trimmed.starts_with(['-', '[', '<'])
            || is_section_header(line)
        {
            continue;
        }
        return Some(trimmed.to_string());
    }
    None
}

/// First non-blank line after a man section header, if the section exists.
fn first_line_of_section<'t>(lines: &[&'t str], header: &str) -> Option<&'t str> {
    let index = lines.iter().position(|l| l.trim() == header)?;
    lines[index + 1..]
        .iter()
        .map(|&l| l.trim())
        .take_while(|l| !is_section_header(l))
        .find(|l| !l.is_empty())
}

fn finish_pending(flags: &mut FlagMap, pending: &mut Option<Definition>, body: &mut Vec<&str>) {
    if let Some(definition) = pending.take() {
        let description = body.join(" ");
        register(flags, definition, Some(description));
    }
    body.clear();
}

fn register(flags: &mut FlagMap, definition: Definition, description: Option<String>) {
    let description = description
        .or(definition.inline)
        .unwrap_or_default()
        .trim()
        .to_string();
    for spelling in definition.spellings {
        flags.entry(spelling.clone()).or_insert_with(|| FlagEntry {
            spelling,
            description: description.clone(),
            takes_value: definition.takes_value,
        });
    }
}

/// Section headers: unindented `Options:` lines, or all-caps lines like `OPTIONS`.
pub(crate) fn is_section_header(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return false;
    }
    let unindented = !line.starts_with(char::is_whitespace);
    if unindented && trimmed.ends_with(':') {
        return true;
    }
    trimmed.chars().any(|c| c.is_ascii_alphabetic())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == ' ' || c == '-' || c == '_')
}

fn parse_definition(line: &str) -> Option<Definition> {
    let trimmed = line.trim_start();
    if !trimmed.starts_with('-') {
        return None;
    }

    let (mut spellings, mut rest) = take_spelling(trimmed)?;
    let mut takes_value = false;

    loop {
        if let Some(after) = take_placeholder(rest) {
            takes_value = true;
            rest = after;
        }
        let candidate = if let Some(after_comma) = rest.strip_prefix(',') {
            Some(after_comma.trim_start())
        } else if rest.starts_with(' ') && !rest.starts_with("  ") {
            Some(&rest[1..])
        } else {
            None
        };
        match candidate.and_then(take_spelling) {
            Some((more, after)) => {
                spellings.extend(more);
                rest = after;
            }
            None => break,
        }
    }

    let inline = rest.trim_start_matches([',', ':']).trim();
    Some(Definition {
        spellings,
        takes_value,
        inline: (!inline.is_empty()).then(|| inline.to_string()),
    })
}

/// Take one flag spelling from the start of `s`.
fn take_spelling(s: &str) -> Option<(Vec<String>, &str)> {
    if let Some(captures) = NEGATABLE.captures(s) {
        let name = &captures[1];
        let end = captures.get(0)?.end();
        return Some((vec![format!("--{name}"), format!("--no-{name}")], &s[end..]));
    }

    let dashes = if s.starts_with("--") {
        2
    } else if s.starts_with('-') {
        1
    } else {
        return None;
    };
    let body = &s[dashes..];
    let first = body.chars().next()?;
    let name_len = if first.is_ascii_alphanumeric() {
        body.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(body.len())
    } else if dashes == 1 && matches!(first, '?' | '#' | '@') {
        1
    } else {
        return None;
    };

    let end = dashes + name_len;
    let spelling = &s[..end];
    // clap marks repeatable flags with `...`
    let rest = s[end..].strip_prefix("...").unwrap_or(&s[end..]);

    match rest.chars().next() {
        None => {}
        Some(c) if c.is_whitespace() || matches!(c, ',' | '=' | '[' | '<' | '{' | ':') => {}
        Some(_) => return None,
    }
    Some((vec![spelling.to_string()], rest))
}

/// Consume a value placeholder directly after a spelling.
fn take_placeholder(rest: &str) -> Option<&str> {
    if let Some(after) = rest.strip_prefix('=') {
        let end = after
            .find(|c: char| c.is_whitespace() || c == ',')
            .unwrap_or(after.len());
        return Some(&after[end..]);
    }
    if rest.starts_with(['[', '<', '{']) {
        return skip_bracketed(rest);
    }

    // A single space, then an uppercase or bracketed token
    let after_space = rest.strip_prefix(' ')?;
    if after_space.starts_with(char::is_whitespace) {
        return None;
    }
    if after_space.starts_with(['[', '<', '{']) {
        return skip_bracketed(after_space);
    }
    let end = after_space
        .find(|c: char| c.is_whitespace() || c == ',')
        .unwrap_or(after_space.len());
    is_upper_placeholder(&after_space[..end]).then(|| &after_space[end..])
}

fn skip_bracketed(s: &str) -> Option<&str> {
    let close = match s.chars().next()? {
        '[' => ']',
        '<' => '>',
        '{' => '}',
        _ => return None,
    };
    let end = s.find(close)? + 1;
    let rest = &s[end..];
    Some(rest.strip_prefix("...").unwrap_or(rest))
}

fn is_upper_placeholder(token: &str) -> bool {
    let token = token.trim_end_matches("...");
    token.chars().any(|c| c.is_ascii_uppercase())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'a>(flags: &'a FlagMap, spelling: &str) -> &'a FlagEntry {
        flags
            .get(spelling)
            .unwrap_or_else(|| panic!("missing {spelling} in {:?}", flags.keys().collect::<Vec<_>>()))
    }

    #[test]
    fn test_short_long_pair_inline() {
        let flags = parse_help_text("  -v, --verbose    Enable verbose output\n");
        assert_eq!(flags.len(), 2);
        for spelling in ["-v", "--verbose"] {
            let e = entry(&flags, spelling);
            assert_eq!(e.description, "Enable verbose output");
            assert!(!e.takes_value);
        }
    }

    #[test]
    fn test_equals_placeholder() {
        let flags = parse_help_text("  -w, --width=COLS           set output width to COLS\n");
        assert!(entry(&flags, "-w").takes_value);
        assert!(entry(&flags, "--width").takes_value);
        assert_eq!(entry(&flags, "--width").description, "set output width to COLS");
    }

    #[test]
    fn test_optional_value() {
        let flags = parse_help_text("      --color[=WHEN]         color the output WHEN\n");
        let e = entry(&flags, "--color");
        assert!(e.takes_value);
        assert_eq!(e.description, "color the output WHEN");
    }

    #[test]
    fn test_uppercase_placeholder_after_space() {
        let flags = parse_help_text("  -o OUTPUT, --output OUTPUT  write result to OUTPUT\n");
        assert!(entry(&flags, "-o").takes_value);
        assert!(entry(&flags, "--output").takes_value);
        assert_eq!(entry(&flags, "-o").description, "write result to OUTPUT");
    }

    #[test]
    fn test_angle_placeholder() {
        let flags = parse_help_text("  -c, --config <FILE>  Sets a custom config file\n");
        assert!(entry(&flags, "--config").takes_value);
        assert_eq!(entry(&flags, "-c").description, "Sets a custom config file");
    }

    #[test]
    fn test_choice_placeholder() {
        let flags = parse_help_text("  --format {json,text}  output format\n");
        assert!(entry(&flags, "--format").takes_value);
        assert_eq!(entry(&flags, "--format").description, "output format");
    }

    #[test]
    fn test_description_on_following_lines() {
        let text = "\
       -a, --all
              do not ignore entries
              starting with .

       -A     do not list implied . and ..
";
        let flags = parse_help_text(text);
        assert_eq!(entry(&flags, "-a").description, "do not ignore entries starting with .");
        assert_eq!(entry(&flags, "--all").description, "do not ignore entries starting with .");
        assert_eq!(entry(&flags, "-A").description, "do not list implied . and ..");
    }

    #[test]
    fn test_next_flag_ends_description() {
        let text = "  -q\n  -r  recursive\n";
        let flags = parse_help_text(text);
        assert_eq!(entry(&flags, "-q").description, "");
        assert_eq!(entry(&flags, "-r").description, "recursive");
    }

    #[test]
    fn test_header_ends_description() {
        let text = "  -x\nEXAMPLES\n  run it\n";
        let flags = parse_help_text(text);
        assert_eq!(entry(&flags, "-x").description, "");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let text = "  -v  be verbose\n  -v, --version  print version\n";
        let flags = parse_help_text(text);
        assert_eq!(entry(&flags, "-v").description, "be verbose");
        assert_eq!(entry(&flags, "--version").description, "print version");
    }

    #[test]
    fn test_prose_and_headers_are_skipped() {
        let text = "\
Usage: tool [OPTION]... FILE
Frobnicate files.

Options:
  -f  force
Report bugs to - nobody
";
        let flags = parse_help_text(text);
        assert_eq!(flags.len(), 1);
        assert_eq!(entry(&flags, "-f").description, "force");
    }

    #[test]
    fn test_space_joined_pair() {
        let flags = parse_help_text("  -h --help  show help\n");
        assert_eq!(entry(&flags, "-h").description, "show help");
        assert_eq!(entry(&flags, "--help").description, "show help");
    }

    #[test]
    fn test_negatable_flag() {
        let flags = parse_help_text("      --[no-]progress   show progress\n");
        assert_eq!(entry(&flags, "--progress").description, "show progress");
        assert_eq!(entry(&flags, "--no-progress").description, "show progress");
    }

    #[test]
    fn test_clap_repeatable_marker() {
        let flags = parse_help_text("  -v, --verbose...  More output per occurrence\n");
        assert_eq!(entry(&flags, "--verbose").description, "More output per occurrence");
        assert!(!entry(&flags, "--verbose").takes_value);
    }

    #[test]
    fn test_single_dash_long_option() {
        let flags = parse_help_text("    -name pattern\n         Base of file name matches pattern.\n");
        let e = entry(&flags, "-name");
        assert_eq!(e.description, "pattern");
        assert!(!e.takes_value);
    }

    #[test]
    fn test_not_flags() {
        let flags = parse_help_text("  - a bullet\n  -- end of options\n  ---\n  -5%) discount\n");
        assert!(flags.is_empty());
    }

    #[test]
    fn test_summary_from_man_page() {
        let text = "LS(1)\n\nNAME\n       ls - list directory contents\n\nSYNOPSIS\n";
        assert_eq!(extract_summary(text).as_deref(), Some("list directory contents"));
    }

    #[test]
    fn test_summary_from_man_description() {
        let text = "FROB(1)\n\nSYNOPSIS\n       frob [-v] FILE\n\nDESCRIPTION\n       Frobnicates FILE in place.\n       More detail here.\n";
        assert_eq!(extract_summary(text).as_deref(), Some("Frobnicates FILE in place."));
    }

    #[test]
    fn test_summary_from_help() {
        let text = "Usage: ls [OPTION]... [FILE]...\nList information about the FILEs.\n\n  -a  all\n";
        assert_eq!(
            extract_summary(text).as_deref(),
            Some("List information about the FILEs.")
        );
    }

    #[test]
    fn test_summary_skips_wrapped_usage() {
        let text = "usage: tool [-h] [--out OUT]\n            [--verbose]\n\nDo the thing.\n";
        assert_eq!(extract_summary(text).as_deref(), Some("Do the thing."));
    }

    #[test]
    fn test_section_headers() {
        assert!(is_section_header("OPTIONS"));
        assert!(is_section_header("Options:"));
        assert!(is_section_header("EXIT STATUS"));
        assert!(!is_section_header("  values are:"));
        assert!(!is_section_header("List files."));
        assert!(!is_section_header("-V"));
    }
}
