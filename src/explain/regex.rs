//! Plain-language reading of simple grep patterns.

use once_cell::sync::Lazy;
use regex::Regex;

static IPV4: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+){3}$").expect("Invalid IPv4 regex"));

/// Fallback when a pattern has no readable parts.
const GENERIC: &str = "regular expression pattern";

fn special(c: char) -> Option<&'static str> {
    match c {
        '^' => Some("start of line"),
        '$' => Some("end of line"),
        '.' => Some("any single character"),
        '*' => Some("zero or more of previous"),
        '+' => Some("one or more of previous"),
        '?' => Some("zero or one (optional)"),
        '|' => Some("alternation (or)"),
        _ => None,
    }
}

/// Whether `text` reads as a regex rather than a plain word, path or address.
pub fn looks_like_regex(text: &str) -> bool {
    if text.is_empty() || text == "|" || text.starts_with('-') {
        return false;
    }
    if text.contains('/') || IPV4.is_match(text) {
        return false;
    }
    if text.starts_with('^') || text.ends_with('$') {
        return true;
    }
    if text.contains(['[', ']', '(', ')', '|', '{', '}']) {
        return true;
    }
    has_unescaped(text, &['*', '+', '?']) || has_unescaped(text, &['.'])
}

fn has_unescaped(text: &str, targets: &[char]) -> bool {
    let mut prev = None;
    for c in text.chars() {
        if targets.contains(&c) && prev != Some('\\') {
            return true;
        }
        prev = Some(c);
    }
    false
}

/// Short description of `pattern`, e.g. `^-[A-Z]` -> "start of line, then '-', one of 'A-Z'".
pub fn explain_regex(pattern: &str) -> String {
    let mut anchors = Vec::new();
    let mut body = pattern;
    if let Some(rest) = body.strip_prefix('^') {
        anchors.push("start of line");
        body = rest;
    }
    if let Some(rest) = body.strip_suffix('$') {
        anchors.push("end of line");
        body = rest;
    }

    let desc = describe_body(body);
    match (anchors.is_empty(), desc) {
        (true, Some(desc)) => desc,
        (false, Some(desc)) => format!("{}, then {desc}", anchors.join(", ")),
        (_, None) => GENERIC.to_string(),
    }
}

fn describe_body(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }
    if let Some(class) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
        return Some(describe_class(class));
    }
    let chars: Vec<char> = body.chars().collect();
    if chars.len() == 2 && chars[0] == '\\' {
        return Some(format!("literal '{}'", chars[1]));
    }

    let mut parts = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '[' {
            if let Some(offset) = chars[i + 1..].iter().position(|&x| x == ']') {
                let end = i + 1 + offset;
                let class: String = chars[i + 1..end].iter().collect();
                parts.push(describe_class(&class));
                i = end + 1;
                continue;
            }
        }
        match (special(c), chars.get(i + 1)) {
            (Some(meaning), _) => parts.push(meaning.to_string()),
            (None, Some(next)) if c == '\\' => {
                parts.push(format!("literal '{next}'"));
                i += 1;
            }
            _ => parts.push(format!("'{c}'")),
        }
        i += 1;
    }
    Some(parts.join(", "))
}

fn describe_class(class: &str) -> String {
    match class.strip_prefix('^') {
        Some(negated) => format!("not any of '{negated}'"),
        None => format!("one of '{class}'"),
    }
}
