//! Turn a command line into a per-stage explanation.
//!
//! Each stage is looked up in the knowledge base; on a miss the command's
//! own help text is mined (at most once per command name per call to
//! [`Explainer::explain`]). Danger warnings are computed on the same
//! [`Pipeline`].

mod regex;
mod signals;

pub use self::regex::{explain_regex, looks_like_regex};
pub use self::signals::{KILL_COMMANDS, SignalArg, explain_signal_arg, resolve_signal};

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::danger::{DangerRules, Warning, detect};
use crate::extract::{ExtractedHelp, FlagMap, HelpSource, extract_help};
use crate::knowledge::{CommandInfo, KnowledgeBase};
use crate::shell::{
    Connector, ParseError, Pipeline, PipelineStage, RedirectOp, RedirectionSpec, parse_pipeline,
};

/// Commands whose first positional argument is a search pattern.
pub const GREP_COMMANDS: &[&str] = &["grep", "egrep", "fgrep", "rg"];

static DEFAULT_RULES: Lazy<DangerRules> = Lazy::new(DangerRules::default);

/// Where a stage's description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionSource {
    KnowledgeBase,
    HelpText,
    Unknown,
}

/// One explained flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagExplanation {
    /// The flag as matched, e.g. `-l` out of `-la`.
    pub flag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `None` when the flag is not documented.
    pub description: Option<String>,
}

/// A search pattern and its reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternExplanation {
    pub pattern: String,
    pub meaning: String,
}

/// Explanation of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageExplanation {
    pub command: String,
    pub summary: String,
    pub source: DescriptionSource,
    pub flags: Vec<FlagExplanation>,
    pub arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternExplanation>,
    pub redirections: Vec<String>,
    /// How this stage connects to the next one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
}

/// The full explanation of a command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub command: String,
    pub pipeline: Pipeline,
    pub stages: Vec<StageExplanation>,
    pub warnings: Vec<Warning>,
    /// Low-severity remarks, e.g. missing flag descriptions.
    pub notes: Vec<String>,
}

/// Explains commands against a knowledge base and an optional help source.
pub struct Explainer<'a> {
    knowledge: &'a dyn KnowledgeBase,
    help_source: Option<&'a dyn HelpSource>,
    rules: &'a DangerRules,
}

impl<'a> Explainer<'a> {
    /// With `help_source` set to `None`, unknown commands are never probed.
    pub fn new(knowledge: &'a dyn KnowledgeBase, help_source: Option<&'a dyn HelpSource>) -> Self {
        Self {
            knowledge,
            help_source,
            rules: &DEFAULT_RULES,
        }
    }

    pub fn with_rules(mut self, rules: &'a DangerRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parse and explain `raw`. Parse errors abort before any explanation.
    pub fn explain(&self, raw: &str) -> Result<Explanation, ParseError> {
        let pipeline = parse_pipeline(raw)?;
        let mut request = Request::default();

        if pipeline.is_empty() {
            request.note("nothing to explain");
        }

        let mut stages = Vec::with_capacity(pipeline.len());
        for (i, stage) in pipeline.stages.iter().enumerate() {
            let mut explained = self.explain_stage(stage, &mut request);
            explained.connector = pipeline.connector_after(i).map(describe_connector);
            stages.push(explained);
        }

        let mut warnings = request.warnings;
        warnings.extend(detect(raw, &pipeline, self.rules));

        Ok(Explanation {
            command: raw.to_string(),
            pipeline,
            stages,
            warnings,
            notes: request.notes,
        })
    }

    fn explain_stage(&self, stage: &PipelineStage, request: &mut Request) -> StageExplanation {
        let command = stage.command.as_str();

        let (summary, source, flags) = match self.knowledge.lookup(command) {
            Some(info) => {
                request.warn_danger_level(command, info);
                (
                    info.description.clone(),
                    DescriptionSource::KnowledgeBase,
                    Flags::Known(&info.flags),
                )
            }
            None => {
                let help = request.extracted(command, self.help_source).clone();
                if help.flags.is_empty() {
                    request.note(format!("flag descriptions for `{command}` are unavailable"));
                }
                if help.is_empty() {
                    (
                        "Unknown command; no description available.".to_string(),
                        DescriptionSource::Unknown,
                        Flags::None,
                    )
                } else {
                    (
                        help.summary
                            .unwrap_or_else(|| "No summary found in its help text.".to_string()),
                        DescriptionSource::HelpText,
                        Flags::Extracted(help.flags),
                    )
                }
            }
        };

        let args = stage.args();
        let mut explained = StageExplanation {
            command: command.to_string(),
            summary,
            source,
            flags: Vec::new(),
            arguments: Vec::new(),
            pattern: None,
            redirections: stage.redirections.iter().map(describe_redirection).collect(),
            connector: None,
        };

        let kill_family = KILL_COMMANDS.contains(&command);
        let grep_family = GREP_COMMANDS.contains(&command);
        let mut end_of_options = false;
        let mut i = 0;
        while i < args.len() {
            let arg = args[i];
            let next = args.get(i + 1).copied();
            i += 1;

            if end_of_options || !arg.starts_with('-') || arg == "-" {
                explained.arguments.push(arg.to_string());
                continue;
            }
            if arg == "--" {
                end_of_options = true;
                continue;
            }
            if kill_family {
                if let Some(signal) = explain_signal_arg(arg, next) {
                    if signal.consumed_next {
                        i += 1;
                    }
                    explained.flags.push(FlagExplanation {
                        flag: signal.spelling.clone(),
                        value: None,
                        description: Some(signal.explain()),
                    });
                    continue;
                }
            }
            let (matched, consumed_next) = flags.explain(arg, next);
            if consumed_next {
                i += 1;
            }
            explained.flags.extend(matched);
        }

        if grep_family {
            explained.pattern = explained
                .arguments
                .first()
                .filter(|p| looks_like_regex(p))
                .map(|p| PatternExplanation {
                    pattern: p.clone(),
                    meaning: explain_regex(p),
                });
        }

        explained
    }
}

/// Per-call state: extraction cache, notes and knowledge-base warnings.
#[derive(Default)]
struct Request {
    extracted: HashMap<String, ExtractedHelp>,
    notes: Vec<String>,
    warnings: Vec<Warning>,
}

impl Request {
    fn extracted(&mut self, command: &str, source: Option<&dyn HelpSource>) -> &ExtractedHelp {
        self.extracted
            .entry(command.to_string())
            .or_insert_with(|| match source {
                Some(source) => {
                    debug!(command, "not in knowledge base; extracting help");
                    extract_help(command, source)
                }
                None => ExtractedHelp::default(),
            })
    }

    fn note(&mut self, note: impl Into<String>) {
        let note = note.into();
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
    }

    fn warn_danger_level(&mut self, command: &str, info: &CommandInfo) {
        if !info.danger_level.is_severe() {
            return;
        }
        let warning = Warning::new(
            "knowledge.danger_level",
            info.danger_level,
            format!("The command '{command}' is considered {} risk.", info.danger_level),
        );
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }
}

/// Flag descriptions available for one stage.
enum Flags<'k> {
    Known(&'k BTreeMap<String, String>),
    Extracted(FlagMap),
    None,
}

impl Flags<'_> {
    /// Description and whether the flag takes a value.
    fn get(&self, spelling: &str) -> Option<(&str, bool)> {
        match self {
            Flags::Known(flags) => flags.get(spelling).map(|d| (d.as_str(), false)),
            Flags::Extracted(flags) => flags
                .get(spelling)
                .map(|e| (e.description.as_str(), e.takes_value)),
            Flags::None => None,
        }
    }

    /// Explain one dash argument; returns the matches and whether `next` was consumed.
    fn explain(&self, arg: &str, next: Option<&str>) -> (Vec<FlagExplanation>, bool) {
        let with_next = |flag: &str, description: &str, takes_value: bool| {
            let value = next.filter(|_| takes_value).map(String::from);
            let consumed = value.is_some();
            (
                vec![FlagExplanation {
                    flag: flag.to_string(),
                    value,
                    description: Some(description.to_string()),
                }],
                consumed,
            )
        };

        if let Some((description, takes_value)) = self.get(arg) {
            return with_next(arg, description, takes_value);
        }

        if let Some((name, value)) = arg.split_once('=') {
            if let Some((description, _)) = self.get(name) {
                return (
                    vec![FlagExplanation {
                        flag: name.to_string(),
                        value: Some(value.to_string()),
                        description: Some(description.to_string()),
                    }],
                    false,
                );
            }
        }

        if !arg.starts_with("--") && arg.len() > 2 {
            if let Some(found) = self.explain_cluster(arg, next) {
                return found;
            }
        }

        (
            vec![FlagExplanation {
                flag: arg.to_string(),
                value: None,
                description: None,
            }],
            false,
        )
    }

    /// `-la` as `-l` and `-a`; a value-taking letter ends the cluster.
    ///
    /// Letters without a description are listed as undocumented, unless no
    /// letter is known at all.
    fn explain_cluster(&self, arg: &str, next: Option<&str>) -> Option<(Vec<FlagExplanation>, bool)> {
        let cluster = &arg[1..];
        let mut found = Vec::new();
        let mut any_known = false;
        let mut consumed_next = false;

        for (offset, c) in cluster.char_indices() {
            let flag = format!("-{c}");
            let Some((description, takes_value)) = self.get(&flag) else {
                found.push(FlagExplanation {
                    flag,
                    value: None,
                    description: None,
                });
                continue;
            };
            any_known = true;
            let mut entry = FlagExplanation {
                flag,
                value: None,
                description: Some(description.to_string()),
            };
            if takes_value {
                let rest = &cluster[offset + c.len_utf8()..];
                if !rest.is_empty() {
                    entry.value = Some(rest.to_string());
                } else if let Some(next) = next {
                    entry.value = Some(next.to_string());
                    consumed_next = true;
                }
                found.push(entry);
                break;
            }
            found.push(entry);
        }

        any_known.then_some((found, consumed_next))
    }
}

fn describe_connector(connector: Connector) -> String {
    let text = match connector {
        Connector::Pipe => "| pipes its output into the next command",
        Connector::And => "&& runs the next command only if this one succeeds",
        Connector::Or => "|| runs the next command only if this one fails",
        Connector::Sequence => "; then runs the next command",
    };
    text.to_string()
}

fn describe_redirection(redirection: &RedirectionSpec) -> String {
    let op = redirection.operator.as_str();
    let target = redirection.target.as_str();
    let stream = match redirection.operator {
        RedirectOp::Stderr | RedirectOp::StderrAppend => "standard error",
        _ => "standard output",
    };
    if let Some(fd) = target.strip_prefix('&') {
        let into = match fd {
            "1" => "standard output",
            "2" => "standard error",
            other => other,
        };
        return format!("{op} {target}: sends {stream} to {into}");
    }
    match redirection.operator {
        RedirectOp::Stdout | RedirectOp::Stderr => {
            format!("{op} {target}: writes {stream} to {target} (overwriting)")
        }
        RedirectOp::StdoutAppend | RedirectOp::StderrAppend => {
            format!("{op} {target}: appends {stream} to {target}")
        }
        RedirectOp::Stdin => format!("{op} {target}: reads standard input from {target}"),
    }
}
