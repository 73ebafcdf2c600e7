//! shell-explain - explain shell command lines in plain language.
//!
//! A command string is tokenized and decomposed into pipeline stages; each
//! stage is described from a built-in knowledge base, a user store, or the
//! command's own `--help`/manual text, and the whole line is checked for
//! dangerous patterns.

pub mod audit;
pub mod config;
pub mod danger;
pub mod explain;
pub mod extract;
pub mod knowledge;
pub mod logging;
pub mod output;
pub mod shell;

pub use config::{CompiledConfig, Config};
pub use danger::{DangerRules, Warning, detect};
pub use explain::{Explainer, Explanation};
pub use extract::{FlagEntry, FlagMap, HelpSource, SystemHelpSource, extract_flags};
pub use knowledge::{CommandInfo, DangerLevel, KnowledgeBase, LayeredKnowledge};
pub use output::{format_parse_error, render_json, render_text};
pub use shell::{ParseError, Pipeline, parse_pipeline, tokenize};
