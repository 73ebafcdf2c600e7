//! shell-explain command-line entry point.

use clap::{CommandFactory, Parser};
use shell_explain::audit::{AuditEntry, AuditLogger};
use shell_explain::config::{CompiledConfig, Config};
use shell_explain::explain::{Explainer, Explanation};
use shell_explain::extract::{HelpSource, SystemHelpSource};
use shell_explain::knowledge::{
    CommandInfo, CustomCommandStore, DangerLevel, LayeredKnowledge, StoreError, parse_flag_spec,
};
use shell_explain::logging::init_logging;
use shell_explain::output::{format_parse_error, render_json, render_text};
use shell_explain::shell::ParseError;

use std::process::ExitCode;
use tracing::warn;

/// Explains a shell command.
#[derive(Debug, Parser)]
#[command(name = "shell-explain", version, about)]
struct Cli {
    /// The shell command to explain (quote it).
    command: Option<String>,

    /// Add a new command to the custom knowledge base.
    /// FLAGS is "-f:description, -g:description" (may be empty).
    #[arg(
        long,
        num_args = 4,
        allow_hyphen_values = true,
        value_names = ["COMMAND", "DESCRIPTION", "DANGER_LEVEL", "FLAGS"]
    )]
    add_command: Option<Vec<String>>,

    /// Print the explanation as JSON.
    #[arg(long)]
    json: bool,

    /// Never run unknown commands to read their help text.
    #[arg(long)]
    no_extract: bool,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let config = load_config();

    if let Some(values) = &cli.add_command {
        let [name, description, danger_level, flags] = values.as_slice() else {
            eprintln!("error: --add-command takes COMMAND DESCRIPTION DANGER_LEVEL FLAGS");
            return ExitCode::from(1);
        };
        return match add_command(&config, name, description, danger_level, flags) {
            Ok(name) => {
                println!("Command '{name}' added to the custom knowledge base.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(1)
            }
        };
    }

    let Some(command) = cli.command.as_deref() else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    let custom = config
        .store_path()
        .map(|path| CustomCommandStore::new(path).load())
        .unwrap_or_default();
    let knowledge = LayeredKnowledge::new(custom);

    let system_source = (!cli.no_extract && config.extractor_enabled())
        .then(|| SystemHelpSource::new(config.probe_limits()));
    let help_source = system_source.as_ref().map(|s| s as &dyn HelpSource);

    let explainer = Explainer::new(&knowledge, help_source).with_rules(&config.danger);
    let result = explainer.explain(command);
    audit(&config, command, &result);

    match result {
        Ok(explanation) => print_explanation(&explanation, cli.json),
        Err(e) => {
            eprintln!("{}", format_parse_error(&e));
            ExitCode::from(2)
        }
    }
}

/// Load and compile config; problems are reported and defaults used.
fn load_config() -> CompiledConfig {
    let cwd = std::env::current_dir().ok();
    let config = match Config::load(cwd.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "ignoring config");
            eprintln!("Config error: {}", e);
            return CompiledConfig::default();
        }
    };
    match config.compile() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "ignoring config");
            eprintln!("Config error: {}", e);
            CompiledConfig::default()
        }
    }
}

fn add_command(
    config: &CompiledConfig,
    name: &str,
    description: &str,
    danger_level: &str,
    flags: &str,
) -> Result<String, StoreError> {
    let info = CommandInfo {
        description: description.to_string(),
        danger_level: danger_level.parse::<DangerLevel>()?,
        flags: parse_flag_spec(flags)?,
    };
    let path = config.store_path().ok_or(StoreError::NoStorePath)?;
    CustomCommandStore::new(path).add(name, info)?;
    Ok(name.to_string())
}

fn print_explanation(explanation: &Explanation, json: bool) -> ExitCode {
    if !json {
        print!("{}", render_text(explanation));
        return ExitCode::SUCCESS;
    }
    match render_json(explanation) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

fn audit(config: &CompiledConfig, command: &str, result: &Result<Explanation, ParseError>) {
    let Some(path) = config.audit_path() else {
        return;
    };
    let entry = match result {
        Ok(explanation) => AuditEntry::explained(explanation),
        Err(e) => AuditEntry::rejected(command, e),
    };
    match AuditLogger::open(&path) {
        Ok(mut logger) => {
            if let Err(e) = logger.log(&entry) {
                warn!(path = %path.display(), error = %e, "audit write failed");
            }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "cannot open audit log"),
    }
}
