pub mod config;
pub mod errors;
pub mod logging;
pub mod path;
pub mod replay;
pub mod report;
pub mod runtime;
pub mod search;
pub mod trace;
pub mod types;
pub mod values;

use clap::{error::ErrorKind, Args, Parser, Subcommand, ValueEnum};
use config::{load_config, AppConfig, CliOverrides};
use errors::ExplorerError;
use logging::{structured_fallback_line, JsonlLogger};
use replay::recorder::write_scenario;
use replay::replayer::ScenarioRecording;
use replay::{ReplayEngine, ReplayFrame};
use runtime::ProductionRuntime;
use search::{search_with_options, Scenario};
use serde_json::json;
use std::path::PathBuf;
use types::BestPolicy;
use values::parse_value_list;

#[derive(Debug, Clone, Parser)]
#[command(name = "bnb-explorer")]
#[command(about = "Trace and replay a branch-and-bound exact-sum subset search")]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Append structured JSONL events to this file.
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a search and print its outcome.
    Search(SearchArgs),
    /// Project the decision tree at a trace cursor.
    Replay(ReplayArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Comma separated amounts, e.g. 60,50,25
    #[arg(long, allow_hyphen_values = true)]
    pub values: Option<String>,
    #[arg(long)]
    pub target: Option<u64>,
    #[arg(long)]
    pub tolerance: Option<u64>,
    #[arg(long = "max-steps")]
    pub max_steps: Option<u64>,
    #[arg(long, value_enum)]
    pub policy: Option<BestPolicy>,
}

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Write the scenario as a JSONL recording.
    #[arg(long)]
    pub record: Option<PathBuf>,
    /// Print every step after the summary.
    #[arg(long, default_value_t = false)]
    pub trace: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Replay a recording instead of searching.
    #[arg(
        long,
        conflicts_with_all = ["values", "target", "tolerance", "max_steps", "policy"]
    )]
    pub from: Option<PathBuf>,
    #[arg(long)]
    pub cursor: usize,
    #[arg(long, default_value_t = false)]
    pub pending: bool,
    #[arg(long, default_value_t = false)]
    pub clamp: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn run() -> Result<i32, ExplorerError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let runtime = ProductionRuntime::new();
    run_with_runtime(&args, &runtime)
}

pub fn run_with_runtime(
    args: &[std::ffi::OsString],
    runtime: &ProductionRuntime,
) -> Result<i32, ExplorerError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(ExplorerError::Cli(error.to_string())),
        },
    };

    let overrides = overrides_from(&cli);
    let cfg = load_config(&overrides, runtime.file_system.as_ref())?;
    let logger = JsonlLogger::from_config(&cfg);

    match &cli.command {
        Command::Search(args) => run_search(args, &cfg, logger.as_ref(), runtime),
        Command::Replay(args) => run_replay(args, &cfg, logger.as_ref(), runtime),
    }
}

fn overrides_from(cli: &Cli) -> CliOverrides {
    let (input, include_pending, clamp_cursor) = match &cli.command {
        Command::Search(args) => (&args.input, false, false),
        Command::Replay(args) => (&args.input, args.pending, args.clamp),
    };
    CliOverrides {
        config_path: cli.config.clone(),
        tolerance: input.tolerance,
        max_steps: input.max_steps,
        best_policy: input.policy,
        include_pending,
        clamp_cursor,
        log_path: cli.log.clone(),
    }
}

fn run_search(
    args: &SearchArgs,
    cfg: &AppConfig,
    logger: Option<&JsonlLogger>,
    runtime: &ProductionRuntime,
) -> Result<i32, ExplorerError> {
    let scenario = search_from_input(&args.input, cfg, logger)?;

    if let Some(path) = &args.record {
        write_scenario(runtime.file_system.as_ref(), path, &scenario)?;
    }

    match args.format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&scenario)
                .map_err(|e| ExplorerError::Io(e.to_string()))?;
            runtime.terminal.write_line(&text)?;
        }
        OutputFormat::Text => {
            for line in report::scenario_summary(&scenario) {
                runtime.terminal.write_line(&line)?;
            }
            if args.trace {
                for line in report::trace_lines(&scenario) {
                    runtime.terminal.write_line(&line)?;
                }
            }
            if let Some(path) = &args.record {
                runtime
                    .terminal
                    .write_line(&format!("recorded: {}", path.display()))?;
            }
        }
    }
    Ok(0)
}

fn run_replay(
    args: &ReplayArgs,
    cfg: &AppConfig,
    logger: Option<&JsonlLogger>,
    runtime: &ProductionRuntime,
) -> Result<i32, ExplorerError> {
    let scenario = match &args.from {
        Some(path) => ScenarioRecording::load(runtime.file_system.as_ref(), path)?.scenario,
        None => search_from_input(&args.input, cfg, logger)?,
    };

    let engine = ReplayEngine::with_options(&scenario, cfg.replay_options())?;
    let frame = if cfg.replay.clamp_cursor {
        engine.frame_clamped(args.cursor)
    } else {
        engine.frame(args.cursor)?
    };
    log_event(
        logger,
        "replay_frame",
        json!({
            "cursor": frame.cursor,
            "kind": frame.step.kind.as_str(),
            "nodes": frame.nodes.len(),
            "edges": frame.edges.len(),
        }),
    );

    write_frame(&frame, args.format, runtime)?;
    Ok(0)
}

fn write_frame(
    frame: &ReplayFrame,
    format: OutputFormat,
    runtime: &ProductionRuntime,
) -> Result<(), ExplorerError> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(frame)
                .map_err(|e| ExplorerError::Io(e.to_string()))?;
            runtime.terminal.write_line(&text)
        }
        OutputFormat::Text => {
            for line in report::frame_lines(frame) {
                runtime.terminal.write_line(&line)?;
            }
            Ok(())
        }
    }
}

fn search_from_input(
    input: &InputArgs,
    cfg: &AppConfig,
    logger: Option<&JsonlLogger>,
) -> Result<Scenario, ExplorerError> {
    let raw_values = input
        .values
        .as_deref()
        .ok_or_else(|| ExplorerError::Cli("--values is required".to_string()))?;
    let target = input
        .target
        .ok_or_else(|| ExplorerError::Cli("--target is required".to_string()))?;
    let values = parse_value_list(raw_values)?;
    let options = cfg.search_options();

    log_event(
        logger,
        "search_started",
        json!({
            "values": values,
            "target": target,
            "tolerance": options.tolerance,
            "max_steps": options.max_steps,
            "best_policy": options.best_policy.as_str(),
        }),
    );
    let scenario = search_with_options(&values, target, options)?;
    log_event(
        logger,
        "search_completed",
        json!({
            "outcome": scenario.outcome.as_str(),
            "steps": scenario.trace.len(),
            "candidates": scenario.candidates.len(),
            "best_path": scenario.best_path().map(|p| p.key()),
            "fingerprint": scenario.trace.fingerprint(),
        }),
    );
    Ok(scenario)
}

fn log_event(logger: Option<&JsonlLogger>, event_type: &str, payload: serde_json::Value) {
    let Some(logger) = logger else {
        return;
    };
    if let Err(error) = logger.info(event_type, payload) {
        eprintln!("{}", structured_fallback_line(event_type, &error.to_string()));
    }
}
