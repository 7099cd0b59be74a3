// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod helpers;

use clap::{error::ErrorKind, ArgAction, Args, Parser, Subcommand};
use sdl_feedback_core::{
    resolve_config_path, ConfigPathScope, ExitCode, MachineError, ENV_LOG_JSON, ENV_LOG_LEVEL,
};
use sdl_feedback_model::{PageKey, ValidationError};
use sdl_feedback_store::{FeedbackConfig, FeedbackSession, StoreError, StoreErrorCode};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use tokio::runtime::Runtime;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
Usage: {usage}

Options:
{options}

Commands:
{subcommands}
{after-help}";

#[derive(Parser)]
#[command(name = "sdl-feedback")]
#[command(version)]
#[command(about = "Local-first page feedback with optional remote sharing")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_help = "Environment:\n  SDL_FEEDBACK_DATA_DIR     Local data directory\n  SDL_FEEDBACK_REMOTE_URL   Remote base URL\n  SDL_FEEDBACK_REMOTE_KEY   Remote API key\n  SDL_FEEDBACK_LOG_LEVEL    Log verbosity override"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long = "print-config-paths", default_value_t = false)]
    print_config_paths: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct PageArgs {
    /// Explicit page key.
    #[arg(long, conflicts_with = "path")]
    page: Option<String>,
    /// Document path the page key is derived from, e.g. `/course/day3.html`.
    #[arg(long)]
    path: Option<String>,
}

impl PageArgs {
    fn resolve(&self) -> Result<PageKey, CliError> {
        helpers::resolve_page(self.page.as_deref(), self.path.as_deref())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile with the remote once, then list the page.
    Init {
        #[command(flatten)]
        page: PageArgs,
    },
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Count {
        #[command(flatten)]
        page: PageArgs,
    },
    Submit {
        #[command(flatten)]
        page: PageArgs,
        /// Display name; defaults to the last saved name.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        message: String,
    },
    Sync {
        #[command(flatten)]
        page: PageArgs,
    },
    Name {
        #[command(subcommand)]
        command: NameCommand,
    },
}

#[derive(Subcommand)]
enum NameCommand {
    Get,
    Set { name: String },
}

#[derive(Clone, Copy)]
struct LogFlags {
    quiet: bool,
    verbose: u8,
}

impl LogFlags {
    fn level_override(self) -> Option<&'static str> {
        match (self.quiet, self.verbose) {
            (_, 2..) => Some("trace"),
            (_, 1) => Some("debug"),
            (true, 0) => Some("error"),
            (false, 0) => None,
        }
    }
}

#[derive(Clone, Copy)]
pub(crate) struct OutputMode {
    pub(crate) json: bool,
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            eprintln!("{}", render_error(&err, wants_json));
            err.exit_code.into()
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", err.to_string()),
                });
            }
        },
    };
    let output_mode = OutputMode { json: cli.json };
    init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
    });

    let mut config = FeedbackConfig::load(cli.config.as_deref()).map_err(CliError::store)?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    debug!(
        data_dir = %config.data_dir.display(),
        remote = config.remote.is_complete(),
        "configuration loaded"
    );
    if cli.print_config_paths {
        return emit_config_paths(&config, output_mode);
    }

    let command = cli.command.ok_or_else(|| CliError {
        exit_code: ExitCode::Usage,
        machine: MachineError::new("usage_error", "missing command; see --help"),
    })?;
    let mut session = FeedbackSession::open(&config);
    run_command(command, &mut session, output_mode)
}

fn run_command(
    command: Commands,
    session: &mut FeedbackSession,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    match command {
        Commands::Init { page } => {
            let page = page.resolve()?;
            let report = runtime()?.block_on(session.init(&page));
            helpers::emit_ok(
                output_mode,
                json!({
                    "command": "init",
                    "page": report.page.as_str(),
                    "remote": session.remote_backend(),
                    "sync": report.sync.as_str(),
                    "added": report.sync.added(),
                    "count": report.entries.len(),
                    "entries": helpers::entries_payload(&report.entries)?,
                }),
            )
        }
        Commands::List { page } => {
            let page = page.resolve()?;
            let entries = session.list(&page);
            helpers::emit_ok(
                output_mode,
                json!({
                    "command": "list",
                    "page": page.as_str(),
                    "count": entries.len(),
                    "entries": helpers::entries_payload(&entries)?,
                }),
            )
        }
        Commands::Count { page } => {
            let page = page.resolve()?;
            helpers::emit_ok(
                output_mode,
                json!({
                    "command": "count",
                    "page": page.as_str(),
                    "count": session.count(&page),
                }),
            )
        }
        Commands::Submit {
            page,
            name,
            message,
        } => {
            let page = page.resolve()?;
            let name = name.unwrap_or_else(|| session.display_name());
            run_submit(session, &page, &name, &message, output_mode)
        }
        Commands::Sync { page } => {
            let page = page.resolve()?;
            let outcome = runtime()?.block_on(session.sync(&page));
            helpers::emit_ok(
                output_mode,
                json!({
                    "command": "sync",
                    "page": page.as_str(),
                    "remote": session.remote_backend(),
                    "status": outcome.as_str(),
                    "added": outcome.added(),
                    "count": session.count(&page),
                }),
            )
        }
        Commands::Name { command } => match command {
            NameCommand::Get => helpers::emit_ok(
                output_mode,
                json!({"command": "name get", "name": session.display_name()}),
            ),
            NameCommand::Set { name } => {
                if name.trim().is_empty() {
                    return Err(CliError::validation(ValidationError(
                        "display name must not be empty".to_string(),
                    )));
                }
                let saved = session.remember_name(&name);
                helpers::emit_ok(
                    output_mode,
                    json!({
                        "command": "name set",
                        "name": session.display_name(),
                        "saved": saved,
                    }),
                )
            }
        },
    }
}

fn run_submit(
    session: &mut FeedbackSession,
    page: &PageKey,
    name: &str,
    message: &str,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let rt = runtime()?;
    let (receipt, remote) = rt.block_on(async {
        let mut receipt = session
            .submit(page, name, message)
            .map_err(CliError::validation)?;
        // The process exits right after, so wait for the push here.
        let remote = match receipt.push.take() {
            None if !session.remote_enabled() => "disabled",
            None => "skipped",
            Some(handle) => match handle.await {
                Ok(Ok(())) => "pushed",
                Ok(Err(_)) | Err(_) => "failed",
            },
        };
        Ok::<_, CliError>((receipt, remote))
    })?;
    helpers::emit_ok(
        output_mode,
        json!({
            "command": "submit",
            "page": page.as_str(),
            "entry": receipt.entry,
            "remote": remote,
            "warnings": helpers::warnings_payload(&receipt.warnings),
        }),
    )
}

fn runtime() -> Result<Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start async runtime: {e}")))
}

fn emit_config_paths(config: &FeedbackConfig, output_mode: OutputMode) -> Result<(), CliError> {
    helpers::emit_ok(
        output_mode,
        json!({
            "workspace_config": resolve_config_path(ConfigPathScope::Workspace),
            "user_config": resolve_config_path(ConfigPathScope::User),
            "data_dir": config.data_dir,
            "remote_configured": config.remote.is_complete(),
        }),
    )
}

fn env_bool(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn init_tracing(log_flags: LogFlags) {
    let filter = match log_flags.level_override() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(ENV_LOG_LEVEL)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let installed = if env_bool(ENV_LOG_JSON) {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = installed {
        eprintln!("logging disabled: {err}");
    }
}

#[derive(Debug)]
pub(crate) struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    pub(crate) fn internal(message: String) -> Self {
        Self {
            exit_code: ExitCode::Internal,
            machine: MachineError::new("internal_error", message),
        }
    }

    pub(crate) fn validation(err: ValidationError) -> Self {
        Self {
            exit_code: ExitCode::Validation,
            machine: MachineError::new("validation_error", err.0),
        }
    }

    fn store(err: StoreError) -> Self {
        let exit_code = match err.code {
            StoreErrorCode::Config => ExitCode::Usage,
            StoreErrorCode::Validation => ExitCode::Validation,
            StoreErrorCode::Network | StoreErrorCode::Unavailable => ExitCode::DependencyFailure,
            _ => ExitCode::Internal,
        };
        Self {
            exit_code,
            machine: MachineError::new(err.code.as_str(), err.message),
        }
    }
}

/// One stderr line in `--json` mode; `code: message` plus details otherwise.
fn render_error(error: &CliError, machine_json: bool) -> String {
    if !machine_json {
        return error.machine.to_string();
    }
    serde_json::to_string(&error.machine).unwrap_or_else(|_| {
        r#"{"code":"internal_error","message":"failed to encode structured error","details":{}}"#
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_flags_override_env_filter() {
        let flags = |quiet, verbose| LogFlags { quiet, verbose }.level_override();
        assert_eq!(flags(false, 0), None);
        assert_eq!(flags(true, 0), Some("error"));
        assert_eq!(flags(true, 1), Some("debug"));
        assert_eq!(flags(false, 3), Some("trace"));
    }

    #[test]
    fn config_errors_map_to_usage_exit() {
        let err = CliError::store(StoreError::new(StoreErrorCode::Config, "bad toml"));
        assert_eq!(err.exit_code, ExitCode::Usage);
        assert_eq!(err.machine.code, "config_error");
    }

    #[test]
    fn errors_render_as_json_or_prefixed_text() {
        let err = CliError::validation(ValidationError("message must not be empty".to_string()));
        assert_eq!(
            render_error(&err, false),
            "validation_error: message must not be empty"
        );
        let json: serde_json::Value =
            serde_json::from_str(&render_error(&err, true)).expect("json line");
        assert_eq!(json["code"], "validation_error");
        assert_eq!(json["details"], serde_json::json!({}));
    }
}
