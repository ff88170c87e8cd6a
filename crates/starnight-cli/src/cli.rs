//! Argument parsing and command dispatch.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use starnight_store::{ResetKind, ScopeName};
use starnight_telemetry::{DEFAULT_LOG_LEVEL, LoggingConfig, init_logging, log_format_from};
use tracing::debug;

use crate::commands::export::handle_export;
use crate::commands::import::handle_import;
use crate::commands::reset::handle_reset;
use crate::commands::run::handle_run;
use crate::commands::show::handle_show;
use crate::context::{AppContext, CliResult};

const DEFAULT_STORE_PATH: &str = "starnight-store.json";

/// Parses process arguments, executes the requested command, and returns the
/// process exit code.
#[must_use]
pub fn run() -> i32 {
    run_with(std::env::args_os())
}

/// Same as [`run`] with explicit arguments; the first item is the program name.
#[must_use]
pub fn run_with<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: log_format_from(cli.log_format.as_deref()),
        build_sha: env!("CARGO_PKG_VERSION"),
    };
    // An embedding host or an earlier call may already own the subscriber.
    if let Err(err) = init_logging(&logging) {
        debug!(error = %err, "keeping existing tracing subscriber");
    }

    match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::load(&cli.store)?;
    debug!(command = command_label(&cli.command), "dispatching");
    match cli.command {
        Command::Show(args) => handle_show(&ctx, &args, cli.output),
        Command::Export(args) => handle_export(&ctx, args),
        Command::Import(args) => handle_import(&ctx, args),
        Command::Reset(args) => handle_reset(&ctx, &args),
        Command::Run(args) => handle_run(&ctx, args, cli.output),
    }
}

#[derive(Parser)]
#[command(name = "starnight", about = "Command-line host for the Starnight runtime")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "STARNIGHT_STORE",
        default_value = DEFAULT_STORE_PATH,
        help = "Snapshot file holding the store between runs"
    )]
    pub(crate) store: PathBuf,
    #[arg(
        long,
        global = true,
        env = "STARNIGHT_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level used when RUST_LOG is unset"
    )]
    pub(crate) log_level: String,
    #[arg(long, global = true, help = "Log format: pretty or json")]
    pub(crate) log_format: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the store contents.
    Show(ShowArgs),
    /// Produce an export token.
    Export(ExportArgs),
    /// Apply an export token.
    Import(ImportArgs),
    /// Restore scopes to their defaults.
    Reset(ResetArgs),
    /// Play a scene script against the store.
    Run(RunArgs),
}

#[derive(Args)]
pub(crate) struct ShowArgs {
    #[arg(long, value_parser = parse_scope, help = "Only show one scope")]
    pub(crate) scope: Option<ScopeName>,
}

#[derive(Args)]
pub(crate) struct ExportArgs {
    #[arg(long, help = "Write the token to this file instead of stdout")]
    pub(crate) to: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ImportArgs {
    #[arg(help = "Export token; read from --from or stdin when omitted")]
    pub(crate) token: Option<String>,
    #[arg(long, conflicts_with = "token", help = "Read the token from this file")]
    pub(crate) from: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ResetArgs {
    #[arg(value_enum)]
    pub(crate) kind: ResetChoice,
}

#[derive(Args)]
pub(crate) struct RunArgs {
    #[arg(help = "Scene file: line format, or JSON when the extension is .json")]
    pub(crate) script: PathBuf,
    #[arg(
        long = "choose",
        help = "Answers for choice prompts, in order; the first option is used when exhausted"
    )]
    pub(crate) choices: Vec<String>,
    #[arg(long, help = "Stop at the first suspension instead of resolving it")]
    pub(crate) stop_at_suspend: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ResetChoice {
    ClearGameSave,
    ResetSettings,
    ClearAll,
}

impl From<ResetChoice> for ResetKind {
    fn from(choice: ResetChoice) -> Self {
        match choice {
            ResetChoice::ClearGameSave => Self::ClearGameSave,
            ResetChoice::ResetSettings => Self::ResetSettings,
            ResetChoice::ClearAll => Self::ClearAll,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_scope(value: &str) -> Result<ScopeName, String> {
    value.parse().map_err(|err: starnight_store::StoreError| err.to_string())
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Show(_) => "show",
        Command::Export(_) => "export",
        Command::Import(_) => "import",
        Command::Reset(_) => "reset",
        Command::Run(_) => "run",
    }
}
