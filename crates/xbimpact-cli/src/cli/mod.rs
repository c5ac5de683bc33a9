mod commands;
mod dispatch;
mod helpers;

use clap::Parser;
use dispatch::stage_command_spec;
use xbimpact_core::domain::ImpactError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let impact_error = error.as_impact_error();
            eprintln!("{}", impact_error.diagnostic_line());
            if let Some(summary_line) = impact_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            impact_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.log_level.as_deref())?;
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "xbimpact", version, about = "Coastal storm-impact post-processing")]
struct Cli {
    /// Log filter for stderr output (overrides RUST_LOG), e.g. `debug` or `xbimpact_core=trace`
    #[arg(long, global = true, value_name = "level")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Trace water-line and erosion-scarp frontiers and compute field maxima
    Postprocess(commands::StageArgs),
    /// Classify reference points against the traced frontiers
    Indicators(commands::StageArgs),
    /// Validate a run manifest and report its shape without processing steps
    Inspect(commands::InspectArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Postprocess(args) => dispatch_stage("postprocess", args),
        CliCommand::Indicators(args) => dispatch_stage("indicators", args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
    }
}

fn dispatch_stage(command_name: &str, args: commands::StageArgs) -> Result<i32, CliError> {
    let spec = stage_command_spec(command_name).ok_or_else(|| {
        CliError::Internal(anyhow::anyhow!(
            "stage command '{}' is not registered",
            command_name
        ))
    })?;
    commands::run_stage_command(spec, args)
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(ImpactError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_impact_error(&self) -> ImpactError {
        match self {
            Self::Usage(message) => ImpactError::configuration("CONFIG.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => ImpactError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<ImpactError> for CliError {
    fn from(error: ImpactError) -> Self {
        Self::Compute(error)
    }
}
