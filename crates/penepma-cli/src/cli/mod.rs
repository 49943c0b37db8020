mod commands;
mod helpers;

use clap::Parser;
use penepma_core::domain::PenelopeError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let penelope_error = error.as_penelope_error();
            eprintln!("{}", penelope_error.diagnostic_line());
            if let Some(summary_line) = penelope_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            penelope_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("penepma-rs".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
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
#[command(
    name = "penepma-rs",
    version,
    about = "PENEPMA and PENSHOWER input exporter and results importer"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Write the geometry and `.in` input files for a simulation
    Export(commands::ExportArgs),
    /// Read simulation outputs back into detector results
    Import(commands::ImportArgs),
    /// Write only the `.geo` geometry file
    Geometry(commands::GeometryArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Export(args) => commands::run_export_command(args),
        CliCommand::Import(args) => commands::run_import_command(args),
        CliCommand::Geometry(args) => commands::run_geometry_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(PenelopeError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PenelopeError> for CliError {
    fn from(error: PenelopeError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_penelope_error(&self) -> PenelopeError {
        match self {
            Self::Usage(message) => {
                PenelopeError::input_validation("INPUT.CLI_USAGE", message.clone())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => PenelopeError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
