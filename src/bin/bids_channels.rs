use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bids_channels::analysis::configuration_summary;
use bids_channels::app::{App, PathPayload, required_set_types};
use bids_channels::config::ConfigLoader;
use bids_channels::domain::FileRecord;
use bids_channels::error::BidsError;
use bids_channels::fs_util::{read_dataset, read_participants};
use bids_channels::output::{JsonOutput, LogSink};

#[derive(Parser)]
#[command(name = "bids-channels")]
#[command(about = "Group parsed BIDS file records into per-subject/session channel tuples")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Group file records according to a channel config")]
    Group(GroupArgs),
    #[command(about = "Report which set types a channel config uses")]
    Analyze(AnalyzeArgs),
    #[command(about = "Derive file records from BIDS filenames (stdin when none given)")]
    Parse(ParseArgs),
}

#[derive(Args)]
struct GroupArgs {
    #[arg(long)]
    config: PathBuf,

    #[arg(long)]
    records: PathBuf,

    #[arg(long)]
    participants: Option<PathBuf>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(long)]
    config: PathBuf,
}

#[derive(Args)]
struct ParseArgs {
    paths: Vec<String>,

    #[arg(long)]
    with_metadata: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(bids) = report.downcast_ref::<BidsError>() {
            return ExitCode::from(map_exit_code(bids));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BidsError) -> u8 {
    if error.is_config_error() {
        2
    } else if error.is_missing_file() {
        3
    } else {
        1
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Group(args) => run_group(args),
        Commands::Analyze(args) => run_analyze(args),
        Commands::Parse(args) => run_parse(args),
    }
}

fn run_group(args: GroupArgs) -> miette::Result<()> {
    let config = ConfigLoader::load(&args.config)?;
    let mut dataset = read_dataset(&args.records)?;
    if let Some(path) = &args.participants {
        read_participants(&mut dataset, path)?;
    }

    let needed = required_set_types(&config, &dataset);
    tracing::info!(set_types = ?needed, "set types in use");

    let app = App::new(PathPayload);
    let result = app.group(&config, &dataset, &LogSink)?;
    if !result.skipped.is_empty() {
        tracing::info!(count = result.skipped.len(), "files without a config entry");
    }
    JsonOutput::print_grouping(&result).into_diagnostic()?;
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> miette::Result<()> {
    let value = ConfigLoader::load_value(&args.config)?;
    let summary = configuration_summary(&value);
    JsonOutput::print_summary(&summary).into_diagnostic()?;
    Ok(())
}

fn run_parse(args: ParseArgs) -> miette::Result<()> {
    let paths = if args.paths.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .into_diagnostic()?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        args.paths
    };

    let records = paths
        .iter()
        .map(|path| {
            let mut record = FileRecord::from_path(path.trim());
            if args.with_metadata {
                record.load_metadata();
            }
            record
        })
        .collect::<Vec<_>>();
    JsonOutput::print_records(&records).into_diagnostic()?;
    Ok(())
}
