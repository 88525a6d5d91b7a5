mod commands;
mod error;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::column::ColumnSetArgs;
use commands::job::{JobDefineArgs, JobNameArgs};
use commands::run::RunArgs;
use dataloom_core::OverrideType;

#[derive(Parser)]
#[command(
    name = "dataloom",
    version,
    about = "Run recurring data-import jobs and keep their tables in shape"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./dataloom.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog and warehouse
    Init,
    /// Define and inspect jobs
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Edit column overrides and keys
    Column {
        #[command(subcommand)]
        command: ColumnCommands,
    },
    /// Run a job now
    Run {
        /// Job name
        name: String,
    },
    /// Run scheduled jobs until Ctrl-C
    Serve,
}

#[derive(Subcommand)]
enum JobCommands {
    /// Create or update a job from a TOML manifest
    Define {
        /// Path to the manifest
        manifest: PathBuf,
    },
    /// List jobs with their schedule and last outcome
    List {
        /// Print the jobs as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a job's scripts, tables, columns and ledger
    Show {
        /// Job name
        name: String,
    },
    /// Renumber a job's scripts 1..N
    Reorder {
        /// Job name
        name: String,
    },
}

#[derive(Subcommand)]
enum ColumnCommands {
    /// Set overrides on a recorded column
    Set {
        /// Job name
        job: String,
        /// Script name
        script: String,
        /// Table name
        table: String,
        /// Column name as it appears in the data file
        column: String,
        /// Store the column under this name (empty string clears)
        #[arg(long)]
        rename: Option<String>,
        /// Type override: DATE, TIMESTAMP, INTEGER, TEXT, NUMERIC, BIGINT, BOOLEAN
        #[arg(long = "type")]
        data_type: Option<OverrideType>,
        /// Flag or unflag the column as part of the primary key
        #[arg(long)]
        primary_key: Option<bool>,
        /// Reference a unique column, as TABLE.COLUMN
        #[arg(long)]
        references: Option<String>,
        /// Remove the reference
        #[arg(long)]
        clear_reference: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json_logs);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => commands::init::handle_init(&config)?,
        Commands::Job { command } => match command {
            JobCommands::Define { manifest } => {
                commands::job::handle_job_define(&config, &JobDefineArgs { manifest })?
            }
            JobCommands::List { json } => commands::job::handle_job_list(&config, json)?,
            JobCommands::Show { name } => {
                commands::job::handle_job_show(&config, &JobNameArgs { name })?
            }
            JobCommands::Reorder { name } => {
                commands::job::handle_job_reorder(&config, &JobNameArgs { name })?
            }
        },
        Commands::Column { command } => match command {
            ColumnCommands::Set {
                job,
                script,
                table,
                column,
                rename,
                data_type,
                primary_key,
                references,
                clear_reference,
            } => commands::column::handle_column_set(
                &config,
                &ColumnSetArgs {
                    job,
                    script,
                    table,
                    column,
                    rename,
                    data_type,
                    primary_key,
                    references,
                    clear_reference,
                },
            )?,
        },
        Commands::Run { name } => {
            if !commands::run::handle_run(config, &RunArgs { name })? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Serve => commands::serve::handle_serve(config)?,
    }

    Ok(ExitCode::SUCCESS)
}
