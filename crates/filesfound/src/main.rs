//! Files found trigger launcher
//!
//! Runs the scheduler, evaluates triggers on demand, checks search
//! configurations, and serves as the scan agent on remote nodes.

use anyhow::Result;
use clap::{Parser, Subcommand};
use filesfound_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "filesfound",
    version,
    about = "Schedule builds when files matching a pattern are found"
)]
struct Cli {
    /// Settings file (defaults to ~/.filesfound/filesfound.toml)
    #[arg(long, global = true, env = "FILESFOUND_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every job's trigger on its schedule until interrupted
    Run,

    /// Evaluate triggers once, now
    Tick {
        /// Only evaluate this job
        #[arg(long)]
        job: Option<String>,
    },

    /// Test one search configuration without scheduling anything
    Test {
        /// Node to search on (empty or "master" for the local controller)
        #[arg(long)]
        node: Option<String>,

        /// Directory to search
        #[arg(long, default_value = "")]
        directory: String,

        /// Comma-separated Ant-style patterns of files to find
        #[arg(long, default_value = "")]
        files: String,

        /// Comma-separated Ant-style patterns of files to ignore
        #[arg(long, default_value = "")]
        ignored_files: String,

        /// Minimum number of files needed to trigger
        #[arg(long, default_value = "1")]
        trigger_number: String,
    },

    /// Validate the settings file and test every configured search
    Check,

    /// List the nodes searches can run on
    Nodes,

    /// Rewrite the settings file in the current format
    Migrate,

    /// Serve one scan request on stdin/stdout (run by the controller)
    #[command(hide = true)]
    AgentScan,
}

fn run_command(cli: Cli) -> Result<ExitCode> {
    let config = cli::settings_path(cli.config);
    match cli.command {
        Commands::Run => cli::run::run(&config),
        Commands::Tick { job } => cli::run::tick(&config, job.as_deref()),
        Commands::Test {
            node,
            directory,
            files,
            ignored_files,
            trigger_number,
        } => cli::test::run(
            &config,
            cli::test::TestArgs {
                node,
                directory,
                files,
                ignored_files,
                trigger_number,
            },
        ),
        Commands::Check => cli::check::run(&config),
        Commands::Nodes => cli::nodes::run(&config),
        Commands::Migrate => cli::migrate::run(&config),
        Commands::AgentScan => cli::agent::run(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let agent_mode = matches!(cli.command, Commands::AgentScan);
    let log_config = LogConfig {
        app_name: if agent_mode { "filesfound-agent" } else { "filesfound" },
        verbose: cli.verbose,
        agent_mode,
    };
    if let Err(e) = init_logging(log_config) {
        eprintln!("Warning: logging unavailable: {:#}", e);
    }

    match run_command(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
