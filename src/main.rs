use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use etfscope::cli::setup::{setup, setup_at_path};
use etfscope::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for etfscope::AppCommand {
    fn from(cmd: Commands) -> etfscope::AppCommand {
        match cmd {
            Commands::Show { symbol, json } => etfscope::AppCommand::Show { symbol, json },
            Commands::Compare {
                first,
                second,
                json,
            } => etfscope::AppCommand::Compare {
                first,
                second,
                json,
            },
            Commands::Popular => etfscope::AppCommand::Popular,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show details for one ETF
    Show {
        /// Ticker symbol, e.g. VTI
        symbol: String,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare two ETFs side by side
    Compare {
        first: String,
        second: String,
        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },
    /// List popular ETF symbols
    Popular,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => etfscope::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
