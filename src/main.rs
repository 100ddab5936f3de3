use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use walletview::core::log::init_logging;
use walletview::core::price::Timeframe;

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

impl From<Commands> for walletview::AppCommand {
    fn from(cmd: Commands) -> walletview::AppCommand {
        match cmd {
            Commands::Chains => walletview::AppCommand::Chains,
            Commands::View {
                chain,
                address,
                timeframe,
            } => walletview::AppCommand::View {
                chain,
                address,
                timeframe,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List supported chains
    Chains,
    /// Display wallet value, metrics and valuation history
    View {
        /// Chain symbol, e.g. btc, eth, rndr, bnb
        #[arg(long)]
        chain: String,

        /// Wallet address on that chain
        #[arg(short, long)]
        address: String,

        /// History window: 1d, 7d or 30d (defaults to the configured timeframe)
        #[arg(short, long)]
        timeframe: Option<Timeframe>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => walletview::cli::setup::setup(),
        Some(cmd) => walletview::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
