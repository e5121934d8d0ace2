//! Toolbridge - a function-calling model wired to an MCP tool server

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{chat_command, init_command, status_command, tools_command};

/// Toolbridge - answer questions with the tools of an MCP server
#[derive(Parser)]
#[command(name = "toolbridge")]
#[command(about = "Bridge a function-calling model to MCP tools")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the config file
    Init,
    /// Ask questions answered with the server's tools
    Chat {
        /// Single message to answer, interactive prompt otherwise
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Print the tool catalog as the model sees it
    Tools,
    /// Show configuration status
    Status,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Chat { message } => chat_command(message).await,
        Commands::Tools => tools_command().await,
        Commands::Status => status_command().await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
