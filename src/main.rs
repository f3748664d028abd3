use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use rsmeta::commands::{self, DependencyFormat};
use rsmeta::config;
use rsmeta::constants::CONFIG_FILENAME;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config_file: String,

    /// Enable verbose output (info level)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress all non-essential output (error level only)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Enable debug output (debug level)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect schema, table and column metadata into one document
    Collect {
        #[command(flatten)]
        database_args: config::DatabaseArgs,

        #[command(flatten)]
        output_args: config::OutputArgs,

        #[command(flatten)]
        object_filter_args: config::ObjectFilterArgs,
    },

    /// Show view lineage recovered from view definitions
    Dependencies {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: DependencyFormat,

        /// Filter to specific objects (e.g., "sales.orders")
        #[arg(long)]
        object: Option<String>,

        #[command(flatten)]
        database_args: config::DatabaseArgs,

        #[command(flatten)]
        object_filter_args: config::ObjectFilterArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logging(&cli);

    tokio::select! {
        result = run_main(cli) => result,
        _ = wait_for_shutdown_signal() => {
            info!("Received shutdown signal, stopping collection...");
            Ok(())
        }
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn initialize_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn" // default level
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    // stdout carries the collected document
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_main(cli: Cli) -> Result<()> {
    let file_config = config::load_config(&cli.config_file)?;

    match cli.command {
        Commands::Collect {
            database_args,
            output_args,
            object_filter_args,
        } => {
            let cli_config = config::ConfigInput {
                database: Some(database_args.into()),
                objects: Some(object_filter_args.into()),
                output: Some(output_args.into()),
            };

            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_config)
                .resolve()?;

            commands::cmd_collect(&config).await
        }
        Commands::Dependencies {
            format,
            object,
            database_args,
            object_filter_args,
        } => {
            let cli_config = config::ConfigInput {
                database: Some(database_args.into()),
                objects: Some(object_filter_args.into()),
                output: None,
            };

            let config = config::ConfigBuilder::new()
                .with_file(file_config)
                .with_cli_args(cli_config)
                .resolve()?;

            commands::cmd_dependencies(&config, format, object.as_deref()).await
        }
    }
}
