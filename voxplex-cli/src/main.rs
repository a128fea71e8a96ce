//! CLI entry point for voxplex

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voxplex_core::config::{Config, ConfigLoader, LoggingConfig};
use voxplex_core::logging::init_logging;
use voxplex_providers::{OpenperplexClient, TranscriptionService};
use voxplex_server::{run_server, speech, AppState};

#[derive(Parser)]
#[command(name = "voxplex")]
#[command(about = "Voice and text chat over the OpenPerplex search API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },
    /// Run the web chat server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask a single question and print the answer
    Ask {
        /// OpenPerplex API key
        #[arg(short = 'k', long)]
        api_key: String,
        /// Question to ask
        message: Option<String>,
        /// Transcribe this audio file and ask its text instead
        #[arg(short, long)]
        audio: Option<PathBuf>,
    },
    /// Show status information
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Onboard { force } => {
            init_console_logging();
            run_onboard(&config_loader, force)?;
        }
        Commands::Serve { host, port } => {
            let mut config = config_loader.load()?;
            let logging = resolve_log_dir(&config.logging, config_loader.config_dir());
            let _guard = init_logging(&logging);

            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_serve(config).await?;
        }
        Commands::Ask {
            api_key,
            message,
            audio,
        } => {
            init_console_logging();
            run_ask(&config_loader, &api_key, message, audio).await?;
        }
        Commands::Status => {
            init_console_logging();
            run_status(&config_loader)?;
        }
    }

    Ok(())
}

/// Plain stderr logging for the one-shot commands
fn init_console_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Relative log directories live under the config directory
fn resolve_log_dir(logging: &LoggingConfig, config_dir: &Path) -> LoggingConfig {
    let mut logging = logging.clone();
    if Path::new(&logging.dir).is_relative() {
        logging.dir = config_dir.join(&logging.dir).to_string_lossy().to_string();
    }
    logging
}

fn run_onboard(loader: &ConfigLoader, force: bool) -> Result<()> {
    println!("{}", style("Welcome to Voxplex!").bold().cyan());

    let config_path = loader.config_path();
    if config_path.exists() && !force {
        println!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_path.display()
        );
        return Ok(());
    }

    loader.save(&Config::default())?;
    println!(
        "{} Wrote {}",
        style("✓").green(),
        config_path.display()
    );
    println!();
    println!("Next steps:");
    println!("  1. Set GROQ_API_KEY (or speech.api_key) to enable voice input");
    println!("  2. Run {}", style("voxplex serve").bold());
    println!("  3. Open the page and enter your OpenPerplex API key");
    Ok(())
}

async fn run_serve(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    info!("Starting voxplex server");
    let state = AppState::from_config(&config);
    run_server(state, addr, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await
}

async fn run_ask(
    loader: &ConfigLoader,
    api_key: &str,
    message: Option<String>,
    audio: Option<PathBuf>,
) -> Result<()> {
    let config = loader.load()?;

    let query = match (message, audio) {
        (Some(message), _) if !message.trim().is_empty() => message,
        (_, Some(path)) => {
            let transcription = TranscriptionService::from_config(&config.speech);
            let text = transcription
                .transcribe(&path)
                .await
                .map_err(|e| anyhow::anyhow!("Speech recognition error: {}", e))?;
            if text.trim().is_empty() {
                anyhow::bail!("Speech recognition error: could not understand audio");
            }
            println!("{} {}", style("You said:").dim(), text);
            text
        }
        _ => {
            println!("Provide a message or --audio <file>");
            println!("Example: voxplex ask --api-key <key> 'What is the capital of France?'");
            return Ok(());
        }
    };

    let client = OpenperplexClient::new(api_key, config.search.clone())
        .map_err(|e| anyhow::anyhow!("Failed to initialize chatbot: {}", e))?;
    match client.custom_search(&query).await {
        Ok(answer) => {
            println!("{}", answer.to_content());
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{}",
                style(format!("I'm sorry, I encountered an error: {}", e)).red()
            );
            Err(anyhow::anyhow!("Error generating response: {}", e))
        }
    }
}

fn run_status(loader: &ConfigLoader) -> Result<()> {
    let config = loader.load()?;

    println!("{}", style("Voxplex Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    let file_state = if loader.config_path().exists() {
        style("present").green()
    } else {
        style("missing (defaults in use)").yellow()
    };
    println!("  Config file: {} ({})", loader.config_path().display(), file_state);
    println!(
        "  Listen address: {}:{}",
        config.server.host, config.server.port
    );
    println!();

    println!("{}", style("Search:").bold());
    println!("  API base: {}", config.search.api_base);
    println!(
        "  Parameters: location={}, search_type={}, pro_mode={}, recency={}",
        config.search.location,
        config.search.search_type,
        config.search.pro_mode,
        config.search.recency_filter
    );
    println!();

    println!("{}", style("Voice input:").bold());
    println!("  Transcription: {} ({})", config.speech.transcription_url, config.speech.model);
    let key_state = if config.speech.api_key.trim().is_empty() {
        style("not configured").red()
    } else {
        style("configured").green()
    };
    println!("  Transcription key: {}", key_state);
    let voice = if speech::from_config(&config.speech).is_some() {
        style("available").green()
    } else {
        style("unavailable").dim()
    };
    println!("  Status: {}", voice);

    Ok(())
}
