//! Conductor Routes - Inspect model routing configuration
//!
//! Loads a routing configuration, validates it and prints the order in which
//! candidates would be tried for each capability.
//!
//! # Usage
//!
//! ```bash
//! # Default config (~/.config/ai-way/routing.toml)
//! conductor-routes
//!
//! # Custom config, chat only, thinking requests
//! conductor-routes --config ./routing.toml --capability chat --thinking
//!
//! # Validate and exit
//! conductor-routes --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use routing_core::config::{default_config_path, load_config_from_path, RoutingConfig};
use routing_core::routing::{ConfiguredSelector, ModelCapability, ModelSelector, ModelTarget};

/// Conductor Routes - model routing inspector for ai-way
#[derive(Parser, Debug)]
#[command(name = "conductor-routes")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Routing configuration file
    #[arg(short = 'c', long, env = "ROUTING_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only show one capability
    #[arg(long, value_enum)]
    capability: Option<CapabilityArg>,

    /// Show chat order for thinking requests
    #[arg(long)]
    thinking: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "ROUTING_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CapabilityArg {
    Chat,
    Embedding,
    Rerank,
}

impl From<CapabilityArg> for ModelCapability {
    fn from(arg: CapabilityArg) -> Self {
        match arg {
            CapabilityArg::Chat => ModelCapability::Chat,
            CapabilityArg::Embedding => ModelCapability::Embedding,
            CapabilityArg::Rerank => ModelCapability::Rerank,
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("conductor_routes={level},routing_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

fn candidates(selector: &ConfiguredSelector, capability: ModelCapability, thinking: bool) -> Vec<ModelTarget> {
    match capability {
        ModelCapability::Chat => selector.select_chat_candidates(thinking),
        ModelCapability::Embedding => selector.select_embedding_candidates(),
        ModelCapability::Rerank => selector.select_rerank_candidates(),
    }
}

fn render(config: &RoutingConfig, args: &Args) -> String {
    let selector = ConfiguredSelector::new(Arc::new(config.clone()));
    let capabilities: Vec<ModelCapability> = match args.capability {
        Some(c) => vec![c.into()],
        None => ModelCapability::ALL.to_vec(),
    };

    let mut out = String::new();
    for capability in capabilities {
        out.push_str(&format!("{capability}:\n"));

        let targets = candidates(&selector, capability, args.thinking);
        if targets.is_empty() {
            out.push_str("  (no candidates)\n");
            continue;
        }

        for (rank, target) in targets.iter().enumerate() {
            let url = target
                .resolve_url(capability)
                .unwrap_or_else(|e| format!("<{e}>"));
            out.push_str(&format!(
                "  {}. {} [{}] {} priority={} {}\n",
                rank + 1,
                target.id(),
                target.provider_name(),
                target.model(),
                target.candidate().priority,
                url
            ));
        }
    }

    let selection = &config.settings.selection;
    out.push_str(&format!(
        "selection: failure_threshold={} open_duration_ms={}\n",
        selection.failure_threshold, selection.open_duration_ms
    ));
    out.push_str(&format!(
        "stream: first_packet_timeout={:?} message_chunk_size={}\n",
        config.first_packet_timeout(),
        config.settings.stream.message_chunk_size
    ));
    out
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let path = args.config.clone().or_else(default_config_path);
    let config = load_config_from_path(path.clone()).with_context(|| {
        format!(
            "Failed to load routing configuration from {}",
            path.as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<none>".to_string())
        )
    })?;

    if config.config_file_path.is_none() {
        warn!("No routing configuration file found, showing defaults");
    }

    config.validate().context("Routing configuration is invalid")?;
    info!(source = %config.source(), "Routing configuration valid");

    if args.check {
        println!("ok");
        return Ok(());
    }

    print!("{}", render(&config, &args));
    Ok(())
}
