use anyhow::{Context, Result};
use clap::Parser;
use parley_core::{AppConfig, Gateway, OpenAiCompatClient};
use parley_gateway::AppState;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "parley-gateway")]
#[command(about = "Parley request gateway - validates chat turns and forwards them upstream")]
#[command(version)]
struct Cli {
    /// Address to listen on (overrides config)
    #[arg(short, long)]
    bind: Option<String>,

    /// Completion endpoint URL (overrides config)
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load();

    if let Some(bind) = cli.bind {
        config.gateway.bind = bind;
    }
    if let Some(endpoint) = cli.endpoint {
        config.completion.endpoint = endpoint;
    }

    let addr: SocketAddr = config
        .gateway
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.gateway.bind))?;

    if config.completion.api_key().is_none() {
        tracing::warn!(
            "{} is not set; requests to {} will likely be rejected",
            config.completion.api_key_env,
            config.completion.endpoint
        );
    }

    let client = OpenAiCompatClient::from_config(&config.completion);
    let state = AppState::new(Gateway::new(Arc::new(client)));

    parley_gateway::serve(state, addr).await
}
