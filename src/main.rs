use anyhow::{Context, Result};
use call_translator::{create_router, AppState, Config};
use clap::Parser;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "call-translator", version, about = "Hindi/English phone call translator")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(long, default_value = "config/call-translator")]
    config: String,

    /// Override http.bind
    #[arg(long)]
    bind: Option<String>,

    /// Override http.port
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut cfg = Config::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = cli.port {
        cfg.service.http.port = port;
    }

    info!("Call Translator v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Mode: {} ({} <-> {})",
        cfg.telephony.mode.as_str(),
        cfg.translation.primary_language,
        cfg.translation.secondary_language
    );
    info!("Public domain: {}", cfg.service.public_domain);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let state = AppState::from_config(cfg)?;
    info!("Providers: {}", state.pipeline.providers().describe());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
