use anyhow::Result;
use clap::Parser;
use companion_sessions::{create_router, AppState, Config};
use tracing::info;

/// Companion tutoring session service
#[derive(Debug, Parser)]
#[command(name = "companion-sessions", version)]
struct Cli {
    /// Config file path, without extension
    #[arg(long, default_value = "config/companion-sessions")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Voice backend: {:?}", cfg.provider.kind);

    let state = AppState::new(cfg.provider.kind);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
