use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use news_gateway::auth::IdentityClient;
use news_gateway::upstream::PostgrestClient;
use news_gateway::{create_router, AppConfig, AppState};

#[derive(Parser)]
#[command(name = "news-gateway")]
#[command(about = "News CRUD gateway over PostgREST with Supabase token verification")]
#[command(version)]
struct Args {
    #[arg(long, env = "NEWS_GATEWAY_HOST", default_value = "0.0.0.0", help = "Address to bind")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SUPABASE_URL, SUPABASE_ANON_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("news_gateway=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;

    let verifier = IdentityClient::new(&config.identity).context("failed to build identity client")?;
    let store = PostgrestClient::new(&config.upstream).context("failed to build PostgREST client")?;
    tracing::info!("Serving collection {}", store.collection_url());

    let state = AppState::new(Arc::new(verifier), Arc::new(store), config.api.clone());
    let app = create_router(state);

    let bind_addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("News gateway listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
