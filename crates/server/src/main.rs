//! Storepress publishing service.
//!
//! Receives page edits from the platform admin and republishes the account's
//! store app through the registry and builder services.
//!
//! Usage:
//!   storepress-server --account acme \
//!       --registry-url https://registry.internal \
//!       --builder-url https://builder.internal

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use storepress_server::build_router;
use storepress_store::{HttpBuilderClient, HttpRegistryClient, StorePublisher};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "storepress-server")]
#[command(about = "Page-driven store app publishing service")]
struct Args {
    /// Port for the HTTP API
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Base URL of the platform registry service
    #[arg(long, env = "STOREPRESS_REGISTRY_URL")]
    registry_url: String,

    /// Base URL of the platform builder service
    #[arg(long, env = "STOREPRESS_BUILDER_URL")]
    builder_url: String,

    /// Platform account owning the store app
    #[arg(long, env = "STOREPRESS_ACCOUNT")]
    account: String,

    /// Scratch directory for unpacked bundles
    #[arg(long, default_value = "appFilesFromRegistry")]
    workdir: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let registry = Arc::new(HttpRegistryClient::new(&args.registry_url));
    let builder = Arc::new(HttpBuilderClient::new(&args.builder_url));
    let publisher = Arc::new(StorePublisher::new(
        registry,
        builder,
        args.account.clone(),
        args.workdir,
    ));

    let app = build_router(publisher);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;
    info!(
        "Publishing API listening on port {} (account: {})",
        args.port, args.account
    );
    axum::serve(listener, app).await?;

    Ok(())
}
