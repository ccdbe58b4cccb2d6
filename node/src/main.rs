// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Vite Rosetta Node
//!
//! Entry point for the `vite-rosetta-node` binary. Parses CLI arguments,
//! initializes logging and metrics, connects to gvite when online, and
//! serves the Rosetta API.
//!
//! - `run`     — serve the API
//! - `sign`    — sign a hex message with the ledger's signature scheme
//! - `version` — print version information

mod api;
mod cli;
mod logging;
mod metrics;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;

use vite_rosetta::client::{GviteClient, NodeClient, OfflineClient};
use vite_rosetta::config::{MIDDLEWARE_VERSION, NODE_VERSION, ROSETTA_VERSION};
use vite_rosetta::crypto::ViteKeypair;

use cli::{Commands, ViteRosettaCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ViteRosettaCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Sign(args) => sign_message(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Connects to the node (online mode only) and serves the API until a
/// shutdown signal arrives.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log_level, args.log_format);

    let config = Arc::new(args.configuration());
    tracing::info!(
        mode = %config.mode,
        network = %config.network,
        port = config.port,
        gvite = %config.gvite_url,
        "starting vite-rosetta-node"
    );

    let client: Arc<dyn NodeClient> = if config.is_online() {
        let client = GviteClient::connect(
            &config.gvite_url,
            config.node_timeout,
            config.inline_transactions,
        )
        .await
        .with_context(|| format!("failed to connect to gvite at {}", config.gvite_url))?;
        Arc::new(client)
    } else {
        Arc::new(OfflineClient)
    };

    let metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);
    let router = api::create_router(api::AppState::new(config.clone(), client, metrics));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", addr))?;
    tracing::info!("Rosetta API listening on {}", addr);

    tokio::select! {
        res = axum::serve(listener, router) => {
            res.context("API server error")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("vite-rosetta-node stopped");
    Ok(())
}

/// Signs `message` and prints the signature hex.
fn sign_message(args: cli::SignArgs) -> Result<()> {
    let keypair = ViteKeypair::from_hex(&args.private_key).context("invalid private key")?;
    let message = hex::decode(args.message.trim()).context("message is not valid hex")?;
    println!("{}", keypair.sign(&message).to_hex());
    Ok(())
}

fn print_version() {
    println!("vite-rosetta-node {}", MIDDLEWARE_VERSION);
    println!("rosetta           {}", ROSETTA_VERSION);
    println!("gvite             {}", NODE_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first. A handler
/// that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
