//! # CLI Interface
//!
//! Command-line arguments for `vite-rosetta-node`, via `clap` derive. Every
//! `run` flag falls back to an environment variable so the server can be
//! configured entirely from a container environment.

use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};

use vite_rosetta::config::{
    Configuration, Mode, Network, DEFAULT_GVITE_URL, DEFAULT_MAX_UNRECEIVED_PAGES, DEFAULT_PORT,
};

use crate::logging::LogFormat;

/// Rosetta API server for the Vite ledger.
#[derive(Parser, Debug)]
#[command(
    name = "vite-rosetta-node",
    about = "Rosetta API server for the Vite ledger",
    version,
    propagate_version = true
)]
pub struct ViteRosettaCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the Rosetta API.
    Run(RunArgs),
    /// Sign a hex message with a hex private key and print the signature.
    Sign(SignArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// ONLINE talks to gvite; OFFLINE serves only the node-free endpoints.
    #[arg(long, env = "MODE", default_value = "ONLINE")]
    pub mode: Mode,

    /// MAINNET, TESTNET or DEVNET.
    #[arg(long, env = "NETWORK", default_value = "MAINNET")]
    pub network: Network,

    /// Port for the Rosetta API, `/health` and `/metrics`.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// gvite JSON-RPC endpoint.
    #[arg(long, env = "GVITE", default_value = DEFAULT_GVITE_URL)]
    pub gvite: String,

    /// Embed transactions in `/block` responses instead of listing their
    /// identifiers.
    #[arg(long, env = "INLINE_TXS", default_value_t = true, action = ArgAction::Set)]
    pub inline_txs: bool,

    /// Timeout for each gvite request, in seconds.
    #[arg(long, env = "NODE_TIMEOUT_SECS", default_value_t = 30)]
    pub node_timeout_secs: u64,

    /// Unreceived-block pages scanned before a receive lookup gives up.
    #[arg(long, env = "MAX_UNRECEIVED_PAGES", default_value_t = DEFAULT_MAX_UNRECEIVED_PAGES)]
    pub max_unreceived_pages: u64,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Default filter when `RUST_LOG` is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "vite_rosetta=info,vite_rosetta_node=info")]
    pub log_level: String,
}

impl RunArgs {
    pub fn configuration(&self) -> Configuration {
        Configuration {
            gvite_url: self.gvite.clone(),
            port: self.port,
            inline_transactions: self.inline_txs,
            node_timeout: Duration::from_secs(self.node_timeout_secs),
            max_unreceived_pages: self.max_unreceived_pages,
            ..Configuration::new(self.mode, self.network)
        }
    }
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// 32-byte seed, or 64-byte seed || public key, in hex.
    pub private_key: String,

    /// Message bytes in hex, usually a signing payload's `hex_bytes`.
    pub message: String,
}
