//! # Ledger Configuration & Constants
//!
//! Every magic number the engine relies on lives here: network names, the
//! native currency, the mint contract, version strings reported by
//! `/network/options`, and the bounds that keep the unreceived-block scan
//! and the nested send-list walk finite.
//!
//! The runtime [`Configuration`] is assembled by the node binary from CLI
//! flags and environment variables and then shared read-only by every
//! handler.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::model::NetworkIdentifier;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Blockchain name reported in every `NetworkIdentifier`.
pub const BLOCKCHAIN: &str = "vite";

/// Network names, as they appear in `network_identifier.network`.
pub const MAINNET_NETWORK: &str = "mainnet";
pub const TESTNET_NETWORK: &str = "testnet";
pub const DEVNET_NETWORK: &str = "devnet";

// ---------------------------------------------------------------------------
// Native Currency
// ---------------------------------------------------------------------------

/// Symbol of the native token.
pub const SYMBOL: &str = "VITE";

/// Decimals of the native token. Amounts on the wire are always in the
/// smallest unit, so this only matters to clients rendering balances.
pub const DECIMALS: i32 = 18;

/// Token type id of the native token.
pub const VITE_TOKEN_ID: &str = "tti_5649544520544f4b454e6e40";

/// The built-in mint contract. Sends to it destroy value, so operations
/// crediting it are reported as BURN.
pub const MINT_ADDRESS: &str = "vite_000000000000000000000000000000000000000595292d996d";

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

/// Rosetta specification version this middleware implements.
pub const ROSETTA_VERSION: &str = "1.4.10";

/// gvite release the middleware is tested against.
pub const NODE_VERSION: &str = "2.10.2";

/// Version of this middleware.
pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Chain Parameters
// ---------------------------------------------------------------------------

/// Height of the genesis snapshot block.
pub const GENESIS_BLOCK_INDEX: u64 = 1;

/// Balances can be queried at any past snapshot height.
pub const HISTORICAL_BALANCE_SUPPORTED: bool = true;

/// Rosetta's minimum plausible block timestamp (2000-01-01T00:00:00Z) in
/// milliseconds. A head block older than this means the node is still
/// bootstrapping.
pub const MIN_UNIX_EPOCH_MS: i64 = 946_713_600_000;

// ---------------------------------------------------------------------------
// Engine Bounds
// ---------------------------------------------------------------------------

/// Page size used when scanning a recipient's unreceived blocks.
pub const UNRECEIVED_PAGE_SIZE: u64 = 20;

/// Default cap on the number of unreceived-block pages one Metadata call
/// may request before giving up.
pub const DEFAULT_MAX_UNRECEIVED_PAGES: u64 = 50;

/// Deepest nested send list the codec expands. Contract blocks deeper than
/// this are reported with status `EXCEED_MAX_DEPTH` instead of descended.
pub const MAX_SEND_LIST_DEPTH: usize = 8;

// ---------------------------------------------------------------------------
// Node Connection
// ---------------------------------------------------------------------------

/// Default gvite HTTP RPC endpoint.
pub const DEFAULT_GVITE_URL: &str = "http://localhost:48132/";

/// Default per-request timeout against the node.
pub const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default HTTP port of the Rosetta server.
pub const DEFAULT_PORT: u16 = 8080;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Error returned when a mode or network name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not a valid mode, expected ONLINE or OFFLINE")]
    InvalidMode(String),
    #[error("{0} is not a valid network, expected MAINNET, TESTNET or DEVNET")]
    InvalidNetwork(String),
}

/// Whether the server may talk to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Online,
    Offline,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ONLINE" => Ok(Self::Online),
            "OFFLINE" => Ok(Self::Offline),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// Which Vite network the server fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl Network {
    /// Name used in `network_identifier.network`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_NETWORK,
            Self::Testnet => TESTNET_NETWORK,
            Self::Devnet => DEVNET_NETWORK,
        }
    }

    pub fn network_identifier(&self) -> NetworkIdentifier {
        NetworkIdentifier {
            blockchain: BLOCKCHAIN.to_string(),
            network: self.name().to_string(),
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MAINNET" => Ok(Self::Mainnet),
            "TESTNET" => Ok(Self::Testnet),
            "DEVNET" => Ok(Self::Devnet),
            _ => Err(ConfigError::InvalidNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name().to_ascii_uppercase())
    }
}

/// Immutable runtime configuration shared by every service.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub mode: Mode,
    pub network: Network,
    pub gvite_url: String,
    pub port: u16,
    /// Embed full transactions in `/block` responses instead of listing
    /// identifiers under `other_transactions`.
    pub inline_transactions: bool,
    pub node_timeout: Duration,
    pub max_unreceived_pages: u64,
}

impl Configuration {
    /// Configuration with every tunable at its default.
    pub fn new(mode: Mode, network: Network) -> Self {
        Self {
            mode,
            network,
            gvite_url: DEFAULT_GVITE_URL.to_string(),
            port: DEFAULT_PORT,
            inline_transactions: true,
            node_timeout: DEFAULT_NODE_TIMEOUT,
            max_unreceived_pages: DEFAULT_MAX_UNRECEIVED_PAGES,
        }
    }

    pub fn is_online(&self) -> bool {
        self.mode == Mode::Online
    }

    pub fn network_identifier(&self) -> NetworkIdentifier {
        self.network.network_identifier()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
