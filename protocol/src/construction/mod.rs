//! # Construction
//!
//! The offline-signing workflow: the typed records that travel between
//! stages, the unreceived-send lookup a receive needs, and the stage
//! implementations themselves.
//!
//! ```text
//! options.rs  — ConstructionOptions, ConstructionMetadata, ParseMetadata
//! resolver.rs — finds the send a receive acknowledges
//! pipeline.rs — ConstructionService, one method per /construction stage
//! ```

pub mod options;
pub mod pipeline;
pub mod resolver;

pub use options::{
    use_pow_flag, ConstructionMetadata, ConstructionOptions, ParseMetadata, USE_POW_KEY,
};
pub use pipeline::{decode_public_key, ConstructionService};
pub use resolver::{ResolverError, TransferQuery, UnreceivedBlockResolver};
