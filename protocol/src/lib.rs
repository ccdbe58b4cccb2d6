// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Vite Rosetta — Core Library
//!
//! A Rosetta middleware engine for the Vite ledger. Vite is a dual-block
//! ledger: every transfer is a send block on the sender's chain and, later,
//! a receive block on the recipient's chain that names the send it
//! acknowledges. Rosetta speaks in ledger-neutral operations. This crate
//! translates between the two and drives the offline-signing construction
//! workflow against a gvite node.
//!
//! ## Architecture
//!
//! - **ledger** — Addresses, token ids, hashes, quantities, account blocks.
//! - **crypto** — BLAKE2b digests and Ed25519 over BLAKE2b-512.
//! - **model** — Rosetta request/response and operation types.
//! - **transaction** — Block ↔ operation codec, matcher, builder, signing.
//! - **construction** — The `/construction/*` stages and receive resolution.
//! - **services** — The Data API: network, account, block.
//! - **client** — The node contract and its gvite JSON-RPC implementation.
//! - **config** — Ledger constants and runtime configuration.
//! - **error** — The API error catalog.
//!
//! ## Design Notes
//!
//! 1. Construction stages are stateless: everything a stage needs travels
//!    in the request, including the base64 block payload.
//! 2. Only `metadata`, `submit` and the Data API talk to the node, and only
//!    in online mode.
//! 3. Module errors are `thiserror` enums; the API boundary maps them onto
//!    the catalog and keeps their text in `details.context`.

pub mod client;
pub mod config;
pub mod construction;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod model;
pub mod services;
pub mod transaction;

pub use client::{GviteClient, InMemoryNode, NodeClient, NodeError};
pub use config::{Configuration, Mode, Network};
pub use construction::ConstructionService;
pub use error::{ApiError, ErrorKind};
pub use services::{AccountService, BlockService, NetworkService};
