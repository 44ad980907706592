//! Encrypted sealed-bid batch-auction settlement engine.
//!
//! This crate implements the full lot lifecycle for marginal-price batch
//! auctions with sealed bids:
//!
//! - Lot creation with capacity, pricing policy, and an encryption key
//! - Sealed bid submission and pre-conclusion cancellation
//! - One-time private key reveal, validated against the lot public key
//! - Chunked bid decryption in submission order
//! - Uniform marginal-price settlement with partial-fill and minimum-fill
//!   protections
//! - Pure per-bid claim calculation for the external custody layer
//!
//! # Architecture
//!
//! - `call`: message types and tagged-variant dispatch for the registry
//! - `handlers`: business logic for processing calls
//! - `settle` / `claim`: the pure settlement and claim algorithms
//! - `queries`: read-only state access
//! - `state`: lot and bid arenas
//! - `genesis`: initial configuration
//! - `error`: error types
//!
//! # Example
//!
//! ```ignore
//! use empa_engine::{handlers, AuctionState, CallContext};
//!
//! let mut state = AuctionState::new();
//! let ctx = CallContext { sender, timestamp };
//!
//! let lot_id = handlers::handle_create_lot(&mut state, &ctx, params)?;
//! let bid_id = handlers::handle_submit_bid(&mut state, &ctx, lot_id, ...)?;
//! // ...after conclusion:
//! handlers::handle_reveal_private_key(&mut state, &ctx, lot_id, key)?;
//! while handlers::handle_decrypt_batch(&mut state, &ctx, lot_id, 100)? > 0 {}
//! let summary = handlers::handle_settle(&mut state, &ctx, lot_id)?;
//! ```

pub mod call;
pub mod claim;
pub mod error;
pub mod genesis;
pub mod handlers;
pub mod queries;
pub mod settle;
pub mod state;

pub use call::{apply_call, AuctionCall, CallOutcome};
pub use claim::{compute_claim, ClaimAmounts};
pub use error::AuctionError;
pub use genesis::{DefaultLotParams, EngineConfig, EngineGenesisConfig};
pub use handlers::{CallContext, HandlerResult, SettlementSummary};
pub use queries::{AuctionQuery, AuctionQueryResponse};
pub use settle::{compute_settlement, SettlementOutcome};
pub use state::AuctionState;
