//! Elliptic-curve bid confidentiality primitive for sealed-bid auctions.
//!
//! This crate implements ECIES over BN254 G1 with a keccak-derived one-time
//! pad, bit-compatible with the protocol's reference implementation.
//!
//! # Overview
//!
//! 1. **Lot setup**: each lot carries a public key; the matching private key
//!    stays off-system until the lot concludes.
//!
//! 2. **Bid sealing**: a bidder encrypts the requested amount to the lot
//!    public key under a fresh ephemeral key, salted with the bid context so
//!    a ciphertext cannot be replayed into another bid.
//!
//! 3. **Reveal**: after conclusion the lot private key is published and any
//!    party can decrypt every bid in submission order.

pub mod ecies;
pub mod error;

pub use ecies::{
    decrypt, derive_public_key, encrypt, open_amount, random_scalar, seal_amount,
    validate_public_key,
};
pub use error::CryptoError;
