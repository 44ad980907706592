//! Core type definitions for encrypted marginal-price batch auctions.
//!
//! This crate provides the shared data structures used across the auction
//! system: curve point and scalar encodings, lot and bid records, and the
//! salt derivation that binds a ciphertext to its bid context.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// =========================
// CRYPTOGRAPHIC PRIMITIVES
// =========================

/// Affine point on BN254 G1, coordinates as 32-byte big-endian words.
///
/// `(0, 0)` is the conventional encoding of the identity and is rejected
/// wherever a key is expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: [u8; 32],
    pub y: [u8; 32],
}

impl Default for CurvePoint {
    fn default() -> Self {
        Self {
            x: [0u8; 32],
            y: [0u8; 32],
        }
    }
}

/// Scalar field element (32 bytes, big-endian).
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Scalar(pub [u8; 32]);

impl Default for Scalar {
    fn default() -> Self {
        Self([0u8; 32])
    }
}

/// Sealed bid payload: one 32-byte word, XORed with the keccak keystream.
///
/// The plaintext packs `seed (16 bytes) || seed - amount_out (16 bytes)`,
/// both big-endian, with wrapping subtraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Ciphertext(pub [u8; 32]);

impl Default for Ciphertext {
    fn default() -> Self {
        Self([0u8; 32])
    }
}

// =========================
// AUCTION TYPES
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// Basis-point denominator for the minimum fill fraction.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Lot lifecycle phase.
///
/// Phases only advance: bidding and key reveal happen while `Created`,
/// gated by the lot's timestamps rather than by extra phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum LotPhase {
    /// Accepting bids, then awaiting reveal and decryption
    Created,
    /// All bids decrypted, awaiting settlement
    Decrypted,
    /// Settlement recorded
    Settled,
}

/// Per-bid lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum BidStatus {
    /// Submitted, contents still sealed
    Submitted,
    /// Contents revealed (possibly to a zero amount if malformed)
    Decrypted,
    /// Claim computed and handed to the custody layer
    Claimed,
    /// Cancelled by the bidder before conclusion; terminal
    Cancelled,
}

/// Parameters fixed at lot creation.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct LotParams {
    /// Base-token capacity on offer
    pub capacity: u64,
    /// Bidding opens (inclusive)
    pub start: u64,
    /// Bidding concludes (exclusive)
    pub conclusion: u64,
    /// Minimum acceptable price, quote per base at `base_scale` fixed point
    pub min_price: u128,
    /// Minimum fill fraction of capacity, in basis points
    pub min_fill_bps: u16,
    /// Minimum quote-token size of a single bid
    pub min_bid_size: u64,
    /// Fixed-point scale for prices: 10^(base token decimals)
    pub base_scale: u64,
    /// Lot encryption public key; the private key is revealed at conclusion
    pub public_key: CurvePoint,
}

/// One auction lot and its full persisted state.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Lot {
    pub lot_id: u64,
    pub capacity: u64,
    pub start: u64,
    pub conclusion: u64,
    pub min_price: u128,
    pub min_fill_bps: u16,
    pub min_bid_size: u64,
    pub base_scale: u64,
    pub public_key: CurvePoint,

    /// Absent until revealed after conclusion
    pub private_key: Option<Scalar>,
    pub phase: LotPhase,

    pub next_bid_id: u64,
    /// Cursor into `bid_ids`: everything before it has been processed
    pub next_decrypt_index: u64,
    /// Bid ids in submission order (includes cancelled bids)
    pub bid_ids: Vec<u64>,

    /// Set at settlement when the fill gate is met
    pub marginal_bid_id: Option<u64>,
    /// Uniform clearing price; absent when settlement was not met
    pub marginal_price: Option<u128>,
    /// Total base tokens filled at settlement
    pub total_filled: u64,
}

impl Lot {
    /// Build a fresh lot from creation parameters.
    pub fn new(lot_id: u64, params: LotParams) -> Self {
        Self {
            lot_id,
            capacity: params.capacity,
            start: params.start,
            conclusion: params.conclusion,
            min_price: params.min_price,
            min_fill_bps: params.min_fill_bps,
            min_bid_size: params.min_bid_size,
            base_scale: params.base_scale,
            public_key: params.public_key,
            private_key: None,
            phase: LotPhase::Created,
            next_bid_id: 1,
            next_decrypt_index: 0,
            bid_ids: Vec::new(),
            marginal_bid_id: None,
            marginal_price: None,
            total_filled: 0,
        }
    }

    /// True once the decrypt cursor has passed every submitted bid.
    pub fn fully_decrypted(&self) -> bool {
        self.next_decrypt_index as usize >= self.bid_ids.len()
    }
}

/// A single sealed bid against a lot.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Bid {
    pub bid_id: u64,
    pub bidder: Address,
    pub referrer: Address,
    /// Quote tokens offered
    pub amount_in: u64,
    pub ciphertext: Ciphertext,
    pub ephemeral_public_key: CurvePoint,
    /// Requested base tokens; zero until decrypted, and zero if malformed
    pub amount_out: u64,
    /// Base tokens allocated at settlement
    pub filled: u64,
    pub status: BidStatus,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Derive the per-bid encryption salt.
///
/// Binds a ciphertext to the lot, the bidder, and the quote amount, so a
/// ciphertext copied verbatim into a different bid context decrypts to
/// garbage instead of the original value.
pub fn compute_bid_salt(lot_id: u64, bidder: &Address, amount_in: u64) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    let mut hasher = Keccak256::new();
    hasher.update(lot_id.to_be_bytes());
    hasher.update(bidder);
    hasher.update(amount_in.to_be_bytes());
    hasher.finalize().into()
}
