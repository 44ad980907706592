//! Auction engine error types.

use thiserror::Error;

use empa_crypto::CryptoError;
use empa_types::LotPhase;

/// Errors that can occur in the auction engine.
///
/// Three families: key validation failures (`InvalidKey`), operations
/// attempted in the wrong lot/bid state, and malformed parameters. A
/// malformed individual bid payload during decryption is deliberately not
/// represented here; it soft-fails to a zero amount instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Lot not found: {0}")]
    LotNotFound(u64),

    #[error("Bid not found: lot {lot_id}, bid {bid_id}")]
    BidNotFound { lot_id: u64, bid_id: u64 },

    #[error("Invalid key: {0}")]
    InvalidKey(#[from] CryptoError),

    #[error("Private key does not match the lot public key")]
    KeyMismatch,

    #[error("Invalid lot phase. Expected: {expected:?}, Got: {got:?}")]
    InvalidPhase { expected: LotPhase, got: LotPhase },

    #[error("Bidding period not started")]
    BiddingNotStarted,

    #[error("Bidding period ended")]
    BiddingEnded,

    #[error("Lot has not concluded yet")]
    LotNotConcluded,

    #[error("Private key already revealed")]
    KeyAlreadyRevealed,

    #[error("Private key not revealed")]
    KeyNotRevealed,

    #[error("Lot already settled")]
    AlreadySettled,

    #[error("Bid already claimed")]
    AlreadyClaimed,

    #[error("Bid was cancelled")]
    BidCancelled,

    #[error("Only the original bidder may cancel")]
    NotBidder,

    #[error("Bid below minimum size: need {required}, got {got}")]
    BidTooSmall { required: u64, got: u64 },

    #[error("Invalid timing configuration")]
    InvalidTiming,

    #[error("Invalid lot parameters: {0}")]
    InvalidParams(&'static str),
}
