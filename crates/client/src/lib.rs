//! Client-side helpers for sealing bids against an encrypted lot.

pub mod bid;

pub use bid::{create_bid, BidBuilder, BidError, PreparedBid};
