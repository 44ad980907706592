//! Query handlers for the auction engine.
//!
//! These functions provide read-only access to lot and bid state for the
//! registry/custody layer.

use serde::{Deserialize, Serialize};

use crate::state::AuctionState;
use empa_types::{Bid, Lot, LotPhase};

/// Query request types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQuery {
    /// Get lot details by ID.
    GetLot { lot_id: u64 },

    /// Get all lots (paginated).
    ListLots { offset: u64, limit: u64 },

    /// Get all bids for a lot, in submission order.
    GetLotBids { lot_id: u64 },

    /// Get a specific bid.
    GetBid { lot_id: u64, bid_id: u64 },

    /// Get the recorded marginal price, if settled and met.
    GetMarginalPrice { lot_id: u64 },
}

/// Query response types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AuctionQueryResponse {
    /// Lot details.
    Lot(Option<Lot>),

    /// List of lots.
    LotList(Vec<Lot>),

    /// Bids for a lot.
    Bids(Vec<Bid>),

    /// Single bid.
    Bid(Option<Bid>),

    /// Marginal price.
    MarginalPrice(Option<u128>),
}

/// Handle a query.
pub fn handle_query(state: &AuctionState, query: AuctionQuery) -> AuctionQueryResponse {
    match query {
        AuctionQuery::GetLot { lot_id } => {
            AuctionQueryResponse::Lot(state.get_lot(lot_id).cloned())
        }

        AuctionQuery::ListLots { offset, limit } => {
            let mut lots: Vec<Lot> = state.lots.values().cloned().collect();
            lots.sort_by_key(|lot| lot.lot_id);
            AuctionQueryResponse::LotList(
                lots.into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect(),
            )
        }

        AuctionQuery::GetLotBids { lot_id } => {
            let bids = state.get_lot_bids(lot_id).into_iter().cloned().collect();
            AuctionQueryResponse::Bids(bids)
        }

        AuctionQuery::GetBid { lot_id, bid_id } => {
            AuctionQueryResponse::Bid(state.get_bid(lot_id, bid_id).cloned())
        }

        AuctionQuery::GetMarginalPrice { lot_id } => {
            let price = state.get_lot(lot_id).and_then(|lot| lot.marginal_price);
            AuctionQueryResponse::MarginalPrice(price)
        }
    }
}

/// Summary of a lot for listing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LotSummary {
    pub lot_id: u64,
    pub phase: LotPhase,
    pub start: u64,
    pub conclusion: u64,
    pub capacity: u64,
    pub num_bids: usize,
}

impl LotSummary {
    /// Create a summary from lot state.
    pub fn from_lot(lot: &Lot) -> Self {
        Self {
            lot_id: lot.lot_id,
            phase: lot.phase,
            start: lot.start,
            conclusion: lot.conclusion,
            capacity: lot.capacity,
            num_bids: lot.bid_ids.len(),
        }
    }
}

/// Lots currently accepting bids.
pub fn get_open_lots(state: &AuctionState, current_time: u64) -> Vec<LotSummary> {
    state
        .lots
        .values()
        .filter(|lot| {
            lot.phase == LotPhase::Created
                && current_time >= lot.start
                && current_time < lot.conclusion
        })
        .map(LotSummary::from_lot)
        .collect()
}

/// Lots fully decrypted and awaiting settlement.
pub fn get_pending_settlement(state: &AuctionState) -> Vec<u64> {
    state
        .lots
        .values()
        .filter(|lot| lot.phase == LotPhase::Decrypted)
        .map(|lot| lot.lot_id)
        .collect()
}

/// Concluded lots whose key has not been revealed yet.
pub fn get_pending_reveal(state: &AuctionState, current_time: u64) -> Vec<u64> {
    state
        .lots
        .values()
        .filter(|lot| {
            lot.phase == LotPhase::Created
                && current_time >= lot.conclusion
                && lot.private_key.is_none()
        })
        .map(|lot| lot.lot_id)
        .collect()
}
