//! In-memory state arenas for the auction engine.

use std::collections::HashMap;

use empa_types::{Bid, Lot};

use crate::genesis::EngineConfig;

/// Auction engine state.
///
/// Two arenas and a counter; there is no shared state beyond these. Calls
/// are serialized per lot by the host environment, so lot phase fields are
/// the only concurrency guard the engine needs.
#[derive(Debug, Default)]
pub struct AuctionState {
    /// Engine-wide configuration
    pub config: EngineConfig,

    /// Next lot ID to assign
    pub next_lot_id: u64,

    /// All lots by ID
    pub lots: HashMap<u64, Lot>,

    /// Bids keyed by (lot_id, bid_id)
    pub bids: HashMap<(u64, u64), Bid>,
}

impl AuctionState {
    /// Create a new auction state with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create a new auction state with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            next_lot_id: 1,
            lots: HashMap::new(),
            bids: HashMap::new(),
        }
    }

    /// Get the next lot ID and increment.
    pub fn allocate_lot_id(&mut self) -> u64 {
        let id = self.next_lot_id;
        self.next_lot_id += 1;
        id
    }

    /// Get lot by ID.
    pub fn get_lot(&self, lot_id: u64) -> Option<&Lot> {
        self.lots.get(&lot_id)
    }

    /// Get mutable lot by ID.
    pub fn get_lot_mut(&mut self, lot_id: u64) -> Option<&mut Lot> {
        self.lots.get_mut(&lot_id)
    }

    /// Get a bid by lot and bid ID.
    pub fn get_bid(&self, lot_id: u64, bid_id: u64) -> Option<&Bid> {
        self.bids.get(&(lot_id, bid_id))
    }

    /// Get a mutable bid by lot and bid ID.
    pub fn get_bid_mut(&mut self, lot_id: u64, bid_id: u64) -> Option<&mut Bid> {
        self.bids.get_mut(&(lot_id, bid_id))
    }

    /// All bids for a lot, in submission order.
    pub fn get_lot_bids(&self, lot_id: u64) -> Vec<&Bid> {
        self.lots
            .get(&lot_id)
            .map(|lot| {
                lot.bid_ids
                    .iter()
                    .filter_map(|bid_id| self.bids.get(&(lot_id, *bid_id)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
