//! Marginal-price settlement.
//!
//! Pure computation: the handler collects decrypted bids, runs
//! [`compute_settlement`], and commits the outcome atomically. Keeping the
//! walk free of state access is what makes the result reproducible from the
//! committed bid ids alone, regardless of how decryption was batched.

use empa_types::BPS_DENOMINATOR;

/// One decrypted, non-cancelled bid as input to settlement.
#[derive(Debug, Clone, Copy)]
pub struct BidEntry {
    pub bid_id: u64,
    /// Quote tokens offered
    pub amount_in: u64,
    /// Base tokens requested (zero when the payload was malformed)
    pub amount_out: u64,
}

/// Base tokens allocated to one bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidFill {
    pub bid_id: u64,
    pub filled: u64,
}

/// Result of the settlement walk.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    /// False when the minimum-fill gate failed; every bid is then refunded
    /// in full and no marginal price is published.
    pub met: bool,
    pub marginal_bid_id: Option<u64>,
    pub marginal_price: Option<u128>,
    /// Total base tokens allocated; never exceeds capacity
    pub total_filled: u64,
    /// One entry per input bid, zero for excluded or unfilled bids
    pub fills: Vec<BidFill>,
}

/// Implied unit price in quote tokens per base token, floor division at
/// `base_scale` fixed point. Wide arithmetic: u64 inputs cannot overflow
/// the u128 product.
pub fn unit_price(amount_in: u64, amount_out: u64, base_scale: u64) -> u128 {
    debug_assert!(amount_out > 0);
    (amount_in as u128) * (base_scale as u128) / (amount_out as u128)
}

/// Compute the uniform marginal clearing price and per-bid fills.
///
/// Bids with a zero decrypted amount or an implied price below `min_price`
/// are excluded up front (full refund, zero payout). The rest are ordered
/// by price descending with earlier bid ids winning ties, then walked
/// against capacity: the first bid that would push the running total over
/// capacity is marginal, takes the residual, and sets the clearing price.
/// If demand never reaches capacity the lowest surviving bid clears the lot
/// instead.
pub fn compute_settlement(
    entries: &[BidEntry],
    capacity: u64,
    min_price: u128,
    min_fill_bps: u16,
    base_scale: u64,
) -> SettlementOutcome {
    let mut surviving: Vec<(BidEntry, u128)> = entries
        .iter()
        .filter(|e| e.amount_out > 0)
        .map(|e| (*e, unit_price(e.amount_in, e.amount_out, base_scale)))
        .filter(|(_, price)| *price >= min_price)
        .collect();

    // Total order: price descending, earliest bid id wins ties. Bid ids are
    // unique per lot, so the ordering has no equal elements.
    surviving.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.bid_id.cmp(&b.0.bid_id)));

    let mut fills: Vec<BidFill> = Vec::with_capacity(surviving.len());
    let mut running: u128 = 0;
    let mut marginal: Option<(u64, u128)> = None;

    for (entry, price) in &surviving {
        if marginal.is_some() {
            fills.push(BidFill {
                bid_id: entry.bid_id,
                filled: 0,
            });
            continue;
        }

        if running + entry.amount_out as u128 > capacity as u128 {
            // Marginal bid: the residual capacity, possibly zero
            let residual = (capacity as u128 - running) as u64;
            fills.push(BidFill {
                bid_id: entry.bid_id,
                filled: residual,
            });
            running += residual as u128;
            marginal = Some((entry.bid_id, *price));
        } else {
            fills.push(BidFill {
                bid_id: entry.bid_id,
                filled: entry.amount_out,
            });
            running += entry.amount_out as u128;
        }
    }

    // Undersold: demand never reached capacity, so the lowest surviving bid
    // clears the lot at its own price.
    if marginal.is_none() {
        if let Some((entry, price)) = surviving.last() {
            marginal = Some((entry.bid_id, *price));
        }
    }

    let total_filled = running as u64;
    let min_filled = (capacity as u128) * (min_fill_bps as u128) / (BPS_DENOMINATOR as u128);

    let (marginal_bid_id, marginal_price) = match marginal {
        Some((id, price)) if (total_filled as u128) >= min_filled => (id, price),
        // Gate failed, or nothing survived the price filter
        _ => {
            return SettlementOutcome {
                met: false,
                marginal_bid_id: None,
                marginal_price: None,
                total_filled: 0,
                fills: entries
                    .iter()
                    .map(|e| BidFill {
                        bid_id: e.bid_id,
                        filled: 0,
                    })
                    .collect(),
            };
        }
    };

    // Re-attach excluded bids with zero fills so the caller records an
    // outcome for every bid it passed in.
    for entry in entries {
        if !fills.iter().any(|f| f.bid_id == entry.bid_id) {
            fills.push(BidFill {
                bid_id: entry.bid_id,
                filled: 0,
            });
        }
    }

    SettlementOutcome {
        met: true,
        marginal_bid_id: Some(marginal_bid_id),
        marginal_price: Some(marginal_price),
        total_filled,
        fills,
    }
}
