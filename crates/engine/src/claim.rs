//! Claim calculation.
//!
//! Pure function of the recorded settlement outcome; the external custody
//! layer moves the actual funds and must use the bid status to guarantee
//! at-most-once disbursement.

/// Payout and refund owed for one settled bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimAmounts {
    /// Base tokens won
    pub payout: u64,
    /// Quote tokens returned
    pub refund: u64,
}

/// Compute the payout/refund pair for a settled bid.
///
/// Every filled bid pays the uniform marginal price for what it received,
/// so the refund covers both any unfilled remainder and the spread between
/// the bid's own implied price and the clearing price. When settlement was
/// not met (`marginal_price` absent) or the bid went unfilled, the full
/// `amount_in` comes back.
pub fn compute_claim(
    amount_in: u64,
    filled: u64,
    marginal_price: Option<u128>,
    base_scale: u64,
) -> ClaimAmounts {
    let cost = match marginal_price {
        Some(price) if filled > 0 => (filled as u128) * price / (base_scale as u128),
        _ => 0,
    };

    // cost <= amount_in: the marginal price never exceeds the bid's own
    // floor-divided implied price, and filled <= amount_out.
    ClaimAmounts {
        payout: filled,
        refund: (amount_in as u128).saturating_sub(cost) as u64,
    }
}
