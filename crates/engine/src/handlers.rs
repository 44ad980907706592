//! Call handlers for the auction engine.
//!
//! These functions implement the business logic for each call type. Every
//! handler validates completely before touching state, so a failed call
//! leaves the arenas untouched; the lot phase fields are the only
//! concurrency guard, since the host serializes calls per lot.

use tracing::{debug, info, warn};

use crate::claim::{compute_claim, ClaimAmounts};
use crate::error::AuctionError;
use crate::settle::{compute_settlement, BidEntry};
use crate::state::AuctionState;
use empa_types::{
    compute_bid_salt, Address, Bid, BidStatus, Ciphertext, CurvePoint, Lot, LotParams, LotPhase,
    Scalar, BPS_DENOMINATOR,
};

/// Context provided by the registry layer for each call.
pub struct CallContext {
    /// Sender of the call
    pub sender: Address,
    /// Current timestamp
    pub timestamp: u64,
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Recorded result of a settlement, echoed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementSummary {
    pub met: bool,
    pub marginal_bid_id: Option<u64>,
    pub marginal_price: Option<u128>,
    pub total_filled: u64,
}

/// Handle lot creation.
pub fn handle_create_lot(
    state: &mut AuctionState,
    _ctx: &CallContext,
    params: LotParams,
) -> HandlerResult<u64> {
    if params.conclusion <= params.start
        || params.conclusion - params.start < state.config.min_lot_duration
    {
        return Err(AuctionError::InvalidTiming);
    }
    if params.capacity == 0 {
        return Err(AuctionError::InvalidParams("capacity cannot be zero"));
    }
    if params.base_scale == 0 {
        return Err(AuctionError::InvalidParams("base scale cannot be zero"));
    }
    if params.min_fill_bps > BPS_DENOMINATOR {
        return Err(AuctionError::InvalidParams(
            "minimum fill fraction exceeds 100%",
        ));
    }

    // The lot key must be usable for encryption from the first bid on
    empa_crypto::validate_public_key(&params.public_key)?;

    let lot_id = state.allocate_lot_id();
    state.lots.insert(lot_id, Lot::new(lot_id, params));

    info!(lot_id, "Lot created");
    Ok(lot_id)
}

/// Handle sealed bid submission.
pub fn handle_submit_bid(
    state: &mut AuctionState,
    ctx: &CallContext,
    lot_id: u64,
    referrer: Address,
    amount_in: u64,
    ciphertext: Ciphertext,
    ephemeral_public_key: CurvePoint,
) -> HandlerResult<u64> {
    let lot = state
        .get_lot(lot_id)
        .ok_or(AuctionError::LotNotFound(lot_id))?;

    if ctx.timestamp < lot.start {
        return Err(AuctionError::BiddingNotStarted);
    }
    if ctx.timestamp >= lot.conclusion {
        return Err(AuctionError::BiddingEnded);
    }
    if amount_in < lot.min_bid_size {
        return Err(AuctionError::BidTooSmall {
            required: lot.min_bid_size,
            got: amount_in,
        });
    }

    // Format validation only; the ciphertext itself stays opaque until reveal
    empa_crypto::validate_public_key(&ephemeral_public_key)?;

    let lot = state.get_lot_mut(lot_id).ok_or(AuctionError::LotNotFound(lot_id))?;
    let bid_id = lot.next_bid_id;
    lot.next_bid_id += 1;
    lot.bid_ids.push(bid_id);

    state.bids.insert(
        (lot_id, bid_id),
        Bid {
            bid_id,
            bidder: ctx.sender,
            referrer,
            amount_in,
            ciphertext,
            ephemeral_public_key,
            amount_out: 0,
            filled: 0,
            status: BidStatus::Submitted,
        },
    );

    debug!(lot_id, bid_id, amount_in, "Bid submitted");
    Ok(bid_id)
}

/// Handle bid cancellation.
///
/// Returns the quote amount the custody layer must hand back to the bidder.
pub fn handle_cancel_bid(
    state: &mut AuctionState,
    ctx: &CallContext,
    lot_id: u64,
    bid_id: u64,
) -> HandlerResult<u64> {
    let lot = state
        .get_lot(lot_id)
        .ok_or(AuctionError::LotNotFound(lot_id))?;

    if ctx.timestamp >= lot.conclusion {
        return Err(AuctionError::BiddingEnded);
    }

    let bid = state
        .get_bid(lot_id, bid_id)
        .ok_or(AuctionError::BidNotFound { lot_id, bid_id })?;

    if bid.bidder != ctx.sender {
        return Err(AuctionError::NotBidder);
    }
    if bid.status == BidStatus::Cancelled {
        return Err(AuctionError::BidCancelled);
    }

    let bid = state
        .get_bid_mut(lot_id, bid_id)
        .ok_or(AuctionError::BidNotFound { lot_id, bid_id })?;
    bid.status = BidStatus::Cancelled;
    let refund = bid.amount_in;

    debug!(lot_id, bid_id, refund, "Bid cancelled");
    Ok(refund)
}

/// Handle the one-time private key reveal after conclusion.
pub fn handle_reveal_private_key(
    state: &mut AuctionState,
    ctx: &CallContext,
    lot_id: u64,
    private_key: Scalar,
) -> HandlerResult<()> {
    let lot = state
        .get_lot(lot_id)
        .ok_or(AuctionError::LotNotFound(lot_id))?;

    if ctx.timestamp < lot.conclusion {
        return Err(AuctionError::LotNotConcluded);
    }
    if lot.private_key.is_some() {
        return Err(AuctionError::KeyAlreadyRevealed);
    }

    // Range-checks the scalar and rederives the public key in one step
    let derived = empa_crypto::derive_public_key(&private_key)?;
    if derived != lot.public_key {
        return Err(AuctionError::KeyMismatch);
    }

    let lot = state.get_lot_mut(lot_id).ok_or(AuctionError::LotNotFound(lot_id))?;
    lot.private_key = Some(private_key);

    info!(lot_id, "Private key revealed");
    Ok(())
}

/// Handle one decryption batch.
///
/// Processes up to `count` sealed bids from the stored cursor, in
/// submission order. Cancelled bids are passed over without consuming the
/// budget. A malformed payload is recorded as a zero amount rather than an
/// error: one corrupt bid must never block the rest of the lot. Returns the
/// number of bids decrypted.
pub fn handle_decrypt_batch(
    state: &mut AuctionState,
    _ctx: &CallContext,
    lot_id: u64,
    count: u64,
) -> HandlerResult<u64> {
    let lot = state
        .get_lot(lot_id)
        .ok_or(AuctionError::LotNotFound(lot_id))?;

    if lot.phase != LotPhase::Created {
        return Err(AuctionError::InvalidPhase {
            expected: LotPhase::Created,
            got: lot.phase,
        });
    }
    let private_key = lot.private_key.ok_or(AuctionError::KeyNotRevealed)?;

    let bid_ids = lot.bid_ids.clone();
    let mut cursor = lot.next_decrypt_index as usize;
    let mut decrypted = 0u64;

    while cursor < bid_ids.len() {
        let bid_id = bid_ids[cursor];
        let Some(bid) = state.get_bid_mut(lot_id, bid_id) else {
            warn!(lot_id, bid_id, "Bid listed but missing from the arena");
            cursor += 1;
            continue;
        };

        if bid.status == BidStatus::Cancelled {
            cursor += 1;
            continue;
        }
        if decrypted >= count {
            break;
        }

        let salt = compute_bid_salt(lot_id, &bid.bidder, bid.amount_in);
        let amount_out = match empa_crypto::decrypt(
            &bid.ciphertext,
            &bid.ephemeral_public_key,
            &private_key,
            &salt,
        ) {
            Ok(message) => empa_crypto::open_amount(&message).unwrap_or(0),
            // Soft failure: recorded as zero, settlement proceeds
            Err(_) => 0,
        };

        bid.amount_out = amount_out;
        bid.status = BidStatus::Decrypted;
        cursor += 1;
        decrypted += 1;
    }

    let lot = state.get_lot_mut(lot_id).ok_or(AuctionError::LotNotFound(lot_id))?;
    lot.next_decrypt_index = cursor as u64;
    if lot.fully_decrypted() {
        lot.phase = LotPhase::Decrypted;
        info!(lot_id, "All bids decrypted");
    }

    debug!(lot_id, decrypted, cursor, "Decrypt batch processed");
    Ok(decrypted)
}

/// Handle settlement. Runs exactly once per lot.
pub fn handle_settle(
    state: &mut AuctionState,
    _ctx: &CallContext,
    lot_id: u64,
) -> HandlerResult<SettlementSummary> {
    let lot = state
        .get_lot(lot_id)
        .ok_or(AuctionError::LotNotFound(lot_id))?;

    match lot.phase {
        LotPhase::Decrypted => {}
        LotPhase::Settled => return Err(AuctionError::AlreadySettled),
        got => {
            return Err(AuctionError::InvalidPhase {
                expected: LotPhase::Decrypted,
                got,
            })
        }
    }

    let entries: Vec<BidEntry> = lot
        .bid_ids
        .iter()
        .filter_map(|bid_id| state.get_bid(lot_id, *bid_id))
        .filter(|bid| bid.status != BidStatus::Cancelled)
        .map(|bid| BidEntry {
            bid_id: bid.bid_id,
            amount_in: bid.amount_in,
            amount_out: bid.amount_out,
        })
        .collect();

    let outcome = compute_settlement(
        &entries,
        lot.capacity,
        lot.min_price,
        lot.min_fill_bps,
        lot.base_scale,
    );

    // Everything computed; commit in one pass
    for fill in &outcome.fills {
        if let Some(bid) = state.get_bid_mut(lot_id, fill.bid_id) {
            bid.filled = fill.filled;
        }
    }

    let lot = state.get_lot_mut(lot_id).ok_or(AuctionError::LotNotFound(lot_id))?;
    lot.marginal_bid_id = outcome.marginal_bid_id;
    lot.marginal_price = outcome.marginal_price;
    lot.total_filled = outcome.total_filled;
    lot.phase = LotPhase::Settled;

    info!(
        lot_id,
        met = outcome.met,
        total_filled = outcome.total_filled,
        "Lot settled"
    );

    Ok(SettlementSummary {
        met: outcome.met,
        marginal_bid_id: outcome.marginal_bid_id,
        marginal_price: outcome.marginal_price,
        total_filled: outcome.total_filled,
    })
}

/// Handle a claim against a settled lot.
///
/// Marks the bid claimed so the custody layer can enforce at-most-once
/// disbursement; the amounts themselves come from the pure calculator and
/// recomputing them for the same bid always yields the same pair.
pub fn handle_claim(
    state: &mut AuctionState,
    _ctx: &CallContext,
    lot_id: u64,
    bid_id: u64,
) -> HandlerResult<ClaimAmounts> {
    let lot = state
        .get_lot(lot_id)
        .ok_or(AuctionError::LotNotFound(lot_id))?;

    if lot.phase != LotPhase::Settled {
        return Err(AuctionError::InvalidPhase {
            expected: LotPhase::Settled,
            got: lot.phase,
        });
    }
    let marginal_price = lot.marginal_price;
    let base_scale = lot.base_scale;

    let bid = state
        .get_bid(lot_id, bid_id)
        .ok_or(AuctionError::BidNotFound { lot_id, bid_id })?;

    match bid.status {
        BidStatus::Cancelled => return Err(AuctionError::BidCancelled),
        BidStatus::Claimed => return Err(AuctionError::AlreadyClaimed),
        _ => {}
    }

    let amounts = compute_claim(bid.amount_in, bid.filled, marginal_price, base_scale);

    let bid = state
        .get_bid_mut(lot_id, bid_id)
        .ok_or(AuctionError::BidNotFound { lot_id, bid_id })?;
    bid.status = BidStatus::Claimed;

    debug!(
        lot_id,
        bid_id,
        payout = amounts.payout,
        refund = amounts.refund,
        "Claim computed"
    );
    Ok(amounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesis::EngineConfig;
    use empa_crypto::{derive_public_key, encrypt, random_scalar, seal_amount};
    use rand::rngs::OsRng;

    const SCALE: u64 = 100;

    fn test_state() -> AuctionState {
        AuctionState::with_config(EngineConfig {
            min_lot_duration: 100,
        })
    }

    fn ctx(sender: Address, timestamp: u64) -> CallContext {
        CallContext { sender, timestamp }
    }

    fn lot_keypair() -> (Scalar, CurvePoint) {
        let sk = random_scalar(&mut OsRng);
        let pk = derive_public_key(&sk).unwrap();
        (sk, pk)
    }

    fn test_params(public_key: CurvePoint) -> LotParams {
        LotParams {
            capacity: 100,
            start: 1_000,
            conclusion: 2_000,
            min_price: 100, // 1.00 at SCALE
            min_fill_bps: 5_000,
            min_bid_size: 10,
            base_scale: SCALE,
            public_key,
        }
    }

    fn seal_bid(
        lot_pk: &CurvePoint,
        lot_id: u64,
        bidder: &Address,
        amount_in: u64,
        amount_out: u64,
    ) -> (Ciphertext, CurvePoint) {
        let salt = compute_bid_salt(lot_id, bidder, amount_in);
        let message = seal_amount(amount_out, 0x1234_5678_9abc_def0);
        let ephemeral_sk = random_scalar(&mut OsRng);
        encrypt(&message, lot_pk, &ephemeral_sk, &salt).unwrap()
    }

    fn submit(
        state: &mut AuctionState,
        lot_pk: &CurvePoint,
        lot_id: u64,
        bidder: Address,
        amount_in: u64,
        amount_out: u64,
    ) -> u64 {
        let (ciphertext, ephemeral_pk) = seal_bid(lot_pk, lot_id, &bidder, amount_in, amount_out);
        handle_submit_bid(
            state,
            &ctx(bidder, 1_500),
            lot_id,
            [0u8; 32],
            amount_in,
            ciphertext,
            ephemeral_pk,
        )
        .unwrap()
    }

    #[test]
    fn test_create_lot() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();

        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();
        assert_eq!(lot_id, 1);
        assert_eq!(state.get_lot(1).unwrap().phase, LotPhase::Created);
    }

    #[test]
    fn test_create_lot_invalid_timing() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();

        let mut params = test_params(pk);
        params.conclusion = params.start; // zero duration
        let result = handle_create_lot(&mut state, &ctx([1u8; 32], 0), params);
        assert_eq!(result, Err(AuctionError::InvalidTiming));
    }

    #[test]
    fn test_create_lot_rejects_bad_key() {
        let mut state = test_state();
        let result =
            handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(CurvePoint::default()));
        assert!(matches!(result, Err(AuctionError::InvalidKey(_))));
    }

    #[test]
    fn test_create_lot_rejects_overflowing_fill_fraction() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();
        let mut params = test_params(pk);
        params.min_fill_bps = BPS_DENOMINATOR + 1;
        assert!(matches!(
            handle_create_lot(&mut state, &ctx([1u8; 32], 0), params),
            Err(AuctionError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_submit_bid_window() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();
        let (ciphertext, ephemeral_pk) = seal_bid(&pk, lot_id, &[2u8; 32], 100, 50);

        let before = handle_submit_bid(
            &mut state,
            &ctx([2u8; 32], 500),
            lot_id,
            [0u8; 32],
            100,
            ciphertext,
            ephemeral_pk,
        );
        assert_eq!(before, Err(AuctionError::BiddingNotStarted));

        let after = handle_submit_bid(
            &mut state,
            &ctx([2u8; 32], 2_000),
            lot_id,
            [0u8; 32],
            100,
            ciphertext,
            ephemeral_pk,
        );
        assert_eq!(after, Err(AuctionError::BiddingEnded));
    }

    #[test]
    fn test_submit_bid_below_minimum() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();
        let (ciphertext, ephemeral_pk) = seal_bid(&pk, lot_id, &[2u8; 32], 5, 50);

        let result = handle_submit_bid(
            &mut state,
            &ctx([2u8; 32], 1_500),
            lot_id,
            [0u8; 32],
            5,
            ciphertext,
            ephemeral_pk,
        );
        assert_eq!(
            result,
            Err(AuctionError::BidTooSmall {
                required: 10,
                got: 5
            })
        );
    }

    #[test]
    fn test_bid_ids_are_sequential() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        assert_eq!(submit(&mut state, &pk, lot_id, [2u8; 32], 100, 50), 1);
        assert_eq!(submit(&mut state, &pk, lot_id, [3u8; 32], 100, 40), 2);
        assert_eq!(state.get_lot(lot_id).unwrap().bid_ids, vec![1, 2]);
    }

    #[test]
    fn test_cancel_only_by_bidder_and_before_conclusion() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();
        let bid_id = submit(&mut state, &pk, lot_id, [2u8; 32], 100, 50);

        assert_eq!(
            handle_cancel_bid(&mut state, &ctx([3u8; 32], 1_600), lot_id, bid_id),
            Err(AuctionError::NotBidder)
        );
        assert_eq!(
            handle_cancel_bid(&mut state, &ctx([2u8; 32], 2_000), lot_id, bid_id),
            Err(AuctionError::BiddingEnded)
        );

        let refund =
            handle_cancel_bid(&mut state, &ctx([2u8; 32], 1_600), lot_id, bid_id).unwrap();
        assert_eq!(refund, 100);
        assert_eq!(
            handle_cancel_bid(&mut state, &ctx([2u8; 32], 1_700), lot_id, bid_id),
            Err(AuctionError::BidCancelled)
        );
    }

    #[test]
    fn test_reveal_validates_key_and_timing() {
        let mut state = test_state();
        let (sk, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        assert_eq!(
            handle_reveal_private_key(&mut state, &ctx([1u8; 32], 1_500), lot_id, sk),
            Err(AuctionError::LotNotConcluded)
        );

        let (wrong_sk, _) = lot_keypair();
        assert_eq!(
            handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, wrong_sk),
            Err(AuctionError::KeyMismatch)
        );
        assert!(matches!(
            handle_reveal_private_key(
                &mut state,
                &ctx([1u8; 32], 2_000),
                lot_id,
                Scalar::default()
            ),
            Err(AuctionError::InvalidKey(_))
        ));

        handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, sk).unwrap();
        assert_eq!(
            handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_100), lot_id, sk),
            Err(AuctionError::KeyAlreadyRevealed)
        );
    }

    #[test]
    fn test_decrypt_requires_key() {
        let mut state = test_state();
        let (_, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        assert_eq!(
            handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 10),
            Err(AuctionError::KeyNotRevealed)
        );
    }

    #[test]
    fn test_decrypt_batches_advance_cursor() {
        let mut state = test_state();
        let (sk, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        submit(&mut state, &pk, lot_id, [2u8; 32], 160, 80);
        submit(&mut state, &pk, lot_id, [3u8; 32], 54, 30);
        submit(&mut state, &pk, lot_id, [4u8; 32], 15, 10);

        handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, sk).unwrap();

        assert_eq!(
            handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 2).unwrap(),
            2
        );
        assert_eq!(state.get_lot(lot_id).unwrap().phase, LotPhase::Created);

        assert_eq!(
            handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 2).unwrap(),
            1
        );
        let lot = state.get_lot(lot_id).unwrap();
        assert_eq!(lot.phase, LotPhase::Decrypted);

        assert_eq!(state.get_bid(lot_id, 1).unwrap().amount_out, 80);
        assert_eq!(state.get_bid(lot_id, 2).unwrap().amount_out, 30);
        assert_eq!(state.get_bid(lot_id, 3).unwrap().amount_out, 10);

        // Further batches are a phase error
        assert!(matches!(
            handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_200), lot_id, 1),
            Err(AuctionError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_cancelled_bid_skipped_and_foreign_ciphertext_garbles() {
        let mut state = test_state();
        let (sk, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        let cancelled = submit(&mut state, &pk, lot_id, [2u8; 32], 160, 80);

        // Bidder 3 copies bidder 2's ciphertext verbatim; the salt binds it
        // to bidder 2's context, so it opens to garbage here.
        let stolen = state.get_bid(lot_id, cancelled).unwrap();
        let (ciphertext, ephemeral_pk) = (stolen.ciphertext, stolen.ephemeral_public_key);
        let copied = handle_submit_bid(
            &mut state,
            &ctx([3u8; 32], 1_500),
            lot_id,
            [0u8; 32],
            160,
            ciphertext,
            ephemeral_pk,
        )
        .unwrap();

        let honest = submit(&mut state, &pk, lot_id, [4u8; 32], 54, 30);

        handle_cancel_bid(&mut state, &ctx([2u8; 32], 1_600), lot_id, cancelled).unwrap();
        handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, sk).unwrap();
        handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 10).unwrap();

        let lot = state.get_lot(lot_id).unwrap();
        assert_eq!(lot.phase, LotPhase::Decrypted);

        assert_eq!(
            state.get_bid(lot_id, cancelled).unwrap().status,
            BidStatus::Cancelled
        );
        // Overwhelmingly likely zero; a garbled open is recorded, not rejected
        assert_eq!(state.get_bid(lot_id, copied).unwrap().amount_out, 0);
        assert_eq!(state.get_bid(lot_id, honest).unwrap().amount_out, 30);
    }

    #[test]
    fn test_settle_lifecycle_and_claims() {
        let mut state = test_state();
        let (sk, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        // The worked example: A=80 @ 2.00, B=30 @ 1.80, C=10 @ 1.50
        let a = submit(&mut state, &pk, lot_id, [2u8; 32], 160, 80);
        let b = submit(&mut state, &pk, lot_id, [3u8; 32], 54, 30);
        let c = submit(&mut state, &pk, lot_id, [4u8; 32], 15, 10);

        assert!(matches!(
            handle_settle(&mut state, &ctx([1u8; 32], 2_000), lot_id),
            Err(AuctionError::InvalidPhase { .. })
        ));

        handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, sk).unwrap();
        handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 10).unwrap();

        let summary = handle_settle(&mut state, &ctx([1u8; 32], 2_200), lot_id).unwrap();
        assert!(summary.met);
        assert_eq!(summary.marginal_bid_id, Some(b));
        assert_eq!(summary.marginal_price, Some(180));
        assert_eq!(summary.total_filled, 100);

        // Second settle fails and mutates nothing
        assert_eq!(
            handle_settle(&mut state, &ctx([1u8; 32], 2_300), lot_id),
            Err(AuctionError::AlreadySettled)
        );
        assert_eq!(state.get_lot(lot_id).unwrap().marginal_price, Some(180));

        let claim_a = handle_claim(&mut state, &ctx([2u8; 32], 2_400), lot_id, a).unwrap();
        assert_eq!(claim_a.payout, 80);
        assert_eq!(claim_a.refund, 160 - 144); // pays 80 x 1.80, not 2.00

        let claim_b = handle_claim(&mut state, &ctx([3u8; 32], 2_400), lot_id, b).unwrap();
        assert_eq!(claim_b.payout, 20);
        assert_eq!(claim_b.refund, 54 - 36);

        let claim_c = handle_claim(&mut state, &ctx([4u8; 32], 2_400), lot_id, c).unwrap();
        assert_eq!(claim_c.payout, 0);
        assert_eq!(claim_c.refund, 15);

        assert_eq!(
            handle_claim(&mut state, &ctx([2u8; 32], 2_500), lot_id, a),
            Err(AuctionError::AlreadyClaimed)
        );
    }

    #[test]
    fn test_min_fill_gate_end_to_end() {
        let mut state = test_state();
        let (sk, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        // Demand 40 of capacity 100, gate at 50%
        let a = submit(&mut state, &pk, lot_id, [2u8; 32], 80, 40);

        handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, sk).unwrap();
        handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 10).unwrap();

        let summary = handle_settle(&mut state, &ctx([1u8; 32], 2_200), lot_id).unwrap();
        assert!(!summary.met);
        assert!(summary.marginal_price.is_none());

        let claim = handle_claim(&mut state, &ctx([2u8; 32], 2_300), lot_id, a).unwrap();
        assert_eq!(claim.payout, 0);
        assert_eq!(claim.refund, 80);
    }

    #[test]
    fn test_empty_lot_settles_not_met() {
        let mut state = test_state();
        let (sk, pk) = lot_keypair();
        let lot_id = handle_create_lot(&mut state, &ctx([1u8; 32], 0), test_params(pk)).unwrap();

        handle_reveal_private_key(&mut state, &ctx([1u8; 32], 2_000), lot_id, sk).unwrap();
        handle_decrypt_batch(&mut state, &ctx([1u8; 32], 2_100), lot_id, 0).unwrap();
        assert_eq!(state.get_lot(lot_id).unwrap().phase, LotPhase::Decrypted);

        let summary = handle_settle(&mut state, &ctx([1u8; 32], 2_200), lot_id).unwrap();
        assert!(!summary.met);
        assert_eq!(summary.total_filled, 0);
    }
}
