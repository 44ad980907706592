//! End-to-end integration tests for the sealed-bid batch auction.
//!
//! These tests exercise the full lot lifecycle:
//! 1. Lot creation with a fresh encryption key pair
//! 2. Client-side bid sealing and submission
//! 3. Private key reveal after conclusion
//! 4. Chunked decryption
//! 5. Marginal-price settlement and per-bid claims

use empa_client::create_bid;
use empa_crypto::{derive_public_key, random_scalar};
use empa_engine::{
    apply_call, handlers, AuctionCall, AuctionError, AuctionState, CallContext, CallOutcome,
    EngineConfig,
};
use empa_types::{Address, CurvePoint, LotParams, LotPhase, Scalar};

use rand::rngs::OsRng;

const SCALE: u64 = 100; // two-decimal prices

const START: u64 = 1_000;
const CONCLUSION: u64 = 2_000;

fn ctx(sender: Address, timestamp: u64) -> CallContext {
    CallContext { sender, timestamp }
}

fn new_state() -> AuctionState {
    AuctionState::with_config(EngineConfig {
        min_lot_duration: 100,
    })
}

fn new_lot(
    state: &mut AuctionState,
    capacity: u64,
    min_price: u128,
    min_fill_bps: u16,
) -> (u64, Scalar, CurvePoint) {
    let lot_sk = random_scalar(&mut OsRng);
    let lot_pk = derive_public_key(&lot_sk).unwrap();

    let lot_id = handlers::handle_create_lot(
        state,
        &ctx([0u8; 32], 0),
        LotParams {
            capacity,
            start: START,
            conclusion: CONCLUSION,
            min_price,
            min_fill_bps,
            min_bid_size: 1,
            base_scale: SCALE,
            public_key: lot_pk,
        },
    )
    .unwrap();

    (lot_id, lot_sk, lot_pk)
}

fn submit_sealed(
    state: &mut AuctionState,
    lot_pk: &CurvePoint,
    lot_id: u64,
    bidder: Address,
    amount_in: u64,
    amount_out: u64,
) -> u64 {
    let prepared = create_bid(lot_pk, lot_id, &bidder, amount_in, amount_out, &mut OsRng).unwrap();
    handlers::handle_submit_bid(
        state,
        &ctx(bidder, START + 1),
        lot_id,
        [0u8; 32],
        amount_in,
        prepared.ciphertext,
        prepared.ephemeral_public_key,
    )
    .unwrap()
}

fn reveal_and_decrypt(state: &mut AuctionState, lot_id: u64, lot_sk: Scalar, batch: u64) {
    handlers::handle_reveal_private_key(state, &ctx([0u8; 32], CONCLUSION), lot_id, lot_sk)
        .unwrap();
    loop {
        handlers::handle_decrypt_batch(state, &ctx([0u8; 32], CONCLUSION), lot_id, batch).unwrap();
        if state.get_lot(lot_id).unwrap().phase != LotPhase::Created {
            break;
        }
    }
}

/// The worked settlement scenario, end to end through the call surface.
#[test]
fn test_full_auction_flow() {
    let mut state = new_state();
    let (lot_id, lot_sk, lot_pk) = new_lot(&mut state, 100, 100, 5_000);

    let bidder_a = [1u8; 32];
    let bidder_b = [2u8; 32];
    let bidder_c = [3u8; 32];

    // A: 80 base @ 2.00, B: 30 @ 1.80, C: 10 @ 1.50
    let bid_a = submit_sealed(&mut state, &lot_pk, lot_id, bidder_a, 160, 80);
    let bid_b = submit_sealed(&mut state, &lot_pk, lot_id, bidder_b, 54, 30);
    let bid_c = submit_sealed(&mut state, &lot_pk, lot_id, bidder_c, 15, 10);

    reveal_and_decrypt(&mut state, lot_id, lot_sk, 2);

    let outcome = apply_call(
        &mut state,
        &ctx([0u8; 32], CONCLUSION + 10),
        AuctionCall::SettleLot { lot_id },
    )
    .unwrap();

    let summary = match outcome {
        CallOutcome::LotSettled(summary) => summary,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert!(summary.met);
    assert_eq!(summary.marginal_bid_id, Some(bid_b));
    assert_eq!(summary.marginal_price, Some(180));
    assert_eq!(summary.total_filled, 100);

    // Uniform price: A pays 80 x 1.80 = 144 despite bidding 2.00
    let claim_a = handlers::handle_claim(&mut state, &ctx(bidder_a, CONCLUSION + 20), lot_id, bid_a)
        .unwrap();
    assert_eq!((claim_a.payout, claim_a.refund), (80, 16));

    // B is marginal: partial fill for the residual 20
    let claim_b = handlers::handle_claim(&mut state, &ctx(bidder_b, CONCLUSION + 20), lot_id, bid_b)
        .unwrap();
    assert_eq!((claim_b.payout, claim_b.refund), (20, 18));

    // C missed the clearing price: full refund
    let claim_c = handlers::handle_claim(&mut state, &ctx(bidder_c, CONCLUSION + 20), lot_id, bid_c)
        .unwrap();
    assert_eq!((claim_c.payout, claim_c.refund), (0, 15));

    // Capacity bound across all claims
    assert_eq!(claim_a.payout + claim_b.payout + claim_c.payout, 100);
}

/// The settlement result must not depend on how decryption was batched.
#[test]
fn test_settlement_invariant_under_batching() {
    let mut summaries = Vec::new();

    for batch in [1u64, 2, 10] {
        let mut state = new_state();
        let (lot_id, lot_sk, lot_pk) = new_lot(&mut state, 120, 0, 0);

        for (i, (amount_in, amount_out)) in
            [(500u64, 70u64), (300, 60), (200, 50), (100, 40)].iter().enumerate()
        {
            submit_sealed(
                &mut state,
                &lot_pk,
                lot_id,
                [i as u8 + 1; 32],
                *amount_in,
                *amount_out,
            );
        }

        reveal_and_decrypt(&mut state, lot_id, lot_sk, batch);
        let summary =
            handlers::handle_settle(&mut state, &ctx([0u8; 32], CONCLUSION + 1), lot_id).unwrap();
        summaries.push((
            summary.marginal_bid_id,
            summary.marginal_price,
            summary.total_filled,
        ));
    }

    assert_eq!(summaries[0], summaries[1]);
    assert_eq!(summaries[1], summaries[2]);
}

/// A cancelled bid is refunded up front and never decrypted or settled.
#[test]
fn test_cancelled_bid_excluded() {
    let mut state = new_state();
    let (lot_id, lot_sk, lot_pk) = new_lot(&mut state, 100, 0, 0);

    let bidder_a = [1u8; 32];
    let bidder_b = [2u8; 32];

    let bid_a = submit_sealed(&mut state, &lot_pk, lot_id, bidder_a, 160, 80);
    let bid_b = submit_sealed(&mut state, &lot_pk, lot_id, bidder_b, 100, 50);

    let refund =
        handlers::handle_cancel_bid(&mut state, &ctx(bidder_a, START + 10), lot_id, bid_a).unwrap();
    assert_eq!(refund, 160);

    reveal_and_decrypt(&mut state, lot_id, lot_sk, 10);

    // The cancelled bid stays sealed
    assert_eq!(state.get_bid(lot_id, bid_a).unwrap().amount_out, 0);
    assert_eq!(
        state.get_bid(lot_id, bid_a).unwrap().status,
        empa_types::BidStatus::Cancelled
    );

    let summary =
        handlers::handle_settle(&mut state, &ctx([0u8; 32], CONCLUSION + 1), lot_id).unwrap();
    assert_eq!(summary.marginal_bid_id, Some(bid_b));
    assert_eq!(summary.total_filled, 50);

    // And cannot be claimed
    assert_eq!(
        handlers::handle_claim(&mut state, &ctx(bidder_a, CONCLUSION + 2), lot_id, bid_a),
        Err(AuctionError::BidCancelled)
    );
}

/// Below the minimum fill fraction every bid is refunded in full.
#[test]
fn test_minimum_fill_gate() {
    let mut state = new_state();
    let (lot_id, lot_sk, lot_pk) = new_lot(&mut state, 1_000, 0, 5_000);

    let bidder = [1u8; 32];
    let bid_id = submit_sealed(&mut state, &lot_pk, lot_id, bidder, 300, 200);

    reveal_and_decrypt(&mut state, lot_id, lot_sk, 10);
    let summary =
        handlers::handle_settle(&mut state, &ctx([0u8; 32], CONCLUSION + 1), lot_id).unwrap();

    assert!(!summary.met);
    assert!(summary.marginal_price.is_none());
    assert_eq!(summary.total_filled, 0);

    let claim =
        handlers::handle_claim(&mut state, &ctx(bidder, CONCLUSION + 2), lot_id, bid_id).unwrap();
    assert_eq!((claim.payout, claim.refund), (0, 300));
}

/// Settling twice fails with a state error and leaves the record intact.
#[test]
fn test_double_settle_rejected() {
    let mut state = new_state();
    let (lot_id, lot_sk, lot_pk) = new_lot(&mut state, 100, 0, 0);

    submit_sealed(&mut state, &lot_pk, lot_id, [1u8; 32], 160, 80);
    reveal_and_decrypt(&mut state, lot_id, lot_sk, 10);

    let first = handlers::handle_settle(&mut state, &ctx([0u8; 32], CONCLUSION + 1), lot_id)
        .unwrap();
    let second = handlers::handle_settle(&mut state, &ctx([0u8; 32], CONCLUSION + 2), lot_id);

    assert_eq!(second, Err(AuctionError::AlreadySettled));
    let lot = state.get_lot(lot_id).unwrap();
    assert_eq!(lot.marginal_price, first.marginal_price);
    assert_eq!(lot.total_filled, first.total_filled);
}

/// An undersold lot clears at the price of the lowest surviving bid.
#[test]
fn test_undersold_lot() {
    let mut state = new_state();
    let (lot_id, lot_sk, lot_pk) = new_lot(&mut state, 1_000, 0, 0);

    submit_sealed(&mut state, &lot_pk, lot_id, [1u8; 32], 160, 80); // 2.00
    let low = submit_sealed(&mut state, &lot_pk, lot_id, [2u8; 32], 15, 10); // 1.50

    reveal_and_decrypt(&mut state, lot_id, lot_sk, 10);
    let summary =
        handlers::handle_settle(&mut state, &ctx([0u8; 32], CONCLUSION + 1), lot_id).unwrap();

    assert!(summary.met);
    assert_eq!(summary.marginal_bid_id, Some(low));
    assert_eq!(summary.marginal_price, Some(150));
    assert_eq!(summary.total_filled, 90);
}

/// Revealing a key that does not match the lot public key is rejected.
#[test]
fn test_reveal_rejects_foreign_key() {
    let mut state = new_state();
    let (lot_id, _lot_sk, _) = new_lot(&mut state, 100, 0, 0);

    let foreign = random_scalar(&mut OsRng);
    let result =
        handlers::handle_reveal_private_key(&mut state, &ctx([0u8; 32], CONCLUSION), lot_id, foreign);
    assert_eq!(result, Err(AuctionError::KeyMismatch));

    // Lot untouched: still awaiting its real key
    assert!(state.get_lot(lot_id).unwrap().private_key.is_none());
}
