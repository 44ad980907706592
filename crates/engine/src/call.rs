//! Call message types and dispatch for the auction engine.
//!
//! The registry layer treats this engine as one auction format among
//! several; `AuctionCall`/`apply_call` give it a single tagged-variant
//! surface over the full operation set.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::claim::ClaimAmounts;
use crate::error::AuctionError;
use crate::handlers::{
    handle_cancel_bid, handle_claim, handle_create_lot, handle_decrypt_batch,
    handle_reveal_private_key, handle_settle, handle_submit_bid, CallContext, SettlementSummary,
};
use crate::state::AuctionState;
use empa_types::{Address, Ciphertext, CurvePoint, LotParams, Scalar};

/// Call messages for the auction engine.
#[derive(Clone, Debug, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    /// Create a new lot.
    CreateLot { params: LotParams },

    /// Submit a sealed bid.
    SubmitBid {
        lot_id: u64,
        referrer: Address,
        amount_in: u64,
        ciphertext: Ciphertext,
        ephemeral_public_key: CurvePoint,
    },

    /// Cancel an own bid before conclusion.
    CancelBid { lot_id: u64, bid_id: u64 },

    /// Reveal the lot private key after conclusion (one-time).
    RevealPrivateKey { lot_id: u64, private_key: Scalar },

    /// Decrypt up to `count` sealed bids from the stored cursor.
    DecryptBatch { lot_id: u64, count: u64 },

    /// Settle the lot (permissionless, once).
    SettleLot { lot_id: u64 },

    /// Compute the payout/refund pair for a settled bid.
    ClaimBid { lot_id: u64, bid_id: u64 },
}

/// Successful call results, one variant per call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallOutcome {
    LotCreated { lot_id: u64 },
    BidSubmitted { bid_id: u64 },
    BidCancelled { refund: u64 },
    KeyRevealed,
    BatchDecrypted { decrypted: u64 },
    LotSettled(SettlementSummary),
    BidClaimed(ClaimAmounts),
}

/// Apply one call against the engine state.
pub fn apply_call(
    state: &mut AuctionState,
    ctx: &CallContext,
    call: AuctionCall,
) -> Result<CallOutcome, AuctionError> {
    match call {
        AuctionCall::CreateLot { params } => {
            let lot_id = handle_create_lot(state, ctx, params)?;
            Ok(CallOutcome::LotCreated { lot_id })
        }
        AuctionCall::SubmitBid {
            lot_id,
            referrer,
            amount_in,
            ciphertext,
            ephemeral_public_key,
        } => {
            let bid_id = handle_submit_bid(
                state,
                ctx,
                lot_id,
                referrer,
                amount_in,
                ciphertext,
                ephemeral_public_key,
            )?;
            Ok(CallOutcome::BidSubmitted { bid_id })
        }
        AuctionCall::CancelBid { lot_id, bid_id } => {
            let refund = handle_cancel_bid(state, ctx, lot_id, bid_id)?;
            Ok(CallOutcome::BidCancelled { refund })
        }
        AuctionCall::RevealPrivateKey {
            lot_id,
            private_key,
        } => {
            handle_reveal_private_key(state, ctx, lot_id, private_key)?;
            Ok(CallOutcome::KeyRevealed)
        }
        AuctionCall::DecryptBatch { lot_id, count } => {
            let decrypted = handle_decrypt_batch(state, ctx, lot_id, count)?;
            Ok(CallOutcome::BatchDecrypted { decrypted })
        }
        AuctionCall::SettleLot { lot_id } => {
            let summary = handle_settle(state, ctx, lot_id)?;
            Ok(CallOutcome::LotSettled(summary))
        }
        AuctionCall::ClaimBid { lot_id, bid_id } => {
            let amounts = handle_claim(state, ctx, lot_id, bid_id)?;
            Ok(CallOutcome::BidClaimed(amounts))
        }
    }
}
