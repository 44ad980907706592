//! Bid sealing.
//!
//! Prepares the ciphertext and ephemeral key a bidder submits alongside
//! their quote amount. The salt binds the ciphertext to the exact bid
//! context (lot, bidder, amount in), so it cannot be replayed elsewhere.

use rand::{CryptoRng, Rng, RngCore};
use thiserror::Error;

use empa_crypto::{encrypt, random_scalar, seal_amount, CryptoError};
use empa_types::{compute_bid_salt, Address, Ciphertext, CurvePoint};

/// Errors that can occur during bid sealing.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Invalid lot public key: {0}")]
    InvalidLotKey(#[from] CryptoError),

    #[error("Requested amount cannot be zero")]
    ZeroAmount,
}

/// A sealed bid ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedBid {
    /// Sealed requested amount
    pub ciphertext: Ciphertext,
    /// Must accompany the ciphertext on submission
    pub ephemeral_public_key: CurvePoint,
    /// Masking seed (keep secret until after reveal)
    pub seed: u128,
    /// Requested base amount (keep secret)
    pub amount_out: u64,
}

/// Seal a bid for submission against a lot.
///
/// # Arguments
/// * `lot_public_key` - The lot's encryption public key
/// * `lot_id` - The lot being bid on
/// * `bidder` - Address the bid will be submitted from
/// * `amount_in` - Quote tokens offered (part of the salt binding)
/// * `amount_out` - Base tokens requested (the sealed value)
/// * `rng` - Cryptographically secure random number generator
pub fn create_bid<R: RngCore + CryptoRng>(
    lot_public_key: &CurvePoint,
    lot_id: u64,
    bidder: &Address,
    amount_in: u64,
    amount_out: u64,
    rng: &mut R,
) -> Result<PreparedBid, BidError> {
    if amount_out == 0 {
        return Err(BidError::ZeroAmount);
    }

    let seed: u128 = rng.gen();
    let message = seal_amount(amount_out, seed);
    let salt = compute_bid_salt(lot_id, bidder, amount_in);

    let ephemeral_sk = random_scalar(rng);
    let (ciphertext, ephemeral_public_key) =
        encrypt(&message, lot_public_key, &ephemeral_sk, &salt)?;

    Ok(PreparedBid {
        ciphertext,
        ephemeral_public_key,
        seed,
        amount_out,
    })
}

/// Builder for sealing bids.
pub struct BidBuilder {
    lot_public_key: CurvePoint,
    lot_id: u64,
    bidder: Address,
    amount_in: u64,
    amount_out: u64,
}

impl BidBuilder {
    /// Create a new bid builder.
    pub fn new(lot_public_key: CurvePoint, lot_id: u64, bidder: Address) -> Self {
        Self {
            lot_public_key,
            lot_id,
            bidder,
            amount_in: 0,
            amount_out: 0,
        }
    }

    /// Set the quote amount offered.
    pub fn amount_in(mut self, amount: u64) -> Self {
        self.amount_in = amount;
        self
    }

    /// Set the base amount requested.
    pub fn amount_out(mut self, amount: u64) -> Self {
        self.amount_out = amount;
        self
    }

    /// Seal the bid.
    pub fn build<R: RngCore + CryptoRng>(self, rng: &mut R) -> Result<PreparedBid, BidError> {
        create_bid(
            &self.lot_public_key,
            self.lot_id,
            &self.bidder,
            self.amount_in,
            self.amount_out,
            rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use empa_crypto::{decrypt, derive_public_key, open_amount};
    use rand::rngs::OsRng;

    #[test]
    fn test_create_bid_roundtrips_through_lot_key() {
        let lot_sk = random_scalar(&mut OsRng);
        let lot_pk = derive_public_key(&lot_sk).unwrap();
        let bidder = [7u8; 32];

        let prepared = create_bid(&lot_pk, 1, &bidder, 100, 40, &mut OsRng).unwrap();

        let salt = compute_bid_salt(1, &bidder, 100);
        let message = decrypt(
            &prepared.ciphertext,
            &prepared.ephemeral_public_key,
            &lot_sk,
            &salt,
        )
        .unwrap();
        assert_eq!(open_amount(&message), Some(40));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let lot_sk = random_scalar(&mut OsRng);
        let lot_pk = derive_public_key(&lot_sk).unwrap();

        let result = create_bid(&lot_pk, 1, &[7u8; 32], 100, 0, &mut OsRng);
        assert!(matches!(result, Err(BidError::ZeroAmount)));
    }

    #[test]
    fn test_bid_builder() {
        let lot_sk = random_scalar(&mut OsRng);
        let lot_pk = derive_public_key(&lot_sk).unwrap();

        let prepared = BidBuilder::new(lot_pk, 3, [9u8; 32])
            .amount_in(200)
            .amount_out(80)
            .build(&mut OsRng)
            .unwrap();

        assert_eq!(prepared.amount_out, 80);
    }

    #[test]
    fn test_invalid_lot_key_rejected() {
        let result = create_bid(&CurvePoint::default(), 1, &[7u8; 32], 100, 40, &mut OsRng);
        assert!(matches!(result, Err(BidError::InvalidLotKey(_))));
    }
}
