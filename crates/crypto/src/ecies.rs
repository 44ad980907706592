//! ECIES over BN254 G1 for sealed single-value bids.
//!
//! This implements the bid-confidentiality scheme cross-checked against the
//! protocol's reference implementation, so every step must stay
//! bit-compatible with it:
//!
//! # Encryption
//!
//! To encrypt a 32-byte message `m` to a recipient public key `P`:
//! 1. Validate `P`: on-curve, not the identity, not the generator
//! 2. Compute the shared point `S = r·P` for ephemeral private key `r`
//! 3. Derive the symmetric key `k = keccak256(S.x || salt)`
//! 4. Ciphertext is `m XOR k`; the ephemeral public key is `r·G`
//!
//! # Decryption
//!
//! Given the ephemeral public key `U = r·G` and recipient private key `s`:
//! 1. Validate `U` and the scalar range of `s`
//! 2. Compute `S = s·U` (= `r·s·G`, the same shared point)
//! 3. Derive `k` and XOR it back out
//!
//! The bid plaintext itself is a masked amount: `seed || seed - amount`,
//! both 16-byte big-endian halves with wrapping subtraction.

use ark_bn254::{Fq, Fr, G1Affine};
use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::{BigInteger, PrimeField, UniformRand};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use sha3::{Digest, Keccak256};

use empa_types::{Ciphertext, CurvePoint, Scalar};

use crate::error::CryptoError;

/// Validate and deserialize a public key.
///
/// Rejects the identity encoding `(0, 0)`, any point off the curve
/// `y² = x³ + 3`, and the generator itself; all three indicate a spoofed or
/// degenerate key.
pub fn validate_public_key(point: &CurvePoint) -> Result<G1Affine, CryptoError> {
    if point.x == [0u8; 32] && point.y == [0u8; 32] {
        return Err(CryptoError::IdentityPublicKey);
    }

    let x = Fq::from(BigUint::from_bytes_be(&point.x));
    let y = Fq::from(BigUint::from_bytes_be(&point.y));
    let affine = G1Affine::new_unchecked(x, y);

    if !affine.is_on_curve() || !affine.is_in_correct_subgroup_assuming_on_curve() {
        return Err(CryptoError::InvalidPublicKey);
    }
    if affine == G1Affine::generator() {
        return Err(CryptoError::GeneratorPublicKey);
    }

    Ok(affine)
}

/// Validate and deserialize a private key.
///
/// The scalar must lie in `(0, groupOrder)`; out-of-range values are
/// rejected rather than reduced.
pub fn parse_private_key(scalar: &Scalar) -> Result<Fr, CryptoError> {
    let value = BigUint::from_bytes_be(&scalar.0);
    let order = BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be());

    if value == BigUint::from(0u8) || value >= order {
        return Err(CryptoError::InvalidPrivateKey);
    }

    Ok(Fr::from(value))
}

/// Derive the public key `sk·G` for a private key.
pub fn derive_public_key(private_key: &Scalar) -> Result<CurvePoint, CryptoError> {
    let sk = parse_private_key(private_key)?;
    Ok(point_to_coordinates(&(G1Affine::generator() * sk).into_affine()))
}

/// Sample a non-zero scalar, big-endian encoded.
pub fn random_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let candidate = Fr::rand(rng);
        if candidate != Fr::from(0u64) {
            return scalar_to_bytes(&candidate);
        }
    }
}

/// Encrypt a 32-byte message to `recipient_pk`.
///
/// Returns the ciphertext together with the ephemeral public key that must
/// accompany it.
pub fn encrypt(
    message: &[u8; 32],
    recipient_pk: &CurvePoint,
    ephemeral_sk: &Scalar,
    salt: &[u8; 32],
) -> Result<(Ciphertext, CurvePoint), CryptoError> {
    let recipient = validate_public_key(recipient_pk)?;
    let r = parse_private_key(ephemeral_sk)?;

    // Same scalar-multiplication path for every input; no degenerate-case
    // shortcuts that would distinguish key shapes.
    let shared = (recipient * r).into_affine();
    let key = symmetric_key(&shared, salt);

    let ephemeral_pk = (G1Affine::generator() * r).into_affine();

    Ok((
        Ciphertext(xor_words(message, &key)),
        point_to_coordinates(&ephemeral_pk),
    ))
}

/// Decrypt a ciphertext with the recipient's private key.
pub fn decrypt(
    ciphertext: &Ciphertext,
    ephemeral_pk: &CurvePoint,
    recipient_sk: &Scalar,
    salt: &[u8; 32],
) -> Result<[u8; 32], CryptoError> {
    let ephemeral = validate_public_key(ephemeral_pk)?;
    let sk = parse_private_key(recipient_sk)?;

    let shared = (ephemeral * sk).into_affine();
    let key = symmetric_key(&shared, salt);

    Ok(xor_words(&ciphertext.0, &key))
}

/// Pack a bid amount into the seed-masked plaintext word.
pub fn seal_amount(amount_out: u64, seed: u128) -> [u8; 32] {
    let masked = seed.wrapping_sub(amount_out as u128);

    let mut message = [0u8; 32];
    message[..16].copy_from_slice(&seed.to_be_bytes());
    message[16..].copy_from_slice(&masked.to_be_bytes());
    message
}

/// Recover the bid amount from a decrypted plaintext word.
///
/// Returns `None` for malformed payloads: a recovered amount of zero or one
/// that does not fit the token amount range. Decryption with the wrong salt
/// or key lands here with overwhelming probability.
pub fn open_amount(message: &[u8; 32]) -> Option<u64> {
    let mut seed_bytes = [0u8; 16];
    let mut masked_bytes = [0u8; 16];
    seed_bytes.copy_from_slice(&message[..16]);
    masked_bytes.copy_from_slice(&message[16..]);

    let seed = u128::from_be_bytes(seed_bytes);
    let masked = u128::from_be_bytes(masked_bytes);

    let amount = seed.wrapping_sub(masked);
    if amount == 0 || amount > u64::MAX as u128 {
        return None;
    }
    Some(amount as u64)
}

/// Symmetric key: keccak256 of the shared point's x-coordinate and the salt.
fn symmetric_key(shared: &G1Affine, salt: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(field_to_bytes(&shared.x));
    hasher.update(salt);
    hasher.finalize().into()
}

fn xor_words(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = a[i] ^ b[i];
    }
    out
}

/// Serialize an affine point to big-endian coordinate words.
pub fn point_to_coordinates(point: &G1Affine) -> CurvePoint {
    CurvePoint {
        x: field_to_bytes(&point.x),
        y: field_to_bytes(&point.y),
    }
}

fn field_to_bytes(element: &Fq) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&element.into_bigint().to_bytes_be());
    out
}

fn scalar_to_bytes(scalar: &Fr) -> Scalar {
    let mut out = [0u8; 32];
    out.copy_from_slice(&scalar.into_bigint().to_bytes_be());
    Scalar(out)
}
