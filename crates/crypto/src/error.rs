//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
///
/// The public-key variants and `InvalidPrivateKey` together form the
/// engine's `InvalidKey` condition: a failed validation always surfaces as
/// one of these and is never silently coerced to a usable key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Public key is not on the curve")]
    InvalidPublicKey,

    #[error("Public key is the identity point")]
    IdentityPublicKey,

    #[error("Public key is the curve generator")]
    GeneratorPublicKey,

    #[error("Private key is zero or not below the group order")]
    InvalidPrivateKey,
}
