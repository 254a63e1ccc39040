//! Error types for bid sealing.

use thiserror::Error;

/// Errors raised while sealing, opening or checking a bid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Cannot seal bid: {0}")]
    InvalidInput(String),

    #[error("Commitment is not a valid G1 point")]
    InvalidG1Point,

    #[error("Blinding factor is not a canonical scalar")]
    InvalidScalar,

    #[error("Sealing failed: {0}")]
    EncryptionFailed(String),

    /// Wrong key, wrong binding or tampered bytes.
    #[error("Sealed payload failed authentication")]
    AuthenticationFailed,

    #[error("Sealed payload is malformed")]
    InvalidCiphertextFormat,

    #[error("Bid proof is malformed")]
    InvalidProofFormat,

    #[error("Proof does not bind this ciphertext")]
    BindingMismatch,

    #[error("Opened amount does not match its commitment")]
    InvalidCommitment,

    #[error("Sealing key derivation failed")]
    KeyDerivationFailed,

    #[error("Invalid network key: {0}")]
    InvalidKey(String),
}
