//! Pedersen commitments on BLS12-381 G1.
//!
//! Every sealed bid carries `C = g^wei · h^r`. The blinding factor `r` rides
//! inside the ciphertext, so whoever opens the bid can check the recovered
//! amount against the commitment that was submitted alongside it.

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Compressed commitment point (48 bytes).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PedersenCommitment(pub [u8; 48]);

/// Commitment bases.
pub struct PedersenParams {
    pub g: G1Affine,
    /// Hash-derived; its discrete log relative to `g` is unknown
    pub h: G1Affine,
}

impl Default for PedersenParams {
    fn default() -> Self {
        Self::new()
    }
}

impl PedersenParams {
    pub fn new() -> Self {
        Self {
            g: G1Affine::generator(),
            h: derive_h_point(),
        }
    }
}

/// Derive the h point from a fixed domain string so it is not a known
/// multiple of g.
fn derive_h_point() -> G1Affine {
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_ART_BID_PEDERSEN_H_V1");
    let hash: [u8; 32] = hasher.finalize().into();

    let mut wide = [0u8; 64];
    wide[..32].copy_from_slice(&hash);
    let s = Scalar::from_bytes_wide(&wide);
    (G1Projective::generator() * s).to_affine()
}

/// Embed a wei amount as a scalar.
fn amount_scalar(value: u128) -> Scalar {
    Scalar::from_raw([value as u64, (value >> 64) as u64, 0, 0])
}

fn commit_point(params: &PedersenParams, value: u128, r: &Scalar) -> PedersenCommitment {
    let point = (G1Projective::from(params.g) * amount_scalar(value)
        + G1Projective::from(params.h) * r)
        .to_affine();
    PedersenCommitment(point.to_compressed())
}

/// Commit to a wei amount with a fresh blinding factor.
///
/// Returns `(commitment, randomness)`; the randomness is needed to open the
/// commitment and travels inside the sealed payload.
pub fn pedersen_commit<R: RngCore + CryptoRng>(
    params: &PedersenParams,
    value: u128,
    rng: &mut R,
) -> (PedersenCommitment, [u8; 32]) {
    let mut rand_bytes = [0u8; 64];
    rng.fill_bytes(&mut rand_bytes);
    let randomness = Scalar::from_bytes_wide(&rand_bytes);

    (commit_point(params, value, &randomness), randomness.to_bytes())
}

/// Recompute a commitment from a known blinding factor.
pub fn pedersen_commit_with_randomness(
    params: &PedersenParams,
    value: u128,
    randomness: &[u8; 32],
) -> Result<PedersenCommitment, CryptoError> {
    let r: Option<Scalar> = Scalar::from_bytes(randomness).into();
    let r = r.ok_or(CryptoError::InvalidScalar)?;
    Ok(commit_point(params, value, &r))
}

/// Check that `(value, randomness)` opens `commitment`.
pub fn pedersen_verify(
    params: &PedersenParams,
    commitment: &PedersenCommitment,
    value: u128,
    randomness: &[u8; 32],
) -> Result<(), CryptoError> {
    let point = G1Affine::from_compressed(&commitment.0);
    if point.is_none().into() {
        return Err(CryptoError::InvalidG1Point);
    }

    let expected = pedersen_commit_with_randomness(params, value, randomness)?;
    if *commitment == expected {
        Ok(())
    } else {
        Err(CryptoError::InvalidCommitment)
    }
}
