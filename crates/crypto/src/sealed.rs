//! Sealed-bid cipher standing in for a homomorphic encryption backend.
//!
//! # Layout
//!
//! `encrypted_amount = version(1) || nonce(12) || AES-256-GCM(payload)`
//! where `payload = amount_wei(16, LE) || blinding(32) || sealed_at(8, LE)`
//! and the AEAD associated data is the `(auction, bidder)` binding.
//!
//! `proof = commitment(48) || sha256(domain || commitment || encrypted_amount || binding)`
//!
//! The symmetric key is derived per `(auction, bidder)` from the network key,
//! so a payload replayed under another auction or bidder fails to open.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use artbid_types::{bid_binding, Amount, AuctionId, Identity};

use crate::encoder::{check_encode_inputs, BidEncoder, BidVerifier, OpenedBid, SealedBid, TimeSource};
use crate::error::CryptoError;
use crate::pedersen::{pedersen_commit, pedersen_verify, PedersenCommitment, PedersenParams};

/// Label published alongside the network key.
pub const SCHEME_LABEL: &str = "aes256gcm-pedersen-v1";

const VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const PAYLOAD_LEN: usize = 16 + 32 + 8;
const CIPHERTEXT_LEN: usize = 1 + NONCE_LEN + PAYLOAD_LEN + TAG_LEN;
const COMMITMENT_LEN: usize = 48;
const PROOF_LEN: usize = COMMITMENT_LEN + 32;

/// Symmetric key standing in for the homomorphic public parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkKey([u8; 32]);

impl NetworkKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s.trim().trim_start_matches("0x"))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("key must be 32 bytes".into()))?;
        Ok(Self(key))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn derive_bid_key(&self, binding: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
        let hk = Hkdf::<Sha256>::new(None, &self.0);
        let mut info = Vec::with_capacity(14 + 32);
        info.extend_from_slice(b"SEALED-BID-KEY");
        info.extend_from_slice(binding);

        let mut key = [0u8; 32];
        hk.expand(&info, &mut key)
            .map_err(|_| CryptoError::KeyDerivationFailed)?;
        Ok(key)
    }
}

impl std::fmt::Debug for NetworkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NetworkKey(..)")
    }
}

fn binding_digest(commitment: &[u8], encrypted_amount: &[u8], binding: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"SEALED_BID_PROOF_V1");
    hasher.update(commitment);
    hasher.update(encrypted_amount);
    hasher.update(binding);
    hasher.finalize().into()
}

/// Check that `proof` binds `encrypted_amount` to this auction and bidder.
///
/// Needs no key material, so the ledger can run it on every placement.
pub fn check_proof_binding(
    auction_id: AuctionId,
    bidder: &Identity,
    encrypted_amount: &[u8],
    proof: &[u8],
) -> Result<(), CryptoError> {
    if encrypted_amount.len() != CIPHERTEXT_LEN || encrypted_amount[0] != VERSION {
        return Err(CryptoError::InvalidCiphertextFormat);
    }
    if proof.len() != PROOF_LEN {
        return Err(CryptoError::InvalidProofFormat);
    }

    let binding = bid_binding(auction_id, bidder);
    let (commitment, digest) = proof.split_at(COMMITMENT_LEN);
    if binding_digest(commitment, encrypted_amount, &binding).as_slice() != digest {
        return Err(CryptoError::BindingMismatch);
    }
    Ok(())
}

/// Seals bids under the network key. Cannot open what it seals.
#[derive(Debug, Clone)]
pub struct SealedBidEncoder {
    key: NetworkKey,
}

impl SealedBidEncoder {
    pub fn new(key: NetworkKey) -> Self {
        Self { key }
    }
}

impl BidEncoder for SealedBidEncoder {
    fn encode(
        &self,
        amount: Amount,
        bidder: &Identity,
        auction_id: AuctionId,
        clock: &dyn TimeSource,
    ) -> Result<SealedBid, CryptoError> {
        check_encode_inputs(amount, bidder)?;

        let mut rng = OsRng;
        let sealed_at = clock.now_unix();
        let binding = bid_binding(auction_id, bidder);

        let params = PedersenParams::new();
        let (commitment, blinding) = pedersen_commit(&params, amount.wei(), &mut rng);

        let mut payload = Vec::with_capacity(PAYLOAD_LEN);
        payload.extend_from_slice(&amount.wei().to_le_bytes());
        payload.extend_from_slice(&blinding);
        payload.extend_from_slice(&sealed_at.to_le_bytes());

        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let key = self.key.derive_bid_key(&binding)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        let sealed = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &payload,
                    aad: &binding,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut encrypted_amount = Vec::with_capacity(CIPHERTEXT_LEN);
        encrypted_amount.push(VERSION);
        encrypted_amount.extend_from_slice(&nonce);
        encrypted_amount.extend_from_slice(&sealed);

        let mut proof = Vec::with_capacity(PROOF_LEN);
        proof.extend_from_slice(&commitment.0);
        proof.extend_from_slice(&binding_digest(&commitment.0, &encrypted_amount, &binding));

        Ok(SealedBid {
            encrypted_amount,
            proof,
            sealed_at,
        })
    }
}

/// Opens bids sealed by [`SealedBidEncoder`] under the same network key.
#[derive(Debug, Clone)]
pub struct SealedBidOpener {
    key: NetworkKey,
}

impl SealedBidOpener {
    pub fn new(key: NetworkKey) -> Self {
        Self { key }
    }
}

impl BidVerifier for SealedBidOpener {
    fn open(
        &self,
        auction_id: AuctionId,
        bidder: &Identity,
        encrypted_amount: &[u8],
        proof: &[u8],
    ) -> Result<OpenedBid, CryptoError> {
        check_proof_binding(auction_id, bidder, encrypted_amount, proof)?;

        let binding = bid_binding(auction_id, bidder);
        let key = self.key.derive_bid_key(&binding)?;
        let cipher =
            Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::KeyDerivationFailed)?;

        let (nonce, sealed) = encrypted_amount[1..].split_at(NONCE_LEN);
        let payload = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: &binding,
                },
            )
            .map_err(|_| CryptoError::AuthenticationFailed)?;
        if payload.len() != PAYLOAD_LEN {
            return Err(CryptoError::InvalidCiphertextFormat);
        }

        let mut wei = [0u8; 16];
        wei.copy_from_slice(&payload[..16]);
        let mut blinding = [0u8; 32];
        blinding.copy_from_slice(&payload[16..48]);
        let mut sealed_at = [0u8; 8];
        sealed_at.copy_from_slice(&payload[48..56]);
        let wei = u128::from_le_bytes(wei);

        let mut commitment = [0u8; COMMITMENT_LEN];
        commitment.copy_from_slice(&proof[..COMMITMENT_LEN]);
        pedersen_verify(
            &PedersenParams::new(),
            &PedersenCommitment(commitment),
            wei,
            &blinding,
        )?;

        Ok(OpenedBid {
            amount: Amount::from_wei(wei),
            sealed_at: u64::from_le_bytes(sealed_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FixedClock;

    fn bidder() -> Identity {
        Identity([0x11; 20])
    }

    fn eth(s: &str) -> Amount {
        Amount::parse_ether(s).unwrap()
    }

    #[test]
    fn test_seal_and_open() {
        let key = NetworkKey::generate();
        let encoder = SealedBidEncoder::new(key.clone());
        let opener = SealedBidOpener::new(key);

        let sealed = encoder
            .encode(eth("2.75"), &bidder(), AuctionId(7), &FixedClock(1_700_000_000))
            .unwrap();
        assert_eq!(sealed.encrypted_amount.len(), CIPHERTEXT_LEN);
        assert_eq!(sealed.proof.len(), PROOF_LEN);
        assert_eq!(sealed.sealed_at, 1_700_000_000);

        let opened = opener
            .open(AuctionId(7), &bidder(), &sealed.encrypted_amount, &sealed.proof)
            .unwrap();
        assert_eq!(opened.amount, eth("2.75"));
        assert_eq!(opened.sealed_at, 1_700_000_000);
    }

    #[test]
    fn test_sealing_is_randomized() {
        let encoder = SealedBidEncoder::new(NetworkKey::generate());
        let clock = FixedClock(42);

        let a = encoder.encode(eth("1"), &bidder(), AuctionId(1), &clock).unwrap();
        let b = encoder.encode(eth("1"), &bidder(), AuctionId(1), &clock).unwrap();
        assert_ne!(a.encrypted_amount, b.encrypted_amount);
        assert_ne!(a.proof, b.proof);
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let encoder = SealedBidEncoder::new(NetworkKey::generate());
        let clock = FixedClock(42);

        assert!(matches!(
            encoder.encode(Amount::ZERO, &bidder(), AuctionId(1), &clock),
            Err(CryptoError::InvalidInput(_))
        ));
        assert!(matches!(
            encoder.encode(eth("1"), &Identity::ZERO, AuctionId(1), &clock),
            Err(CryptoError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_replay_under_other_auction_fails() {
        let key = NetworkKey::generate();
        let encoder = SealedBidEncoder::new(key.clone());
        let opener = SealedBidOpener::new(key);

        let sealed = encoder
            .encode(eth("3"), &bidder(), AuctionId(1), &FixedClock(1))
            .unwrap();

        assert_eq!(
            check_proof_binding(AuctionId(2), &bidder(), &sealed.encrypted_amount, &sealed.proof),
            Err(CryptoError::BindingMismatch)
        );
        assert!(opener
            .open(AuctionId(1), &Identity([0x22; 20]), &sealed.encrypted_amount, &sealed.proof)
            .is_err());
    }

    #[test]
    fn test_wrong_key_fails_to_open() {
        let encoder = SealedBidEncoder::new(NetworkKey::generate());
        let opener = SealedBidOpener::new(NetworkKey::generate());

        let sealed = encoder
            .encode(eth("1"), &bidder(), AuctionId(1), &FixedClock(1))
            .unwrap();
        assert_eq!(
            opener.open(AuctionId(1), &bidder(), &sealed.encrypted_amount, &sealed.proof),
            Err(CryptoError::AuthenticationFailed)
        );
    }

    #[test]
    fn test_tampered_ciphertext_fails_binding() {
        let encoder = SealedBidEncoder::new(NetworkKey::generate());
        let mut sealed = encoder
            .encode(eth("1"), &bidder(), AuctionId(1), &FixedClock(1))
            .unwrap();
        sealed.encrypted_amount[20] ^= 0x01;

        assert_eq!(
            check_proof_binding(AuctionId(1), &bidder(), &sealed.encrypted_amount, &sealed.proof),
            Err(CryptoError::BindingMismatch)
        );
    }

    #[test]
    fn test_network_key_hex() {
        let key = NetworkKey::new([0xab; 32]);
        let parsed = NetworkKey::from_hex(&format!("0x{}", key.to_hex())).unwrap();
        assert_eq!(parsed, key);
        assert!(NetworkKey::from_hex("abcd").is_err());
    }
}
