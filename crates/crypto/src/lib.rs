//! Bid sealing primitives for sealed-bid art auctions.
//!
//! Bids are sealed through the [`BidEncoder`] capability so the submission
//! pipeline never depends on a concrete scheme. The shipped implementation
//! stands in for a homomorphic backend:
//!
//! 1. **Sealing**: the amount, a Pedersen blinding factor and the sealing
//!    time are encrypted with AES-256-GCM under a key derived (HKDF-SHA256)
//!    from the network key and the `(auction, bidder)` binding.
//! 2. **Proof**: a Pedersen commitment to the amount plus a digest binding the
//!    commitment to the ciphertext, auction and bidder.
//! 3. **Opening**: only holders of a [`BidVerifier`] (the ledger's comparison
//!    service, audit tooling) can recover the amount. The bidding path is
//!    handed an encoder and nothing else.
//!
//! Sealing is randomized: two encodings of the same bid differ.

pub mod encoder;
pub mod error;
pub mod pedersen;
pub mod sealed;

pub use encoder::{BidEncoder, BidVerifier, FixedClock, OpenedBid, SealedBid, SystemClock, TimeSource};
pub use error::CryptoError;
pub use pedersen::{pedersen_commit, pedersen_verify, PedersenCommitment, PedersenParams};
pub use sealed::{check_proof_binding, NetworkKey, SealedBidEncoder, SealedBidOpener, SCHEME_LABEL};
