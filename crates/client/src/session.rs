//! Wallet session as seen by the submission pipeline.

use artbid_types::Identity;
use parking_lot::RwLock;

/// Source of the caller's identity. Every write is attributed to the
/// identity reported here at submission time.
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    fn is_connected(&self) -> bool;
}

/// Session holding a fixed identity until disconnected.
#[derive(Debug, Default)]
pub struct StaticSession {
    identity: RwLock<Option<Identity>>,
}

impl StaticSession {
    pub fn connected(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(Some(identity)),
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connect(&self, identity: Identity) {
        *self.identity.write() = Some(identity);
    }

    pub fn disconnect(&self) {
        *self.identity.write() = None;
    }
}

impl IdentityProvider for StaticSession {
    fn current_identity(&self) -> Option<Identity> {
        (*self.identity.read()).filter(|id| !id.is_empty())
    }

    fn is_connected(&self) -> bool {
        self.current_identity().is_some()
    }
}
