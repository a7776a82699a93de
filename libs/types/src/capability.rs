//! Admin capability token
//!
//! Privileged operations (risk-parameter updates, pause/resume) are
//! gated by possession of an `AdminCapability`. The token is opaque:
//! its only field is private, so no other crate can construct one, and
//! it is deliberately neither `Clone` nor serializable — it cannot be
//! duplicated or reconstructed from persisted state.

/// Unforgeable admin token. Possession alone authorizes privileged
/// calls; pass by reference into gated functions.
#[derive(Debug)]
pub struct AdminCapability {
    _token: (),
}

/// Mints the admin capability exactly once at bootstrap.
#[derive(Debug, Default)]
pub struct CapabilityAuthority {
    minted: bool,
}

impl CapabilityAuthority {
    /// Create a fresh authority with no capability minted yet.
    pub fn new() -> Self {
        Self { minted: false }
    }

    /// Mint the admin capability. Returns `Some` exactly once; every
    /// later call returns `None`.
    pub fn bootstrap(&mut self) -> Option<AdminCapability> {
        if self.minted {
            return None;
        }
        self.minted = true;
        Some(AdminCapability { _token: () })
    }

    /// Whether the capability has been minted.
    pub fn is_minted(&self) -> bool {
        self.minted
    }
}
