//! Caller identity supplied by the external identity provider.

use crate::credential::domain::SessionToken;
use crate::owner::OwnerId;

/// An authenticated user session.
#[derive(Debug, Clone)]
pub struct UserSession {
    /// Owner the session acts for.
    pub owner: OwnerId,
    /// Opaque session token; keys are wrapped for it.
    pub token: SessionToken,
    /// Whether the user may call admin operations.
    pub is_admin: bool,
}

impl UserSession {
    /// Creates a non-admin session.
    #[must_use]
    pub const fn new(owner: OwnerId, token: SessionToken) -> Self {
        Self {
            owner,
            token,
            is_admin: false,
        }
    }

    /// Grants admin rights.
    #[must_use]
    pub const fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}
