//! Authentication context types.

use recipebox_core::{User, UserId};

/// Authenticated request context.
///
/// Extracted from requests by the `OwnerAuth` extractor.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The account the token belongs to.
    pub user: User,
}

impl AuthContext {
    /// The acting owner for every owner-scoped operation.
    #[must_use]
    pub fn owner(&self) -> UserId {
        self.user.id
    }

    /// Returns `true` if the user is a superuser.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.user.is_superuser
    }
}
