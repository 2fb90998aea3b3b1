//! Caller identity.

/// Who is calling, as decided by the credential resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerIdentity {
    /// Holder of the shared server-side secret. Bypasses ownership checks.
    Privileged,
    /// Authenticated end user. Every resolved endpoint must belong to them.
    User { user_id: String },
}

impl CallerIdentity {
    /// Create a user identity.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
        }
    }

    /// Check if the caller bypasses ownership checks.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Privileged)
    }

    /// User ID for ownership filtering, `None` for privileged callers.
    pub fn owner_filter(&self) -> Option<&str> {
        match self {
            Self::Privileged => None,
            Self::User { user_id } => Some(user_id),
        }
    }
}
