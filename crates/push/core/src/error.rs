//! Error taxonomy for a push request.

/// Failure that aborts a push request before or during target resolution.
///
/// Per-endpoint delivery failures are never reported through this type; they
/// are captured as failed [`DispatchOutcome`](crate::DispatchOutcome)s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    /// Missing or invalid server-side secrets.
    #[error("{0}")]
    Configuration(String),

    /// Malformed client input.
    #[error("{0}")]
    InvalidRequest(String),

    /// No credentials, or credentials the identity store rejected.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated caller is not allowed to reach the requested target.
    #[error("{0}")]
    Forbidden(String),

    /// A lookup resolved to nothing.
    #[error("{0}")]
    NotFound(String),

    /// The delivery provider did not hand out a usable access token.
    #[error("{0}")]
    UpstreamAuth(String),

    /// The data store failed while resolving targets.
    #[error("{0}")]
    Resolution(String),

    /// Anything else. Only defects should end up here.
    #[error("{0}")]
    Internal(String),
}

impl PushError {
    /// HTTP status code reported for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Configuration(_)
            | Self::UpstreamAuth(_)
            | Self::Resolution(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Create an internal error from anything displayable.
    pub fn internal(error: impl std::fmt::Display) -> Self {
        Self::Internal(error.to_string())
    }
}
