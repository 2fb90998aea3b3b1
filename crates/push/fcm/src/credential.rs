//! Service account credentials.

use push_core::PushError;

/// OAuth scope for sending FCM messages.
pub const MESSAGING_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Token endpoint used when the service account does not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Google service account key, as downloaded from the console.
#[derive(Clone, serde::Deserialize)]
pub struct ServiceAccount {
    #[serde(default)]
    pub project_id: Option<String>,
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Parse a service account key from JSON.
    pub fn from_json(json: &str) -> Result<Self, PushError> {
        serde_json::from_str(json).map_err(|e| {
            PushError::Configuration(format!(
                "FIREBASE_SERVICE_ACCOUNT_JSON is not a valid service account: {e}"
            ))
        })
    }

    /// Resolve the project to send through.
    ///
    /// An explicit, non-empty project ID wins over the one embedded in the key.
    pub fn resolve_project_id(&self, explicit: Option<&str>) -> Result<String, PushError> {
        explicit
            .filter(|id| !id.is_empty())
            .or(self.project_id.as_deref().filter(|id| !id.is_empty()))
            .map(str::to_string)
            .ok_or_else(|| PushError::Configuration("FIREBASE_PROJECT_ID is missing.".to_string()))
    }

    /// Token endpoint for this account.
    pub fn token_uri(&self) -> &str {
        self.token_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// Key identifying tokens minted for this account and scope.
    pub fn cache_key(&self, scope: &str) -> String {
        format!(
            "{}|{}|{}",
            self.client_email,
            self.private_key_id.as_deref().unwrap_or_default(),
            scope
        )
    }
}

/// Short-lived provider access token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl AccessToken {
    /// Check if the token stays valid for at least `margin` after `now`.
    pub fn is_fresh(&self, now: chrono::DateTime<chrono::Utc>, margin: chrono::Duration) -> bool {
        self.expires_at - margin > now
    }
}
