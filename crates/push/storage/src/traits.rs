//! Storage traits.

/// Bearer token verification.
#[trait_variant::make(Send)]
pub trait IdentityStore: Send + Sync {
    /// Resolve a bearer token to the user ID it was issued for.
    ///
    /// Returns `Ok(None)` for unknown or expired tokens.
    async fn verify_token(&self, bearer: &str) -> color_eyre::eyre::Result<Option<String>>;
}

/// Device token lookups.
#[trait_variant::make(Send)]
pub trait TokenStore: Send + Sync {
    /// Check if `token` is registered to `owner_id`.
    async fn owns_token(&self, owner_id: &str, token: &str) -> color_eyre::eyre::Result<bool>;

    /// Get every device token registered for a pet.
    ///
    /// When `owner_id` is set, only that owner's rows are considered.
    async fn tokens_for_pet(
        &self,
        pet_id: &str,
        owner_id: Option<&str>,
    ) -> color_eyre::eyre::Result<Vec<String>>;
}

/// Combined storage trait.
pub trait AllStorage: IdentityStore + TokenStore {}

impl<T> AllStorage for T where T: IdentityStore + TokenStore {}
