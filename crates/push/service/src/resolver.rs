//! Target resolution.

use push_core::{CallerIdentity, PushError, Target};
use push_storage::TokenStore;

/// Where a request will be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// One topic message.
    Topic(String),
    /// One message per endpoint, in this order.
    Endpoints(Vec<String>),
}

/// Resolve a target into a topic or endpoint list, enforcing ownership.
///
/// Ownership for pet targets is part of the store query, so a user never
/// learns whether someone else's devices exist for the same pet.
pub async fn resolve_target<T: TokenStore>(
    target: &Target,
    caller: &CallerIdentity,
    store: &T,
) -> Result<ResolvedTarget, PushError> {
    match target {
        Target::Topic(topic) => {
            if !caller.is_privileged() {
                return Err(PushError::Forbidden(
                    "Only service-role callers can send topic pushes.".to_string(),
                ));
            }
            Ok(ResolvedTarget::Topic(topic.clone()))
        }

        Target::Token(token) => {
            if let CallerIdentity::User { user_id } = caller {
                let owned = match store.owns_token(user_id, token).await {
                    Ok(owned) => owned,
                    Err(e) => {
                        tracing::warn!(error = %e, "token ownership check failed");
                        false
                    }
                };
                if !owned {
                    return Err(PushError::Forbidden(
                        "Token does not belong to current user.".to_string(),
                    ));
                }
            }
            Ok(ResolvedTarget::Endpoints(vec![token.clone()]))
        }

        Target::PetId(pet_id) => {
            let tokens = store
                .tokens_for_pet(pet_id, caller.owner_filter())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "pet token lookup failed");
                    PushError::Resolution("Failed to resolve pet tokens.".to_string())
                })?;

            let tokens: Vec<String> = tokens.into_iter().filter(|t| !t.is_empty()).collect();
            if tokens.is_empty() {
                return Err(PushError::NotFound(
                    "No tokens found for the requested pet_id.".to_string(),
                ));
            }

            Ok(ResolvedTarget::Endpoints(tokens))
        }
    }
}
