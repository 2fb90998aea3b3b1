//! Caller authentication.

use push_core::{CallContext, CallerIdentity, PushError};
use push_storage::IdentityStore;

/// Decide who is calling.
///
/// The privileged secret is accepted from either the `Authorization` bearer
/// or the `apikey` header. Anyone else needs a bearer token the identity
/// store recognizes.
pub async fn resolve_caller<I: IdentityStore>(
    ctx: &CallContext,
    privileged_key: &str,
    store: &I,
) -> Result<CallerIdentity, PushError> {
    let bearer = ctx.bearer();

    let privileged =
        (!bearer.is_empty() && bearer == privileged_key) || ctx.api_key() == privileged_key;
    if privileged {
        return Ok(CallerIdentity::Privileged);
    }

    if !ctx.has_authorization() {
        return Err(PushError::Unauthenticated(
            "Missing Authorization header.".to_string(),
        ));
    }

    let invalid = || PushError::Unauthenticated("Invalid user token.".to_string());
    if bearer.is_empty() {
        return Err(invalid());
    }

    match store.verify_token(bearer).await {
        Ok(Some(user_id)) => Ok(CallerIdentity::user(user_id)),
        Ok(None) => Err(invalid()),
        Err(e) => {
            tracing::warn!(error = %e, "token verification failed");
            Err(invalid())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeStore;

    const KEY: &str = "service-role-secret";

    fn store() -> FakeStore {
        FakeStore::default().with_user("alice-jwt", "alice")
    }

    #[tokio::test]
    async fn test_privileged_via_bearer() {
        let ctx = CallContext::new().with_authorization(format!("Bearer {KEY}"));
        let caller = resolve_caller(&ctx, KEY, &store()).await.unwrap();
        assert_eq!(caller, CallerIdentity::Privileged);
    }

    #[tokio::test]
    async fn test_privileged_via_api_key() {
        let ctx = CallContext::new()
            .with_authorization("Bearer alice-jwt")
            .with_api_key(KEY);
        let caller = resolve_caller(&ctx, KEY, &store()).await.unwrap();
        assert!(caller.is_privileged());

        let ctx = CallContext::new().with_api_key(KEY);
        assert!(resolve_caller(&ctx, KEY, &store()).await.unwrap().is_privileged());
    }

    #[tokio::test]
    async fn test_user_token() {
        let ctx = CallContext::new()
            .with_authorization("Bearer alice-jwt")
            .with_api_key("anon-key");
        let caller = resolve_caller(&ctx, KEY, &store()).await.unwrap();
        assert_eq!(caller, CallerIdentity::user("alice"));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let err = resolve_caller(&CallContext::new(), KEY, &store()).await.unwrap_err();
        assert_eq!(err, PushError::Unauthenticated("Missing Authorization header.".into()));

        let ctx = CallContext::new().with_authorization("");
        let err = resolve_caller(&ctx, KEY, &store()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[tokio::test]
    async fn test_invalid_or_unverifiable_token() {
        let expected = PushError::Unauthenticated("Invalid user token.".into());

        let ctx = CallContext::new().with_authorization("Bearer stolen");
        assert_eq!(resolve_caller(&ctx, KEY, &store()).await.unwrap_err(), expected);

        let ctx = CallContext::new().with_authorization("Bearer \u{fffd}\u{fffd}");
        assert_eq!(resolve_caller(&ctx, KEY, &store()).await.unwrap_err(), expected);

        let ctx = CallContext::new().with_authorization("Bearer ");
        assert_eq!(resolve_caller(&ctx, KEY, &store()).await.unwrap_err(), expected);

        let broken = store().failing();
        let ctx = CallContext::new().with_authorization("Bearer alice-jwt");
        assert_eq!(resolve_caller(&ctx, KEY, &broken).await.unwrap_err(), expected);
    }
}
