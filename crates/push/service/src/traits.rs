//! Service traits.

use push_core::{CallContext, PushResponse};

/// Push request handling.
#[trait_variant::make(Send)]
pub trait PushDispatch: Send + Sync {
    /// Handle one push request.
    ///
    /// Never fails: errors are rendered into the returned response.
    async fn send_push(&self, ctx: &CallContext, body: &[u8]) -> PushResponse;
}
