//! Delivery provider traits.

use crate::{AccessToken, Message, ProviderAuth, ProviderReply, ServiceAccount};

/// Exchanges a long-lived service credential for a short-lived access token.
#[trait_variant::make(Send)]
pub trait TokenExchanger: Send + Sync {
    /// Get an access token for `scope`.
    async fn exchange(
        &self,
        account: &ServiceAccount,
        scope: &str,
    ) -> color_eyre::eyre::Result<AccessToken>;
}

/// Sends a single message to the delivery provider.
#[trait_variant::make(Send)]
pub trait MessageSender: Send + Sync {
    /// Send one message.
    ///
    /// Any HTTP reply, successful or not, is `Ok`. `Err` means no reply was
    /// received at all.
    async fn send(
        &self,
        auth: &ProviderAuth,
        message: &Message,
    ) -> color_eyre::eyre::Result<ProviderReply>;
}
