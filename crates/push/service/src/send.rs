//! Push request flow.

use std::sync::Arc;

use push_core::{CallContext, PushError, PushResponse, SendRequest};
use push_fcm::{
    Dispatcher, MESSAGING_SCOPE, MessageSender, Notification, ProviderAuth, ServiceAccount,
    TokenExchanger,
};
use push_storage::AllStorage;

use crate::{
    PushDispatch, RequiredSettings, ResolvedTarget, Settings, aggregate, resolve_caller,
    resolve_target,
};

/// Push service wiring storage, token exchange, and delivery together.
#[derive(Clone)]
pub struct PushService<S, X, M> {
    settings: Arc<Settings>,
    store: S,
    exchanger: X,
    dispatcher: Dispatcher<M>,
}

impl<S, X, M> PushService<S, X, M>
where
    S: AllStorage,
    X: TokenExchanger,
    M: MessageSender,
{
    /// Create a new push service.
    pub fn new(settings: Settings, store: S, exchanger: X, sender: M) -> Self {
        let dispatcher = Dispatcher::new(sender).with_concurrency(settings.dispatch_concurrency);

        Self {
            settings: Arc::new(settings),
            store,
            exchanger,
            dispatcher,
        }
    }

    /// Run one request. Every step before dispatch fails fast.
    pub async fn handle(&self, ctx: &CallContext, body: &[u8]) -> Result<PushResponse, PushError> {
        let required = self.settings.require()?;
        let request = SendRequest::from_json(body)?;

        let caller = resolve_caller(ctx, required.privileged_key, &self.store).await?;
        let resolved = resolve_target(&request.target, &caller, &self.store).await?;

        let auth = self.provider_auth(&required).await?;
        let notification = Notification::from_request(&request);

        let response = match resolved {
            ResolvedTarget::Topic(topic) => self
                .dispatcher
                .send_topic(&auth, &notification, &topic)
                .await
                .into(),
            ResolvedTarget::Endpoints(endpoints) => {
                let outcomes = self
                    .dispatcher
                    .send_endpoints(&auth, &notification, &endpoints)
                    .await;
                let result = aggregate(&request.target, outcomes);

                tracing::info!(
                    kind = ?result.target_kind,
                    sent = result.sent_count,
                    failed = result.failed_count,
                    "push dispatched"
                );
                result.into()
            }
        };

        Ok(response)
    }

    async fn provider_auth(
        &self,
        required: &RequiredSettings<'_>,
    ) -> Result<ProviderAuth, PushError> {
        let account = ServiceAccount::from_json(required.service_account_json)?;
        let project_id = account.resolve_project_id(required.project_id)?;

        let token = self
            .exchanger
            .exchange(&account, MESSAGING_SCOPE)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "access token exchange failed");
                PushError::UpstreamAuth("Failed to obtain Firebase access token.".to_string())
            })?;

        Ok(ProviderAuth {
            access_token: token.token,
            project_id,
        })
    }
}

impl<S, X, M> PushDispatch for PushService<S, X, M>
where
    S: AllStorage,
    X: TokenExchanger,
    M: MessageSender,
{
    async fn send_push(&self, ctx: &CallContext, body: &[u8]) -> PushResponse {
        match self.handle(ctx, body).await {
            Ok(response) => response,
            Err(e) => {
                if e.status_code() >= 500 {
                    tracing::error!(error = %e, "push request failed");
                } else {
                    tracing::info!(error = %e, status = e.status_code(), "push request rejected");
                }
                e.into()
            }
        }
    }
}
