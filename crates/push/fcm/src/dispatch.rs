//! Message dispatch.

use futures::StreamExt as _;
use push_core::{DispatchOutcome, TopicResult};

use crate::{MessageSender, Notification, ProviderAuth};

/// Sends a notification to a topic or to a list of endpoints.
///
/// Every endpoint is attempted exactly once. A failed attempt never stops the
/// remaining ones, and outcomes always come back in endpoint order.
#[derive(Clone)]
pub struct Dispatcher<M> {
    sender: M,
    concurrency: usize,
}

impl<M: MessageSender> Dispatcher<M> {
    /// Create a dispatcher that sends one message at a time.
    pub fn new(sender: M) -> Self {
        Self {
            sender,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` sends in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Send a single topic message.
    pub async fn send_topic(
        &self,
        auth: &ProviderAuth,
        notification: &Notification,
        topic: &str,
    ) -> TopicResult {
        match self.sender.send(auth, &notification.to_topic(topic)).await {
            Ok(reply) => {
                tracing::info!(status = reply.status, "topic message sent");
                TopicResult::from_reply(topic, reply.status, reply.payload)
            }
            Err(e) => {
                tracing::warn!(error = %e, "topic send failed");
                let failed = DispatchOutcome::transport_failure(topic, format!("{e:#}"));
                TopicResult::from_reply(topic, failed.status_code, failed.payload)
            }
        }
    }

    /// Send one message per endpoint.
    pub async fn send_endpoints(
        &self,
        auth: &ProviderAuth,
        notification: &Notification,
        endpoints: &[String],
    ) -> Vec<DispatchOutcome> {
        let attempts: Vec<_> = endpoints
            .iter()
            .map(|endpoint| self.send_one(auth, notification, endpoint))
            .collect();

        futures::stream::iter(attempts)
            .buffered(self.concurrency)
            .collect()
            .await
    }

    async fn send_one(
        &self,
        auth: &ProviderAuth,
        notification: &Notification,
        endpoint: &str,
    ) -> DispatchOutcome {
        match self.sender.send(auth, &notification.to_token(endpoint)).await {
            Ok(reply) => {
                if !(200..300).contains(&reply.status) {
                    tracing::warn!(status = reply.status, "endpoint send rejected");
                }
                DispatchOutcome::from_reply(endpoint, reply.status, reply.payload)
            }
            Err(e) => {
                tracing::warn!(error = %e, "endpoint send failed");
                DispatchOutcome::transport_failure(endpoint, format!("{e:#}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::{Message, ProviderReply};

    /// Replies by token name: `fail-*` gets a 404, `broken` has no reply,
    /// `slow-*` waits before answering.
    #[derive(Clone, Default)]
    struct ScriptedSender {
        sent: Arc<Mutex<Vec<String>>>,
    }

    impl MessageSender for ScriptedSender {
        async fn send(
            &self,
            _auth: &ProviderAuth,
            message: &Message,
        ) -> color_eyre::eyre::Result<ProviderReply> {
            let target = message
                .token
                .clone()
                .or_else(|| message.topic.clone())
                .unwrap_or_default();

            if target.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(30)).await;
            }
            self.sent.lock().unwrap().push(target.clone());

            if target == "broken" {
                color_eyre::eyre::bail!("connection reset");
            }
            let status = if target.starts_with("fail") { 404 } else { 200 };
            Ok(ProviderReply {
                status,
                payload: serde_json::json!({ "target": target }),
            })
        }
    }

    fn auth() -> ProviderAuth {
        ProviderAuth {
            access_token: "token".into(),
            project_id: "project".into(),
        }
    }

    fn notification() -> Notification {
        Notification {
            title: "Hi".into(),
            body: "There".into(),
            data: BTreeMap::new(),
        }
    }

    fn endpoints(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_every_endpoint_attempted_in_order() {
        let sender = ScriptedSender::default();
        let dispatcher = Dispatcher::new(sender.clone());
        let list = endpoints(&["a", "fail-b", "broken", "d"]);

        let outcomes = dispatcher.send_endpoints(&auth(), &notification(), &list).await;

        let order: Vec<_> = outcomes.iter().map(|o| o.endpoint.as_str()).collect();
        assert_eq!(order, ["a", "fail-b", "broken", "d"]);
        assert_eq!(*sender.sent.lock().unwrap(), list);

        let success: Vec<_> = outcomes.iter().map(|o| o.success).collect();
        assert_eq!(success, [true, false, false, true]);
        assert_eq!(outcomes[1].status_code, 404);
        assert_eq!(outcomes[2].status_code, push_core::TRANSPORT_FAILURE_STATUS);
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_keeps_endpoint_order() {
        let sender = ScriptedSender::default();
        let dispatcher = Dispatcher::new(sender.clone()).with_concurrency(4);
        let list = endpoints(&["slow-a", "b", "slow-c", "d"]);

        let outcomes = dispatcher.send_endpoints(&auth(), &notification(), &list).await;

        let order: Vec<_> = outcomes.iter().map(|o| o.endpoint.as_str()).collect();
        assert_eq!(order, ["slow-a", "b", "slow-c", "d"]);
        assert_eq!(sender.sent.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_endpoints_sent_twice() {
        let sender = ScriptedSender::default();
        let dispatcher = Dispatcher::new(sender.clone());

        let outcomes = dispatcher
            .send_endpoints(&auth(), &notification(), &endpoints(&["x", "x"]))
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_topic_send() {
        let dispatcher = Dispatcher::new(ScriptedSender::default());

        let ok = dispatcher.send_topic(&auth(), &notification(), "all").await;
        assert!(ok.ok);
        assert_eq!(ok.status_code(), 200);

        let rejected = dispatcher.send_topic(&auth(), &notification(), "fail-news").await;
        assert!(!rejected.ok);
        assert_eq!(rejected.status_code(), 404);

        let broken = dispatcher.send_topic(&auth(), &notification(), "broken").await;
        assert_eq!(broken.status_code(), push_core::TRANSPORT_FAILURE_STATUS);
    }
}
