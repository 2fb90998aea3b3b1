//! FCM HTTP v1 sender.

use color_eyre::eyre::WrapErr as _;

use crate::{Message, MessageSender, ProviderAuth, ProviderReply};

/// Default FCM API base URL.
pub const DEFAULT_FCM_BASE_URL: &str = "https://fcm.googleapis.com";

#[derive(serde::Serialize)]
struct SendBody<'a> {
    message: &'a Message,
}

/// Sends messages through the FCM HTTP v1 API.
#[derive(Clone)]
pub struct FcmSender {
    client: reqwest::Client,
    base_url: String,
}

impl FcmSender {
    /// Create a sender against the public FCM API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_FCM_BASE_URL)
    }

    /// Create a sender against another base URL.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, project_id: &str) -> String {
        format!("{}/v1/projects/{}/messages:send", self.base_url, project_id)
    }
}

impl Default for FcmSender {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSender for FcmSender {
    async fn send(
        &self,
        auth: &ProviderAuth,
        message: &Message,
    ) -> color_eyre::eyre::Result<ProviderReply> {
        let response = self
            .client
            .post(self.endpoint(&auth.project_id))
            .bearer_auth(&auth.access_token)
            .json(&SendBody { message })
            .send()
            .await
            .wrap_err("failed to reach FCM")?;

        let status = response.status().as_u16();

        let payload = match response.bytes().await {
            Ok(body) => {
                serde_json::from_slice(&body).unwrap_or_else(|_| push_core::non_json_marker())
            }
            Err(e) => {
                tracing::warn!(error = %e, status, "failed to read FCM response body");
                push_core::non_json_marker()
            }
        };

        Ok(ProviderReply { status, payload })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mockito::Matcher;

    use super::*;
    use crate::Notification;

    fn auth() -> ProviderAuth {
        ProviderAuth {
            access_token: "ya29.token".into(),
            project_id: "pets-prod".into(),
        }
    }

    fn notification() -> Notification {
        Notification {
            title: "Hi".into(),
            body: "There".into(),
            data: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_v1_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/projects/pets-prod/messages:send")
            .match_header("authorization", "Bearer ya29.token")
            .match_body(Matcher::Json(serde_json::json!({
                "message": {
                    "token": "t1",
                    "notification": {"title": "Hi", "body": "There"},
                    "data": {}
                }
            })))
            .with_status(200)
            .with_body(r#"{"name":"projects/pets-prod/messages/1"}"#)
            .create_async()
            .await;

        let sender = FcmSender::with_base_url(&server.url());
        let reply = sender.send(&auth(), &notification().to_token("t1")).await.unwrap();

        assert_eq!(reply.status, 200);
        assert_eq!(reply.payload["name"], "projects/pets-prod/messages/1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_reply_is_marked() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/projects/pets-prod/messages:send")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let sender = FcmSender::with_base_url(&server.url());
        let reply = sender.send(&auth(), &notification().to_topic("all")).await.unwrap();

        assert_eq!(reply.status, 502);
        assert_eq!(reply.payload, push_core::non_json_marker());
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_error() {
        let sender = FcmSender::with_base_url("http://127.0.0.1:9");
        assert!(sender.send(&auth(), &notification().to_token("t1")).await.is_err());
    }
}
