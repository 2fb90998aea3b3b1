//! FCM message types.

use std::collections::BTreeMap;

use push_core::SendRequest;

/// Notification content shared by every message of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

impl Notification {
    /// Take the content of a validated request.
    pub fn from_request(request: &SendRequest) -> Self {
        Self {
            title: request.title.clone(),
            body: request.body.clone(),
            data: request.data.clone(),
        }
    }

    /// Address the notification to a single device.
    pub fn to_token(&self, token: &str) -> Message {
        self.message(Some(token.to_string()), None)
    }

    /// Address the notification to a topic.
    pub fn to_topic(&self, topic: &str) -> Message {
        self.message(None, Some(topic.to_string()))
    }

    fn message(&self, token: Option<String>, topic: Option<String>) -> Message {
        Message {
            token,
            topic,
            notification: MessageNotification {
                title: self.title.clone(),
                body: self.body.clone(),
            },
            data: self.data.clone(),
        }
    }
}

/// FCM v1 `message` object.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub notification: MessageNotification,
    pub data: BTreeMap<String, String>,
}

/// FCM v1 `notification` object.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MessageNotification {
    pub title: String,
    pub body: String,
}

/// Credentials for one request against the provider.
#[derive(Debug, Clone)]
pub struct ProviderAuth {
    pub access_token: String,
    pub project_id: String,
}

/// HTTP reply from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    /// Parsed reply body, or the non-JSON marker.
    pub payload: serde_json::Value,
}
