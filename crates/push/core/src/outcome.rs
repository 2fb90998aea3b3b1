//! Dispatch outcomes and response bodies.

use crate::{PushError, TargetKind};

/// Status recorded for an attempt that never got an HTTP reply.
pub const TRANSPORT_FAILURE_STATUS: u16 = 502;

/// Payload recorded when the provider reply is not JSON.
pub fn non_json_marker() -> serde_json::Value {
    serde_json::json!({ "parse_error": "non-json response" })
}

/// Result of one send attempt to one endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DispatchOutcome {
    /// Device registration token the attempt was addressed to.
    #[serde(rename = "token")]
    pub endpoint: String,
    /// Whether the provider accepted the message (2xx).
    #[serde(rename = "ok")]
    pub success: bool,
    /// Provider HTTP status.
    #[serde(rename = "status")]
    pub status_code: u16,
    /// Provider reply body, or a marker when it was unusable.
    pub payload: serde_json::Value,
}

impl DispatchOutcome {
    /// Create an outcome from a provider reply.
    pub fn from_reply(
        endpoint: impl Into<String>,
        status_code: u16,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            success: is_success(status_code),
            status_code,
            payload,
        }
    }

    /// Create an outcome for an attempt that failed before any reply.
    pub fn transport_failure(endpoint: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            endpoint: endpoint.into(),
            success: false,
            status_code: TRANSPORT_FAILURE_STATUS,
            payload: serde_json::json!({ "transport_error": error.to_string() }),
        }
    }
}

/// Aggregate of every endpoint attempt for a token or pet target.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AggregatedResult {
    #[serde(rename = "target")]
    pub target_kind: TargetKind,
    /// The resolved pet ID, `null` for token targets.
    #[serde(rename = "pet_id")]
    pub target_value: Option<String>,
    #[serde(rename = "sent")]
    pub sent_count: usize,
    #[serde(rename = "failed")]
    pub failed_count: usize,
    /// One entry per attempt, in endpoint order.
    #[serde(rename = "results")]
    pub outcomes: Vec<DispatchOutcome>,
}

impl AggregatedResult {
    /// 200 when every attempt succeeded, 207 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.failed_count == 0 { 200 } else { 207 }
    }
}

/// Result of a single topic send.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TopicResult {
    pub target: TargetKind,
    pub topic: String,
    pub ok: bool,
    #[serde(skip)]
    pub provider_status: u16,
    pub payload: serde_json::Value,
}

impl TopicResult {
    /// Create a topic result from a provider reply.
    pub fn from_reply(
        topic: impl Into<String>,
        provider_status: u16,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            target: TargetKind::Topic,
            topic: topic.into(),
            ok: is_success(provider_status),
            provider_status,
            payload,
        }
    }

    /// 200 on success, the provider's status otherwise.
    pub fn status_code(&self) -> u16 {
        if self.ok { 200 } else { self.provider_status }
    }
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of a push response.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Error(ErrorBody),
    Topic(TopicResult),
    Endpoints(AggregatedResult),
}

/// Final response of a push request.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct PushResponse {
    #[serde(skip)]
    pub status: u16,
    pub body: ResponseBody,
}

impl PushResponse {
    /// Create an error response with an explicit status.
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody::Error(ErrorBody {
                error: message.into(),
            }),
        }
    }
}

impl From<PushError> for PushResponse {
    fn from(err: PushError) -> Self {
        Self::error(err.status_code(), err.to_string())
    }
}

impl From<TopicResult> for PushResponse {
    fn from(result: TopicResult) -> Self {
        Self {
            status: result.status_code(),
            body: ResponseBody::Topic(result),
        }
    }
}

impl From<AggregatedResult> for PushResponse {
    fn from(result: AggregatedResult) -> Self {
        Self {
            status: result.status_code(),
            body: ResponseBody::Endpoints(result),
        }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
