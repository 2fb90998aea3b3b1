//! Inbound push request and its call context.

use std::collections::BTreeMap;

use crate::PushError;

/// Credentials presented alongside a push request.
///
/// Carries the raw header values the credential resolver needs, without tying
/// the core types to any HTTP library.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,

    /// Raw `apikey` header value.
    pub api_key: Option<String>,
}

impl CallContext {
    /// Create an empty call context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `Authorization` header value.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    /// Set the `apikey` header value.
    pub fn with_api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(value.into());
        self
    }

    /// Check whether a non-empty `Authorization` header was sent.
    pub fn has_authorization(&self) -> bool {
        self.authorization.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Bearer credential with any leading `Bearer ` scheme removed.
    pub fn bearer(&self) -> &str {
        strip_bearer_scheme(self.authorization.as_deref().unwrap_or_default()).trim()
    }

    /// The `apikey` header, empty when absent.
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

/// Remove a case-insensitive `Bearer` scheme followed by at least one space.
fn strip_bearer_scheme(header: &str) -> &str {
    const SCHEME: &str = "bearer";

    let Some(prefix) = header.get(..SCHEME.len()) else {
        return header;
    };
    if !prefix.eq_ignore_ascii_case(SCHEME) {
        return header;
    }

    let rest = &header[SCHEME.len()..];
    let stripped = rest.trim_start();
    if stripped.len() == rest.len() {
        header
    } else {
        stripped
    }
}

/// Kind of delivery target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Token,
    Topic,
    PetId,
}

/// Exactly one delivery target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single device registration token.
    Token(String),
    /// A provider-side broadcast topic.
    Topic(String),
    /// Every device registered for a pet.
    PetId(String),
}

impl Target {
    /// Kind of this target.
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Token(_) => TargetKind::Token,
            Self::Topic(_) => TargetKind::Topic,
            Self::PetId(_) => TargetKind::PetId,
        }
    }

    /// The pet ID, when this is a pet target.
    pub fn pet_id(&self) -> Option<&str> {
        match self {
            Self::PetId(id) => Some(id),
            _ => None,
        }
    }
}

/// A validated push request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Notification title. Never empty.
    pub title: String,
    /// Notification body. Never empty.
    pub body: String,
    /// Data payload, values already flattened to strings.
    pub data: BTreeMap<String, String>,
    /// Where to deliver.
    pub target: Target,
}

/// Wire shape of the request body before validation.
#[derive(Debug, Default, serde::Deserialize)]
struct RawSendRequest {
    title: Option<String>,
    body: Option<String>,
    data: Option<serde_json::Map<String, serde_json::Value>>,
    token: Option<String>,
    topic: Option<String>,
    pet_id: Option<String>,
}

impl SendRequest {
    /// Parse and validate a JSON request body.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PushError> {
        let raw: RawSendRequest = serde_json::from_slice(bytes)
            .map_err(|e| PushError::InvalidRequest(format!("invalid JSON body: {e}")))?;

        Self::validate(raw)
    }

    fn validate(raw: RawSendRequest) -> Result<Self, PushError> {
        let (Some(title), Some(body)) = (non_empty(raw.title), non_empty(raw.body)) else {
            return Err(PushError::InvalidRequest(
                "title and body are required.".to_string(),
            ));
        };

        let targets: Vec<Target> = [
            non_empty(raw.token).map(Target::Token),
            non_empty(raw.topic).map(Target::Topic),
            non_empty(raw.pet_id).map(Target::PetId),
        ]
        .into_iter()
        .flatten()
        .collect();

        let [target] = <[Target; 1]>::try_from(targets).map_err(|_| {
            PushError::InvalidRequest(
                "Exactly one target is required: token, topic, or pet_id.".to_string(),
            )
        })?;

        let data = raw
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| (key, stringify(value)))
            .collect();

        Ok(Self {
            title,
            body,
            data,
            target,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Flatten a JSON value into the string form the provider's data map requires.
fn stringify(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<SendRequest, PushError> {
        SendRequest::from_json(json.as_bytes())
    }

    #[test]
    fn test_single_target_kinds() {
        let req = parse(r#"{"title":"Hi","body":"There","token":"t1"}"#).unwrap();
        assert_eq!(req.target, Target::Token("t1".into()));

        let req = parse(r#"{"title":"Hi","body":"There","topic":"all"}"#).unwrap();
        assert_eq!(req.target.kind(), TargetKind::Topic);

        let req = parse(r#"{"title":"Hi","body":"There","pet_id":"p1"}"#).unwrap();
        assert_eq!(req.target.pet_id(), Some("p1"));
    }

    #[test]
    fn test_target_count_must_be_one() {
        let expected = PushError::InvalidRequest(
            "Exactly one target is required: token, topic, or pet_id.".into(),
        );

        assert_eq!(parse(r#"{"title":"Hi","body":"There"}"#), Err(expected.clone()));
        assert_eq!(
            parse(r#"{"title":"Hi","body":"There","token":"t","topic":"all"}"#),
            Err(expected.clone())
        );
        assert_eq!(
            parse(r#"{"title":"Hi","body":"There","token":"t","topic":"a","pet_id":"p"}"#),
            Err(expected)
        );
    }

    #[test]
    fn test_empty_target_counts_as_absent() {
        let req = parse(r#"{"title":"Hi","body":"There","token":"","pet_id":"p1"}"#).unwrap();
        assert_eq!(req.target, Target::PetId("p1".into()));
    }

    #[test]
    fn test_title_and_body_required_before_target_check() {
        let err = parse(r#"{"title":"","body":"There"}"#).unwrap_err();
        assert_eq!(err, PushError::InvalidRequest("title and body are required.".into()));

        let err = parse(r#"{"body":"There","token":"t"}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_invalid_json_is_invalid_request() {
        let err = parse("not json").unwrap_err();
        assert!(
            matches!(err, PushError::InvalidRequest(ref m) if m.starts_with("invalid JSON body"))
        );

        let err = parse(r#"{"title":"Hi","body":"There","token":"t","data":[1]}"#).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_data_values_are_stringified() {
        let req = parse(
            r#"{"title":"Hi","body":"There","token":"t",
                "data":{"s":"v","n":3,"b":true,"z":null,"o":{"k":1}}}"#,
        )
        .unwrap();

        assert_eq!(req.data["s"], "v");
        assert_eq!(req.data["n"], "3");
        assert_eq!(req.data["b"], "true");
        assert_eq!(req.data["z"], "null");
        assert_eq!(req.data["o"], r#"{"k":1}"#);
    }

    #[test]
    fn test_bearer_extraction() {
        let ctx = CallContext::new().with_authorization("Bearer abc ");
        assert_eq!(ctx.bearer(), "abc");

        let ctx = CallContext::new().with_authorization("bEaReR\txyz");
        assert_eq!(ctx.bearer(), "xyz");

        let ctx = CallContext::new().with_authorization("Bearerxyz");
        assert_eq!(ctx.bearer(), "Bearerxyz");

        let ctx = CallContext::new().with_authorization("raw-key");
        assert_eq!(ctx.bearer(), "raw-key");

        assert_eq!(CallContext::new().bearer(), "");
        assert!(!CallContext::new().with_authorization("").has_authorization());
    }
}
