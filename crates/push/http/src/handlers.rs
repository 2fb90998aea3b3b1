//! Push HTTP handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

use push_core::{CallContext, PushResponse};
use push_service::PushDispatch;

/// Header carrying the raw API key.
pub const API_KEY_HEADER: &str = "apikey";

/// Handle a push request.
pub async fn send_push_handler<S>(
    State(service): State<S>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: PushDispatch,
{
    if method == Method::OPTIONS {
        return (StatusCode::OK, "ok").into_response();
    }

    let ctx = call_context(&headers);
    let response = service.send_push(&ctx, &body).await;

    json_response(response)
}

/// Render a push response as JSON with its status code.
pub fn json_response(response: PushResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(response)).into_response()
}

/// Extract the credentials the service looks at.
fn call_context(headers: &HeaderMap) -> CallContext {
    let value = |name| {
        headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    };

    CallContext {
        authorization: value(header::AUTHORIZATION),
        api_key: value(header::HeaderName::from_static(API_KEY_HEADER)),
    }
}
