use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

const TRACE_ID_HEADER: &str = "x-trace-id";

/// Request-scoped identifier, echoed back in the `X-Trace-Id` response header.
#[derive(Debug, Clone)]
pub struct TraceId(pub String);

pub async fn assign_trace_id(mut req: Request<Body>, next: Next) -> Response {
    // Keep a caller-supplied id when it is a usable header value.
    let trace_id = req
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 64)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(TraceId(trace_id.clone()));

    let mut res = next.run(req).await;
    let value = HeaderValue::from_str(&trace_id)
        .unwrap_or_else(|_| HeaderValue::from_static("invalid"));
    res.headers_mut()
        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    res
}
