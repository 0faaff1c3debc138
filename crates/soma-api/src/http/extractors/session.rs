//! Session id resolution for turn endpoints.
//!
//! The caller's session id is taken from the `x-session-id` header, then the
//! JSON body, then the `session_id` query parameter. When none is present the
//! conversation service mints a `temp-` id.

use axum::http::HeaderMap;
use serde::Deserialize;

pub const SESSION_HEADER: &str = "x-session-id";

/// `?session_id=` on turn endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// First non-blank candidate in header, body, query order.
pub fn pick_session_id<'a>(
    headers: &'a HeaderMap,
    body: Option<&'a str>,
    query: Option<&'a str>,
) -> Option<&'a str> {
    let header = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok());

    non_blank(header)
        .or_else(|| non_blank(body))
        .or_else(|| non_blank(query))
}
