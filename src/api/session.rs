use axum::http::HeaderMap;

use crate::tmdb::SessionId;
use crate::util::QueryParams;

pub const SESSION_HEADER: &str = "x-guest-session";
pub const SESSION_PARAM: &str = "guest_session_id";

/// The guest session of a request, from the `X-Guest-Session` header or the
/// `guest_session_id` query parameter. Blank values count as no session.
pub fn guest_session(headers: &HeaderMap, params: &QueryParams) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(SessionId::parse)
        .or_else(|| params.get(SESSION_PARAM).and_then(SessionId::parse))
}
