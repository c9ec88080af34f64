//! Pre-request and post-response hooks composed by `AuthenticatedClient`.

use crate::http::{HttpRequest, HttpResponse};

pub const AUTHORIZATION: &str = "authorization";

/// Status the backend uses to reject a missing or stale token.
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Outcome of inspecting a response before it reaches the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVerdict {
    Pass,
    /// The stored credential must be cleared.
    Unauthorized,
}

/// Set `authorization: Bearer <token>` exactly once, or strip it when there
/// is no token.
pub fn attach_bearer(request: &mut HttpRequest, token: Option<&str>) {
    match token {
        Some(token) => request.set_header(AUTHORIZATION, format!("Bearer {token}")),
        None => request.remove_header(AUTHORIZATION),
    }
}

pub fn inspect_response(response: &HttpResponse) -> ResponseVerdict {
    if response.status == UNAUTHORIZED_STATUS {
        ResponseVerdict::Unauthorized
    } else {
        ResponseVerdict::Pass
    }
}
