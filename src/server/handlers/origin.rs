//! Same-origin guard for the camera and clipboard endpoints.

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::error::ApiError;

/// Refuse requests whose `Origin` does not match the `Host` they were sent to.
///
/// Requests without an `Origin` header (the CLI, curl, plain navigation) pass.
pub async fn same_origin(request: Request, next: Next) -> Response {
    if let Some(origin) = foreign_origin(request.headers()) {
        tracing::warn!("Refused cross-origin request from {}", origin);
        return ApiError::Forbidden(format!("cross-origin request from {} refused", origin))
            .into_response();
    }
    next.run(request).await
}

fn foreign_origin(headers: &HeaderMap) -> Option<String> {
    let origin = headers.get(header::ORIGIN)?;
    let origin = String::from_utf8_lossy(origin.as_bytes()).into_owned();
    let authority = origin.split_once("://").map(|(_, rest)| rest);
    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());

    let same_site = matches!(
        (authority, host),
        (Some(authority), Some(host)) if authority.eq_ignore_ascii_case(host)
    );
    (!same_site).then_some(origin)
}
