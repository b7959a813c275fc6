//! Client details recorded on audit entries.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::USER_AGENT, request::Parts},
};

use sitebook_core::audit::RequestContext;

/// Client address and user agent of the current request.
///
/// The address is the first hop of `X-Forwarded-For`, else `X-Real-IP`.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo(pub RequestContext);

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl ClientInfo {
    /// Reads client details from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = header(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()));
        Self(RequestContext {
            ip_address: forwarded.or_else(|| header(headers, "x-real-ip")),
            user_agent: header(headers, USER_AGENT.as_str()),
        })
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
