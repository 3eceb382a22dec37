//! Request scope extraction.
//!
//! Authentication happens upstream. The gateway forwards the resolved
//! identity as headers and every handler trusts them:
//!
//! ```text
//! x-outlet-id: outlet-kwr      (required)
//! x-actor-id:  cashier-01      (required)
//! x-role:      CASHIER         (optional)
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;

pub const OUTLET_HEADER: &str = "x-outlet-id";
pub const ACTOR_HEADER: &str = "x-actor-id";
pub const ROLE_HEADER: &str = "x-role";

/// Who is calling and for which outlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestScope {
    pub outlet_id: String,
    pub actor_id: String,
    pub role: Option<String>,
}

impl RequestScope {
    pub fn new(outlet_id: impl Into<String>, actor_id: impl Into<String>) -> Self {
        RequestScope {
            outlet_id: outlet_id.into(),
            actor_id: actor_id.into(),
            role: None,
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let outlet_id = header(headers, OUTLET_HEADER).ok_or_else(|| ApiError::missing_scope(OUTLET_HEADER))?;
        let actor_id = header(headers, ACTOR_HEADER).ok_or_else(|| ApiError::missing_scope(ACTOR_HEADER))?;
        Ok(RequestScope {
            outlet_id,
            actor_id,
            role: header(headers, ROLE_HEADER),
        })
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        RequestScope::from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::HeaderValue;

    #[test]
    fn test_scope_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(OUTLET_HEADER, HeaderValue::from_static("outlet-kwr"));
        headers.insert(ACTOR_HEADER, HeaderValue::from_static(" cashier-01 "));
        headers.insert(ROLE_HEADER, HeaderValue::from_static("CASHIER"));

        let scope = RequestScope::from_headers(&headers).unwrap();
        assert_eq!(scope.outlet_id, "outlet-kwr");
        assert_eq!(scope.actor_id, "cashier-01");
        assert_eq!(scope.role.as_deref(), Some("CASHIER"));
    }

    #[test]
    fn test_missing_or_blank_headers_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_HEADER, HeaderValue::from_static("cashier-01"));
        let err = RequestScope::from_headers(&headers).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingScope);

        headers.insert(OUTLET_HEADER, HeaderValue::from_static("   "));
        assert!(RequestScope::from_headers(&headers).is_err());
    }
}
