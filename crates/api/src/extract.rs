//! Caller-identity extraction.
//!
//! Session issuance and token validation live in an upstream auth layer;
//! by the time a request reaches these handlers, that layer has resolved
//! the caller and forwards the identity in `x-user-*` headers. The
//! extractor only reads them back out.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{Currency, Guest};
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated guest resolved from forwarded identity headers.
#[derive(Debug, Clone)]
pub struct AuthenticatedGuest(pub Guest);

fn header_str(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for AuthenticatedGuest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_str(parts, "x-user-id")
            .ok_or_else(|| ApiError::Unauthorized("Missing x-user-id header".to_string()))?;
        let user_id = Uuid::parse_str(&user_id)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid x-user-id header: {e}")))?;

        let email = header_str(parts, "x-user-email")
            .ok_or_else(|| ApiError::Unauthorized("Missing x-user-email header".to_string()))?;

        let currency = header_str(parts, "x-user-currency")
            .map(Currency::new)
            .unwrap_or_default();

        Ok(AuthenticatedGuest(Guest {
            user_id: UserId::from_uuid(user_id),
            email,
            phone_number: header_str(parts, "x-user-phone"),
            full_name: header_str(parts, "x-user-name"),
            currency,
        }))
    }
}
