//! Buyer identity extraction.
//!
//! Authentication happens upstream; the gateway injects the verified
//! buyer's ID as a header on every proxied request. This extractor trusts
//! that header and rejects requests where it is missing or malformed —
//! on a correctly configured deployment that only happens for traffic
//! that bypassed the gateway.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use librum_core::BuyerId;

/// Header carrying the authenticated buyer's ID.
pub const BUYER_ID_HEADER: &str = "x-buyer-id";

/// The authenticated buyer, extracted from [`BUYER_ID_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentBuyer(pub BuyerId);

#[derive(Debug)]
pub enum AuthRejection {
    Missing,
    Malformed,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            Self::Missing => "Authentication required",
            Self::Malformed => "Invalid buyer identity",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": message })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for CurrentBuyer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(BUYER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AuthRejection::Missing)?;

        let buyer_id = raw.parse::<BuyerId>().map_err(|_| {
            tracing::warn!(header = raw, "malformed buyer ID header");
            AuthRejection::Malformed
        })?;

        Ok(Self(buyer_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CurrentBuyer, AuthRejection> {
        let (mut parts, ()) = request.into_parts();
        CurrentBuyer::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header_is_accepted() {
        let buyer = BuyerId::generate();
        let request = Request::builder()
            .header(BUYER_ID_HEADER, buyer.to_string())
            .body(())
            .unwrap();

        let CurrentBuyer(extracted) = extract(request).await.unwrap();
        assert_eq!(extracted, buyer);
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            AuthRejection::Missing
        ));
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected() {
        let request = Request::builder()
            .header(BUYER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            AuthRejection::Malformed
        ));
    }
}
