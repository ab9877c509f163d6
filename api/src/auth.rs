//! Bearer token identity. Tokens are issued elsewhere, this service only
//! verifies them with the shared HMAC secret and reads the `user_id` claim.

use crate::error::ApiError;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use lots::domain::{UserId, Viewer};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Claims {
    user_id: UserId,
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // `exp` is checked when present but not demanded
        validation.required_spec_claims.clear();
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn user_id(&self, token: &str) -> Result<UserId, jsonwebtoken::errors::Error> {
        Ok(decode::<Claims>(token, &self.key, &self.validation)?
            .claims
            .user_id)
    }

    fn verify_parts(&self, parts: &Parts) -> Option<Result<UserId, jsonwebtoken::errors::Error>> {
        let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
        Some(self.user_id(bearer_token(header)))
    }
}

/// The auth scheme is case-insensitive, a bare token is accepted as is.
fn bearer_token(header: &str) -> &str {
    match header.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => &header[7..],
        _ => header,
    }
}

/// Caller that presented a valid token, rejected with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);
        match verifier.verify_parts(parts) {
            Some(Ok(user_id)) => Ok(Self(user_id)),
            Some(Err(e)) => {
                debug!(auth_error = %e, "bearer token rejected");
                Err(ApiError::Unauthorized)
            }
            None => Err(ApiError::Unauthorized),
        }
    }
}

/// Caller identity when a valid token is present, anonymous otherwise.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Viewer);

impl<S> FromRequestParts<S> for MaybeUser
where
    Arc<JwtVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let verifier = Arc::<JwtVerifier>::from_ref(state);
        let viewer = match verifier.verify_parts(parts) {
            Some(Ok(user_id)) => Viewer::from_raw(user_id),
            _ => Viewer::Anonymous,
        };
        Ok(Self(viewer))
    }
}
