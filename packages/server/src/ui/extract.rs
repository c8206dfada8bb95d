//! 認証済みの識別子を取り出す extractor

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::domain::Identity;

use super::{error::ApiError, state::AppState};

/// `Authorization: Bearer <token>` を `IdentityResolver` で解決した識別子
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthorized)?;

        state
            .identity_resolver
            .resolve(token.trim())
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}
