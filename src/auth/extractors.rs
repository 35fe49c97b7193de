use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::warn;

use super::{claims::TokenClaims, gate};
use crate::{error::AppError, state::AppState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const TOKEN_QUERY_PARAM: &str = "token";

/// Verified claims of a `Normal` token read from the `Authorization` header.
pub struct NormalAuth(pub TokenClaims);

/// Same as [`NormalAuth`] but the token comes from `?token=`, for
/// downloadable resources.
pub struct QueryTokenAuth(pub TokenClaims);

/// Verified claims of a `Requires2FA` token.
pub struct TwoFactorAuth(pub TokenClaims);

pub fn request_id(parts: &Parts) -> String {
    parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn header_token(parts: &Parts, request_id: &str) -> Result<String, AppError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(gate::strip_bearer)
        .filter(|t| !t.is_empty());

    match value {
        Some(token) => Ok(token.to_string()),
        None => {
            warn!(%request_id, "no token provided");
            Err(AppError::UnauthorizedAccess)
        }
    }
}

fn verify(state: &AppState, token: &str, request_id: &str) -> Result<TokenClaims, AppError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    gate::get_token_claims(&state.keys, token, now, request_id)
}

#[async_trait]
impl FromRequestParts<AppState> for NormalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = request_id(parts);
        let token = header_token(parts, &request_id)?;
        let claims = verify(state, &token, &request_id)?;
        Ok(NormalAuth(gate::authorize_normal(claims, &request_id)?))
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for QueryTokenAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = request_id(parts);
        let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.token)
            .filter(|t| !t.is_empty());

        let Some(token) = token else {
            warn!(%request_id, param = TOKEN_QUERY_PARAM, "no token provided");
            return Err(AppError::UnauthorizedAccess);
        };

        let claims = verify(state, gate::strip_bearer(&token), &request_id)?;
        Ok(QueryTokenAuth(gate::authorize_normal(claims, &request_id)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TwoFactorAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = request_id(parts);
        let token = header_token(parts, &request_id)?;
        let claims = verify(state, &token, &request_id)?;
        Ok(TwoFactorAuth(gate::authorize_two_factor(claims, &request_id)?))
    }
}
