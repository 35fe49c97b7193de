//! Token verification pipeline and authorization decisions.
//!
//! Everything here is synchronous and side-effect free apart from the
//! warn-level log line written once per rejection.

use tracing::warn;

use super::{
    claims::{TokenClaims, TokenType},
    jwt::{JwtKeys, ParsedToken},
};
use crate::error::AppError;

/// Runs the verifier against `now` (unix seconds).
pub fn get_token_claims(
    keys: &JwtKeys,
    token: &str,
    now: i64,
    request_id: &str,
) -> Result<TokenClaims, AppError> {
    let claims = match keys.parse(token) {
        Ok(ParsedToken::Valid(claims)) => claims,
        Ok(ParsedToken::Invalid(kind)) => {
            warn!(%request_id, reason = ?kind, "token is invalid");
            return Err(AppError::CurrentInvalidToken);
        }
        Err(e) => {
            warn!(%request_id, error = %e, "failed to parse token");
            return Err(AppError::UnauthorizedAccess);
        }
    };

    if claims.exp < now {
        warn!(%request_id, uid = %claims.masked_sub(), exp = claims.exp, "token is expired");
        return Err(AppError::CurrentTokenExpired);
    }

    if claims.sub.is_empty() {
        warn!(%request_id, "user id in token is empty");
        return Err(AppError::CurrentInvalidToken);
    }

    Ok(claims)
}

/// Gate for regular API calls.
pub fn authorize_normal(claims: TokenClaims, request_id: &str) -> Result<TokenClaims, AppError> {
    match claims.kind {
        TokenType::Normal => Ok(claims),
        TokenType::Requires2FA => {
            warn!(%request_id, uid = %claims.masked_sub(), "token requires 2fa");
            Err(AppError::CurrentTokenRequire2FA)
        }
        TokenType::Unrecognized(raw) => {
            warn!(%request_id, uid = %claims.masked_sub(), raw, "token type is invalid");
            Err(AppError::CurrentInvalidTokenType)
        }
    }
}

/// Gate for the two factor completion endpoint.
pub fn authorize_two_factor(
    claims: TokenClaims,
    request_id: &str,
) -> Result<TokenClaims, AppError> {
    if claims.kind != TokenType::Requires2FA {
        warn!(%request_id, uid = %claims.masked_sub(), "token does not require 2fa");
        return Err(AppError::CurrentTokenNotRequire2FA);
    }
    Ok(claims)
}

/// Accepts both `Bearer <token>` and a bare token.
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    const NOW: i64 = 1_700_000_000;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "gate-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
            two_factor_ttl_minutes: 5,
        })
    }

    fn claims(sub: &str, kind: TokenType, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: sub.into(),
            kind,
            exp,
            iat: NOW - 10,
            iss: "iss".into(),
            aud: "aud".into(),
        }
    }

    fn token(c: &TokenClaims) -> String {
        keys().sign_claims(c).unwrap()
    }

    #[test]
    fn valid_token_yields_claims() {
        let c = claims("12", TokenType::Normal, NOW + 60);
        let got = get_token_claims(&keys(), &token(&c), NOW, "req").unwrap();
        assert_eq!(got, c);
    }

    #[test]
    fn expiry_is_inclusive_at_the_second() {
        let at_now = claims("12", TokenType::Normal, NOW);
        assert!(get_token_claims(&keys(), &token(&at_now), NOW, "req").is_ok());

        let one_before = claims("12", TokenType::Normal, NOW - 1);
        assert!(matches!(
            get_token_claims(&keys(), &token(&one_before), NOW, "req"),
            Err(AppError::CurrentTokenExpired)
        ));
    }

    #[test]
    fn empty_subject_is_invalid_even_when_signed_and_fresh() {
        let c = claims("", TokenType::Normal, NOW + 60);
        assert!(matches!(
            get_token_claims(&keys(), &token(&c), NOW, "req"),
            Err(AppError::CurrentInvalidToken)
        ));
    }

    #[test]
    fn bad_signature_is_invalid_and_garbage_is_unauthorized() {
        let c = claims("12", TokenType::Normal, NOW + 60);
        let forged = JwtKeys::from_config(&JwtConfig {
            secret: "other".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
            two_factor_ttl_minutes: 5,
        })
        .sign_claims(&c)
        .unwrap();
        assert!(matches!(
            get_token_claims(&keys(), &forged, NOW, "req"),
            Err(AppError::CurrentInvalidToken)
        ));
        assert!(matches!(
            get_token_claims(&keys(), "garbage", NOW, "req"),
            Err(AppError::UnauthorizedAccess)
        ));
    }

    #[test]
    fn normal_gate_routes_token_types() {
        let normal = claims("12", TokenType::Normal, NOW);
        assert!(authorize_normal(normal, "req").is_ok());

        let two_factor = claims("12", TokenType::Requires2FA, NOW);
        assert!(matches!(
            authorize_normal(two_factor, "req"),
            Err(AppError::CurrentTokenRequire2FA)
        ));

        let unknown = claims("12", TokenType::Unrecognized(7), NOW);
        assert!(matches!(
            authorize_normal(unknown, "req"),
            Err(AppError::CurrentInvalidTokenType)
        ));
    }

    #[test]
    fn two_factor_gate_accepts_only_2fa_tokens() {
        let two_factor = claims("12", TokenType::Requires2FA, NOW);
        assert!(authorize_two_factor(two_factor, "req").is_ok());

        for kind in [TokenType::Normal, TokenType::Unrecognized(0)] {
            assert!(matches!(
                authorize_two_factor(claims("12", kind, NOW), "req"),
                Err(AppError::CurrentTokenNotRequire2FA)
            ));
        }
    }

    #[test]
    fn strip_bearer_accepts_prefixed_and_bare() {
        assert_eq!(strip_bearer("Bearer abc"), "abc");
        assert_eq!(strip_bearer("bearer abc"), "abc");
        assert_eq!(strip_bearer("abc"), "abc");
    }
}
