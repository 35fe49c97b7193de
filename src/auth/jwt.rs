use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{TokenClaims, TokenType};
use crate::config::JwtConfig;

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    pub two_factor_ttl: Duration,
}

/// Outcome of checking a token that was at least structurally readable.
#[derive(Debug)]
pub enum ParsedToken {
    Valid(TokenClaims),
    /// Signature, issuer, audience or algorithm was rejected.
    Invalid(ErrorKind),
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::from_secs((config.ttl_minutes.max(0) as u64) * 60),
            two_factor_ttl: Duration::from_secs((config.two_factor_ttl_minutes.max(0) as u64) * 60),
        }
    }

    pub fn sign_claims(&self, claims: &TokenClaims) -> anyhow::Result<String> {
        let token = encode(&Header::default(), claims, &self.encoding)?;
        debug!(kind = ?claims.kind, "jwt signed");
        Ok(token)
    }

    pub fn sign(&self, uid: i64, kind: TokenType) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenType::Requires2FA => self.two_factor_ttl,
            _ => self.ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        self.sign_claims(&TokenClaims {
            sub: uid.to_string(),
            kind,
            exp: exp.unix_timestamp(),
            iat: now.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        })
    }

    pub fn sign_normal(&self, uid: i64) -> anyhow::Result<String> {
        self.sign(uid, TokenType::Normal)
    }

    pub fn sign_requires_2fa(&self, uid: i64) -> anyhow::Result<String> {
        self.sign(uid, TokenType::Requires2FA)
    }

    /// Decodes and checks the signature.
    ///
    /// Expiry is not checked here; the caller compares `exp` against its own
    /// clock. Errors are tokens that could not be read at all.
    pub fn parse(&self, token: &str) -> Result<ParsedToken, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        match decode::<TokenClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(ParsedToken::Valid(data.claims)),
            Err(err) => match err.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::ImmatureSignature => Ok(ParsedToken::Invalid(err.into_kind())),
                _ => Err(err),
            },
        }
    }
}
