use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Authorization type carried in a token.
///
/// Unknown raw values survive decoding so the gate can reject them with a
/// dedicated error instead of failing to parse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "u8", into = "u8")]
pub enum TokenType {
    Normal,
    Requires2FA,
    Unrecognized(u8),
}

impl From<u8> for TokenType {
    fn from(value: u8) -> Self {
        match value {
            1 => TokenType::Normal,
            2 => TokenType::Requires2FA,
            other => TokenType::Unrecognized(other),
        }
    }
}

impl From<TokenType> for u8 {
    fn from(value: TokenType) -> Self {
        match value {
            TokenType::Normal => 1,
            TokenType::Requires2FA => 2,
            TokenType::Unrecognized(other) => other,
        }
    }
}

/// JWT payload; built per request and never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Decimal user id.
    #[serde(default)]
    pub sub: String,
    #[serde(rename = "type")]
    pub kind: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

impl TokenClaims {
    pub fn uid(&self) -> Result<i64, AppError> {
        match self.sub.parse::<i64>() {
            Ok(uid) if uid > 0 => Ok(uid),
            _ => Err(AppError::UserIdInvalid),
        }
    }

    /// Subject for log lines: only the trailing digits are kept.
    pub fn masked_sub(&self) -> String {
        let skip = self.sub.chars().count().saturating_sub(4);
        let tail: String = self.sub.chars().skip(skip).collect();
        format!("***{tail}")
    }
}
