use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{
    edit_scope::{TransactionEditScope, TRANSACTION_EDIT_SCOPE_MAX_INPUT},
    repo_types::{User, WeekDay},
};
use crate::error::{AppError, AppResult};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 100 && EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub(crate) fn is_valid_currency(currency: &str) -> bool {
    currency.len() == 3 && currency.bytes().all(|b| b.is_ascii_uppercase())
}

fn invalid(field: &str) -> AppError {
    AppError::InvalidParameter(field.to_string())
}

pub(crate) fn check_password(password: &str) -> AppResult<()> {
    if !(6..=128).contains(&password.chars().count()) {
        return Err(invalid("password"));
    }
    Ok(())
}

pub(crate) fn check_nickname(nickname: &str) -> AppResult<()> {
    if nickname.trim().is_empty() || nickname.chars().count() > 64 {
        return Err(invalid("nickname"));
    }
    Ok(())
}

pub(crate) fn check_first_day_of_week(value: u8) -> AppResult<WeekDay> {
    match WeekDay::from(value) {
        WeekDay::Invalid(_) => Err(invalid("first_day_of_week")),
        day => Ok(day),
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct UserBasicInfo {
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub default_currency: String,
    pub first_day_of_week: WeekDay,
    pub transaction_edit_scope: TransactionEditScope,
}

impl From<&User> for UserBasicInfo {
    fn from(u: &User) -> Self {
        Self {
            username: u.username.clone(),
            email: u.email.clone(),
            nickname: u.nickname.clone(),
            default_currency: u.default_currency.clone(),
            first_day_of_week: u.first_day_of_week,
            transaction_edit_scope: u.transaction_edit_scope,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfileResponse {
    #[serde(flatten)]
    pub user: UserBasicInfo,
    pub last_login_at: i64,
}

impl From<&User> for UserProfileResponse {
    fn from(u: &User) -> Self {
        Self {
            user: UserBasicInfo::from(u),
            last_login_at: u.last_login_unix_time,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserProfileUpdateRequest {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub password: Option<String>,
    pub old_password: Option<String>,
    pub default_currency: Option<String>,
    pub first_day_of_week: Option<u8>,
    pub transaction_edit_scope: Option<u8>,
}

impl UserProfileUpdateRequest {
    pub fn validate(&mut self) -> AppResult<()> {
        if let Some(email) = self.email.as_mut() {
            *email = email.trim().to_lowercase();
            if !is_valid_email(email) {
                return Err(invalid("email"));
            }
        }
        if let Some(nickname) = self.nickname.as_deref() {
            check_nickname(nickname)?;
        }
        if let Some(password) = self.password.as_deref() {
            check_password(password)?;
            match self.old_password.as_deref() {
                Some(old) => check_password(old)?,
                None => return Err(invalid("old_password")),
            }
        }
        if let Some(currency) = self.default_currency.as_deref() {
            if !is_valid_currency(currency) {
                return Err(invalid("default_currency"));
            }
        }
        if let Some(day) = self.first_day_of_week {
            check_first_day_of_week(day)?;
        }
        if let Some(scope) = self.transaction_edit_scope {
            if scope > TRANSACTION_EDIT_SCOPE_MAX_INPUT {
                return Err(invalid("transaction_edit_scope"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserProfileUpdateResponse {
    pub user: UserBasicInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_token: Option<String>,
}

/// Turns on two factor login with a caller chosen passcode.
#[derive(Debug, Deserialize)]
pub struct TwoFactorEnableRequest {
    pub password: String,
    pub passcode: String,
}

impl TwoFactorEnableRequest {
    pub fn validate(&mut self) -> AppResult<()> {
        self.passcode = self.passcode.trim().to_string();
        let len = self.passcode.chars().count();
        if !(6..=32).contains(&len) || self.passcode.chars().any(char::is_whitespace) {
            return Err(invalid("passcode"));
        }
        check_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct TwoFactorDisableRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TwoFactorStatusResponse {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators() {
        assert!(is_valid_email("someone@example.com"));
        assert!(!is_valid_email("someone.example.com"));
        assert!(is_valid_username("user_01-a"));
        assert!(!is_valid_username("user name"));
        assert!(is_valid_currency("USD"));
        assert!(!is_valid_currency("usd"));
        assert!(!is_valid_currency("EURO"));
    }

    #[test]
    fn edit_scope_accepts_up_to_seven() {
        let mut req = UserProfileUpdateRequest {
            transaction_edit_scope: Some(7),
            ..Default::default()
        };
        assert!(req.validate().is_ok());

        req.transaction_edit_scope = Some(8);
        assert!(matches!(req.validate(), Err(AppError::InvalidParameter(f)) if f == "transaction_edit_scope"));
    }

    #[test]
    fn password_change_requires_old_password() {
        let mut req = UserProfileUpdateRequest {
            password: Some("new-password".into()),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::InvalidParameter(f)) if f == "old_password"));

        req.old_password = Some("old-password".into());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn first_day_of_week_bounds() {
        let mut req = UserProfileUpdateRequest {
            first_day_of_week: Some(6),
            email: Some("  Mixed@Example.COM ".into()),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.email.as_deref(), Some("mixed@example.com"));

        req.first_day_of_week = Some(7);
        assert!(req.validate().is_err());
    }

    #[test]
    fn two_factor_passcode_bounds() {
        let mut req = TwoFactorEnableRequest {
            password: "secret123".into(),
            passcode: " 123456 ".into(),
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.passcode, "123456");

        req.passcode = "12345".into();
        assert!(matches!(req.validate(), Err(AppError::InvalidParameter(f)) if f == "passcode"));

        req.passcode = "123 456".into();
        assert!(req.validate().is_err());
    }
}
