use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    users::dto::{
        check_first_day_of_week, check_nickname, check_password, is_valid_currency,
        is_valid_email, is_valid_username, UserBasicInfo,
    },
};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub default_currency: String,
    #[serde(default)]
    pub first_day_of_week: u8,
}

impl RegisterRequest {
    pub fn validate(&mut self) -> AppResult<()> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();

        if !is_valid_username(&self.username) {
            return Err(AppError::InvalidParameter("username".into()));
        }
        if !is_valid_email(&self.email) {
            return Err(AppError::InvalidParameter("email".into()));
        }
        check_nickname(&self.nickname)?;
        check_password(&self.password)?;
        if !is_valid_currency(&self.default_currency) {
            return Err(AppError::InvalidParameter("default_currency".into()));
        }
        check_first_day_of_week(self.first_day_of_week)?;
        Ok(())
    }
}

/// Request body for login; the login name is a username or an email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TwoFactorLoginRequest {
    pub passcode: String,
}

/// Response returned after register, login or two factor completion.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub need_2fa: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserBasicInfo>,
}
