use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("unauthorized access")]
    UnauthorizedAccess,

    #[error("current token is invalid")]
    CurrentInvalidToken,

    #[error("current token is expired")]
    CurrentTokenExpired,

    #[error("current token type is invalid")]
    CurrentInvalidTokenType,

    #[error("current token requires two factor authorization")]
    CurrentTokenRequire2FA,

    #[error("current token does not require two factor authorization")]
    CurrentTokenNotRequire2FA,

    #[error("user id is invalid")]
    UserIdInvalid,

    #[error("user not found")]
    UserNotFound,

    #[error("username already exists")]
    UserNameAlreadyExists,

    #[error("email already exists")]
    UserEmailAlreadyExists,

    #[error("login name or password is wrong")]
    LoginNameOrPasswordWrong,

    #[error("password is wrong")]
    UserPasswordWrong,

    #[error("two factor passcode is invalid")]
    TwoFactorPasscodeInvalid,

    #[error("nothing will be updated")]
    NothingWillBeUpdated,

    #[error("transaction category id is invalid")]
    TransactionCategoryIdInvalid,

    #[error("transaction category not found")]
    TransactionCategoryNotFound,

    #[error("parent transaction category not found")]
    TransactionCategoryParentNotFound,

    #[error("parent transaction category is not a top level category")]
    TransactionCategoryParentIsNotTopLevel,

    #[error("transaction category type does not match its parent")]
    TransactionCategoryTypeMismatch,

    #[error("timezone offset is invalid")]
    InvalidTimezoneOffset,

    #[error("exchange rates data source is invalid")]
    InvalidExchangeRatesDataSource,

    #[error("parameter is invalid: {0}")]
    InvalidParameter(String),

    #[error("database operation failed: {0}")]
    DatabaseOperationFailed(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    /// Stable machine-readable identifier returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            AppError::CurrentInvalidToken => "CURRENT_INVALID_TOKEN",
            AppError::CurrentTokenExpired => "CURRENT_TOKEN_EXPIRED",
            AppError::CurrentInvalidTokenType => "CURRENT_INVALID_TOKEN_TYPE",
            AppError::CurrentTokenRequire2FA => "CURRENT_TOKEN_REQUIRE_2FA",
            AppError::CurrentTokenNotRequire2FA => "CURRENT_TOKEN_NOT_REQUIRE_2FA",
            AppError::UserIdInvalid => "USER_ID_INVALID",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::UserNameAlreadyExists => "USER_NAME_ALREADY_EXISTS",
            AppError::UserEmailAlreadyExists => "USER_EMAIL_ALREADY_EXISTS",
            AppError::LoginNameOrPasswordWrong => "LOGIN_NAME_OR_PASSWORD_WRONG",
            AppError::UserPasswordWrong => "USER_PASSWORD_WRONG",
            AppError::TwoFactorPasscodeInvalid => "TWO_FACTOR_PASSCODE_INVALID",
            AppError::NothingWillBeUpdated => "NOTHING_WILL_BE_UPDATED",
            AppError::TransactionCategoryIdInvalid => "TRANSACTION_CATEGORY_ID_INVALID",
            AppError::TransactionCategoryNotFound => "TRANSACTION_CATEGORY_NOT_FOUND",
            AppError::TransactionCategoryParentNotFound => "TRANSACTION_CATEGORY_PARENT_NOT_FOUND",
            AppError::TransactionCategoryParentIsNotTopLevel => {
                "TRANSACTION_CATEGORY_PARENT_IS_NOT_TOP_LEVEL"
            }
            AppError::TransactionCategoryTypeMismatch => "TRANSACTION_CATEGORY_TYPE_MISMATCH",
            AppError::InvalidTimezoneOffset => "INVALID_TIMEZONE_OFFSET",
            AppError::InvalidExchangeRatesDataSource => "INVALID_EXCHANGE_RATES_DATA_SOURCE",
            AppError::InvalidParameter(_) => "INVALID_PARAMETER",
            AppError::DatabaseOperationFailed(_) => "DATABASE_OPERATION_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnauthorizedAccess
            | AppError::CurrentInvalidToken
            | AppError::CurrentTokenExpired
            | AppError::CurrentInvalidTokenType
            | AppError::CurrentTokenRequire2FA
            | AppError::CurrentTokenNotRequire2FA
            | AppError::LoginNameOrPasswordWrong
            | AppError::TwoFactorPasscodeInvalid => StatusCode::UNAUTHORIZED,
            AppError::UserNotFound
            | AppError::TransactionCategoryNotFound
            | AppError::TransactionCategoryParentNotFound => StatusCode::NOT_FOUND,
            AppError::UserNameAlreadyExists | AppError::UserEmailAlreadyExists => {
                StatusCode::CONFLICT
            }
            AppError::DatabaseOperationFailed(_)
            | AppError::InvalidExchangeRatesDataSource
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        // Store errors carry driver details that stay in the logs.
        let message = match self {
            AppError::DatabaseOperationFailed(_) => "database operation failed".to_string(),
            other => other.to_string(),
        };
        ErrorResponse {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_error_response())).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
