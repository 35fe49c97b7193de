use axum::{extract::State, routing::post, Json, Router};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest, TwoFactorLoginRequest},
    extractors::TwoFactorAuth,
    password::{hash_secret, verify_secret},
};
use crate::{
    db::generate_id,
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::UserBasicInfo, edit_scope::TransactionEditScope, handlers::current_user,
        repo_types::User,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/2fa/authorize", post(authorize_two_factor))
}

fn signing_failed(e: anyhow::Error) -> AppError {
    error!(error = %e, "jwt sign failed");
    AppError::Internal("failed to issue token".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.validate()?;

    if state.users.find_by_username(&payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already registered");
        return Err(AppError::UserNameAlreadyExists);
    }
    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::UserEmailAlreadyExists);
    }

    let now = OffsetDateTime::now_utc().unix_timestamp();
    let user = User {
        uid: generate_id(),
        username: payload.username,
        email: payload.email,
        nickname: payload.nickname,
        password_hash: hash_secret(&payload.password)?,
        two_factor_passcode_hash: None,
        default_currency: payload.default_currency,
        first_day_of_week: payload.first_day_of_week.into(),
        transaction_edit_scope: TransactionEditScope::All,
        deleted: false,
        email_verified: false,
        created_unix_time: now,
        updated_unix_time: now,
        deleted_unix_time: 0,
        last_login_unix_time: now,
    };

    if let Err(e) = state.users.insert(&user).await {
        error!(error = %e, "create user failed");
        return Err(e);
    }

    let token = state.keys.sign_normal(user.uid).map_err(signing_failed)?;

    info!(uid = user.uid, "user registered");
    Ok(Json(AuthResponse {
        token,
        need_2fa: false,
        user: Some(UserBasicInfo::from(&user)),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let login_name = payload.login_name.trim();
    if login_name.is_empty() || login_name.len() > 100 {
        return Err(AppError::InvalidParameter("login_name".into()));
    }

    let found = if login_name.contains('@') {
        state.users.find_by_email(&login_name.to_lowercase()).await?
    } else {
        state.users.find_by_username(login_name).await?
    };

    let Some(user) = found else {
        warn!(login_name, "login unknown user");
        return Err(AppError::LoginNameOrPasswordWrong);
    };

    if !verify_secret(&payload.password, &user.password_hash)? {
        warn!(uid = user.uid, "login invalid password");
        return Err(AppError::LoginNameOrPasswordWrong);
    }

    let now = OffsetDateTime::now_utc().unix_timestamp();
    state.users.update_last_login(user.uid, now).await?;

    if user.two_factor_enabled() {
        let token = state.keys.sign_requires_2fa(user.uid).map_err(signing_failed)?;
        info!(uid = user.uid, "user logged in, two factor pending");
        return Ok(Json(AuthResponse {
            token,
            need_2fa: true,
            user: None,
        }));
    }

    let token = state.keys.sign_normal(user.uid).map_err(signing_failed)?;
    info!(uid = user.uid, "user logged in");
    Ok(Json(AuthResponse {
        token,
        need_2fa: false,
        user: Some(UserBasicInfo::from(&user)),
    }))
}

#[instrument(skip(state, claims, payload))]
pub async fn authorize_two_factor(
    State(state): State<AppState>,
    TwoFactorAuth(claims): TwoFactorAuth,
    Json(payload): Json<TwoFactorLoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let uid = claims.uid()?;
    let user = current_user(&state, uid).await?;

    let Some(passcode_hash) = user.two_factor_passcode_hash.as_deref() else {
        warn!(uid, "two factor is not enabled");
        return Err(AppError::TwoFactorPasscodeInvalid);
    };

    if !verify_secret(payload.passcode.trim(), passcode_hash)? {
        warn!(uid, "two factor passcode is invalid");
        return Err(AppError::TwoFactorPasscodeInvalid);
    }

    let token = state.keys.sign_normal(uid).map_err(signing_failed)?;
    info!(uid, "two factor authorization completed");
    Ok(Json(AuthResponse {
        token,
        need_2fa: false,
        user: Some(UserBasicInfo::from(&user)),
    }))
}
