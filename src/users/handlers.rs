use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{
        TwoFactorDisableRequest, TwoFactorEnableRequest, TwoFactorStatusResponse, UserBasicInfo,
        UserProfileResponse, UserProfileUpdateRequest, UserProfileUpdateResponse,
    },
    edit_scope::TransactionEditScope,
    repo_types::{User, WeekDay},
};
use crate::{
    auth::{
        extractors::NormalAuth,
        password::{hash_secret, verify_secret},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile))
        .route("/users/profile/update", post(update_profile))
        .route("/users/2fa/enable", post(enable_two_factor))
        .route("/users/2fa/disable", post(disable_two_factor))
}

/// Loads the caller's user row.
pub(crate) async fn current_user(state: &AppState, uid: i64) -> AppResult<User> {
    match state.users.find_by_uid(uid).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!(uid, "user not found");
            Err(AppError::UserNotFound)
        }
        Err(e) => {
            error!(error = %e, uid, "failed to load user");
            Err(e)
        }
    }
}

#[instrument(skip(state, claims))]
pub async fn get_profile(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
) -> AppResult<Json<UserProfileResponse>> {
    let user = current_user(&state, claims.uid()?).await?;
    Ok(Json(UserProfileResponse::from(&user)))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(mut payload): Json<UserProfileUpdateRequest>,
) -> AppResult<Json<UserProfileUpdateResponse>> {
    payload.validate()?;
    let uid = claims.uid()?;
    let mut user = current_user(&state, uid).await?;
    let mut changed = false;
    let mut password_changed = false;

    if let Some(email) = payload.email.filter(|e| *e != user.email) {
        if state.users.find_by_email(&email).await?.is_some() {
            warn!(uid, "email already used by another user");
            return Err(AppError::UserEmailAlreadyExists);
        }
        user.email = email;
        user.email_verified = false;
        changed = true;
    }

    if let Some(nickname) = payload.nickname.filter(|n| *n != user.nickname) {
        user.nickname = nickname;
        changed = true;
    }

    if let Some(password) = payload.password {
        let old_password = payload.old_password.unwrap_or_default();
        if !verify_secret(&old_password, &user.password_hash)? {
            warn!(uid, "old password is wrong");
            return Err(AppError::UserPasswordWrong);
        }
        if !verify_secret(&password, &user.password_hash)? {
            user.password_hash = hash_secret(&password)?;
            changed = true;
            password_changed = true;
        }
    }

    if let Some(currency) = payload.default_currency.filter(|c| *c != user.default_currency) {
        user.default_currency = currency;
        changed = true;
    }

    if let Some(day) = payload.first_day_of_week {
        let day = WeekDay::from(day);
        if day != user.first_day_of_week {
            user.first_day_of_week = day;
            changed = true;
        }
    }

    if let Some(scope) = payload.transaction_edit_scope {
        let scope = TransactionEditScope::from(scope);
        if scope != user.transaction_edit_scope {
            user.transaction_edit_scope = scope;
            changed = true;
        }
    }

    if !changed {
        return Err(AppError::NothingWillBeUpdated);
    }

    user.updated_unix_time = OffsetDateTime::now_utc().unix_timestamp();
    if state.users.update_profile(&user).await? < 1 {
        return Err(AppError::UserNotFound);
    }

    let new_token = if password_changed {
        Some(
            state
                .keys
                .sign_normal(uid)
                .map_err(|e| AppError::Internal(e.to_string()))?,
        )
    } else {
        None
    };

    info!(uid, scope = %user.transaction_edit_scope, "user profile updated");
    Ok(Json(UserProfileUpdateResponse {
        user: UserBasicInfo::from(&user),
        new_token,
    }))
}

fn check_current_password(user: &User, password: &str) -> AppResult<()> {
    if !verify_secret(password, &user.password_hash)? {
        warn!(uid = user.uid, "password is wrong");
        return Err(AppError::UserPasswordWrong);
    }
    Ok(())
}

#[instrument(skip(state, claims, payload))]
pub async fn enable_two_factor(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(mut payload): Json<TwoFactorEnableRequest>,
) -> AppResult<Json<TwoFactorStatusResponse>> {
    payload.validate()?;
    let uid = claims.uid()?;
    let user = current_user(&state, uid).await?;
    check_current_password(&user, &payload.password)?;

    let passcode_hash = hash_secret(&payload.passcode)?;
    let now = OffsetDateTime::now_utc().unix_timestamp();
    if state
        .users
        .update_two_factor(uid, Some(&passcode_hash), now)
        .await?
        < 1
    {
        return Err(AppError::UserNotFound);
    }

    info!(uid, "two factor enabled");
    Ok(Json(TwoFactorStatusResponse { enabled: true }))
}

#[instrument(skip(state, claims, payload))]
pub async fn disable_two_factor(
    State(state): State<AppState>,
    NormalAuth(claims): NormalAuth,
    Json(payload): Json<TwoFactorDisableRequest>,
) -> AppResult<Json<TwoFactorStatusResponse>> {
    let uid = claims.uid()?;
    let user = current_user(&state, uid).await?;
    check_current_password(&user, &payload.password)?;

    if !user.two_factor_enabled() {
        return Err(AppError::NothingWillBeUpdated);
    }

    let now = OffsetDateTime::now_utc().unix_timestamp();
    if state.users.update_two_factor(uid, None, now).await? < 1 {
        return Err(AppError::UserNotFound);
    }

    info!(uid, "two factor disabled");
    Ok(Json(TwoFactorStatusResponse { enabled: false }))
}
