use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::User;
use crate::error::AppResult;

const USER_COLUMNS: &str = "uid, username, email, nickname, password_hash, \
     two_factor_passcode_hash, default_currency, first_day_of_week, \
     transaction_edit_scope, deleted, email_verified, created_unix_time, \
     updated_unix_time, deleted_unix_time, last_login_unix_time";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_uid(&self, uid: i64) -> AppResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn insert(&self, user: &User) -> AppResult<()>;
    /// Writes the editable profile columns; returns the number of rows hit.
    async fn update_profile(&self, user: &User) -> AppResult<u64>;
    async fn update_last_login(&self, uid: i64, unix_time: i64) -> AppResult<()>;
    /// Sets or clears the two factor passcode hash.
    async fn update_two_factor(
        &self,
        uid: i64,
        passcode_hash: Option<&str>,
        updated_unix_time: i64,
    ) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1 AND deleted = FALSE"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_uid(&self, uid: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE uid = $1 AND deleted = FALSE");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(uid)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO users (uid, username, email, nickname, password_hash,
                               two_factor_passcode_hash, default_currency,
                               first_day_of_week, transaction_edit_scope, deleted,
                               email_verified, created_unix_time, updated_unix_time,
                               deleted_unix_time, last_login_unix_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(user.uid)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(&user.two_factor_passcode_hash)
        .bind(&user.default_currency)
        .bind(i16::from(u8::from(user.first_day_of_week)))
        .bind(i16::from(u8::from(user.transaction_edit_scope)))
        .bind(user.deleted)
        .bind(user.email_verified)
        .bind(user.created_unix_time)
        .bind(user.updated_unix_time)
        .bind(user.deleted_unix_time)
        .bind(user.last_login_unix_time)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET email = $1, nickname = $2, password_hash = $3, default_currency = $4,
                   first_day_of_week = $5, transaction_edit_scope = $6,
                   email_verified = $7, updated_unix_time = $8
             WHERE uid = $9 AND deleted = FALSE
            "#,
        )
        .bind(&user.email)
        .bind(&user.nickname)
        .bind(&user.password_hash)
        .bind(&user.default_currency)
        .bind(i16::from(u8::from(user.first_day_of_week)))
        .bind(i16::from(u8::from(user.transaction_edit_scope)))
        .bind(user.email_verified)
        .bind(user.updated_unix_time)
        .bind(user.uid)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    async fn update_last_login(&self, uid: i64, unix_time: i64) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_unix_time = $1 WHERE uid = $2 AND deleted = FALSE")
            .bind(unix_time)
            .bind(uid)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn update_two_factor(
        &self,
        uid: i64,
        passcode_hash: Option<&str>,
        updated_unix_time: i64,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
               SET two_factor_passcode_hash = $1, updated_unix_time = $2
             WHERE uid = $3 AND deleted = FALSE
            "#,
        )
        .bind(passcode_hash)
        .bind(updated_unix_time)
        .bind(uid)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }
}
