use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{repo::UserStore, repo_types::User};
use crate::error::AppResult;

/// In-memory [`UserStore`] used by tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    async fn find_by<F>(&self, pred: F) -> Option<User>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .read()
            .await
            .iter()
            .find(|u| !u.deleted && pred(u))
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_uid(&self, uid: i64) -> AppResult<Option<User>> {
        Ok(self.find_by(|u| u.uid == uid).await)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.find_by(|u| u.username == username).await)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.find_by(|u| u.email == email).await)
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        self.users.write().await.push(user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> AppResult<u64> {
        let mut users = self.users.write().await;
        let Some(row) = users.iter_mut().find(|u| u.uid == user.uid && !u.deleted) else {
            return Ok(0);
        };
        row.email = user.email.clone();
        row.nickname = user.nickname.clone();
        row.password_hash = user.password_hash.clone();
        row.default_currency = user.default_currency.clone();
        row.first_day_of_week = user.first_day_of_week;
        row.transaction_edit_scope = user.transaction_edit_scope;
        row.email_verified = user.email_verified;
        row.updated_unix_time = user.updated_unix_time;
        Ok(1)
    }

    async fn update_last_login(&self, uid: i64, unix_time: i64) -> AppResult<()> {
        if let Some(row) = self
            .users
            .write()
            .await
            .iter_mut()
            .find(|u| u.uid == uid && !u.deleted)
        {
            row.last_login_unix_time = unix_time;
        }
        Ok(())
    }

    async fn update_two_factor(
        &self,
        uid: i64,
        passcode_hash: Option<&str>,
        updated_unix_time: i64,
    ) -> AppResult<u64> {
        let mut users = self.users.write().await;
        let Some(row) = users.iter_mut().find(|u| u.uid == uid && !u.deleted) else {
            return Ok(0);
        };
        row.two_factor_passcode_hash = passcode_hash.map(str::to_string);
        row.updated_unix_time = updated_unix_time;
        Ok(1)
    }
}
