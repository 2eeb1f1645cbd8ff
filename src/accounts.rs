//! Registration, login and account removal.

use sqlx::SqlitePool;

use crate::{
    auth,
    db::WriteLock,
    error::{require_text, AppError, AppResult},
    model::{User, UserId},
    store,
};

#[derive(Debug, Clone)]
pub struct Accounts {
    pool: SqlitePool,
    jwt_secret: String,
    token_ttl_secs: u64,
    writes: WriteLock,
}

impl Accounts {
    pub fn new(
        pool: SqlitePool,
        jwt_secret: impl Into<String>,
        token_ttl_secs: u64,
        writes: WriteLock,
    ) -> Self {
        Self {
            pool,
            jwt_secret: jwt_secret.into(),
            token_ttl_secs,
            writes,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<User> {
        let username = require_text(username, "Username")?;
        if password.is_empty() {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        let password_hash = auth::hash_password(password)?;
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        if store::find_user_by_username(&mut tx, username).await?.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        let user = store::insert_user(&mut tx, username, &password_hash).await?;
        tx.commit().await?;
        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Returns the user and a fresh bearer token.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(User, String)> {
        let mut conn = self.pool.acquire().await?;
        let user = store::find_user_by_username(&mut conn, username.trim())
            .await?
            .filter(|user| auth::verify_password(password, &user.password_hash))
            .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;
        let token = auth::issue_token(&user, &self.jwt_secret, self.token_ttl_secs)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok((user, token))
    }

    pub async fn find(&self, user_id: UserId) -> AppResult<User> {
        let mut conn = self.pool.acquire().await?;
        store::find_user(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    /// Removes the user together with every list and item they own.
    pub async fn delete_account(&self, user_id: UserId) -> AppResult<()> {
        let _write = self.writes.lock().await;
        let mut tx = self.pool.begin().await?;
        let lists = store::lists_for_user(&mut tx, user_id).await?;
        let mut items = 0;
        for list in &lists {
            items += store::delete_items_in_list(&mut tx, list.id).await?;
            store::delete_list(&mut tx, list.id).await?;
        }
        if store::delete_user(&mut tx, user_id).await? == 0 {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        tx.commit().await?;
        tracing::info!(user_id, lists = lists.len(), items, "account deleted");
        Ok(())
    }
}
