use log::*;

use crate::{
    db_types::{NewUser, User},
    helpers::{hash_password, verify_password},
    traits::{AuthApiError, UserManagement},
};

/// `AuthApi` handles user registration and credential checks.
#[derive(Debug, Clone)]
pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    pub async fn register(&self, login: &str, password: &str) -> Result<User, AuthApiError> {
        let user = NewUser { login: login.to_string(), password_hash: hash_password(password) };
        let user = self.db.create_user(user).await?;
        info!("🧑️ New user registered: {}", user.login);
        Ok(user)
    }

    /// Verifies the login/password pair. An unknown login and a wrong password are deliberately indistinguishable
    /// to the caller.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<User, AuthApiError> {
        let user = self.db.fetch_user_by_login(login).await?.ok_or(AuthApiError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash) {
            debug!("🧑️ Failed login attempt for {login}");
            return Err(AuthApiError::InvalidCredentials);
        }
        Ok(user)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
