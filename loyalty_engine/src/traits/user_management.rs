use thiserror::Error;

use crate::db_types::{NewUser, User};

/// User account registration and lookup.
#[allow(async_fn_in_trait)]
pub trait UserManagement: Clone {
    /// Creates a new user account. The login must be unique; a duplicate is reported as
    /// [`AuthApiError::LoginUnavailable`].
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, AuthApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("The login {0} is already taken")]
    LoginUnavailable(String),
    #[error("The login or password is incorrect")]
    InvalidCredentials,
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}
