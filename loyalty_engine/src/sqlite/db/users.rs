use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::AuthApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let result: Result<User, sqlx::Error> = sqlx::query_as(
        r#"
        INSERT INTO users (login, password_hash)
        VALUES ($1, $2)
        RETURNING *;
        "#,
    )
    .bind(user.login.clone())
    .bind(user.password_hash)
    .fetch_one(conn)
    .await;
    match result {
        Ok(created) => {
            debug!("🧑️ User {} registered with id #{}", created.login, created.id);
            Ok(created)
        },
        // The login column carries a UNIQUE constraint; a violation means the name is taken.
        Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
            Err(AuthApiError::LoginUnavailable(user.login))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user_by_login(login: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE login = $1").bind(login).fetch_optional(conn).await?;
    Ok(user)
}
