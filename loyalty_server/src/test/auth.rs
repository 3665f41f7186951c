use chrono::{Duration, Utc};
use lp_common::Secret;
use loyalty_engine::db_types::User;

use crate::{
    auth::TokenIssuer,
    config::AuthConfig,
    errors::AuthError,
};

fn test_user() -> User {
    User { id: 42, login: "alice".to_string(), password_hash: "irrelevant".to_string(), created_at: Utc::now() }
}

fn config_with_secret(secret: &str) -> AuthConfig {
    AuthConfig { secret: Secret::new(secret.to_string()), token_expiry: Duration::hours(1) }
}

#[test]
fn token_round_trip() {
    let issuer = TokenIssuer::new(&config_with_secret("test-secret"));
    let token = issuer.issue(&test_user()).unwrap();
    let claims = issuer.validate(&token).unwrap();
    assert_eq!(claims.sub, 42);
    assert_eq!(claims.login, "alice");
    assert!(claims.exp > Utc::now().timestamp());
}

#[test]
fn tampered_tokens_are_rejected() {
    let issuer = TokenIssuer::new(&config_with_secret("test-secret"));
    let token = issuer.issue(&test_user()).unwrap();
    // Flip a character in the claims segment.
    let mut parts: Vec<String> = token.split('.').map(String::from).collect();
    let mut claims: Vec<char> = parts[1].chars().collect();
    claims[0] = if claims[0] == 'A' { 'B' } else { 'A' };
    parts[1] = claims.into_iter().collect();
    let tampered = parts.join(".");
    assert!(matches!(issuer.validate(&tampered), Err(AuthError::ValidationError(_))));
}

#[test]
fn tokens_from_another_key_are_rejected() {
    let issuer = TokenIssuer::new(&config_with_secret("test-secret"));
    let impostor = TokenIssuer::new(&config_with_secret("other-secret"));
    let token = impostor.issue(&test_user()).unwrap();
    assert!(matches!(issuer.validate(&token), Err(AuthError::ValidationError(_))));
}

#[test]
fn expired_tokens_are_rejected() {
    let config = AuthConfig { secret: Secret::new("test-secret".to_string()), token_expiry: Duration::hours(-1) };
    let issuer = TokenIssuer::new(&config);
    let token = issuer.issue(&test_user()).unwrap();
    assert!(matches!(issuer.validate(&token), Err(AuthError::ExpiredToken)));
}

#[test]
fn garbage_tokens_are_rejected() {
    let issuer = TokenIssuer::new(&config_with_secret("test-secret"));
    for garbage in ["", "a.b", "not even a token", "a.b.c.d"] {
        assert!(issuer.validate(garbage).is_err(), "{garbage:?} should not validate");
    }
}
