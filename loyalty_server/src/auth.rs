//! Bearer-token authentication.
//!
//! Tokens are standard HS256 JWTs: `base64url(header).base64url(claims).base64url(hmac-sha256(signature))`, signed
//! with the key from [`AuthConfig`]. The [`JwtClaims`] extractor makes a protected route as simple as adding a
//! `claims: JwtClaims` parameter to the handler.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::Utc;
use hmac::{Hmac, Mac};
use log::debug;
use loyalty_engine::db_types::User;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The internal user id.
    pub sub: i64,
    pub login: String,
    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: AuthConfig,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { config: config.clone() }
    }

    pub fn issue(&self, user: &User) -> Result<String, ServerError> {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        let claims = JwtClaims {
            sub: user.id,
            login: user.login.clone(),
            exp: (Utc::now() + self.config.token_expiry).timestamp(),
        };
        let header = encode_part(&header).map_err(ServerError::Unspecified)?;
        let claims = encode_part(&claims).map_err(ServerError::Unspecified)?;
        let signature = self.sign(&format!("{header}.{claims}"));
        Ok(format!("{header}.{claims}.{signature}"))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let mut parts = token.splitn(3, '.');
        let (Some(header), Some(claims), Some(signature)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(AuthError::ValidationError("token does not have three parts".to_string()));
        };
        let mut mac = self.keyed_mac();
        mac.update(format!("{header}.{claims}").as_bytes());
        let signature = base64::decode_config(signature, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        mac.verify_slice(&signature).map_err(|_| AuthError::ValidationError("signature mismatch".to_string()))?;
        let claims = base64::decode_config(claims, base64::URL_SAFE_NO_PAD)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let claims: JwtClaims =
            serde_json::from_slice(&claims).map_err(|e| AuthError::ValidationError(e.to_string()))?;
        if claims.exp <= Utc::now().timestamp() {
            debug!("🔑️ Rejecting expired token for {}", claims.login);
            return Err(AuthError::ExpiredToken);
        }
        Ok(claims)
    }

    fn sign(&self, message: &str) -> String {
        let mut mac = self.keyed_mac();
        mac.update(message.as_bytes());
        base64::encode_config(mac.finalize().into_bytes(), base64::URL_SAFE_NO_PAD)
    }

    fn keyed_mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length, so new_from_slice cannot fail here.
        HmacSha256::new_from_slice(self.config.secret.reveal().as_bytes()).expect("HMAC accepts any key length")
    }
}

fn encode_part<T: Serialize>(value: &T) -> Result<String, String> {
    let bytes = serde_json::to_vec(value).map_err(|e| e.to_string())?;
    Ok(base64::encode_config(bytes, base64::URL_SAFE_NO_PAD))
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = (|| {
            let issuer = req
                .app_data::<web::Data<TokenIssuer>>()
                .ok_or_else(|| ServerError::InitializeError("TokenIssuer is not configured".to_string()))?;
            let header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .ok_or(AuthError::MissingToken)?;
            let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
            let claims = issuer.validate(token)?;
            Ok(claims)
        })();
        ready(result)
    }
}
