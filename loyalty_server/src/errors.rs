use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use loyalty_engine::traits::{AuthApiError, LedgerError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error")]
    CouldNotDeserializePayload,
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0} is not a valid order number")]
    InvalidOrderNumber(String),
    #[error("Order {0} was already uploaded by another user")]
    OrderConflict(String),
    #[error("The balance does not cover the requested withdrawal")]
    InsufficientFunds,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The login is already taken")]
    LoginUnavailable,
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::CouldNotDeserializePayload => StatusCode::BAD_REQUEST,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderConflict(_) => StatusCode::CONFLICT,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::LoginUnavailable => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(json!({"error": self.to_string()}).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds => ServerError::InsufficientFunds,
            LedgerError::InvalidAmount(sum) => ServerError::InvalidRequestBody(format!("invalid sum: {sum}")),
            e => ServerError::BackendError(e.to_string()),
        }
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::LoginUnavailable(_) => ServerError::LoginUnavailable,
            AuthApiError::InvalidCredentials => ServerError::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::DatabaseError(msg) => ServerError::BackendError(msg),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("The login or password is incorrect.")]
    InvalidCredentials,
    #[error("No bearer token was provided.")]
    MissingToken,
    #[error("The bearer token is malformed or has a bad signature. {0}")]
    ValidationError(String),
    #[error("The bearer token has expired.")]
    ExpiredToken,
}
