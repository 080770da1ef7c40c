// errors.rs
use thiserror::Error;

use crate::auth::email_change::EmailChangeError;

/// Errors originating from either the server logic
/// (routing, missing resources, auth) or downstream layers (DB, mail).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Internal Server Error")]
    InternalError,

    #[error(transparent)]
    EmailChange(#[from] EmailChangeError),
}

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden => 403,
            ServerError::DbError(_) | ServerError::InternalError => 500,
            ServerError::EmailChange(e) => e.status(),
        }
    }

    /// Message safe to show to a client. Database details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServerError::DbError(_) => "Database Error".to_string(),
            ServerError::BadRequest(msg) | ServerError::Unauthorized(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}
