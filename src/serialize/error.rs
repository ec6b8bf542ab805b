use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_derive::{Deserialize, Serialize};

pub const INVALID_DATA: &str = "Invalid data";
pub const VERIFICATION_FAILED: &str = "Signature verification failed!";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorRes {
    pub error: String,
}

/// Error returned by handlers. Whatever is in `message` goes to the client verbatim, so
/// only the fixed public messages above should end up here.
#[derive(Debug, Clone, PartialEq)]
pub struct AppError {
    pub code: u16,
    pub message: String,
}

impl AppError {
    pub fn new(code: u16) -> Self {
        AppError {
            code,
            message: String::new(),
        }
    }

    pub fn message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn invalid_data() -> Self {
        AppError::new(422).message(INVALID_DATA)
    }

    pub fn verification_failed() -> Self {
        AppError::new(401).message(VERIFICATION_FAILED)
    }

    pub fn internal() -> Self {
        AppError::new(500).message(INTERNAL_SERVER_ERROR)
    }

    pub fn unavailable() -> Self {
        AppError::new(503).message(SERVICE_UNAVAILABLE)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorRes {
            error: self.message.clone(),
        })
    }
}
