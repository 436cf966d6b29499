use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use statuswatch::error::{ConfigError, RegistryError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Startup(#[from] anyhow::Error),
}

/// Errors returned from request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("target registry unavailable: {0}")]
    Registry(#[from] RegistryError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
