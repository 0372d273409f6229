use std::io::Error as IoError;

use actix_web::ResponseError;
use actix_web::http::StatusCode;
use pingo_service::Error as ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Bad query bounds are the caller's fault, everything else is ours.
/// The body is the plain-text error message.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Service(e) if e.is_invalid_time_format() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
