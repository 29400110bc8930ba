use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use order_sync_engine::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("The order store is unavailable. {0}")]
    StoreUnavailable(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("The batch could not be run. {0}")]
    BatchFailed(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BatchFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).insert_header(ContentType::plaintext()).body(format!("{self}\n"))
    }
}

impl From<SyncError> for ServerError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::StoreUnavailable(_) => Self::StoreUnavailable(e.to_string()),
            SyncError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            SyncError::InvalidTransition(_) => Self::InvalidTransition(e.to_string()),
            e => Self::BatchFailed(e.to_string()),
        }
    }
}
