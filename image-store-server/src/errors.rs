use std::io;
use std::path::PathBuf;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::StoreError;
use thiserror::Error;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";


#[derive(Debug, Error)]
pub enum TransferErr {
    #[error("Unexpected request body data: {0}")]
    InvalidRequest(String),

    #[error("File with that name already exists in the database.")]
    AlreadyExists(String),

    // lost the race between the existence check and the write
    #[error("File with that name already exists in the database.")]
    DuplicateName(String),

    #[error("No image named {0:?} in the database.")]
    NotFound(String),

    #[error("Image {filename:?} is corrupted: {reason}")]
    Corrupted { filename: String, reason: String },

    #[error("Reading image file {} failed: {source}", .path.display())]
    SourceUnreadable { path: PathBuf, source: io::Error },

    #[error("Writing image file {} failed: {source}", .path.display())]
    DestinationUnwritable { path: PathBuf, source: io::Error },

    #[error("Image database is unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Request worker failed")]
    Worker(#[from] BlockingError),
}

impl From<StoreError> for TransferErr {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateName(name) => TransferErr::DuplicateName(name),
            StoreError::NotFound(name) => TransferErr::NotFound(name),
            StoreError::Corrupted { filename, reason } => TransferErr::Corrupted { filename, reason },
            StoreError::Unavailable(_) | StoreError::InvalidConnectionString(_) => {
                TransferErr::StoreUnavailable(e.to_string())
            }
        }
    }
}

impl ResponseError for TransferErr {
    fn status_code(&self) -> StatusCode {
        match self {
            TransferErr::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TransferErr::AlreadyExists(_) | TransferErr::DuplicateName(_) => StatusCode::CONFLICT,
            TransferErr::NotFound(_) => StatusCode::NOT_FOUND,
            TransferErr::SourceUnreadable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            TransferErr::Corrupted { .. }
            | TransferErr::DestinationUnwritable { .. }
            | TransferErr::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TransferErr::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(TEXT_PLAIN)
            .body(self.to_string())
    }
}
