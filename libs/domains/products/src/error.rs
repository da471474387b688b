use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    Validation(String),

    /// The store failed for a reason other than a missing record. The cause
    /// is logged when this is created and never sent to clients.
    #[error("Something went wrong")]
    Internal,
}

pub type ProductResult<T> = Result<T, ProductError>;

impl ProductError {
    /// Shared translation from store errors.
    ///
    /// Missing records (on read, update, or delete) become `NotFound`;
    /// everything else becomes `Internal`.
    pub fn from_store(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => ProductError::NotFound,
            other => {
                tracing::error!(error = %other, "Product store operation failed");
                ProductError::Internal
            }
        }
    }
}

impl From<DbErr> for ProductError {
    fn from(err: DbErr) -> Self {
        Self::from_store(err)
    }
}

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        let message = err.to_string();
        match err {
            ProductError::NotFound => AppError::NotFound(message),
            ProductError::Validation(msg) => AppError::BadRequest(msg),
            ProductError::Internal => AppError::InternalServerError(message),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
