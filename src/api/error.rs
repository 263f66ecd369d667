use crate::application::lending::LendingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LendingError);

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self.0 {
            // 404 Not Found
            LendingError::ReferenceNotFound { .. } => (StatusCode::NOT_FOUND, "REFERENCE_NOT_FOUND"),
            LendingError::TransactionNotFound => (StatusCode::NOT_FOUND, "TRANSACTION_NOT_FOUND"),

            // 409 Conflict - 状態の競合
            LendingError::NotAvailable { .. } => (StatusCode::CONFLICT, "NOT_AVAILABLE"),
            LendingError::NotBorrowed => (StatusCode::CONFLICT, "NOT_BORROWED"),

            // 400 Bad Request
            LendingError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            LendingError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),

            // 504 Gateway Timeout
            LendingError::Timeout => {
                tracing::error!("Lending operation timed out");
                (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT")
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LendingError::StockNotFound(_) | LendingError::StockStateConflict { .. } => {
                tracing::error!("Stock ledger inconsistency: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATA_INTEGRITY_ERROR")
            }
            LendingError::StoreError(e) => {
                tracing::error!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            LendingError::ChargeStoreError(e) => {
                tracing::error!("Charge store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "CHARGE_STORE_ERROR")
            }
            LendingError::BookCatalogError(e) => {
                tracing::error!("Book catalog error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "BOOK_CATALOG_ERROR")
            }
            LendingError::CustomerDirectoryError(e) => {
                tracing::error!("Customer directory error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "CUSTOMER_DIRECTORY_ERROR")
            }
        };

        let message = if self.0.is_server_fault() && status != StatusCode::GATEWAY_TIMEOUT {
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
