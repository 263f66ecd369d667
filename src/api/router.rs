use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_transaction, delete_transaction_handler, get_stock, get_transaction,
    list_active, list_available_stocks, list_by_book, list_by_customer, list_by_stock_code,
    list_charges, list_overdue, list_stocks, list_transaction_charges, list_transactions,
    return_transaction, update_transaction_handler,
};

/// 貸出管理APIのルーターを作成する
///
/// Command endpoints:
/// - POST   /v1/book-transactions - 貸出
/// - PUT    /v1/book-transactions/:id/return - 返却
/// - PUT    /v1/book-transactions/:id - 管理者訂正
/// - DELETE /v1/book-transactions/:id - 削除
///
/// Query endpoints は取引・在庫・延滞料金の一覧と詳細。
pub fn create_router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route(
            "/book-transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/book-transactions/active", get(list_active))
        .route("/book-transactions/overdue", get(list_overdue))
        .route(
            "/book-transactions/:id",
            get(get_transaction)
                .put(update_transaction_handler)
                .delete(delete_transaction_handler),
        )
        .route("/book-transactions/:id/return", put(return_transaction))
        .route(
            "/book-transactions/:id/charges",
            get(list_transaction_charges),
        )
        .route("/customers/:id/book-transactions", get(list_by_customer))
        .route("/books/:id/book-transactions", get(list_by_book))
        .route("/books/:id/stocks", get(list_stocks))
        .route("/books/:id/available-stocks", get(list_available_stocks))
        .route("/book-stocks/:code", get(get_stock))
        .route(
            "/book-stocks/:code/book-transactions",
            get(list_by_stock_code),
        )
        .route("/charges", get(list_charges));

    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .nest("/v1", v1)
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
