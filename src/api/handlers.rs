use crate::application::lending::{
    self, ServiceDependencies, borrow_book, delete_transaction, return_book, update_transaction,
};
use crate::domain::{
    BookId, CustomerId, StockCode, StockUnit, TransactionId, commands::DeleteTransaction,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BorrowRequest, ChargeResponse, ListQuery, ReturnRequest, ReturnResponse,
        TransactionResponse, UpdateRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

type ListResponse = Result<Json<Vec<TransactionResponse>>, ApiError>;

fn to_responses(views: Vec<lending::TransactionView>) -> Json<Vec<TransactionResponse>> {
    Json(views.into_iter().map(TransactionResponse::from).collect())
}

fn parse_code(raw: &str) -> Result<StockCode, ApiError> {
    StockCode::parse(raw)
        .map_err(|e| ApiError::from(lending::LendingError::InvalidInput(e.to_string())))
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /v1/book-transactions - 書籍を貸し出す
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let cmd = req.to_command(Utc::now())?;

    let view = borrow_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(view.into())))
}

/// PUT /v1/book-transactions/:id/return - 書籍を返却する
///
/// 延滞料金の記録に失敗しても 200 を返し、`charge_error` で知らせる。
pub async fn return_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReturnRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let cmd = req.to_command(TransactionId::from_uuid(id), Utc::now());

    let receipt = return_book(&state.service_deps, cmd).await?;

    Ok(Json(receipt.into()))
}

/// PUT /v1/book-transactions/:id - 管理者による訂正（在庫台帳を経由しない）
pub async fn update_transaction_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let cmd = req.to_command(TransactionId::from_uuid(id), Utc::now())?;

    let view = update_transaction(&state.service_deps, cmd).await?;

    Ok(Json(view.into()))
}

/// DELETE /v1/book-transactions/:id - 取引を削除する（在庫の状態は戻さない）
pub async fn delete_transaction_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let cmd = DeleteTransaction {
        transaction_id: TransactionId::from_uuid(id),
    };

    delete_transaction(&state.service_deps, cmd).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /v1/book-transactions?status=&search=
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ListResponse {
    let filter = query.to_filter()?;
    let views = lending::find_transactions(&state.service_deps, &filter, Utc::now()).await?;
    Ok(to_responses(views))
}

/// GET /v1/book-transactions/:id
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let view =
        lending::get_transaction(&state.service_deps, TransactionId::from_uuid(id), Utc::now())
            .await?;
    Ok(Json(view.into()))
}

/// GET /v1/book-transactions/active
pub async fn list_active(State(state): State<Arc<AppState>>) -> ListResponse {
    let views = lending::find_active(&state.service_deps, Utc::now()).await?;
    Ok(to_responses(views))
}

/// GET /v1/book-transactions/overdue
pub async fn list_overdue(State(state): State<Arc<AppState>>) -> ListResponse {
    let views = lending::find_overdue(&state.service_deps, Utc::now()).await?;
    Ok(to_responses(views))
}

/// GET /v1/customers/:id/book-transactions
pub async fn list_by_customer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ListResponse {
    let views =
        lending::find_by_customer(&state.service_deps, CustomerId::from_uuid(id), Utc::now())
            .await?;
    Ok(to_responses(views))
}

/// GET /v1/books/:id/book-transactions
pub async fn list_by_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ListResponse {
    let views =
        lending::find_by_book(&state.service_deps, BookId::from_uuid(id), Utc::now()).await?;
    Ok(to_responses(views))
}

/// GET /v1/book-stocks/:code/book-transactions
pub async fn list_by_stock_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ListResponse {
    let code = parse_code(&code)?;
    let views = lending::find_by_stock_code(&state.service_deps, &code, Utc::now()).await?;
    Ok(to_responses(views))
}

/// GET /v1/book-stocks/:code
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<StockUnit>, ApiError> {
    let code = parse_code(&code)?;
    let unit = lending::get_stock(&state.service_deps, &code).await?;
    Ok(Json(unit))
}

/// GET /v1/books/:id/stocks
pub async fn list_stocks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StockUnit>>, ApiError> {
    let units = lending::find_stock_by_book(&state.service_deps, BookId::from_uuid(id)).await?;
    Ok(Json(units))
}

/// GET /v1/books/:id/available-stocks
pub async fn list_available_stocks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<StockUnit>>, ApiError> {
    let units = lending::find_available_stock(&state.service_deps, BookId::from_uuid(id)).await?;
    Ok(Json(units))
}

/// GET /v1/book-transactions/:id/charges
pub async fn list_transaction_charges(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChargeResponse>>, ApiError> {
    let charges =
        lending::find_charges_for_transaction(&state.service_deps, TransactionId::from_uuid(id))
            .await?;
    Ok(Json(charges.into_iter().map(ChargeResponse::from).collect()))
}

/// GET /v1/charges
pub async fn list_charges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChargeResponse>>, ApiError> {
    let charges = lending::find_all_charges(&state.service_deps).await?;
    Ok(Json(charges.into_iter().map(ChargeResponse::from).collect()))
}
