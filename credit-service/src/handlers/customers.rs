//! Customer balance handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use retail_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{ApiResponse, CustomerBalanceListData, ListBalancesQuery, Pagination},
    middleware::TenantContext,
    models::CustomerBalance,
    AppState,
};

/// List per-customer credit exposure for the tenant, largest balance first.
pub async fn list_customer_balances(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListBalancesQuery>,
) -> Result<Json<ApiResponse<CustomerBalanceListData>>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (customers, total) = state
        .db
        .list_customer_balances(tenant.tenant_id, page, limit)
        .await?;

    Ok(Json(ApiResponse::ok(CustomerBalanceListData {
        customers,
        pagination: Pagination::new(page, limit, total),
    })))
}

/// Credit exposure for a single customer. A customer with no credit history
/// yields a zeroed aggregate.
pub async fn customer_balance(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CustomerBalance>>, AppError> {
    let balance = state
        .db
        .get_customer_balance(tenant.tenant_id, customer_id)
        .await?;

    Ok(Json(ApiResponse::ok(balance)))
}
