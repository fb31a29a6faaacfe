//! Credit ledger handlers.
//!
//! All operations are scoped to the tenant from the request context.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use retail_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        ApiResponse, CreditListData, ListCreditsQuery, Pagination, RegisterPaymentRequest,
    },
    middleware::TenantContext,
    models::{CreditDetail, CreditFilter, CreditPayment, CreditSummary, RegisterPayment,
        StatusFilter},
    AppState,
};

/// List pending credits for the tenant, newest first.
pub async fn list_credits(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListCreditsQuery>,
) -> Result<Json<ApiResponse<CreditListData>>, AppError> {
    let status = match query.status.as_deref() {
        None => StatusFilter::Open,
        Some(s) => StatusFilter::parse(s).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Unknown status filter '{}' (expected pending, partial or all)",
                s
            ))
        })?,
    };

    let filter = CreditFilter {
        customer_id: query.customer_id,
        status,
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(20).clamp(1, 100),
    };

    tracing::debug!(
        tenant_id = %tenant.tenant_id,
        page = filter.page,
        limit = filter.limit,
        "Listing credits"
    );

    let (credits, total) = state.db.list_credits(tenant.tenant_id, &filter).await?;

    Ok(Json(ApiResponse::ok(CreditListData {
        credits,
        pagination: Pagination::new(filter.page, filter.limit, total),
    })))
}

/// Aggregate exposure for the tenant.
pub async fn credit_summary(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<ApiResponse<CreditSummary>>, AppError> {
    let summary = state.db.get_credit_summary(tenant.tenant_id).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// Full credit detail for one sale.
pub async fn credit_detail(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CreditDetail>>, AppError> {
    let detail = state
        .db
        .get_credit_detail(tenant.tenant_id, sale_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Credit sale not found")))?;

    Ok(Json(ApiResponse::ok(detail)))
}

/// Payment history for one sale, newest first.
pub async fn payment_history(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(sale_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<CreditPayment>>>, AppError> {
    let payments = state
        .db
        .get_payment_history(tenant.tenant_id, sale_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Credit sale not found")))?;

    Ok(Json(ApiResponse::ok(payments)))
}

/// Register a payment against a credit sale.
pub async fn register_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(sale_id): Path<Uuid>,
    Json(payload): Json<RegisterPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreditPayment>>), AppError> {
    payload.validate()?;

    tracing::info!(
        tenant_id = %tenant.tenant_id,
        sale_id = %sale_id,
        amount = %payload.amount,
        payment_method = %payload.payment_method,
        "Registering credit payment"
    );

    let payment = state
        .db
        .register_payment(&RegisterPayment {
            tenant_id: tenant.tenant_id,
            sale_id,
            amount: payload.amount,
            payment_method: payload.payment_method,
            notes: payload.notes,
            received_by: tenant.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(payment))))
}
