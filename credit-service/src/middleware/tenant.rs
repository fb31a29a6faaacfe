//! Tenant context extractor for multi-tenancy support.
//!
//! Extracts the tenant id (and optional operator id) from request headers.
//! These headers are set by the API gateway after authenticating the user and
//! validating their tenant membership.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use retail_core::error::AppError;
use uuid::Uuid;

/// Tenant context extracted from request headers.
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// Tenant the request is scoped to.
    pub tenant_id: Uuid,
    /// Operator making the request (optional; recorded on payments).
    pub user_id: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant_id = parts
            .headers
            .get("X-Tenant-ID")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-Tenant-ID header (required from gateway)"
                ))
            })?;

        let tenant_id = Uuid::parse_str(tenant_id).map_err(|_| {
            AppError::AuthError(anyhow::anyhow!("X-Tenant-ID header is not a valid UUID"))
        })?;

        let user_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Add to tracing span for observability
        let span = tracing::Span::current();
        span.record("tenant_id", tenant_id.to_string());
        if let Some(ref uid) = user_id {
            span.record("user_id", uid.as_str());
        }

        Ok(TenantContext { tenant_id, user_id })
    }
}
