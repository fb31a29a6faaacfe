//! Database service for credit-service.

use crate::models::{
    format_currency, format_receipt_number, CreditDetail, CreditFilter, CreditPayment,
    CreditStatus, CreditSummary, CustomerBalance, ReceiptSequence, RegisterPayment, Sale,
    DEFAULT_RECEIPT_PREFIX,
};
use crate::services::metrics::{DB_QUERY_DURATION, PAYMENTS_TOTAL};
use retail_core::error::AppError;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const SALE_COLUMNS: &str = "sale_id, tenant_id, invoice_number, customer_id, customer_name, \
     customer_phone, subtotal, tax, discount, total, payment_method, amount_paid, \
     credit_status, status, due_date, created_utc";

const PAYMENT_COLUMNS: &str = "payment_id, tenant_id, sale_id, customer_id, amount, \
     payment_method, receipt_number, notes, received_by, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    credit_term_days: u32,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "credit-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        credit_term_days: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self {
            pool,
            credit_term_days,
        })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Credit Queries
    // -------------------------------------------------------------------------

    /// List store-credit sales for a tenant, most recent first, with a total
    /// count computed independently of the page slice.
    #[instrument(skip(self, filter), fields(tenant_id = %tenant_id))]
    pub async fn list_credits(
        &self,
        tenant_id: Uuid,
        filter: &CreditFilter,
    ) -> Result<(Vec<CreditDetail>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_credits"])
            .start_timer();

        let statuses: Vec<String> = filter
            .status
            .statuses()
            .into_iter()
            .map(String::from)
            .collect();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sales
            WHERE tenant_id = $1
              AND payment_method = 'store_credit'
              AND status = 'completed'
              AND credit_status = ANY($2)
              AND ($3::uuid IS NULL OR customer_id = $3)
            "#,
        )
        .bind(tenant_id)
        .bind(&statuses)
        .bind(filter.customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count credits: {}", e)))?;

        let limit = filter.limit.clamp(1, 100);
        let offset = (filter.page.max(1) - 1) * limit;

        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE tenant_id = $1
              AND payment_method = 'store_credit'
              AND status = 'completed'
              AND credit_status = ANY($2)
              AND ($3::uuid IS NULL OR customer_id = $3)
            ORDER BY created_utc DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(tenant_id)
        .bind(&statuses)
        .bind(filter.customer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list credits: {}", e)))?;

        let mut credits = Vec::with_capacity(sales.len());
        for sale in sales {
            credits.push(self.build_credit_detail(sale).await?);
        }

        timer.observe_duration();

        Ok((credits, total))
    }

    /// Get the full credit-detail projection for one sale.
    /// Returns None when no store-credit sale with that id exists for the tenant.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, sale_id = %sale_id))]
    pub async fn get_credit_detail(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<CreditDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_credit_detail"])
            .start_timer();

        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE tenant_id = $1 AND sale_id = $2 AND payment_method = 'store_credit'
            "#
        ))
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get credit: {}", e)))?;

        let detail = match sale {
            Some(sale) => Some(self.build_credit_detail(sale).await?),
            None => None,
        };

        timer.observe_duration();

        Ok(detail)
    }

    /// Get all payments for a sale, most recent first. Verifies the sale
    /// belongs to the tenant; returns None when it does not.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, sale_id = %sale_id))]
    pub async fn get_payment_history(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Option<Vec<CreditPayment>>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payment_history"])
            .start_timer();

        let owned: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM sales
                WHERE tenant_id = $1 AND sale_id = $2 AND payment_method = 'store_credit'
            )
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to verify sale: {}", e)))?;

        if !owned {
            timer.observe_duration();
            return Ok(None);
        }

        let payments = self.fetch_payments(tenant_id, sale_id).await?;

        timer.observe_duration();

        Ok(Some(payments))
    }

    /// Fetch the payment log for a sale, descending by creation time.
    async fn fetch_payments(
        &self,
        tenant_id: Uuid,
        sale_id: Uuid,
    ) -> Result<Vec<CreditPayment>, AppError> {
        sqlx::query_as::<_, CreditPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM credit_payments
            WHERE tenant_id = $1 AND sale_id = $2
            ORDER BY created_utc DESC, receipt_number DESC
            "#
        ))
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payments: {}", e)))
    }

    /// Build the projection from a sale row. The payment log is the source of
    /// truth; `sale.amount_paid` is only the transactionally-maintained cache.
    async fn build_credit_detail(&self, sale: Sale) -> Result<CreditDetail, AppError> {
        let payments = self.fetch_payments(sale.tenant_id, sale.sale_id).await?;
        let paid_amount: Decimal = payments.iter().map(|p| p.amount).sum();
        let remaining_balance = sale.total - paid_amount;
        let status = CreditStatus::derive(paid_amount, sale.total);
        let due_date = sale.effective_due_date(self.credit_term_days);
        let is_overdue =
            status != CreditStatus::Paid && due_date < chrono::Utc::now().date_naive();

        Ok(CreditDetail {
            sale,
            paid_amount,
            remaining_balance,
            status,
            due_date,
            is_overdue,
            payments,
        })
    }

    // -------------------------------------------------------------------------
    // Payment Registration
    // -------------------------------------------------------------------------

    /// Register a payment against a credit sale.
    ///
    /// Runs as a single transaction: the sale row is locked with
    /// `SELECT ... FOR UPDATE`, the balance is recomputed from the payment log
    /// under that lock, the tenant's receipt-sequence row is incremented under
    /// its own row lock, and the payment insert plus the sale's
    /// `amount_paid`/`credit_status` update commit together. Any failure rolls
    /// the whole transaction back, so no partial write is ever observable.
    #[instrument(skip(self, input), fields(tenant_id = %input.tenant_id, sale_id = %input.sale_id))]
    pub async fn register_payment(
        &self,
        input: &RegisterPayment,
    ) -> Result<CreditPayment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["register_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Lock the sale row. Concurrent registrations against the same sale
        // serialize here and re-read the updated balance.
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE tenant_id = $1 AND sale_id = $2 AND payment_method = 'store_credit'
            FOR UPDATE
            "#
        ))
        .bind(input.tenant_id)
        .bind(input.sale_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to lock sale: {}", e)))?;

        let sale = match sale {
            Some(sale) => sale,
            None => {
                PAYMENTS_TOTAL.with_label_values(&["rejected"]).inc();
                return Err(AppError::NotFound(anyhow::anyhow!("Credit sale not found")));
            }
        };

        if sale.is_voided() {
            PAYMENTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cannot register a payment on a voided sale"
            )));
        }

        let total_paid: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM credit_payments
            WHERE tenant_id = $1 AND sale_id = $2
            "#,
        )
        .bind(input.tenant_id)
        .bind(input.sale_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to sum payments: {}", e))
        })?;
        let total_paid = total_paid.unwrap_or(Decimal::ZERO);

        if input.amount <= Decimal::ZERO {
            PAYMENTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount must be greater than zero"
            )));
        }

        // Amounts are stored as NUMERIC(14, 2); anything finer than a cent
        // would be silently rounded at insert.
        if input.amount.normalize().scale() > 2 {
            PAYMENTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount cannot have more than two decimal places"
            )));
        }

        let remaining = sale.total - total_paid;
        if input.amount > remaining {
            PAYMENTS_TOTAL.with_label_values(&["rejected"]).inc();
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Payment amount exceeds the remaining balance of {}",
                format_currency(remaining)
            )));
        }

        // Provision-or-increment the tenant's sequence row in one statement.
        // The row lock taken here serializes receipt numbering per tenant,
        // so numbers are gap-free and strictly increasing.
        let sequence = sqlx::query_as::<_, ReceiptSequence>(
            r#"
            INSERT INTO payment_receipt_sequence (tenant_id, prefix, current_number)
            VALUES ($1, $2, 1)
            ON CONFLICT (tenant_id)
            DO UPDATE SET current_number = payment_receipt_sequence.current_number + 1
            RETURNING tenant_id, prefix, current_number
            "#,
        )
        .bind(input.tenant_id)
        .bind(DEFAULT_RECEIPT_PREFIX)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance receipt sequence: {}", e))
        })?;

        let receipt_number = format_receipt_number(&sequence.prefix, sequence.current_number);

        let payment = sqlx::query_as::<_, CreditPayment>(&format!(
            r#"
            INSERT INTO credit_payments (
                payment_id, tenant_id, sale_id, customer_id, amount,
                payment_method, receipt_number, notes, received_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(input.tenant_id)
        .bind(input.sale_id)
        .bind(sale.customer_id)
        .bind(input.amount)
        .bind(input.payment_method.as_str())
        .bind(&receipt_number)
        .bind(&input.notes)
        .bind(&input.received_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert payment: {}", e))
        })?;

        let new_total_paid = total_paid + input.amount;
        let new_status = CreditStatus::derive(new_total_paid, sale.total);

        sqlx::query(
            r#"
            UPDATE sales
            SET amount_paid = $3, credit_status = $4
            WHERE tenant_id = $1 AND sale_id = $2
            "#,
        )
        .bind(input.tenant_id)
        .bind(input.sale_id)
        .bind(new_total_paid)
        .bind(new_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update sale: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();
        PAYMENTS_TOTAL.with_label_values(&["ok"]).inc();

        info!(
            payment_id = %payment.payment_id,
            receipt_number = %payment.receipt_number,
            amount = %payment.amount,
            new_status = %new_status.as_str(),
            "Payment registered"
        );

        Ok(payment)
    }

    // -------------------------------------------------------------------------
    // Aggregate Summary
    // -------------------------------------------------------------------------

    /// Platform-wide exposure for a tenant: outstanding amount, open credit
    /// count and distinct indebted customers. All zero when nothing matches.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn get_credit_summary(&self, tenant_id: Uuid) -> Result<CreditSummary, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_credit_summary"])
            .start_timer();

        let summary = sqlx::query_as::<_, CreditSummary>(
            r#"
            SELECT COALESCE(SUM(s.total - p.paid), 0) AS total_pending,
                   COUNT(*) AS total_credits,
                   COUNT(DISTINCT s.customer_id) AS customers_with_debt
            FROM sales s
            CROSS JOIN LATERAL (
                SELECT COALESCE(SUM(amount), 0) AS paid
                FROM credit_payments
                WHERE tenant_id = s.tenant_id AND sale_id = s.sale_id
            ) p
            WHERE s.tenant_id = $1
              AND s.payment_method = 'store_credit'
              AND s.status = 'completed'
              AND s.credit_status IN ('pending', 'partial')
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get summary: {}", e)))?;

        timer.observe_duration();

        Ok(summary)
    }

    // -------------------------------------------------------------------------
    // Customer Balance Aggregation
    // -------------------------------------------------------------------------

    /// Exposure for a single customer. A customer with no credit activity
    /// yields a zeroed aggregate.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, customer_id = %customer_id))]
    pub async fn get_customer_balance(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<CustomerBalance, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer_balance"])
            .start_timer();

        let balance = sqlx::query_as::<_, CustomerBalance>(
            r#"
            SELECT s.customer_id,
                   MAX(s.customer_name) AS customer_name,
                   SUM(s.total) AS total_credit,
                   COALESCE(p.paid, 0) AS total_paid,
                   SUM(s.total) - COALESCE(p.paid, 0) AS balance
            FROM sales s
            LEFT JOIN (
                SELECT customer_id, SUM(amount) AS paid
                FROM credit_payments
                WHERE tenant_id = $1
                GROUP BY customer_id
            ) p ON p.customer_id = s.customer_id
            WHERE s.tenant_id = $1
              AND s.customer_id = $2
              AND s.payment_method = 'store_credit'
              AND s.status = 'completed'
            GROUP BY s.customer_id, p.paid
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get customer balance: {}", e))
        })?;

        timer.observe_duration();

        Ok(balance.unwrap_or_else(|| CustomerBalance::zero(customer_id)))
    }

    /// List per-customer exposure for a tenant, largest balance first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub async fn list_customer_balances(
        &self,
        tenant_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<CustomerBalance>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customer_balances"])
            .start_timer();

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT customer_id)
            FROM sales
            WHERE tenant_id = $1
              AND payment_method = 'store_credit'
              AND status = 'completed'
              AND customer_id IS NOT NULL
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e))
        })?;

        let limit = limit.clamp(1, 100);
        let offset = (page.max(1) - 1) * limit;

        let balances = sqlx::query_as::<_, CustomerBalance>(
            r#"
            SELECT s.customer_id,
                   MAX(s.customer_name) AS customer_name,
                   SUM(s.total) AS total_credit,
                   COALESCE(p.paid, 0) AS total_paid,
                   SUM(s.total) - COALESCE(p.paid, 0) AS balance
            FROM sales s
            LEFT JOIN (
                SELECT customer_id, SUM(amount) AS paid
                FROM credit_payments
                WHERE tenant_id = $1
                GROUP BY customer_id
            ) p ON p.customer_id = s.customer_id
            WHERE s.tenant_id = $1
              AND s.payment_method = 'store_credit'
              AND s.status = 'completed'
              AND s.customer_id IS NOT NULL
            GROUP BY s.customer_id, p.paid
            ORDER BY balance DESC, s.customer_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list customer balances: {}", e))
        })?;

        timer.observe_duration();

        Ok((balances, total))
    }
}
