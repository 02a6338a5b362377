//! Invoice repository

use super::scope::{push_client_join, push_order_and_page, push_owner_scope, push_search};
use crate::domain::{
    Invoice, InvoiceChanges, InvoiceClient, InvoiceFilter, InvoiceIssuer, InvoiceSortKey,
    InvoiceStatus, InvoiceView, IssuerFirm, NewInvoice, StringUuid,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Next value of the per-period invoice counter, allocated atomically
    async fn next_sequence(&self, period: &str) -> Result<i64>;
    async fn create(&self, invoice: &NewInvoice) -> Result<InvoiceView>;
    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<InvoiceView>>;
    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        changes: &InvoiceChanges,
    ) -> Result<InvoiceView>;
    /// Delete only if still a draft; `false` when no draft row matched
    async fn delete_draft(&self, owner_id: StringUuid, id: StringUuid) -> Result<bool>;
    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceView>>;
    async fn count(&self, filter: &InvoiceFilter) -> Result<i64>;
}

pub struct InvoiceRepositoryImpl {
    pool: MySqlPool,
}

impl InvoiceRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const INVOICE_VIEW_COLUMNS: &str = r#"
    SELECT i.id, i.invoice_number, i.client_id, i.issued_by_id, i.amount, i.tax, i.total_amount,
           i.status, i.due_date, i.description, i.created_at, i.updated_at,
           cl.name AS client_name, cl.email AS client_email, cl.phone AS client_phone,
           cl.company_name AS client_company_name, cl.gstin AS client_gstin,
           cl.pan AS client_pan, cl.address AS client_address,
           u.first_name AS issuer_first_name, u.last_name AS issuer_last_name,
           u.email AS issuer_email,
           cp.firm AS issuer_firm, cp.license_number AS issuer_license_number
    FROM invoices i
"#;

#[derive(FromRow)]
struct InvoiceRow {
    #[sqlx(flatten)]
    invoice: Invoice,
    client_name: String,
    client_email: String,
    client_phone: Option<String>,
    client_company_name: Option<String>,
    client_gstin: Option<String>,
    client_pan: Option<String>,
    client_address: Option<String>,
    issuer_first_name: String,
    issuer_last_name: String,
    issuer_email: String,
    issuer_firm: Option<String>,
    issuer_license_number: Option<String>,
}

impl From<InvoiceRow> for InvoiceView {
    fn from(row: InvoiceRow) -> Self {
        let client = InvoiceClient {
            id: row.invoice.client_id,
            name: row.client_name,
            email: row.client_email,
            phone: row.client_phone,
            company_name: row.client_company_name,
            gstin: row.client_gstin,
            pan: row.client_pan,
            address: row.client_address,
        };
        let ca_profile = match (row.issuer_firm, row.issuer_license_number) {
            (Some(firm), Some(license_number)) => Some(IssuerFirm {
                firm,
                license_number,
            }),
            _ => None,
        };
        let issued_by = InvoiceIssuer {
            id: row.invoice.issued_by_id,
            first_name: row.issuer_first_name,
            last_name: row.issuer_last_name,
            email: row.issuer_email,
            ca_profile,
        };
        InvoiceView {
            invoice: row.invoice,
            client,
            issued_by,
        }
    }
}

fn sort_column(key: InvoiceSortKey) -> &'static str {
    match key {
        InvoiceSortKey::CreatedAt => "i.created_at",
        InvoiceSortKey::InvoiceNumber => "i.invoice_number",
        InvoiceSortKey::DueDate => "i.due_date",
        InvoiceSortKey::TotalAmount => "i.total_amount",
        InvoiceSortKey::Status => "i.status",
    }
}

fn push_view_joins(qb: &mut QueryBuilder<'_, MySql>) {
    push_client_join(qb, "i");
    qb.push(" JOIN users u ON u.id = i.issued_by_id");
    qb.push(" LEFT JOIN ca_profiles cp ON cp.user_id = i.issued_by_id");
}

fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filter: &InvoiceFilter) {
    if let Some(client_id) = filter.client_id {
        qb.push(" AND i.client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND i.status = ").push_bind(status);
    }
    if let Some(pattern) = filter.search_pattern() {
        push_search(
            qb,
            &pattern,
            &["i.invoice_number", "i.description", "cl.name"],
        );
    }
}

#[async_trait]
impl InvoiceRepository for InvoiceRepositoryImpl {
    async fn next_sequence(&self, period: &str) -> Result<i64> {
        // LAST_INSERT_ID(expr) is connection-scoped, so both statements must share one connection
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            INSERT INTO invoice_sequences (period, last_value)
            VALUES (?, LAST_INSERT_ID(1))
            ON DUPLICATE KEY UPDATE last_value = LAST_INSERT_ID(last_value + 1)
            "#,
        )
        .bind(period)
        .execute(&mut *conn)
        .await?;

        let (value,): (u64,) = sqlx::query_as("SELECT LAST_INSERT_ID()")
            .fetch_one(&mut *conn)
            .await?;

        i64::try_from(value)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Invoice sequence overflow")))
    }

    async fn create(&self, invoice: &NewInvoice) -> Result<InvoiceView> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, invoice_number, client_id, issued_by_id, amount, tax,
                                  total_amount, status, due_date, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(3), NOW(3))
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.client_id)
        .bind(invoice.issued_by_id)
        .bind(invoice.amount)
        .bind(invoice.tax)
        .bind(invoice.total_amount)
        .bind(invoice.status)
        .bind(invoice.due_date)
        .bind(&invoice.description)
        .execute(&self.pool)
        .await?;

        self.find_owned(invoice.issued_by_id, invoice.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create invoice")))
    }

    async fn find_owned(&self, owner_id: StringUuid, id: StringUuid) -> Result<Option<InvoiceView>> {
        let mut qb = QueryBuilder::<MySql>::new(INVOICE_VIEW_COLUMNS);
        push_view_joins(&mut qb);
        push_owner_scope(&mut qb, owner_id);
        qb.push(" AND i.id = ").push_bind(id);

        let row = qb
            .build_query_as::<InvoiceRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(InvoiceView::from))
    }

    async fn update(
        &self,
        owner_id: StringUuid,
        id: StringUuid,
        changes: &InvoiceChanges,
    ) -> Result<InvoiceView> {
        sqlx::query(
            r#"
            UPDATE invoices i
            JOIN clients cl ON cl.id = i.client_id
            SET i.amount = ?, i.tax = ?, i.total_amount = ?, i.status = ?, i.due_date = ?,
                i.description = ?, i.updated_at = NOW(3)
            WHERE i.id = ? AND cl.created_by_id = ?
            "#,
        )
        .bind(changes.amount)
        .bind(changes.tax)
        .bind(changes.total_amount)
        .bind(changes.status)
        .bind(changes.due_date)
        .bind(&changes.description)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))
    }

    async fn delete_draft(&self, owner_id: StringUuid, id: StringUuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE i FROM invoices i
            JOIN clients cl ON cl.id = i.client_id
            WHERE i.id = ? AND cl.created_by_id = ? AND i.status = ?
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(InvoiceStatus::Draft)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &InvoiceFilter) -> Result<Vec<InvoiceView>> {
        let mut qb = QueryBuilder::<MySql>::new(INVOICE_VIEW_COLUMNS);
        push_view_joins(&mut qb);
        push_owner_scope(&mut qb, filter.owner_id);
        push_filters(&mut qb, filter);
        push_order_and_page(
            &mut qb,
            sort_column(filter.sort_by),
            filter.sort_order,
            "i.id",
            filter.page,
        );

        let rows = qb.build_query_as::<InvoiceRow>().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(InvoiceView::from).collect())
    }

    async fn count(&self, filter: &InvoiceFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM invoices i");
        push_client_join(&mut qb, "i");
        push_owner_scope(&mut qb, filter.owner_id);
        push_filters(&mut qb, filter);

        let row: (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(row.0)
    }
}
