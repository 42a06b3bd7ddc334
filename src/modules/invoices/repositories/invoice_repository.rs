// Invoice persistence.
//
// Reads go straight to the pool. Every mutation of an existing invoice goes
// through an `InvoiceGuard`: the row is locked with SELECT ... FOR UPDATE
// inside a transaction that stays open until `commit`, so payments against
// the same invoice are serialized while different invoices proceed freely.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder, Transaction};
use std::collections::HashMap;
use std::str::FromStr;

use crate::core::{AppError, Percent, Result};
use crate::modules::invoices::models::{Invoice, InvoiceStatus, InvoiceType};
use crate::modules::payments::models::{Payment, PaymentMethod};
use crate::modules::totals::models::{LineItem, Pricing};

/// Filters pushed down to storage
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub client_id: Option<String>,
    /// Inclusive issue-date range
    pub issued_between: Option<(NaiveDate, NaiveDate)>,
}

/// What a guarded commit writes
#[derive(Debug, Clone, Copy)]
pub enum InvoiceChange<'a> {
    /// Status and paid amount
    Status,
    /// Header fields, rates, paid amount and the full item list
    Document,
    /// A new ledger row plus the recomputed paid amount
    PaymentAppended(&'a Payment),
    /// Remove the invoice and its items
    Delete,
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Insert a new invoice with its items
    async fn create(&self, invoice: &Invoice) -> Result<()>;

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Invoice>>;

    /// Newest first
    async fn list(&self, tenant_id: &str, filter: &InvoiceFilter) -> Result<Vec<Invoice>>;

    /// Lock an invoice for a read-modify-write cycle.
    /// Waits while another guard holds the same invoice.
    async fn lock(&self, tenant_id: &str, id: &str) -> Result<Option<Box<dyn InvoiceGuard>>>;
}

/// Exclusive hold on one invoice. Dropping it without `commit` discards the change.
#[async_trait]
pub trait InvoiceGuard: Send {
    /// Snapshot read under the lock
    fn invoice(&self) -> &Invoice;

    /// Persist `invoice` according to `change` and release the lock
    async fn commit(self: Box<Self>, invoice: &Invoice, change: InvoiceChange<'_>) -> Result<()>;
}

pub struct MySqlInvoiceRepository {
    pool: MySqlPool,
}

impl MySqlInvoiceRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for MySqlInvoiceRepository {
    async fn create(&self, invoice: &Invoice) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_invoice(&mut tx, invoice).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} WHERE tenant_id = ? AND id = ?",
            SELECT_INVOICE
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(load_children(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, tenant_id: &str, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let mut conn = self.pool.acquire().await?;

        let mut query = QueryBuilder::<MySql>::new(SELECT_INVOICE);
        query.push(" WHERE tenant_id = ").push_bind(tenant_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(client_id) = &filter.client_id {
            query.push(" AND client_id = ").push_bind(client_id.as_str());
        }
        if let Some((start, end)) = filter.issued_between {
            query
                .push(" AND issue_date BETWEEN ")
                .push_bind(start)
                .push(" AND ")
                .push_bind(end);
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<InvoiceRow>()
            .fetch_all(&mut *conn)
            .await?;

        load_children(&mut conn, rows).await
    }

    async fn lock(&self, tenant_id: &str, id: &str) -> Result<Option<Box<dyn InvoiceGuard>>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{} WHERE tenant_id = ? AND id = ? FOR UPDATE",
            SELECT_INVOICE
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let invoice = load_children(&mut tx, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Invoice {} vanished under lock", id)))?;

        Ok(Some(Box::new(MySqlInvoiceGuard { tx, invoice })))
    }
}

struct MySqlInvoiceGuard {
    tx: Transaction<'static, MySql>,
    invoice: Invoice,
}

#[async_trait]
impl InvoiceGuard for MySqlInvoiceGuard {
    fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    async fn commit(self: Box<Self>, invoice: &Invoice, change: InvoiceChange<'_>) -> Result<()> {
        let Self { mut tx, .. } = *self;

        match change {
            InvoiceChange::Status => update_header(&mut tx, invoice).await?,
            InvoiceChange::Document => {
                update_header(&mut tx, invoice).await?;
                sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?")
                    .bind(&invoice.id)
                    .execute(&mut *tx)
                    .await?;
                insert_items(&mut tx, &invoice.id, invoice.pricing.items()).await?;
            }
            InvoiceChange::PaymentAppended(payment) => {
                sqlx::query(
                    r#"
                    INSERT INTO payments (id, invoice_id, amount, method, paid_at, notes, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&payment.id)
                .bind(&payment.invoice_id)
                .bind(payment.amount)
                .bind(payment.method.as_str())
                .bind(payment.paid_at)
                .bind(&payment.notes)
                .bind(payment.created_at)
                .execute(&mut *tx)
                .await?;

                update_header(&mut tx, invoice).await?;
            }
            InvoiceChange::Delete => {
                sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?")
                    .bind(&invoice.id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM invoices WHERE tenant_id = ? AND id = ?")
                    .bind(&invoice.tenant_id)
                    .bind(&invoice.id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, tenant_id, number, client_id, quote_id, invoice_type, issue_date, due_date,
           status, discount_percent, tax_rate, paid_amount, notes, created_at, updated_at
    FROM invoices"#;

/// Insert header and items. Shared with quote conversion, which writes the
/// invoice inside the quote's transaction.
pub(crate) async fn insert_invoice(conn: &mut MySqlConnection, invoice: &Invoice) -> Result<()> {
    let totals = invoice.pricing.totals();

    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, tenant_id, number, client_id, quote_id, invoice_type, issue_date, due_date,
            status, discount_percent, tax_rate, subtotal, discount_amount, tax_amount, total,
            paid_amount, notes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.tenant_id)
    .bind(&invoice.number)
    .bind(&invoice.client_id)
    .bind(&invoice.quote_id)
    .bind(invoice.invoice_type.as_str())
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.status.as_str())
    .bind(invoice.pricing.discount_percent().value())
    .bind(invoice.pricing.tax_rate().value())
    .bind(totals.subtotal)
    .bind(totals.discount_amount)
    .bind(totals.tax_amount)
    .bind(totals.total)
    .bind(invoice.paid_amount)
    .bind(&invoice.notes)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::Internal(format!(
                    "Invoice number {} already exists for tenant {}",
                    invoice.number, invoice.tenant_id
                ));
            }
        }
        AppError::Database(e)
    })?;

    insert_items(conn, &invoice.id, invoice.pricing.items()).await
}

async fn insert_items(conn: &mut MySqlConnection, invoice_id: &str, items: &[LineItem]) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_items (invoice_id, position, description, quantity, unit_price)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice_id)
        .bind(position as u32)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn update_header(conn: &mut MySqlConnection, invoice: &Invoice) -> Result<()> {
    let totals = invoice.pricing.totals();

    sqlx::query(
        r#"
        UPDATE invoices
        SET invoice_type = ?, due_date = ?, status = ?, discount_percent = ?, tax_rate = ?,
            subtotal = ?, discount_amount = ?, tax_amount = ?, total = ?,
            paid_amount = ?, notes = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(invoice.invoice_type.as_str())
    .bind(invoice.due_date)
    .bind(invoice.status.as_str())
    .bind(invoice.pricing.discount_percent().value())
    .bind(invoice.pricing.tax_rate().value())
    .bind(totals.subtotal)
    .bind(totals.discount_amount)
    .bind(totals.tax_amount)
    .bind(totals.total)
    .bind(invoice.paid_amount)
    .bind(&invoice.notes)
    .bind(invoice.updated_at)
    .bind(&invoice.tenant_id)
    .bind(&invoice.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Attach items and payments to header rows, preserving row order
async fn load_children(conn: &mut MySqlConnection, rows: Vec<InvoiceRow>) -> Result<Vec<Invoice>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut items: HashMap<String, Vec<LineItem>> = HashMap::new();
    let mut payments: HashMap<String, Vec<Payment>> = HashMap::new();

    let mut query = QueryBuilder::<MySql>::new(
        "SELECT invoice_id, description, quantity, unit_price FROM invoice_items WHERE invoice_id IN (",
    );
    let mut ids = query.separated(", ");
    for row in &rows {
        ids.push_bind(row.id.as_str());
    }
    query.push(") ORDER BY invoice_id, position");

    for item in query.build_query_as::<ItemRow>().fetch_all(&mut *conn).await? {
        items.entry(item.invoice_id.clone()).or_default().push(item.into_line_item());
    }

    let mut query = QueryBuilder::<MySql>::new(
        "SELECT id, invoice_id, amount, method, paid_at, notes, created_at FROM payments WHERE invoice_id IN (",
    );
    let mut ids = query.separated(", ");
    for row in &rows {
        ids.push_bind(row.id.as_str());
    }
    query.push(") ORDER BY created_at, id");

    for payment in query.build_query_as::<PaymentRow>().fetch_all(&mut *conn).await? {
        let payment = payment.into_payment()?;
        payments.entry(payment.invoice_id.clone()).or_default().push(payment);
    }

    rows.into_iter()
        .map(|row| {
            let row_items = items.remove(&row.id).unwrap_or_default();
            let row_payments = payments.remove(&row.id).unwrap_or_default();
            row.into_invoice(row_items, row_payments)
        })
        .collect()
}

// Helper structs for database mapping

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    tenant_id: String,
    number: String,
    client_id: String,
    quote_id: Option<String>,
    invoice_type: String,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    status: String,
    discount_percent: Decimal,
    tax_rate: Decimal,
    paid_amount: Decimal,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<LineItem>, payments: Vec<Payment>) -> Result<Invoice> {
        let corrupt = |field: &str, e: String| {
            AppError::Internal(format!("Invalid {} stored for invoice {}: {}", field, self.id, e))
        };

        let status = InvoiceStatus::from_str(&self.status).map_err(|e| corrupt("status", e))?;
        let invoice_type =
            InvoiceType::from_str(&self.invoice_type).map_err(|e| corrupt("type", e))?;
        let discount_percent =
            Percent::new(self.discount_percent).map_err(|e| corrupt("discount", e.to_string()))?;
        let tax_rate = Percent::new(self.tax_rate).map_err(|e| corrupt("tax rate", e.to_string()))?;
        let pricing = Pricing::new(items, discount_percent, tax_rate)
            .map_err(|e| corrupt("items", e.to_string()))?;
        if self.paid_amount < Decimal::ZERO || self.paid_amount > pricing.total() {
            return Err(corrupt(
                "paid amount",
                format!("{} outside 0..={}", self.paid_amount, pricing.total()),
            ));
        }

        Ok(Invoice {
            id: self.id,
            tenant_id: self.tenant_id,
            number: self.number,
            client_id: self.client_id,
            quote_id: self.quote_id,
            invoice_type,
            issue_date: self.issue_date,
            due_date: self.due_date,
            status,
            pricing,
            paid_amount: self.paid_amount,
            notes: self.notes,
            payments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    invoice_id: String,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
}

impl ItemRow {
    // Stored rows were validated on the way in
    fn into_line_item(self) -> LineItem {
        LineItem {
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    invoice_id: String,
    amount: Decimal,
    method: String,
    paid_at: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_payment(self) -> Result<Payment> {
        let method = PaymentMethod::from_str(&self.method).map_err(|e| {
            AppError::Internal(format!("Invalid method stored for payment {}: {}", self.id, e))
        })?;

        Ok(Payment {
            id: self.id,
            invoice_id: self.invoice_id,
            amount: self.amount,
            method,
            paid_at: self.paid_at,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}
