// Quote persistence.
//
// Same locking discipline as invoices: mutations go through a `QuoteGuard`
// holding the quote row with SELECT ... FOR UPDATE. Conversion writes the
// new invoice and the set-once link inside that one transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder, Transaction};
use std::collections::HashMap;
use std::str::FromStr;

use crate::core::{AppError, Percent, Result};
use crate::modules::invoices::models::Invoice;
use crate::modules::invoices::repositories::invoice_repository::insert_invoice;
use crate::modules::quotes::models::{Quote, QuoteStatus};
use crate::modules::totals::models::{LineItem, Pricing};

#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub client_id: Option<String>,
}

/// What a guarded commit writes
#[derive(Debug, Clone, Copy)]
pub enum QuoteChange<'a> {
    Status,
    /// Header fields, rates and the full item list
    Document,
    /// Insert the converted invoice and set `invoice_id`, all or nothing
    LinkInvoice(&'a Invoice),
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn create(&self, quote: &Quote) -> Result<()>;

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Quote>>;

    /// Newest first
    async fn list(&self, tenant_id: &str, filter: &QuoteFilter) -> Result<Vec<Quote>>;

    async fn lock(&self, tenant_id: &str, id: &str) -> Result<Option<Box<dyn QuoteGuard>>>;
}

/// Exclusive hold on one quote. Dropping it without `commit` discards the change.
#[async_trait]
pub trait QuoteGuard: Send {
    fn quote(&self) -> &Quote;

    async fn commit(self: Box<Self>, quote: &Quote, change: QuoteChange<'_>) -> Result<()>;
}

pub struct MySqlQuoteRepository {
    pool: MySqlPool,
}

impl MySqlQuoteRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuoteRepository for MySqlQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let totals = quote.pricing.totals();

        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, tenant_id, number, client_id, issue_date, valid_until, status,
                discount_percent, tax_rate, subtotal, discount_amount, tax_amount, total,
                notes, invoice_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&quote.id)
        .bind(&quote.tenant_id)
        .bind(&quote.number)
        .bind(&quote.client_id)
        .bind(quote.issue_date)
        .bind(quote.valid_until)
        .bind(quote.status.as_str())
        .bind(quote.pricing.discount_percent().value())
        .bind(quote.pricing.tax_rate().value())
        .bind(totals.subtotal)
        .bind(totals.discount_amount)
        .bind(totals.tax_amount)
        .bind(totals.total)
        .bind(&quote.notes)
        .bind(&quote.invoice_id)
        .bind(quote.created_at)
        .bind(quote.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &quote.id, quote.pricing.items()).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn find_by_id(&self, tenant_id: &str, id: &str) -> Result<Option<Quote>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            "{} WHERE tenant_id = ? AND id = ?",
            SELECT_QUOTE
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => Ok(load_items(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(&self, tenant_id: &str, filter: &QuoteFilter) -> Result<Vec<Quote>> {
        let mut conn = self.pool.acquire().await?;

        let mut query = QueryBuilder::<MySql>::new(SELECT_QUOTE);
        query.push(" WHERE tenant_id = ").push_bind(tenant_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(client_id) = &filter.client_id {
            query.push(" AND client_id = ").push_bind(client_id.as_str());
        }
        query.push(" ORDER BY created_at DESC");

        let rows = query
            .build_query_as::<QuoteRow>()
            .fetch_all(&mut *conn)
            .await?;

        load_items(&mut conn, rows).await
    }

    async fn lock(&self, tenant_id: &str, id: &str) -> Result<Option<Box<dyn QuoteGuard>>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, QuoteRow>(&format!(
            "{} WHERE tenant_id = ? AND id = ? FOR UPDATE",
            SELECT_QUOTE
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let quote = load_items(&mut tx, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Quote {} vanished under lock", id)))?;

        Ok(Some(Box::new(MySqlQuoteGuard { tx, quote })))
    }
}

struct MySqlQuoteGuard {
    tx: Transaction<'static, MySql>,
    quote: Quote,
}

#[async_trait]
impl QuoteGuard for MySqlQuoteGuard {
    fn quote(&self) -> &Quote {
        &self.quote
    }

    async fn commit(self: Box<Self>, quote: &Quote, change: QuoteChange<'_>) -> Result<()> {
        let Self { mut tx, .. } = *self;

        match change {
            QuoteChange::Status => update_header(&mut tx, quote).await?,
            QuoteChange::Document => {
                update_header(&mut tx, quote).await?;
                sqlx::query("DELETE FROM quote_items WHERE quote_id = ?")
                    .bind(&quote.id)
                    .execute(&mut *tx)
                    .await?;
                insert_items(&mut tx, &quote.id, quote.pricing.items()).await?;
            }
            QuoteChange::LinkInvoice(invoice) => {
                insert_invoice(&mut tx, invoice).await?;

                let result = sqlx::query(
                    r#"
                    UPDATE quotes SET invoice_id = ?, updated_at = ?
                    WHERE tenant_id = ? AND id = ? AND invoice_id IS NULL
                    "#,
                )
                .bind(&invoice.id)
                .bind(quote.updated_at)
                .bind(&quote.tenant_id)
                .bind(&quote.id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(AppError::link(format!(
                        "Quote {} is already linked to an invoice",
                        quote.number
                    )));
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

const SELECT_QUOTE: &str = r#"
    SELECT id, tenant_id, number, client_id, issue_date, valid_until, status,
           discount_percent, tax_rate, notes, invoice_id, created_at, updated_at
    FROM quotes"#;

async fn insert_items(conn: &mut MySqlConnection, quote_id: &str, items: &[LineItem]) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO quote_items (quote_id, position, description, quantity, unit_price)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(quote_id)
        .bind(position as u32)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn update_header(conn: &mut MySqlConnection, quote: &Quote) -> Result<()> {
    let totals = quote.pricing.totals();

    sqlx::query(
        r#"
        UPDATE quotes
        SET valid_until = ?, status = ?, discount_percent = ?, tax_rate = ?,
            subtotal = ?, discount_amount = ?, tax_amount = ?, total = ?,
            notes = ?, updated_at = ?
        WHERE tenant_id = ? AND id = ?
        "#,
    )
    .bind(quote.valid_until)
    .bind(quote.status.as_str())
    .bind(quote.pricing.discount_percent().value())
    .bind(quote.pricing.tax_rate().value())
    .bind(totals.subtotal)
    .bind(totals.discount_amount)
    .bind(totals.tax_amount)
    .bind(totals.total)
    .bind(&quote.notes)
    .bind(quote.updated_at)
    .bind(&quote.tenant_id)
    .bind(&quote.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn load_items(conn: &mut MySqlConnection, rows: Vec<QuoteRow>) -> Result<Vec<Quote>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = QueryBuilder::<MySql>::new(
        "SELECT quote_id, description, quantity, unit_price FROM quote_items WHERE quote_id IN (",
    );
    let mut ids = query.separated(", ");
    for row in &rows {
        ids.push_bind(row.id.as_str());
    }
    query.push(") ORDER BY quote_id, position");

    let mut items: HashMap<String, Vec<LineItem>> = HashMap::new();
    for item in query.build_query_as::<QuoteItemRow>().fetch_all(&mut *conn).await? {
        items.entry(item.quote_id.clone()).or_default().push(LineItem {
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
        });
    }

    rows.into_iter()
        .map(|row| {
            let row_items = items.remove(&row.id).unwrap_or_default();
            row.into_quote(row_items)
        })
        .collect()
}

#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: String,
    tenant_id: String,
    number: String,
    client_id: String,
    issue_date: NaiveDate,
    valid_until: Option<NaiveDate>,
    status: String,
    discount_percent: Decimal,
    tax_rate: Decimal,
    notes: Option<String>,
    invoice_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuoteRow {
    fn into_quote(self, items: Vec<LineItem>) -> Result<Quote> {
        let corrupt = |field: &str, e: String| {
            AppError::Internal(format!("Invalid {} stored for quote {}: {}", field, self.id, e))
        };

        let status = QuoteStatus::from_str(&self.status).map_err(|e| corrupt("status", e))?;
        let discount_percent =
            Percent::new(self.discount_percent).map_err(|e| corrupt("discount", e.to_string()))?;
        let tax_rate = Percent::new(self.tax_rate).map_err(|e| corrupt("tax rate", e.to_string()))?;
        let pricing = Pricing::new(items, discount_percent, tax_rate)
            .map_err(|e| corrupt("items", e.to_string()))?;

        Ok(Quote {
            id: self.id,
            tenant_id: self.tenant_id,
            number: self.number,
            client_id: self.client_id,
            issue_date: self.issue_date,
            valid_until: self.valid_until,
            status,
            pricing,
            notes: self.notes,
            invoice_id: self.invoice_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuoteItemRow {
    quote_id: String,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
}
