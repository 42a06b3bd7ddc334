use async_trait::async_trait;
use sqlx::MySqlPool;
use std::fmt;

use crate::core::{AppError, Result};

/// Kind of billing document carrying a system-assigned number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Quote,
    Invoice,
}

impl DocumentKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "Q",
            DocumentKind::Invoice => "INV",
        }
    }

    /// Key used by the per-tenant sequence table
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Quote => "quote",
            DocumentKind::Invoice => "invoice",
        }
    }

    /// `Q-2025-00042`, unique per tenant, kind and year
    pub fn format_number(&self, year: i32, sequence: u64) -> String {
        format!("{}-{}-{:05}", self.prefix(), year, sequence)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of system-assigned document numbers.
///
/// Sequences are per tenant, kind and year; numbers may have gaps (a number
/// drawn for a request that later fails is not reused) but never repeat.
#[async_trait]
pub trait NumberSequence: Send + Sync {
    async fn next_number(&self, tenant_id: &str, kind: DocumentKind, year: i32) -> Result<String>;
}

/// MySQL-backed sequence using the `LAST_INSERT_ID(expr)` counter idiom
pub struct MySqlNumberSequence {
    pool: MySqlPool,
}

impl MySqlNumberSequence {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NumberSequence for MySqlNumberSequence {
    async fn next_number(&self, tenant_id: &str, kind: DocumentKind, year: i32) -> Result<String> {
        // LAST_INSERT_ID() is per connection, keep both statements on one
        let mut conn = self.pool.acquire().await?;

        sqlx::query(
            r#"
            INSERT INTO document_sequences (tenant_id, kind, year, last_value)
            VALUES (?, ?, ?, LAST_INSERT_ID(1))
            ON DUPLICATE KEY UPDATE last_value = LAST_INSERT_ID(last_value + 1)
            "#,
        )
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(year)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to advance {} sequence: {}", kind, e)))?;

        let (sequence,): (u64,) = sqlx::query_as("SELECT LAST_INSERT_ID()")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read {} sequence: {}", kind, e)))?;

        Ok(kind.format_number(year, sequence))
    }
}
