use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::core::money;
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::controllers::InvoiceResponse;
use crate::modules::invoices::services::InvoiceService;
use crate::modules::payments::models::{Payment, PaymentMethod, PaymentRequest};
use crate::modules::payments::services::{PaymentReceipt, PaymentService};

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: String,
    pub invoice_id: String,
    pub amount: String,
    pub method: PaymentMethod,
    pub paid_at: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.clone(),
            invoice_id: payment.invoice_id.clone(),
            amount: money::format_amount(payment.amount),
            method: payment.method,
            paid_at: payment.paid_at,
            notes: payment.notes.clone(),
            created_at: payment.created_at,
        }
    }
}

/// Response of POST /invoices/{id}/payments
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentReceiptResponse {
    pub payment: PaymentResponse,
    pub invoice: InvoiceResponse,
    pub balance: String,
    /// Balance reached zero; the invoice can now be marked as paid
    pub settled: bool,
}

/// Record a payment
/// POST /invoices/{id}/payments
pub async fn apply_payment(
    payments: web::Data<Arc<PaymentService>>,
    invoices: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    path: web::Path<String>,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let PaymentReceipt {
        invoice,
        payment,
        balance,
        settled,
    } = payments
        .apply_payment(&ctx, &path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(PaymentReceiptResponse {
        payment: PaymentResponse::from(&payment),
        invoice: InvoiceResponse::from(invoices.view(invoice)),
        balance: money::format_amount(balance),
        settled,
    }))
}

/// GET /invoices/{id}/payments
pub async fn list_payments(
    payments: web::Data<Arc<PaymentService>>,
    ctx: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let payments: Vec<PaymentResponse> = payments
        .list_payments(&ctx, &path.into_inner())
        .await?
        .iter()
        .map(PaymentResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(payments))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/invoices/{id}/payments")
            .route(web::post().to(apply_payment))
            .route(web::get().to(list_payments)),
    );
}
