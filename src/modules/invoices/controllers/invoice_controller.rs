use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::core::money;
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::models::{
    CreateInvoiceRequest, DisplayStatus, InvoiceListQuery, InvoiceStatus, InvoiceStatusRequest,
    InvoiceType, UpdateInvoiceRequest,
};
use crate::modules::invoices::services::{InvoiceService, InvoiceUpdate, InvoiceView};
use crate::modules::payments::controllers::PaymentResponse;
use crate::modules::totals::controllers::totals_controller::PricingResponse;

/// Invoice as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub number: String,
    pub client_id: String,
    pub quote_id: Option<String>,
    pub invoice_type: InvoiceType,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// Stored status
    pub status: InvoiceStatus,
    /// Status label for today (PENDING invoices past due show as OVERDUE)
    pub display_status: DisplayStatus,
    #[serde(flatten)]
    pub pricing: PricingResponse,
    pub paid_amount: String,
    pub balance: String,
    pub payments: Vec<PaymentResponse>,
    pub can_delete: bool,
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvoiceView> for InvoiceResponse {
    fn from(view: InvoiceView) -> Self {
        let invoice = view.invoice;

        Self {
            pricing: PricingResponse::from(&invoice.pricing),
            paid_amount: money::format_amount(invoice.paid_amount),
            balance: money::format_amount(invoice.balance()),
            payments: invoice.payments.iter().map(PaymentResponse::from).collect(),
            can_delete: invoice.can_delete(),
            display_status: view.display_status,
            id: invoice.id,
            number: invoice.number,
            client_id: invoice.client_id,
            quote_id: invoice.quote_id,
            invoice_type: invoice.invoice_type,
            date: invoice.issue_date,
            due_date: invoice.due_date,
            status: invoice.status,
            notes: invoice.notes,
            warnings: Vec::new(),
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
        }
    }
}

impl From<InvoiceUpdate> for InvoiceResponse {
    fn from(update: InvoiceUpdate) -> Self {
        let mut response = InvoiceResponse::from(update.view);
        response.warnings = update.warnings;
        response
    }
}

/// Create a new invoice
/// POST /invoices
pub async fn create_invoice(
    service: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    request: web::Json<CreateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let view = service.create_invoice(&ctx, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(InvoiceResponse::from(view)))
}

/// List invoices for the tenant
/// GET /invoices?status=PENDING&client_id=...&overdue_only=true
pub async fn list_invoices(
    service: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    query: web::Query<InvoiceListQuery>,
) -> Result<HttpResponse, AppError> {
    let invoices: Vec<InvoiceResponse> = service
        .list_invoices(&ctx, query.into_inner())
        .await?
        .into_iter()
        .map(InvoiceResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(invoices))
}

/// GET /invoices/{id}
pub async fn get_invoice(
    service: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = service.get_invoice(&ctx, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(view)))
}

/// Edit items, rates or terms
/// PUT /invoices/{id}
pub async fn update_invoice(
    service: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    path: web::Path<String>,
    request: web::Json<UpdateInvoiceRequest>,
) -> Result<HttpResponse, AppError> {
    let update = service
        .update_invoice(&ctx, &path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(update)))
}

/// POST /invoices/{id}/status
pub async fn transition_invoice_status(
    service: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    path: web::Path<String>,
    request: web::Json<InvoiceStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let view = service
        .transition_invoice_status(&ctx, &path.into_inner(), request.status)
        .await?;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(view)))
}

/// DELETE /invoices/{id}
pub async fn delete_invoice(
    service: web::Data<Arc<InvoiceService>>,
    ctx: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    service.delete_invoice(&ctx, &path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Configure invoice routes.
///
/// Plain resources rather than a scope so `/invoices/{id}/payments` can be
/// registered by the payments module.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/invoices")
            .route(web::post().to(create_invoice))
            .route(web::get().to(list_invoices)),
    )
    .service(
        web::resource("/invoices/{id}")
            .route(web::get().to(get_invoice))
            .route(web::put().to(update_invoice))
            .route(web::delete().to(delete_invoice)),
    )
    .service(
        web::resource("/invoices/{id}/status").route(web::post().to(transition_invoice_status)),
    );
}
