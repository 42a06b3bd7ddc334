use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::middleware::auth::CallerContext;
use crate::modules::invoices::controllers::InvoiceResponse;
use crate::modules::quotes::models::{
    ConvertQuoteRequest, CreateQuoteRequest, Quote, QuoteListQuery, QuoteStatus,
    QuoteStatusRequest, UpdateQuoteRequest,
};
use crate::modules::quotes::services::{QuoteConversion, QuoteService};
use crate::modules::totals::controllers::totals_controller::PricingResponse;

/// Quote as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub id: String,
    pub number: String,
    pub client_id: String,
    pub date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub status: QuoteStatus,
    #[serde(flatten)]
    pub pricing: PricingResponse,
    pub notes: Option<String>,
    pub invoice_id: Option<String>,
    pub can_edit: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            pricing: PricingResponse::from(&quote.pricing),
            can_edit: quote.can_edit(),
            id: quote.id,
            number: quote.number,
            client_id: quote.client_id,
            date: quote.issue_date,
            valid_until: quote.valid_until,
            status: quote.status,
            notes: quote.notes,
            invoice_id: quote.invoice_id,
            created_at: quote.created_at,
            updated_at: quote.updated_at,
        }
    }
}

/// Response of POST /quotes/{id}/invoice
#[derive(Debug, Serialize, Deserialize)]
pub struct QuoteConversionResponse {
    pub quote: QuoteResponse,
    pub invoice: InvoiceResponse,
}

impl From<QuoteConversion> for QuoteConversionResponse {
    fn from(conversion: QuoteConversion) -> Self {
        Self {
            quote: QuoteResponse::from(conversion.quote),
            invoice: InvoiceResponse::from(conversion.invoice),
        }
    }
}

/// POST /quotes
pub async fn create_quote(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    request: web::Json<CreateQuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let quote = service.create_quote(&ctx, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(QuoteResponse::from(quote)))
}

/// GET /quotes?status=SENT&client_id=...
pub async fn list_quotes(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    query: web::Query<QuoteListQuery>,
) -> Result<HttpResponse, AppError> {
    let quotes: Vec<QuoteResponse> = service
        .list_quotes(&ctx, query.into_inner())
        .await?
        .into_iter()
        .map(QuoteResponse::from)
        .collect();

    Ok(HttpResponse::Ok().json(quotes))
}

/// GET /quotes/{id}
pub async fn get_quote(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let quote = service.get_quote(&ctx, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(QuoteResponse::from(quote)))
}

/// PUT /quotes/{id}
pub async fn update_quote(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    path: web::Path<String>,
    request: web::Json<UpdateQuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let quote = service
        .update_quote(&ctx, &path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(QuoteResponse::from(quote)))
}

/// POST /quotes/{id}/status
pub async fn transition_quote_status(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    path: web::Path<String>,
    request: web::Json<QuoteStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let quote = service
        .transition_quote_status(&ctx, &path.into_inner(), request.status)
        .await?;

    Ok(HttpResponse::Ok().json(QuoteResponse::from(quote)))
}

/// POST /quotes/{id}/duplicate
pub async fn duplicate_quote(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let quote = service.duplicate_quote(&ctx, &path.into_inner()).await?;

    Ok(HttpResponse::Created().json(QuoteResponse::from(quote)))
}

/// POST /quotes/{id}/invoice
pub async fn convert_quote(
    service: web::Data<Arc<QuoteService>>,
    ctx: CallerContext,
    path: web::Path<String>,
    request: web::Json<ConvertQuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let conversion = service
        .convert_quote_to_invoice(&ctx, &path.into_inner(), request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(QuoteConversionResponse::from(conversion)))
}

/// Configure quote routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("", web::post().to(create_quote))
            .route("", web::get().to(list_quotes))
            .route("/{id}", web::get().to(get_quote))
            .route("/{id}", web::put().to(update_quote))
            .route("/{id}/status", web::post().to(transition_quote_status))
            .route("/{id}/duplicate", web::post().to(duplicate_quote))
            .route("/{id}/invoice", web::post().to(convert_quote)),
    );
}
