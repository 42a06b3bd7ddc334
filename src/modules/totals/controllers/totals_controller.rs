//! Totals controller
//!
//! Live totals preview used by the quote and invoice editing forms, plus the
//! amount DTOs every document response embeds.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::core::error::AppError;
use crate::core::{money, Percent};
use crate::modules::totals::models::{DocumentTotals, LineItem, LineItemInput, Pricing};
use crate::modules::totals::services::TotalsCalculator;

/// Request body for POST /totals/preview
#[derive(Debug, Deserialize)]
pub struct TotalsPreviewRequest {
    #[serde(default)]
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub discount_percent: Percent,
    #[serde(default)]
    pub tax_rate: Percent,
}

/// Amounts rounded for presentation (decimal as string for JSON precision)
#[derive(Debug, Serialize, Deserialize)]
pub struct TotalsResponse {
    pub subtotal: String,
    pub discount_amount: String,
    pub taxable_base: String,
    pub tax_amount: String,
    pub total: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LineItemResponse {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

/// Items, rates and totals of a document as returned to callers
#[derive(Debug, Serialize, Deserialize)]
pub struct PricingResponse {
    pub items: Vec<LineItemResponse>,
    pub discount_percent: String,
    pub tax_rate: String,
    #[serde(flatten)]
    pub totals: TotalsResponse,
}

impl From<&DocumentTotals> for TotalsResponse {
    fn from(totals: &DocumentTotals) -> Self {
        Self {
            subtotal: money::format_amount(totals.subtotal),
            discount_amount: money::format_amount(totals.discount_amount),
            taxable_base: money::format_amount(totals.taxable_base),
            tax_amount: money::format_amount(totals.tax_amount),
            total: money::format_amount(totals.total),
        }
    }
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            description: item.description.clone(),
            quantity: item.quantity.normalize().to_string(),
            unit_price: money::format_amount(item.unit_price),
            total: item.total().map(money::format_amount).unwrap_or_default(),
        }
    }
}

impl From<&Pricing> for PricingResponse {
    fn from(pricing: &Pricing) -> Self {
        Self {
            items: pricing.items().iter().map(LineItemResponse::from).collect(),
            discount_percent: pricing.discount_percent().value().normalize().to_string(),
            tax_rate: pricing.tax_rate().value().normalize().to_string(),
            totals: TotalsResponse::from(pricing.totals()),
        }
    }
}

/// Preview document totals without persisting anything
///
/// POST /totals/preview
pub async fn preview_totals(
    request: web::Json<TotalsPreviewRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();

    // Unvalidated rows: the calculator skips anything not billable
    let items: Vec<LineItem> = request
        .items
        .into_iter()
        .map(|input| LineItem {
            description: input.description,
            quantity: input.quantity,
            unit_price: input.unit_price,
        })
        .collect();

    let totals = TotalsCalculator::compute(&items, request.discount_percent, request.tax_rate)?;

    Ok(HttpResponse::Ok().json(TotalsResponse::from(&totals)))
}

/// Configure totals routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/totals").route("/preview", web::post().to(preview_totals)));
}
