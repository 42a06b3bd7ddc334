// Service wiring and route registration shared by the binary and the HTTP tests.

use std::sync::Arc;

use actix_web::web;

use crate::config::BillingConfig;
use crate::core::NumberSequence;
use crate::middleware::{json_config, path_config, query_config};
use crate::modules::invoices::{InvoiceRepository, InvoiceService};
use crate::modules::notifications::Notifier;
use crate::modules::payments::PaymentService;
use crate::modules::quotes::{QuoteRepository, QuoteService};
use crate::modules::reports::ReportService;
use crate::modules::{invoices, payments, quotes, reports, totals};

/// The billing services, built once and shared by every worker
#[derive(Clone)]
pub struct BillingServices {
    pub quotes: Arc<QuoteService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
    pub reports: Arc<ReportService>,
}

impl BillingServices {
    pub fn new(
        quote_repository: Arc<dyn QuoteRepository>,
        invoice_repository: Arc<dyn InvoiceRepository>,
        numbers: Arc<dyn NumberSequence>,
        notifier: Arc<dyn Notifier>,
        billing: &BillingConfig,
    ) -> Self {
        let calendar = billing.calendar();

        let invoices = Arc::new(InvoiceService::new(
            invoice_repository.clone(),
            numbers.clone(),
            notifier.clone(),
            calendar,
            billing.payment_terms_days,
        ));

        let quotes = Arc::new(QuoteService::new(
            quote_repository,
            invoices.clone(),
            numbers,
            notifier,
            calendar,
            billing.quote_validity_days,
        ));

        Self {
            quotes,
            invoices,
            payments: Arc::new(PaymentService::new(invoice_repository.clone(), calendar)),
            reports: Arc::new(ReportService::new(invoice_repository, calendar)),
        }
    }
}

/// Register shared state, extractor configs and every billing route.
/// Health probes are registered separately because readiness needs the pool.
pub fn configure(cfg: &mut web::ServiceConfig, services: &BillingServices) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .app_data(web::Data::new(services.quotes.clone()))
        .app_data(web::Data::new(services.invoices.clone()))
        .app_data(web::Data::new(services.payments.clone()))
        .app_data(web::Data::new(services.reports.clone()));

    cfg.configure(totals::controllers::configure)
        .configure(quotes::controllers::configure)
        .configure(payments::controllers::configure)
        .configure(invoices::controllers::configure)
        .configure(reports::controllers::configure);
}
