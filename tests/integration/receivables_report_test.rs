// Receivables report over invoices created through the services

#[path = "../helpers/mod.rs"]
mod helpers;

use bizledger::core::AppError;
use bizledger::invoices::models::InvoiceListQuery;
use bizledger::invoices::{DisplayStatus, InvoiceStatus};
use bizledger::middleware::{CallerContext, CallerRole};
use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// January 2025 book:
/// - overdue: 100, due Jan 20, 30 paid
/// - pending: 200 + 10% tax, due Mar 1
/// - paid: 50, marked paid
/// - cancelled: 80
/// - March invoice outside the range
async fn seed_january(billing: &TestBilling) {
    let ctx = user();
    let invoices = &billing.services.invoices;

    let overdue = invoices
        .create_invoice(
            &ctx,
            dated_invoice_request("100.00", date(2025, 1, 5), date(2025, 1, 20)),
        )
        .await
        .unwrap();
    billing
        .services
        .payments
        .apply_payment(&ctx, &overdue.invoice.id, payment("30.00"))
        .await
        .unwrap();

    let mut taxed = dated_invoice_request("200.00", date(2025, 1, 10), date(2025, 3, 1));
    taxed.tax_rate = pct("10");
    invoices.create_invoice(&ctx, taxed).await.unwrap();

    let paid = invoices
        .create_invoice(
            &ctx,
            dated_invoice_request("50.00", date(2025, 1, 15), date(2025, 1, 31)),
        )
        .await
        .unwrap();
    invoices
        .transition_invoice_status(&ctx, &paid.invoice.id, InvoiceStatus::Paid)
        .await
        .unwrap();

    let cancelled = invoices
        .create_invoice(
            &ctx,
            dated_invoice_request("80.00", date(2025, 1, 20), date(2025, 2, 20)),
        )
        .await
        .unwrap();
    invoices
        .transition_invoice_status(&ctx, &cancelled.invoice.id, InvoiceStatus::Cancelled)
        .await
        .unwrap();

    invoices
        .create_invoice(
            &ctx,
            dated_invoice_request("999.00", date(2025, 3, 10), date(2025, 4, 10)),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_breakdown_by_display_status() {
    let billing = TestBilling::new();
    seed_january(&billing).await;

    let report = billing
        .services
        .reports
        .receivables_report(&user(), date(2025, 1, 1), date(2025, 1, 31), Some(date(2025, 2, 1)))
        .await
        .unwrap();

    let statuses: Vec<DisplayStatus> = report.breakdown.iter().map(|row| row.status).collect();
    assert_eq!(
        statuses,
        vec![
            DisplayStatus::Pending,
            DisplayStatus::Overdue,
            DisplayStatus::Paid,
            DisplayStatus::Cancelled
        ]
    );

    let pending = report.row(DisplayStatus::Pending).unwrap();
    assert_eq!(pending.invoice_count, 1);
    assert_eq!(pending.total_amount, dec!(220));
    assert_eq!(pending.balance, dec!(220));

    let overdue = report.row(DisplayStatus::Overdue).unwrap();
    assert_eq!(overdue.invoice_count, 1);
    assert_eq!(overdue.paid_amount, dec!(30));
    assert_eq!(overdue.balance, dec!(70));

    let paid = report.row(DisplayStatus::Paid).unwrap();
    assert_eq!(paid.invoice_count, 1);
    assert_eq!(paid.balance, Decimal::ZERO);

    let cancelled = report.row(DisplayStatus::Cancelled).unwrap();
    assert_eq!(cancelled.invoice_count, 1);
    assert_eq!(cancelled.total_amount, dec!(80));

    assert_eq!(report.invoiced_total, dec!(370));
    assert_eq!(report.tax_total, dec!(20));
    assert_eq!(report.collected_total, dec!(80));
    assert_eq!(report.outstanding_balance, dec!(290));
    assert_eq!(report.overdue_balance, dec!(70));
}

#[tokio::test]
async fn test_as_of_moves_overdue_boundary() {
    let billing = TestBilling::new();
    seed_january(&billing).await;

    // On the due date itself the invoice is not yet overdue
    let report = billing
        .services
        .reports
        .receivables_report(&user(), date(2025, 1, 1), date(2025, 1, 31), Some(date(2025, 1, 20)))
        .await
        .unwrap();

    assert_eq!(report.row(DisplayStatus::Overdue).unwrap().invoice_count, 0);
    assert_eq!(report.row(DisplayStatus::Pending).unwrap().invoice_count, 2);
    assert_eq!(report.overdue_balance, Decimal::ZERO);
    assert_eq!(report.outstanding_balance, dec!(290));
}

#[tokio::test]
async fn test_report_is_tenant_scoped() {
    let billing = TestBilling::new();
    seed_january(&billing).await;

    let outsider = CallerContext::new(OTHER_TENANT, CallerRole::Admin);
    let report = billing
        .services
        .reports
        .receivables_report(&outsider, date(2025, 1, 1), date(2025, 1, 31), None)
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(report.breakdown.len(), 4);
    assert_eq!(report.invoiced_total, Decimal::ZERO);
}

#[tokio::test]
async fn test_invalid_ranges() {
    let billing = TestBilling::new();
    let reports = &billing.services.reports;

    let err = reports
        .receivables_report(&user(), date(2025, 2, 1), date(2025, 1, 1), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = reports
        .receivables_report(&user(), date(2024, 1, 1), date(2025, 6, 1), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Date range too large"));

    // Single day and a full leap year are accepted
    assert!(reports
        .receivables_report(&user(), date(2025, 1, 1), date(2025, 1, 1), None)
        .await
        .is_ok());
    assert!(reports
        .receivables_report(&user(), date(2024, 1, 1), date(2024, 12, 31), None)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_overdue_listing_matches_report() {
    let billing = TestBilling::new();
    seed_january(&billing).await;

    let overdue = billing
        .services
        .invoices
        .list_invoices(
            &user(),
            InvoiceListQuery {
                overdue_only: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Everything due in early 2025 and still pending is overdue today
    assert!(!overdue.is_empty());
    assert!(overdue
        .iter()
        .all(|view| view.display_status == DisplayStatus::Overdue
            && view.invoice.status == InvoiceStatus::Pending));
    assert!(overdue.iter().any(|view| view.invoice.total() == dec!(100)));
}
