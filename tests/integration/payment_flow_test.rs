// Payment flow through the services: partial payments, tolerance,
// mark-as-paid and serialization of concurrent payments on one invoice

#[path = "../helpers/mod.rs"]
mod helpers;

use bizledger::core::AppError;
use bizledger::invoices::models::InvoiceStatusRequest;
use bizledger::invoices::InvoiceStatus;
use bizledger::middleware::{CallerContext, CallerRole};
use bizledger::modules::notifications::BillingEvent;
use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_partial_payments_then_mark_paid() {
    let billing = TestBilling::new();
    let ctx = user();

    let view = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("100.00"))
        .await
        .unwrap();
    let id = view.invoice.id.clone();
    assert_eq!(view.invoice.status, InvoiceStatus::Pending);

    let first = billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("40.00"))
        .await
        .unwrap();
    assert_eq!(first.balance, dec!(60));
    assert!(!first.settled);

    let second = billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("60.00"))
        .await
        .unwrap();
    assert_eq!(second.balance, Decimal::ZERO);
    assert!(second.settled);

    // Settling the balance does not flip the status
    let stored = billing.invoices.stored(TENANT, &id).unwrap();
    assert_eq!(stored.status, InvoiceStatus::Pending);
    assert_eq!(stored.paid_amount, dec!(100));
    assert_eq!(stored.payments.len(), 2);

    let paid = billing
        .services
        .invoices
        .transition_invoice_status(&ctx, &id, InvoiceStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
    assert_eq!(paid.invoice.paid_amount, dec!(100));

    let events = billing.notifier.wait_for(1).await;
    assert_eq!(events.len(), 1);
    match &events[0] {
        BillingEvent::InvoicePaid { invoice_id, total, .. } => {
            assert_eq!(invoice_id, &id);
            assert_eq!(*total, dec!(100));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_mark_paid_without_payments_settles_in_full() {
    let billing = TestBilling::new();
    let ctx = user();

    let id = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("250.00"))
        .await
        .unwrap()
        .invoice
        .id;

    let request: InvoiceStatusRequest = serde_json::from_str(r#"{"status":"PAID"}"#).unwrap();
    let view = billing
        .services
        .invoices
        .transition_invoice_status(&ctx, &id, request.status)
        .await
        .unwrap();

    assert_eq!(view.invoice.paid_amount, dec!(250));
    assert!(view.invoice.payments.is_empty());

    let err = billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("1.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::State(_)));
}

#[tokio::test]
async fn test_tolerance_and_overpayment() {
    let billing = TestBilling::new();
    let ctx = user();

    let id = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("100.00"))
        .await
        .unwrap()
        .invoice
        .id;

    billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("95.00"))
        .await
        .unwrap();

    let err = billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("5.02"))
        .await
        .unwrap_err();
    match err {
        AppError::Balance { balance, .. } => assert_eq!(balance, dec!(5)),
        other => panic!("expected balance error, got {:?}", other),
    }

    let receipt = billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("5.005"))
        .await
        .unwrap();
    assert_eq!(receipt.payment.amount, dec!(5));
    assert!(receipt.settled);
    assert_eq!(receipt.invoice.paid_amount, receipt.invoice.total());
}

#[tokio::test]
async fn test_payments_rejected_on_cancelled_invoice() {
    let billing = TestBilling::new();
    let ctx = user();

    let id = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("80.00"))
        .await
        .unwrap()
        .invoice
        .id;

    billing
        .services
        .invoices
        .transition_invoice_status(&ctx, &id, InvoiceStatus::Cancelled)
        .await
        .unwrap();

    let err = billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("10.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::State(_)));

    // Reactivated invoices accept payments again
    billing
        .services
        .invoices
        .transition_invoice_status(&ctx, &id, InvoiceStatus::Pending)
        .await
        .unwrap();
    assert!(billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("10.00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_invoice_with_payments_cannot_be_deleted() {
    let billing = TestBilling::new();
    let ctx = user();

    let id = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("100.00"))
        .await
        .unwrap()
        .invoice
        .id;

    billing
        .services
        .payments
        .apply_payment(&ctx, &id, payment("10.00"))
        .await
        .unwrap();

    let err = billing.services.invoices.delete_invoice(&ctx, &id).await.unwrap_err();
    assert!(matches!(err, AppError::State(_)));
    assert!(billing.invoices.stored(TENANT, &id).is_some());

    let untouched = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("20.00"))
        .await
        .unwrap()
        .invoice
        .id;
    billing.services.invoices.delete_invoice(&ctx, &untouched).await.unwrap();
    assert!(billing.invoices.stored(TENANT, &untouched).is_none());
}

#[tokio::test]
async fn test_payments_are_tenant_scoped() {
    let billing = TestBilling::new();

    let id = billing
        .services
        .invoices
        .create_invoice(&user(), invoice_request("100.00"))
        .await
        .unwrap()
        .invoice
        .id;

    let outsider = CallerContext::new(OTHER_TENANT, CallerRole::Superadmin);
    let err = billing
        .services
        .payments
        .apply_payment(&outsider, &id, payment("10.00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = billing
        .services
        .payments
        .list_payments(&outsider, &id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_list_payments_oldest_first() {
    let billing = TestBilling::new();
    let ctx = user();

    let id = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("100.00"))
        .await
        .unwrap()
        .invoice
        .id;

    for amount in ["10.00", "20.00", "30.00"] {
        billing
            .services
            .payments
            .apply_payment(&ctx, &id, payment(amount))
            .await
            .unwrap();
    }

    let amounts: Vec<Decimal> = billing
        .services
        .payments
        .list_payments(&ctx, &id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.amount)
        .collect();
    assert_eq!(amounts, vec![dec!(10), dec!(20), dec!(30)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_never_overpay() {
    let billing = TestBilling::new();

    let id = billing
        .services
        .invoices
        .create_invoice(&user(), invoice_request("100.00"))
        .await
        .unwrap()
        .invoice
        .id;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let payments = billing.services.payments.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            payments.apply_payment(&user(), &id, payment("20.00")).await
        }));
    }

    let mut accepted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::Balance { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    assert_eq!(accepted, 5);
    assert_eq!(rejected, 5);

    let stored = billing.invoices.stored(TENANT, &id).unwrap();
    assert_eq!(stored.paid_amount, dec!(100));
    assert_eq!(stored.recorded_payments(), dec!(100));
    assert_eq!(stored.payments.len(), 5);
}

#[tokio::test]
async fn test_settled_invoice_reloads_with_zero_balance() {
    let billing = TestBilling::new();
    let ctx = user();

    // 19.99 less 12.5% plus 11.5% tax
    let mut request = invoice_request("19.99");
    request.discount_percent = pct("12.5");
    request.tax_rate = pct("11.5");

    let by_payment = billing
        .services
        .invoices
        .create_invoice(&ctx, request.clone())
        .await
        .unwrap()
        .invoice
        .id;
    let receipt = billing
        .services
        .payments
        .apply_payment(&ctx, &by_payment, payment("19.51"))
        .await
        .unwrap();
    assert!(receipt.settled);

    let reloaded = billing.invoices.stored(TENANT, &by_payment).unwrap();
    assert_eq!(reloaded.total(), dec!(19.502744));
    assert_eq!(reloaded.paid_amount, reloaded.total());
    assert_eq!(reloaded.balance(), Decimal::ZERO);

    let by_status = billing
        .services
        .invoices
        .create_invoice(&ctx, request)
        .await
        .unwrap()
        .invoice
        .id;
    billing
        .services
        .invoices
        .transition_invoice_status(&ctx, &by_status, InvoiceStatus::Paid)
        .await
        .unwrap();

    let reloaded = billing
        .services
        .invoices
        .get_invoice(&ctx, &by_status)
        .await
        .unwrap();
    assert_eq!(reloaded.invoice.paid_amount, reloaded.invoice.total());
    assert_eq!(reloaded.invoice.balance(), Decimal::ZERO);
}

#[tokio::test]
async fn test_rates_and_amounts_beyond_storage_are_rejected() {
    let billing = TestBilling::new();
    let ctx = user();

    let err = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("100000000000000000000"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = billing
        .services
        .invoices
        .create_invoice(&ctx, invoice_request("19.9999999"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(billing.invoices.count(TENANT), 0);
}
