// Payment ledger: balance checks, one-cent tolerance and the paid = Σ payments invariant

use bizledger::core::money::{max_amount, round_for_storage};
use bizledger::core::{AppError, Percent};
use bizledger::invoices::models::InvoiceDraft;
use bizledger::invoices::{Invoice, InvoiceStatus, InvoiceType};
use bizledger::payments::services::NewPayment;
use bizledger::payments::{PaymentLedger, PaymentMethod};
use bizledger::totals::{LineItem, Pricing};
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn invoice(total: Decimal) -> Invoice {
    let item = LineItem::new("Boiler service".to_string(), Decimal::ONE, total).unwrap();
    Invoice::new(
        "acme".to_string(),
        "INV-2025-00007".to_string(),
        InvoiceDraft {
            client_id: "client-001".to_string(),
            quote_id: None,
            invoice_type: InvoiceType::Service,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: None,
            pricing: Pricing::new(vec![item], Percent::ZERO, Percent::ZERO).unwrap(),
            notes: None,
        },
    )
    .unwrap()
}

fn entry(amount: Decimal) -> NewPayment {
    NewPayment {
        amount,
        method: PaymentMethod::Transfer,
        paid_at: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        notes: Some("  ".to_string()),
    }
}

#[test]
fn test_partial_payments_accumulate() {
    let mut inv = invoice(dec!(100));

    let first = PaymentLedger::apply(&mut inv, entry(dec!(40))).unwrap();
    assert_eq!(first.amount, dec!(40));
    assert_eq!(inv.balance(), dec!(60));
    assert!(!PaymentLedger::is_settled(&inv));
    assert!(first.notes.is_none());

    PaymentLedger::apply(&mut inv, entry(dec!(60))).unwrap();
    assert_eq!(inv.paid_amount, dec!(100));
    assert!(PaymentLedger::is_settled(&inv));

    // Covering the balance does not settle the status
    assert_eq!(inv.status, InvoiceStatus::Pending);
}

#[test]
fn test_overpayment_is_rejected_with_balance() {
    let mut inv = invoice(dec!(100));
    PaymentLedger::apply(&mut inv, entry(dec!(95))).unwrap();

    let err = PaymentLedger::apply(&mut inv, entry(dec!(5.02))).unwrap_err();
    match err {
        AppError::Balance { message, balance } => {
            assert_eq!(message, "payment exceeds pending balance of 5.00");
            assert_eq!(balance, dec!(5));
        }
        other => panic!("expected balance error, got {:?}", other),
    }

    assert_eq!(inv.payments.len(), 1);
    assert_eq!(inv.paid_amount, dec!(95));
}

#[test]
fn test_amount_within_one_cent_records_exact_balance() {
    let mut inv = invoice(dec!(100));
    PaymentLedger::apply(&mut inv, entry(dec!(95))).unwrap();

    let payment = PaymentLedger::apply(&mut inv, entry(dec!(5.01))).unwrap();
    assert_eq!(payment.amount, dec!(5));
    assert_eq!(inv.paid_amount, inv.total());
}

#[test]
fn test_unrounded_balance_is_payable() {
    // 112.5 + 11.5% tax = 125.4375, shown as 125.44
    let item = LineItem::new("Install".to_string(), Decimal::ONE, dec!(112.5)).unwrap();
    let mut inv = invoice(dec!(1));
    inv.pricing = Pricing::new(vec![item], Percent::ZERO, Percent::new(dec!(11.5)).unwrap()).unwrap();

    let payment = PaymentLedger::apply(&mut inv, entry(dec!(125.44))).unwrap();
    assert_eq!(payment.amount, dec!(125.4375));
    assert_eq!(inv.balance(), Decimal::ZERO);
}

/// 19.99 with 12.5% discount and 11.5% tax: 19.50274375 before rounding
fn odd_total_invoice() -> Invoice {
    let item = LineItem::new("Thermostat".to_string(), Decimal::ONE, dec!(19.99)).unwrap();
    let mut inv = invoice(dec!(1));
    inv.pricing = Pricing::new(
        vec![item],
        Percent::new(dec!(12.5)).unwrap(),
        Percent::new(dec!(11.5)).unwrap(),
    )
    .unwrap();
    inv
}

#[test]
fn test_settled_amounts_survive_storage_rounding() {
    let mut paid_by_ledger = odd_total_invoice();
    assert_eq!(paid_by_ledger.total(), dec!(19.502744));

    let payment = PaymentLedger::apply(&mut paid_by_ledger, entry(dec!(19.51))).unwrap();
    assert_eq!(payment.amount, dec!(19.502744));
    assert_eq!(round_for_storage(payment.amount), payment.amount);
    assert_eq!(round_for_storage(paid_by_ledger.paid_amount), paid_by_ledger.total());

    let mut marked_paid = odd_total_invoice();
    marked_paid.transition_to(InvoiceStatus::Paid).unwrap();
    assert_eq!(round_for_storage(marked_paid.paid_amount), marked_paid.total());
    assert_eq!(marked_paid.balance(), Decimal::ZERO);
}

#[test]
fn test_amount_beyond_storage_scale_is_rejected() {
    let mut inv = invoice(dec!(100));
    let err = PaymentLedger::apply(&mut inv, entry(dec!(33.3333333))).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(inv.payments.is_empty());
    assert_eq!(inv.paid_amount, Decimal::ZERO);
}

#[test]
fn test_largest_storable_invoice_accepts_payment() {
    let mut inv = invoice(max_amount());
    let payment = PaymentLedger::apply(&mut inv, entry(max_amount())).unwrap();
    assert_eq!(payment.amount, max_amount());
    assert!(PaymentLedger::is_settled(&inv));
}

#[test]
fn test_non_positive_amount() {
    let mut inv = invoice(dec!(100));

    for amount in [dec!(0), dec!(-5)] {
        let err = PaymentLedger::apply(&mut inv, entry(amount)).unwrap_err();
        assert!(matches!(err, AppError::Balance { .. }));
        assert!(err.to_string().contains("amount must be greater than 0"));
    }
    assert!(inv.payments.is_empty());
}

#[test]
fn test_fully_paid_invoice_has_no_pending_balance() {
    let mut inv = invoice(dec!(100));
    PaymentLedger::apply(&mut inv, entry(dec!(100))).unwrap();

    let err = PaymentLedger::apply(&mut inv, entry(dec!(0.01))).unwrap_err();
    assert!(err.to_string().contains("no pending balance"));
}

#[test]
fn test_only_pending_invoices_accept_payments() {
    let mut paid = invoice(dec!(100));
    paid.transition_to(InvoiceStatus::Paid).unwrap();
    assert!(matches!(
        PaymentLedger::apply(&mut paid, entry(dec!(1))).unwrap_err(),
        AppError::State(_)
    ));

    let mut cancelled = invoice(dec!(100));
    cancelled.transition_to(InvoiceStatus::Cancelled).unwrap();
    assert!(matches!(
        PaymentLedger::apply(&mut cancelled, entry(dec!(1))).unwrap_err(),
        AppError::State(_)
    ));
}

proptest! {
    #[test]
    fn prop_paid_equals_sum_and_never_exceeds_total(
        total in (1i64..10_000_000_000_000, 0u32..=6),
        attempts in prop::collection::vec((0i64..600_000_000_000_000, 0u32..=7), 1..20),
    ) {
        let mut inv = invoice(Decimal::new(total.0, total.1));

        for (mantissa, scale) in attempts {
            let before = inv.clone();
            let amount = Decimal::new(mantissa, scale);

            match PaymentLedger::apply(&mut inv, entry(amount)) {
                Ok(payment) => {
                    prop_assert!(payment.amount > Decimal::ZERO);
                    prop_assert!(payment.amount <= before.balance());
                }
                Err(_) => prop_assert_eq!(&inv, &before),
            }

            prop_assert_eq!(inv.paid_amount, inv.recorded_payments());
            prop_assert_eq!(round_for_storage(inv.paid_amount), inv.paid_amount);
            prop_assert!(inv.paid_amount <= inv.total());
            prop_assert!(inv.balance() >= Decimal::ZERO);
        }
    }
}
