// Quote lifecycle: DRAFT → SENT → {ACCEPTED, REJECTED}, edit window and conversion rules

use bizledger::core::{AppError, Percent};
use bizledger::invoices::InvoiceType;
use bizledger::quotes::models::{QuoteChanges, QuoteDraft};
use bizledger::quotes::{Quote, QuoteStatus};
use bizledger::totals::{LineItem, Pricing, PricingChanges};
use chrono::NaiveDate;
use rust_decimal_macros::dec;

const ALL: [QuoteStatus; 4] = [
    QuoteStatus::Draft,
    QuoteStatus::Sent,
    QuoteStatus::Accepted,
    QuoteStatus::Rejected,
];

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn quote() -> Quote {
    let items = vec![LineItem::new("Air filter".to_string(), dec!(2), dec!(50)).unwrap()];
    let pricing = Pricing::new(items, Percent::ZERO, Percent::new(dec!(20)).unwrap()).unwrap();

    Quote::new(
        "acme".to_string(),
        "Q-2025-00001".to_string(),
        QuoteDraft {
            client_id: "client-001".to_string(),
            issue_date: date(2025, 3, 1),
            valid_until: Some(date(2025, 3, 31)),
            pricing,
            notes: None,
        },
    )
    .unwrap()
}

fn quote_in(status: QuoteStatus) -> Quote {
    let mut quote = quote();
    quote.status = status;
    quote
}

#[test]
fn test_new_quote_is_draft() {
    let quote = quote();
    assert_eq!(quote.status, QuoteStatus::Draft);
    assert!(quote.invoice_id.is_none());
    assert_eq!(quote.pricing.total(), dec!(120));
}

#[test]
fn test_transition_table() {
    let legal = [
        (QuoteStatus::Draft, QuoteStatus::Sent),
        (QuoteStatus::Sent, QuoteStatus::Accepted),
        (QuoteStatus::Sent, QuoteStatus::Rejected),
    ];

    for from in ALL {
        for to in ALL {
            let mut quote = quote_in(from);
            let result = quote.transition_to(to);

            if legal.contains(&(from, to)) {
                assert!(result.is_ok(), "{} -> {} should be allowed", from, to);
                assert_eq!(quote.status, to);
            } else {
                let err = result.unwrap_err();
                assert!(
                    matches!(err, AppError::State(_)),
                    "{} -> {} should be a state error",
                    from,
                    to
                );
                assert_eq!(quote.status, from, "rejected transition must not change status");
            }
        }
    }
}

#[test]
fn test_cannot_skip_sent() {
    let mut quote = quote();
    let err = quote.transition_to(QuoteStatus::Accepted).unwrap_err();
    assert!(err.to_string().contains("DRAFT to ACCEPTED"));
}

#[test]
fn test_edit_window() {
    for status in ALL {
        let mut quote = quote_in(status);
        let result = quote.apply_changes(QuoteChanges {
            pricing: PricingChanges {
                discount_percent: Some(Percent::new(dec!(10)).unwrap()),
                ..Default::default()
            },
            ..Default::default()
        });

        match status {
            QuoteStatus::Draft | QuoteStatus::Sent => {
                assert!(result.is_ok());
                assert_eq!(quote.pricing.total(), dec!(108));
            }
            QuoteStatus::Accepted | QuoteStatus::Rejected => {
                let err = result.unwrap_err();
                assert!(matches!(err, AppError::State(_)));
                assert!(err.to_string().contains("duplicate it"));
                assert_eq!(quote.pricing.total(), dec!(120));
            }
        }
    }
}

#[test]
fn test_valid_until_cannot_precede_quote_date() {
    let mut quote = quote();
    let err = quote
        .apply_changes(QuoteChanges {
            valid_until: Some(date(2025, 2, 1)),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn test_only_accepted_quotes_convert() {
    for status in [QuoteStatus::Draft, QuoteStatus::Sent, QuoteStatus::Rejected] {
        let err = quote_in(status).ensure_convertible().unwrap_err();
        assert!(matches!(err, AppError::State(_)), "{} must not convert", status);
    }

    assert!(quote_in(QuoteStatus::Accepted).ensure_convertible().is_ok());
}

#[test]
fn test_link_is_set_once() {
    let mut quote = quote_in(QuoteStatus::Accepted);
    quote.link_invoice("inv-1").unwrap();
    assert_eq!(quote.invoice_id.as_deref(), Some("inv-1"));

    let err = quote.link_invoice("inv-2").unwrap_err();
    assert!(matches!(err, AppError::Link(_)));
    assert_eq!(quote.invoice_id.as_deref(), Some("inv-1"));
}

#[test]
fn test_invoice_draft_copies_pricing() {
    let quote = quote_in(QuoteStatus::Accepted);
    let draft = quote
        .invoice_draft(InvoiceType::Equipment, date(2025, 4, 1), Some(date(2025, 5, 1)))
        .unwrap();

    assert_eq!(draft.quote_id.as_deref(), Some(quote.id.as_str()));
    assert_eq!(draft.client_id, quote.client_id);
    assert_eq!(draft.pricing, quote.pricing);
    assert_eq!(draft.invoice_type, InvoiceType::Equipment);
}

#[test]
fn test_duplicate_copies_items_into_fresh_draft() {
    let source = quote_in(QuoteStatus::Rejected);
    let draft = source.duplicate(date(2025, 6, 1), Some(date(2025, 7, 1)));
    let copy = Quote::new(source.tenant_id.clone(), "Q-2025-00002".to_string(), draft).unwrap();

    assert_ne!(copy.id, source.id);
    assert_eq!(copy.status, QuoteStatus::Draft);
    assert_eq!(copy.issue_date, date(2025, 6, 1));
    assert_eq!(copy.pricing, source.pricing);
    assert!(copy.invoice_id.is_none());
}
