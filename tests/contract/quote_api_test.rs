// HTTP contract for /quotes: lifecycle, edit window, duplication and conversion

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use helpers::*;
use serde_json::{json, Value};

macro_rules! billing_app {
    ($billing:expr) => {
        test::init_service(
            App::new().configure(|cfg| bizledger::configure(cfg, &$billing.services)),
        )
        .await
    };
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let req = $req.insert_header(("X-Tenant-ID", TENANT)).to_request();
        test::call_service(&$app, req).await
    }};
}

macro_rules! set_status {
    ($app:expr, $id:expr, $status:expr) => {{
        let resp = send!(
            $app,
            test::TestRequest::post()
                .uri(&format!("/quotes/{}/status", $id))
                .set_json(json!({ "status": $status }))
        );
        resp.status()
    }};
}

#[actix_web::test]
async fn test_create_quote_response_shape() {
    let billing = TestBilling::new();
    let app = billing_app!(billing);

    let resp = send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    assert_eq!(resp.status(), StatusCode::CREATED);

    let quote: Value = test::read_body_json(resp).await;
    assert!(quote["number"].as_str().unwrap().starts_with("Q-"));
    assert_eq!(quote["status"], "DRAFT");
    assert_eq!(quote["can_edit"], true);
    assert!(quote["invoice_id"].is_null());
    assert!(quote["valid_until"].is_string());

    // The blank row was pruned
    assert_eq!(quote["items"].as_array().unwrap().len(), 2);
    assert_eq!(quote["items"][0]["total"], "100.00");
    assert_eq!(quote["discount_percent"], "10");
    assert_eq!(quote["tax_rate"], "11.5");
    assert_eq!(quote["subtotal"], "125.00");
    assert_eq!(quote["tax_amount"], "12.94");
    assert_eq!(quote["total"], "125.44");
}

#[actix_web::test]
async fn test_accept_and_convert_once() {
    let billing = TestBilling::new();
    let app = billing_app!(billing);

    let resp = send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    let quote: Value = test::read_body_json(resp).await;
    let id = quote["id"].as_str().unwrap();

    assert_eq!(set_status!(app, id, "SENT"), StatusCode::OK);
    assert_eq!(set_status!(app, id, "ACCEPTED"), StatusCode::OK);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/quotes/{}/invoice", id))
            .set_json(json!({ "invoice_type": "EQUIPMENT", "due_date": "2099-12-31" }))
    );
    assert_eq!(resp.status(), StatusCode::CREATED);

    let conversion: Value = test::read_body_json(resp).await;
    let invoice = &conversion["invoice"];
    assert_eq!(invoice["quote_id"], quote["id"]);
    assert_eq!(invoice["status"], "PENDING");
    assert_eq!(invoice["invoice_type"], "EQUIPMENT");
    assert_eq!(invoice["due_date"], "2099-12-31");
    assert_eq!(invoice["total"], "125.44");
    assert_eq!(invoice["balance"], "125.44");
    assert_eq!(conversion["quote"]["invoice_id"], invoice["id"]);
    assert_eq!(conversion["quote"]["can_edit"], false);

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/quotes/{}/invoice", id))
            .set_json(json!({}))
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "link");

    // The invoice is reachable through the invoice API
    let resp = send!(
        app,
        test::TestRequest::get().uri(&format!("/invoices/{}", invoice["id"].as_str().unwrap()))
    );
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_unaccepted_quote_conversion_is_state_error() {
    let billing = TestBilling::new();
    let app = billing_app!(billing);

    let resp = send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    let quote: Value = test::read_body_json(resp).await;
    let id = quote["id"].as_str().unwrap();

    let resp = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/quotes/{}/invoice", id))
            .set_json(json!({}))
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "state");
}

#[actix_web::test]
async fn test_status_flow_is_enforced() {
    let billing = TestBilling::new();
    let app = billing_app!(billing);

    let resp = send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    let quote: Value = test::read_body_json(resp).await;
    let id = quote["id"].as_str().unwrap();

    assert_eq!(set_status!(app, id, "ACCEPTED"), StatusCode::CONFLICT);
    assert_eq!(set_status!(app, id, "ARCHIVED"), StatusCode::BAD_REQUEST);
    assert_eq!(set_status!(app, id, "SENT"), StatusCode::OK);
    assert_eq!(set_status!(app, id, "DRAFT"), StatusCode::CONFLICT);
    assert_eq!(set_status!(app, id, "REJECTED"), StatusCode::OK);
    assert_eq!(set_status!(app, id, "ACCEPTED"), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_rejected_quote_edit_and_duplicate() {
    let billing = TestBilling::new();
    let app = billing_app!(billing);

    let resp = send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    let quote: Value = test::read_body_json(resp).await;
    let id = quote["id"].as_str().unwrap();

    set_status!(app, id, "SENT");
    set_status!(app, id, "REJECTED");

    let resp = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/quotes/{}", id))
            .set_json(json!({ "discount_percent": "0" }))
    );
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "state");

    let resp = send!(
        app,
        test::TestRequest::post().uri(&format!("/quotes/{}/duplicate", id))
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let copy: Value = test::read_body_json(resp).await;
    assert_ne!(copy["id"], quote["id"]);
    assert_ne!(copy["number"], quote["number"]);
    assert_eq!(copy["status"], "DRAFT");
    assert_eq!(copy["total"], quote["total"]);

    let resp = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/quotes/{}", copy["id"].as_str().unwrap()))
            .set_json(json!({ "discount_percent": "0" }))
    );
    assert_eq!(resp.status(), StatusCode::OK);
    let edited: Value = test::read_body_json(resp).await;
    assert_eq!(edited["subtotal"], "125.00");
    assert_eq!(edited["total"], "139.38");
}

#[actix_web::test]
async fn test_list_and_get() {
    let billing = TestBilling::new();
    let app = billing_app!(billing);

    let resp = send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    let first: Value = test::read_body_json(resp).await;
    send!(app, test::TestRequest::post().uri("/quotes").set_json(quote_payload()));
    set_status!(app, first["id"].as_str().unwrap(), "SENT");

    let resp = send!(app, test::TestRequest::get().uri("/quotes?status=SENT"));
    assert_eq!(resp.status(), StatusCode::OK);
    let sent: Value = test::read_body_json(resp).await;
    assert_eq!(sent.as_array().unwrap().len(), 1);
    assert_eq!(sent[0]["id"], first["id"]);

    let resp = send!(app, test::TestRequest::get().uri("/quotes"));
    let all: Value = test::read_body_json(resp).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let resp = send!(app, test::TestRequest::get().uri("/quotes/does-not-exist"));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "not_found");
}
