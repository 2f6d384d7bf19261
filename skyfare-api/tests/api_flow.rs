use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use skyfare_api::state::{AppState, AuthConfig};
use skyfare_api::app;
use skyfare_core::memory::MemoryStore;
use skyfare_core::models::{Flight, NewAirport, NewFlight};
use skyfare_core::{CompanyInfo, FlightStore};
use skyfare_notify::RecordingMailer;

fn company() -> CompanyInfo {
    CompanyInfo {
        name: "SkyTunisia".to_string(),
        address: "12 Avenue Habib Bourguiba, Tunis".to_string(),
        support_email: "support@skytunisia.example".to_string(),
        support_phone: "+216 70 000 000".to_string(),
        currency: "TND".to_string(),
        from_email: "no-reply@skytunisia.example".to_string(),
    }
}

fn test_app() -> (Router, Arc<MemoryStore>, Arc<RecordingMailer>) {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let state = AppState {
        flights: store.clone(),
        bookings: store.clone(),
        contacts: store.clone(),
        users: store.clone(),
        mailer: mailer.clone(),
        auth: AuthConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        },
        company: company(),
    };
    (app(state), store, mailer)
}

async fn seed_flight(store: &MemoryStore, number: &str, capacity: i32, hours_ahead: i64) -> Flight {
    for code in ["TUN", "CDG"] {
        // Ignore duplicate-code conflicts when seeding repeatedly.
        let _ = store
            .create_airport(&NewAirport {
                code: code.to_string(),
                name: format!("{code} International"),
                city: code.to_string(),
                country: "TN".to_string(),
            })
            .await;
    }
    let departure = Utc::now() + Duration::hours(hours_ahead);
    store
        .create_flight(&NewFlight {
            number: number.to_string(),
            origin_code: "TUN".to_string(),
            destination_code: "CDG".to_string(),
            departure_time: departure,
            arrival_time: departure + Duration::hours(2),
            price_cents: 25_000,
            seat_capacity: capacity,
        })
        .await
        .unwrap()
}

async fn request(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, username: &str, email: &str) -> String {
    let (status, body) = request(
        app,
        json_request(
            "POST",
            "/register/",
            None,
            &json!({
                "username": username,
                "email": email,
                "first_name": "Amine",
                "last_name": "Ben Salah",
                "password": "s3cretpassword",
                "password_confirm": "s3cretpassword",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = request(
        app,
        json_request(
            "POST",
            "/login/",
            None,
            &json!({ "username": username, "password": "s3cretpassword" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn flight_search_excludes_departed_and_sorts() {
    let (app, store, _) = test_app();
    seed_flight(&store, "TU900", 100, -3).await;
    seed_flight(&store, "TU300", 100, 48).await;
    seed_flight(&store, "TU100", 100, 4).await;

    let (status, body) = request(&app, get_request("/flights/", None)).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["number"].as_str().unwrap())
        .collect();
    assert_eq!(numbers, vec!["TU100", "TU300"]);
}

#[tokio::test]
async fn flight_search_filters_are_case_insensitive() {
    let (app, store, _) = test_app();
    seed_flight(&store, "TU100", 100, 4).await;

    let (status, body) =
        request(&app, get_request("/flights/?origin=tun&destination=cdg", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = request(&app, get_request("/flights/?origin=ory", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_date_filter_is_a_field_error() {
    let (app, _, _) = test_app();
    let (status, body) = request(&app, get_request("/flights/?date=not-a-date", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "date");
}

#[tokio::test]
async fn booking_requires_authentication() {
    let (app, store, _) = test_app();
    let flight = seed_flight(&store, "TU100", 10, 24).await;

    let (status, _) = request(
        &app,
        json_request(
            "POST",
            &format!("/flight/{}/book/", flight.id),
            None,
            &json!({ "seats": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_flow_end_to_end() {
    let (app, store, mailer) = test_app();
    let flight = seed_flight(&store, "TU100", 2, 24).await;
    let token = register(&app, "amine", "amine@example.com").await;

    // Form context carries live availability and account prefill.
    let (status, body) = request(
        &app,
        get_request(&format!("/flight/{}/book/", flight.id), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_seats"], 2);
    assert_eq!(body["prefill_email"], "amine@example.com");

    // Book the full capacity.
    let (status, body) = request(
        &app,
        json_request(
            "POST",
            &format!("/flight/{}/book/", flight.id),
            Some(&token),
            &json!({ "name": "Amine Ben Salah", "email": "amine@example.com", "seats": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "booking failed: {body}");
    assert_eq!(body["detail"], "Your booking has been confirmed!");
    let booking_id = body["booking_id"].as_str().unwrap().to_string();

    // Confirmation email with the PDF invoice went out.
    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "amine@example.com");
    let attachment = sent[0].attachment.as_ref().unwrap();
    assert_eq!(attachment.filename, format!("Invoice_{booking_id}.pdf"));
    assert!(attachment.bytes.starts_with(b"%PDF"));

    // Availability is recomputed from the ledger.
    let (status, body) = request(
        &app,
        get_request(&format!("/flight/{}/", flight.id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available_seats"], 0);

    // Success page is public.
    let (status, body) = request(
        &app,
        get_request(&format!("/booking/{booking_id}/success/"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seats"], 2);
    assert_eq!(body["total_cents"], 50_000);

    // A further booking is rejected with the true remaining count, and no
    // extra email goes out.
    let (status, body) = request(
        &app,
        json_request(
            "POST",
            &format!("/flight/{}/book/", flight.id),
            Some(&token),
            &json!({ "name": "Amine Ben Salah", "email": "amine@example.com", "seats": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "seats");
    assert_eq!(body["errors"][0]["message"], "Only 0 seat(s) remaining.");
    assert_eq!(mailer.sent().await.len(), 1);
}

#[tokio::test]
async fn blank_form_fields_fall_back_to_account_details() {
    let (app, store, _) = test_app();
    let flight = seed_flight(&store, "TU100", 10, 24).await;
    let token = register(&app, "amine", "amine@example.com").await;

    let (status, body) = request(
        &app,
        json_request(
            "POST",
            &format!("/flight/{}/book/", flight.id),
            Some(&token),
            &json!({ "seats": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "booking failed: {body}");
    assert_eq!(body["passenger_email"], "amine@example.com");
}

#[tokio::test]
async fn mail_failure_does_not_undo_the_booking() {
    let (app, store, mailer) = test_app();
    let flight = seed_flight(&store, "TU100", 10, 24).await;
    let token = register(&app, "amine", "amine@example.com").await;
    mailer.set_failing(true);

    let (status, _) = request(
        &app,
        json_request(
            "POST",
            &format!("/flight/{}/book/", flight.id),
            Some(&token),
            &json!({ "seats": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = request(
        &app,
        get_request(&format!("/flight/{}/", flight.id), None),
    )
    .await;
    assert_eq!(body["available_seats"], 7);
}

#[tokio::test]
async fn unknown_flight_is_not_found() {
    let (app, _, _) = test_app();
    let token_needed = get_request(&format!("/flight/{}/", Uuid::new_v4()), None);
    let (status, _) = request(&app, token_needed).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resend_is_limited_to_owner_or_admin() {
    let (app, store, mailer) = test_app();
    let flight = seed_flight(&store, "TU100", 10, 24).await;
    let owner_token = register(&app, "amine", "amine@example.com").await;
    let other_token = register(&app, "karim", "karim@example.com").await;

    let (_, body) = request(
        &app,
        json_request(
            "POST",
            &format!("/flight/{}/book/", flight.id),
            Some(&owner_token),
            &json!({ "seats": 1 }),
        ),
    )
    .await;
    let booking_id = body["booking_id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        json_request(
            "POST",
            &format!("/booking/{booking_id}/resend/"),
            Some(&other_token),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        "You don't have permission to resend this booking email."
    );

    let (status, body) = request(
        &app,
        json_request(
            "POST",
            &format!("/booking/{booking_id}/resend/"),
            Some(&owner_token),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["detail"],
        "Confirmation email resent to amine@example.com."
    );
    assert_eq!(mailer.sent().await.len(), 2);
}

#[tokio::test]
async fn contact_validation_rejects_short_messages() {
    let (app, store, mailer) = test_app();

    let (status, body) = request(
        &app,
        json_request(
            "POST",
            "/contact/",
            None,
            &json!({
                "name": "Al",
                "email": "al@example.com",
                "subject": "Hi",
                "message": "short",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "message");

    // Nothing persisted, nothing mailed.
    use skyfare_core::ContactStore;
    assert!(store.list_submissions(None).await.unwrap().is_empty());
    assert!(mailer.sent().await.is_empty());
}

#[tokio::test]
async fn contact_submission_notifies_support() {
    let (app, store, mailer) = test_app();

    let (status, body) = request(
        &app,
        json_request(
            "POST",
            "/contact/",
            None,
            &json!({
                "name": "Amine Ben Salah",
                "email": "amine@example.com",
                "subject": "Baggage allowance",
                "message": "How many bags can I check in on TU100?",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Thank you Amine Ben Salah!"));

    use skyfare_core::ContactStore;
    let submissions = store.list_submissions(None).await.unwrap();
    assert_eq!(submissions.len(), 1);
    assert!(!submissions[0].is_resolved);

    let sent = mailer.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "support@skytunisia.example");
    assert_eq!(sent[0].subject, "[Contact] Baggage allowance");
}

#[tokio::test]
async fn admin_surface_requires_staff_role() {
    let (app, store, _) = test_app();
    let token = register(&app, "amine", "amine@example.com").await;

    let (status, _) = request(&app, get_request("/admin/bookings/", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(&app, get_request("/admin/bookings/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Promote and re-login for an ADMIN token.
    use skyfare_core::UserStore;
    let user = store.find_by_username("amine").await.unwrap().unwrap();
    store.set_staff(user.id, true).await;
    let admin_token = login(&app, "amine").await;

    let (status, body) = request(&app, get_request("/admin/bookings/", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn admin_can_seed_and_resolve() {
    let (app, store, _) = test_app();
    register(&app, "root", "root@example.com").await;
    use skyfare_core::UserStore;
    let user = store.find_by_username("root").await.unwrap().unwrap();
    store.set_staff(user.id, true).await;
    let token = login(&app, "root").await;

    let (status, _) = request(
        &app,
        json_request(
            "POST",
            "/admin/airports/",
            Some(&token),
            &json!({ "code": "tun", "name": "Tunis Carthage", "city": "Tunis", "country": "Tunisia" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Duplicate code is a field error.
    let (status, body) = request(
        &app,
        json_request(
            "POST",
            "/admin/airports/",
            Some(&token),
            &json!({ "code": "TUN", "name": "Tunis Carthage", "city": "Tunis", "country": "Tunisia" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "code");

    // Flight invariants are enforced at creation.
    let departure = Utc::now() + Duration::days(1);
    let (status, body) = request(
        &app,
        json_request(
            "POST",
            "/admin/flights/",
            Some(&token),
            &json!({
                "number": "TU100",
                "origin_code": "TUN",
                "destination_code": "TUN",
                "departure_time": departure,
                "arrival_time": departure - Duration::hours(1),
                "price_cents": -5,
                "seat_capacity": -1,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"arrival_time"));
    assert!(fields.contains(&"price_cents"));
    assert!(fields.contains(&"seat_capacity"));

    // Contact resolution round trip.
    let (_, body) = request(
        &app,
        json_request(
            "POST",
            "/contact/",
            None,
            &json!({
                "name": "Amine Ben Salah",
                "email": "amine@example.com",
                "subject": "Refund",
                "message": "Please cancel my reservation.",
            }),
        ),
    )
    .await;
    let submission_id = body["submission_id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        json_request(
            "PATCH",
            &format!("/admin/contact-submissions/{submission_id}/"),
            Some(&token),
            &json!({ "is_resolved": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_resolved"], true);

    let (status, body) = request(
        &app,
        get_request("/admin/contact-submissions/?is_resolved=false", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}
