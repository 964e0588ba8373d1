//! End-to-end tests over the real router and a file-backed SQLite database.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use referral_cloud::referral::commission::Pricing;
use referral_cloud::{AppState, Config, api, db};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";
const TRACKING_TARGET: &str = "https://app.example.com/signup";

async fn test_state(dir: &TempDir) -> AppState {
    let config = Config {
        database_url: format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("test.db").display()
        ),
        http_port: 0,
        environment: "development".into(),
        admin_token: ADMIN_TOKEN.into(),
        public_base_url: "http://localhost:8080".into(),
        tracking_target_url: TRACKING_TARGET.into(),
        ses_from_email: None,
        pricing: Pricing::default(),
    };
    AppState::new(&config).await.expect("app state")
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(resp: &axum::response::Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Register Alice and return her code.
async fn register_alice(app: &Router, state: &AppState) -> String {
    let resp = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=Alice&email=ALICE%40x.com&accept_terms=on",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    let ambassador = db::ambassadors::find_by_email(&state.pool, "alice@x.com")
        .await
        .unwrap()
        .expect("alice stored");
    ambassador.code
}

#[tokio::test]
async fn root_redirects_to_registration_form() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state);

    let resp = app.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/register");
}

#[tokio::test]
async fn registration_creates_record_and_redirects_with_code() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let resp = app
        .oneshot(form_post(
            "/register",
            "name=Alice&email=ALICE%40x.com&accept_terms=on",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);

    let ambassador = db::ambassadors::find_by_email(&state.pool, "alice@x.com")
        .await
        .unwrap()
        .expect("stored under lowercased email");
    assert_eq!(location(&resp), format!("/dashboard?code={}", ambassador.code));
    assert_eq!(ambassador.email, "alice@x.com");
    assert_eq!(ambassador.code.len(), 6);
    assert_eq!(ambassador.code, ambassador.code.to_uppercase());
    assert_eq!(ambassador.clicks, 0);
    assert_eq!(ambassador.signups, 0);
}

#[tokio::test]
async fn repeat_registration_keeps_code_and_name() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let code = register_alice(&app, &state).await;

    // Second registration: blank name, lowercased email
    let resp = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=&email=alice%40x.com&accept_terms=on",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/dashboard?code={code}"));

    let ambassador = db::ambassadors::find_by_email(&state.pool, "alice@x.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ambassador.code, code);
    assert_eq!(ambassador.name, "Alice");
    assert_eq!(db::ambassadors::count(&state.pool).await.unwrap(), 1);
}

#[tokio::test]
async fn validation_failure_rerenders_form_without_mutation() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    // Terms not accepted; everything typed comes back in the form
    let resp = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=Alice&email=alice%40x.com&payout_preference=iban&payout_identifier=FR76%201234",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_string(resp).await;
    assert!(body.contains("accept the terms"));
    assert!(body.contains("value=\"Alice\""));
    assert!(body.contains("value=\"alice@x.com\""));
    assert!(body.contains("value=\"iban\""));
    assert!(body.contains("value=\"FR76 1234\""));

    // Malformed email
    let resp = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=Alice&email=nope&accept_terms=on",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(resp).await.contains("invalid"));

    // Blank name on a first-time email
    let resp = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=&email=new%40x.com&accept_terms=on",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(resp).await.contains("Name is required"));

    assert_eq!(db::ambassadors::count(&state.pool).await.unwrap(), 0);
}

#[tokio::test]
async fn tracked_link_credits_click_and_redirects() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let code = register_alice(&app, &state).await;

    // Lowercase input still credits; redirect carries the visitor's input
    let lower = code.to_lowercase();
    let resp = app.clone().oneshot(get(&format!("/l/{lower}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("{TRACKING_TARGET}?ref={lower}"));

    let resp = app.clone().oneshot(get(&format!("/l/{code}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);

    let ambassador = db::ambassadors::find_by_code(&state.pool, &code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ambassador.clicks, 2);
}

#[tokio::test]
async fn unknown_code_redirects_without_credit() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let code = register_alice(&app, &state).await;

    let resp = app.clone().oneshot(get("/l/UNKNOWNCODE")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("{TRACKING_TARGET}?ref=UNKNOWNCODE"));

    // Nobody was credited
    let ambassador = db::ambassadors::find_by_code(&state.pool, &code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ambassador.clicks, 0);
}

#[tokio::test]
async fn dashboard_lookup_by_code_ref_and_email_agree() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let code = register_alice(&app, &state).await;

    for uri in [
        format!("/dashboard?code={code}"),
        format!("/dashboard?ref={code}"),
        format!("/dashboard?code={}", code.to_lowercase()),
        "/dashboard?email=alice%40x.com".to_string(),
        "/dashboard?email=ALICE%40x.com".to_string(),
    ] {
        let resp = app.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "uri {uri}");
        let body = body_string(resp).await;
        assert!(body.contains(&code), "uri {uri}");
        assert!(body.contains("Alice"), "uri {uri}");
    }

    // Code wins when both identify different things
    let resp = app
        .clone()
        .oneshot(get(&format!("/dashboard?code={code}&email=nobody%40x.com")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_unknown_renders_not_found_state() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state);

    let resp = app.oneshot(get("/dashboard?code=ZZZZZZ")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_string(resp).await.contains("Ambassador not found"));
}

#[tokio::test]
async fn admin_routes_reject_bad_or_missing_token() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state);

    for uri in [
        "/admin/ambassadors",
        "/admin/ambassadors?token=wrong",
        "/admin/ambassadors.csv?token=wrong",
        "/admin/ambassadors.json?token=wrong",
        "/admin/ambassadors?token=",
    ] {
        let resp = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "uri {uri}");
    }

    let resp = app
        .clone()
        .oneshot(form_post("/admin/conversions?token=wrong", "code=ABC123"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn csv_export_quotes_every_field_and_doubles_quotes() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let resp = app
        .clone()
        .oneshot(form_post(
            "/register",
            "name=Ann%20%22The%20Closer%22&email=ann%40x.com&accept_terms=on",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);

    let resp = app
        .clone()
        .oneshot(get(&format!("/admin/ambassadors.csv?token={ADMIN_TOKEN}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );

    let body = body_string(resp).await;
    let header_line = body.lines().next().unwrap();
    assert_eq!(
        header_line,
        "\"id\",\"name\",\"email\",\"code\",\"payout_preference\",\"payout_identifier\",\
         \"created_at\",\"updated_at\",\"clicks\",\"signups\""
    );
    assert!(body.contains("\"Ann \"\"The Closer\"\"\""));
}

#[tokio::test]
async fn json_export_has_envelope() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    register_alice(&app, &state).await;

    let resp = app
        .clone()
        .oneshot(get(&format!("/admin/ambassadors.json?token={ADMIN_TOKEN}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(value["db"], "test.db");
    assert_eq!(value["count"], 1);
    assert_eq!(value["ambassadors"].as_array().unwrap().len(), 1);
    assert_eq!(value["ambassadors"][0]["email"], "alice@x.com");
}

#[tokio::test]
async fn manual_conversion_raises_signups_and_estimate() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state.clone());

    let code = register_alice(&app, &state).await;

    let resp = app
        .clone()
        .oneshot(form_post(
            &format!("/admin/conversions?token={ADMIN_TOKEN}"),
            &format!("code={code}"),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let ambassador = db::ambassadors::find_by_code(&state.pool, &code)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ambassador.signups, 1);

    // Default pricing: 79.00 × 0.30 upfront, 5.00 monthly per signup
    let resp = app
        .clone()
        .oneshot(get(&format!("/dashboard?code={code}")))
        .await
        .unwrap();
    let body = body_string(resp).await;
    assert!(body.contains("23.70"));
    assert!(body.contains("5.00"));
    assert!(body.contains("53.70"));

    // Unknown code is reported, not silently dropped
    let resp = app
        .clone()
        .oneshot(form_post(
            &format!("/admin/conversions?token={ADMIN_TOKEN}"),
            "code=ZZZZZZ",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let app = api::create_router(state);

    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["service"], "referral-cloud");
}
