//! API integration tests

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const TERMINAL_URL: &str = "http://localhost:8080/terminal";

/// Helper to create a planned visit and return its ID
async fn create_planned_visit(client: &Client) -> i64 {
    let response = client
        .post(format!("{}/visits", BASE_URL))
        .json(&json!({
            "branch_id": 1,
            "visit_type": "planned"
        }))
        .send()
        .await
        .expect("Failed to send create visit request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["visit"]["id"].as_i64().expect("No visit ID")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_create_and_get_visit() {
    let client = Client::new();
    let visit_id = create_planned_visit(&client).await;

    let response = client
        .get(format!("{}/visits/{}", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"].as_i64(), Some(visit_id));
    assert_eq!(body["visit_type"], "planned");
    assert_eq!(body["status"], "scheduled");

    // Cleanup
    let _ = client
        .post(format!("{}/visits/{}/cancel", BASE_URL, visit_id))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_create_visit_invalid_email() {
    let client = Client::new();

    let response = client
        .post(format!("{}/visits", BASE_URL))
        .json(&json!({
            "branch_id": 1,
            "visit_type": "planned",
            "invitation_email": "not-an-email"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_pin_lifecycle() {
    let client = Client::new();
    let visit_id = create_planned_visit(&client).await;

    // Generate
    let response = client
        .post(format!("{}/visits/{}/pin", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let pin = body["pin"].as_str().expect("No PIN in response");
    assert_eq!(pin.len(), 6);
    assert!(pin.chars().all(|c| c.is_ascii_digit()));
    assert!(body["expires_at"].is_string());

    // Status reports a valid PIN with a remaining-time text
    let response = client
        .get(format!("{}/visits/{}/pin/status?lang=en", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["state"], "valid");
    assert!(body["duration_text"].is_string());

    // Extend by 48 hours
    let response = client
        .post(format!("{}/visits/{}/pin/extend", BASE_URL, visit_id))
        .json(&json!({ "hours": 48 }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    // Cleanup
    let _ = client
        .post(format!("{}/visits/{}/cancel", BASE_URL, visit_id))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_extend_pin_requires_exactly_one_mode() {
    let client = Client::new();
    let visit_id = create_planned_visit(&client).await;

    let _ = client
        .post(format!("{}/visits/{}/pin", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .post(format!("{}/visits/{}/pin/extend", BASE_URL, visit_id))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    // Cleanup
    let _ = client
        .post(format!("{}/visits/{}/cancel", BASE_URL, visit_id))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_cancelled_visit_refuses_pin() {
    let client = Client::new();
    let visit_id = create_planned_visit(&client).await;

    let response = client
        .post(format!("{}/visits/{}/cancel", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/visits/{}/pin", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_add_visitor_and_list_present() {
    let client = Client::new();
    let visit_id = create_planned_visit(&client).await;

    let response = client
        .post(format!("{}/visits/{}/visitors", BASE_URL, visit_id))
        .json(&json!({
            "first_name": "Jana",
            "last_name": "Nováková"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["id"].is_number());

    // Pre-registered visitors are not present until they check in
    let response = client
        .get(format!("{}/visits/{}/visitors", BASE_URL, visit_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body.as_array().map(|a| a.len()), Some(0));

    // Cleanup
    let _ = client
        .post(format!("{}/visits/{}/cancel", BASE_URL, visit_id))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_visit_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/visits/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_terminal_home_redirects_to_language() {
    let client = Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client");

    let response = client
        .get(format!("{}/", TERMINAL_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("No Location header");
    assert_eq!(location, "/terminal/language/");
}

#[tokio::test]
#[ignore]
async fn test_terminal_unknown_step_resets_to_language() {
    let client = Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client");

    let response = client
        .get(format!("{}/no-such-step/", TERMINAL_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("No Location header");
    assert_eq!(location, "/terminal/language/");
}

#[tokio::test]
#[ignore]
async fn test_terminal_post_rejects_stale_token() {
    let client = Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build client");

    // Establish a session first
    let _ = client
        .get(format!("{}/language/", TERMINAL_URL))
        .send()
        .await
        .expect("Failed to send request");

    // POST with a token that was never issued: back to the same step
    let response = client
        .post(format!("{}/", TERMINAL_URL))
        .form(&[
            ("terminal_action", "set_language"),
            ("token", &"0".repeat(64)),
            ("language", "en"),
        ])
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_redirection());
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("No Location header");
    assert_eq!(location, "/terminal/language/");
}
