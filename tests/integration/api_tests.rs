//! API integration tests

use chrono::{Duration, Local};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

fn unique_suffix() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos()
}

fn in_days(days: i64) -> String {
    (Local::now() + Duration::days(days))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

async fn create_user(client: &Client, name: &str) -> i64 {
    let response = client
        .post(format!("{}/admin/users", BASE_URL))
        .json(&json!({
            "name": name,
            "email": format!("{}.{}@example.com", name.to_lowercase(), unique_suffix())
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

async fn create_category(client: &Client) -> i64 {
    let response = client
        .post(format!("{}/admin/categories", BASE_URL))
        .json(&json!({ "name": format!("Category {}", unique_suffix()) }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

/// Create and publish an event
async fn published_event(client: &Client, initiator: i64, category: i64, limit: i64) -> i64 {
    let response = client
        .post(format!("{}/users/{}/events", BASE_URL, initiator))
        .json(&json!({
            "annotation": "Open-air jazz evening by the river",
            "category": category,
            "description": "Three bands, food trucks and a late night jam session",
            "eventDate": in_days(3),
            "location": { "lat": 55.75, "lon": 37.61 },
            "participantLimit": limit,
            "requestModeration": true,
            "title": "Jazz on the river"
        }))
        .send()
        .await
        .expect("Failed to create event");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"], "PENDING");
    assert_eq!(body["views"], 0);
    let event_id = body["id"].as_i64().unwrap();

    let response = client
        .patch(format!("{}/admin/events/{}", BASE_URL, event_id))
        .json(&json!({ "stateAction": "PUBLISH_EVENT" }))
        .send()
        .await
        .expect("Failed to publish event");
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["state"], "PUBLISHED");
    assert!(body["publishedOn"].is_string());

    event_id
}

async fn request_participation(client: &Client, user: i64, event: i64) -> reqwest::Response {
    client
        .post(format!("{}/users/{}/requests?eventId={}", BASE_URL, user, event))
        .send()
        .await
        .expect("Failed to send request")
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
async fn test_confirming_last_slot_rejects_other_pending() {
    let client = Client::new();
    let initiator = create_user(&client, "Initiator").await;
    let alice = create_user(&client, "Alice").await;
    let bob = create_user(&client, "Bob").await;
    let category = create_category(&client).await;
    let event = published_event(&client, initiator, category, 1).await;

    let a: Value = request_participation(&client, alice, event).await.json().await.unwrap();
    let b: Value = request_participation(&client, bob, event).await.json().await.unwrap();
    assert_eq!(a["status"], "PENDING");
    assert_eq!(b["status"], "PENDING");

    let response = client
        .patch(format!("{}/users/{}/events/{}/requests", BASE_URL, initiator, event))
        .json(&json!({ "requestIds": [a["id"]], "status": "CONFIRMED" }))
        .send()
        .await
        .expect("Failed to change status");
    assert!(response.status().is_success());

    let result: Value = response.json().await.unwrap();
    assert_eq!(result["confirmedRequests"][0]["id"], a["id"]);
    assert_eq!(result["rejectedRequests"][0]["id"], b["id"]);
    assert_eq!(result["rejectedRequests"][0]["status"], "REJECTED");

    let event_body: Value = client
        .get(format!("{}/events/{}", BASE_URL, event))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(event_body["confirmedRequests"], 1);
}

#[tokio::test]
#[ignore]
async fn test_request_conflicts() {
    let client = Client::new();
    let initiator = create_user(&client, "Initiator").await;
    let alice = create_user(&client, "Alice").await;
    let category = create_category(&client).await;
    let event = published_event(&client, initiator, category, 5).await;

    // own event
    let response = request_participation(&client, initiator, event).await;
    assert_eq!(response.status(), 409);

    // repeat request
    assert_eq!(request_participation(&client, alice, event).await.status(), 201);
    let response = request_participation(&client, alice, event).await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "CONFLICT");
}

#[tokio::test]
#[ignore]
async fn test_unlimited_event_confirms_immediately() {
    let client = Client::new();
    let initiator = create_user(&client, "Initiator").await;
    let alice = create_user(&client, "Alice").await;
    let category = create_category(&client).await;
    let event = published_event(&client, initiator, category, 0).await;

    let response = request_participation(&client, alice, event).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "CONFIRMED");

    let canceled: Value = client
        .patch(format!("{}/users/{}/requests/{}/cancel", BASE_URL, alice, body["id"]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(canceled["status"], "CANCELED");
}

#[tokio::test]
#[ignore]
async fn test_unpublished_event_is_not_found() {
    let client = Client::new();
    let initiator = create_user(&client, "Initiator").await;
    let category = create_category(&client).await;

    let body: Value = client
        .post(format!("{}/users/{}/events", BASE_URL, initiator))
        .json(&json!({
            "annotation": "Board games night for beginners and pros",
            "category": category,
            "description": "Bring your favourite game or learn a new one with us",
            "eventDate": in_days(5),
            "location": { "lat": 1.0, "lon": 2.0 },
            "title": "Board games"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/events/{}", BASE_URL, body["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_stats_unique_counts_distinct_ips() {
    let client = Client::new();
    let uri = format!("/stats-test/{}", unique_suffix());
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    for ip in ["10.0.0.1", "10.0.0.1", "10.0.0.2"] {
        let response = client
            .post(format!("{}/hit", BASE_URL))
            .json(&json!({ "app": "it", "uri": uri, "ip": ip, "timestamp": timestamp }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
    }

    let query = |unique: bool| {
        vec![
            ("start", in_days(-1)),
            ("end", in_days(1)),
            ("uris", uri.clone()),
            ("unique", unique.to_string()),
        ]
    };

    let unique: Value = client
        .get(format!("{}/stats", BASE_URL))
        .query(&query(true))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unique[0]["hits"], 2);

    let all: Value = client
        .get(format!("{}/stats", BASE_URL))
        .query(&query(false))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all[0]["hits"], 3);
}

#[tokio::test]
#[ignore]
async fn test_stats_inverted_range() {
    let client = Client::new();
    let response = client
        .get(format!("{}/stats", BASE_URL))
        .query(&[("start", in_days(1)), ("end", in_days(-1))])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

async fn search_category(client: &Client, category: i64, only_available: bool) -> Vec<Value> {
    let response = client
        .get(format!("{}/events", BASE_URL))
        .query(&[
            ("categories", category.to_string()),
            ("onlyAvailable", only_available.to_string()),
        ])
        .send()
        .await
        .expect("Failed to search events");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body.as_array().cloned().unwrap_or_default()
}

fn find_event(events: &[Value], id: i64) -> Option<&Value> {
    events.iter().find(|e| e["id"].as_i64() == Some(id))
}

#[tokio::test]
#[ignore]
async fn test_public_search_counters_and_only_available() {
    let client = Client::new();
    let initiator = create_user(&client, "Initiator").await;
    let alice = create_user(&client, "Alice").await;
    let category = create_category(&client).await;
    let small = published_event(&client, initiator, category, 1).await;
    let open = published_event(&client, initiator, category, 10).await;

    // Fresh events: no hits and no requests yet
    let events = search_category(&client, category, false).await;
    assert_eq!(events.len(), 2);
    for id in [small, open] {
        let event = find_event(&events, id).expect("event missing from search");
        assert_eq!(event["views"], 0);
        assert_eq!(event["confirmedRequests"], 0);
    }

    // Fill the limit-1 event
    let request: Value = request_participation(&client, alice, small).await.json().await.unwrap();
    let response = client
        .patch(format!("{}/users/{}/events/{}/requests", BASE_URL, initiator, small))
        .json(&json!({ "requestIds": [request["id"]], "status": "CONFIRMED" }))
        .send()
        .await
        .expect("Failed to change status");
    assert!(response.status().is_success());

    let events = search_category(&client, category, false).await;
    assert_eq!(find_event(&events, small).unwrap()["confirmedRequests"], 1);

    let available = search_category(&client, category, true).await;
    assert!(find_event(&available, small).is_none());
    assert!(find_event(&available, open).is_some());
}
