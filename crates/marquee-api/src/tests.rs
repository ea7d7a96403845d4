//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::{Months, Utc};
use marquee_core::{plan::{Plan, QuotaTable}, store::SubscriptionStore, subscription::Subscription};
use marquee_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, api_router};

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(Arc::new(store), QuotaTable::default())
}

async fn send(
  state: &AppState<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = api_router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
  };
  (status, value)
}

fn registration(email: &str, subscription: Option<Value>) -> Value {
  let mut body = json!({
    "email": email,
    "password": "secret123",
    "firstname": "Ana",
    "lastname": "Souza",
    "phone": "+5511999998888",
    "address": "Rua das Flores, 123",
  });
  if let Some(sub) = subscription {
    body["subscription"] = sub;
  }
  body
}

async fn register(state: &AppState<SqliteStore>, email: &str, plan: Option<&str>) -> Uuid {
  let sub = plan.map(|p| json!({ "plan": p, "value": 39.9 }));
  let (status, body) = send(state, "POST", "/user/register", Some(registration(email, sub))).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["id"].as_str().unwrap().parse().unwrap()
}

async fn create_profile(
  state: &AppState<SqliteStore>,
  user_id: Uuid,
  name: &str,
  color: &str,
) -> (StatusCode, Value) {
  send(
    state,
    "POST",
    "/profiles",
    Some(json!({ "name": name, "color": color, "userId": user_id })),
  )
  .await
}

fn names(list: &Value) -> Vec<&str> {
  list
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["name"].as_str().unwrap())
    .collect()
}

// ─── Health & users ──────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
  let state = make_state().await;
  let (status, body) = send(&state, "GET", "/health", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
  assert!(body["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn register_normalises_and_hides_the_password() {
  let state = make_state().await;
  let (status, body) = send(
    &state,
    "POST",
    "/user/register",
    Some(registration("  Ana@Example.COM ", None)),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["email"], "ana@example.com");
  assert!(body.get("password").is_none());
  assert!(body.get("passwordHash").is_none());
  assert!(body["subscription"].is_null());

  let (status, _) = send(&state, "POST", "/user/register", Some(registration("ana@example.com", None))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn concurrent_registrations_for_one_email() {
  let state = make_state().await;
  let body = registration("ana@example.com", None);
  let (a, b) = tokio::join!(
    send(&state, "POST", "/user/register", Some(body.clone())),
    send(&state, "POST", "/user/register", Some(body)),
  );

  let mut statuses = [a.0, b.0];
  statuses.sort();
  assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
  let loser = if a.0 == StatusCode::BAD_REQUEST { a.1 } else { b.1 };
  assert!(loser["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn register_rejects_short_passwords() {
  let state = make_state().await;
  let mut body = registration("ana@example.com", None);
  body["password"] = json!("12345");
  let (status, _) = send(&state, "POST", "/user/register", Some(body)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_checks_credentials() {
  let state = make_state().await;
  register(&state, "ana@example.com", Some("basic")).await;

  let (status, body) = send(
    &state,
    "POST",
    "/user/login",
    Some(json!({ "email": "ANA@example.com", "password": "secret123" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["isSubscribed"], true);
  assert_eq!(body["firstname"], "Ana");

  let (status, _) = send(
    &state,
    "POST",
    "/user/login",
    Some(json!({ "email": "ana@example.com", "password": "wrong-pass" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = send(
    &state,
    "POST",
    "/user/login",
    Some(json!({ "email": "nobody@example.com", "password": "secret123" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn find_and_update_user() {
  let state = make_state().await;
  let ana = register(&state, "ana@example.com", None).await;
  register(&state, "bob@example.com", None).await;

  let (status, body) = send(&state, "GET", &format!("/user/find/{ana}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["lastname"], "Souza");

  let (status, body) =
    send(&state, "PUT", &format!("/user/{ana}"), Some(json!({ "lastname": "Lima" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["lastname"], "Lima");

  let (status, _) = send(
    &state,
    "PUT",
    &format!("/user/{ana}"),
    Some(json!({ "email": "bob@example.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&state, "GET", &format!("/user/find/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_creation_respects_quota() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", Some("intermediary")).await;

  let (status, _) = create_profile(&state, user, "Ana", "#EC4899").await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = send(&state, "GET", &format!("/profiles/user/{user}/limits"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["currentProfiles"], 1);
  assert_eq!(body["maxProfiles"], 2);
  assert_eq!(body["canCreateMore"], true);
  assert_eq!(body["plan"], "intermediary");

  let (status, _) = create_profile(&state, user, "Bob", "#3B82F6").await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, body) = create_profile(&state, user, "Carl", "#10B981").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn profile_conflicts_are_bad_requests() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", Some("complete")).await;
  create_profile(&state, user, "Ana", "#EC4899").await;

  let (status, _) = create_profile(&state, user, "ANA", "#3B82F6").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = create_profile(&state, user, "Bob", "#EC4899").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_profile_input_is_rejected() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", None).await;
  let (status, _) = create_profile(&state, user, "", "#EC4899").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  let (status, _) = create_profile(&state, user, "Ana", "pink").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
  let state = make_state().await;
  let ghost = Uuid::new_v4();
  let (status, _) = create_profile(&state, ghost, "Ana", "#EC4899").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = send(&state, "GET", &format!("/profiles/user/{ghost}/limits"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) =
    send(&state, "POST", &format!("/profiles/user/{ghost}/enforce-limits"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enforce_limits_endpoint_keeps_first_names() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", Some("complete")).await;
  for (name, color) in [("Bob", "#000001"), ("Ana", "#000002"), ("Carl", "#000003")] {
    let (status, _) = create_profile(&state, user, name, color).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  // Change the plan behind the service's back to leave excess profiles.
  let now = Utc::now();
  let basic = Subscription {
    id:            Uuid::new_v4(),
    user_id:       user,
    plan:          Plan::Basic,
    value:         18.9,
    registered_at: now,
    expires_at:    now + Months::new(12),
  };
  state.store.save_subscription(basic).await.unwrap();

  let uri = format!("/profiles/user/{user}/enforce-limits");
  let (status, body) = send(&state, "POST", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body["removedProfiles"]), ["Bob", "Carl"]);
  assert_eq!(names(&body["remainingProfiles"]), ["Ana"]);

  let (_, again) = send(&state, "POST", &uri, None).await;
  assert!(again["removedProfiles"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn downgrading_the_plan_removes_excess_profiles() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", Some("complete")).await;
  for (name, color) in [("Dan", "#000001"), ("Ana", "#000002"), ("Carl", "#000003"), ("Bob", "#000004")] {
    create_profile(&state, user, name, color).await;
  }

  let (status, body) = send(
    &state,
    "PUT",
    &format!("/subscriptions/user/{user}"),
    Some(json!({ "plan": "Intermediary" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["plan"], "intermediary");

  let (_, list) = send(&state, "GET", &format!("/profiles/user/{user}"), None).await;
  assert_eq!(names(&list), ["Ana", "Bob"]);
}

#[tokio::test]
async fn last_profile_cannot_be_deleted() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", Some("intermediary")).await;
  let (_, ana) = create_profile(&state, user, "Ana", "#EC4899").await;
  let (_, bob) = create_profile(&state, user, "Bob", "#3B82F6").await;

  let bob_id = bob["id"].as_str().unwrap();
  let (status, _) = send(&state, "DELETE", &format!("/profiles/{bob_id}"), None).await;
  assert_eq!(status, StatusCode::OK);

  let ana_id = ana["id"].as_str().unwrap();
  let (status, _) = send(&state, "DELETE", &format!("/profiles/{ana_id}"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(
    &state,
    "PUT",
    &format!("/profiles/{ana_id}"),
    Some(json!({ "color": "#FFFFFF" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["color"], "#FFFFFF");
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_lifecycle() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", None).await;
  let base = format!("/subscriptions/user/{user}");

  let (_, status_body) = send(&state, "GET", &format!("{base}/status"), None).await;
  assert_eq!(status_body["hasSubscription"], false);
  assert_eq!(status_body["daysUntilExpiry"], 0);

  let (status, _) = send(&state, "GET", &base, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, created) =
    send(&state, "POST", &base, Some(json!({ "plan": "BASIC", "value": 18.9 }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["plan"], "basic");

  let (_, status_body) = send(&state, "GET", &format!("{base}/status"), None).await;
  assert_eq!(status_body["isActive"], true);
  assert!(status_body["daysUntilExpiry"].as_i64().unwrap() >= 365);

  let (status, renewed) = send(&state, "POST", &format!("{base}/renew"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_ne!(renewed["expiresAt"], created["expiresAt"]);

  let (status, _) = send(
    &state,
    "POST",
    &format!("{base}/upsert"),
    Some(json!({ "plan": "complete", "value": 0 })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, all) = send(&state, "GET", "/subscriptions", None).await;
  assert_eq!(all.as_array().unwrap().len(), 1);

  let (status, _) = send(&state, "DELETE", &base, None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&state, "DELETE", &base, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_without_subscription_is_a_bad_request() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", None).await;
  let base = format!("/subscriptions/user/{user}");

  let (status, body) = send(&state, "PUT", &base, Some(json!({ "plan": "basic" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("plan"));

  let (status, _) = send(&state, "GET", &base, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Cards ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn cards_never_expose_the_security_code() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", None).await;
  let card = json!({
    "userId": user,
    "name": "Ana Souza",
    "number": "4111 1111 1111 1111",
    "expirationDate": "2030-12-31",
    "securityCode": "123",
  });

  let (status, body) = send(&state, "POST", "/cards", Some(card.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["number"], "4111111111111111");
  assert!(body.get("securityCode").is_none());
  let card_id = body["id"].as_str().unwrap().to_owned();

  let (_, mine) = send(&state, "GET", &format!("/cards/user/{user}"), None).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);

  let mut orphan = card;
  orphan["userId"] = json!(Uuid::new_v4());
  let (status, _) = send(&state, "POST", "/cards", Some(orphan)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = send(&state, "DELETE", &format!("/cards/{card_id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&state, "DELETE", &format!("/cards/{card_id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Movies & favorites ──────────────────────────────────────────────────────

#[tokio::test]
async fn favorites_flow() {
  let state = make_state().await;
  let user = register(&state, "ana@example.com", None).await;

  let (status, movie) = send(
    &state,
    "POST",
    "/movies",
    Some(json!({ "title": "Alien", "apiId": "348", "imageUrl": "https://img.example.com/alien.jpg" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let movie_id = movie["id"].as_str().unwrap().to_owned();

  let (status, _) = send(&state, "GET", &format!("/favorites/user/{user}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let add = format!("/favorites/add/{user}/{movie_id}");
  let (status, list) = send(&state, "POST", &add, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(list["movies"][0]["title"], "Alien");
  let (_, list) = send(&state, "POST", &add, None).await;
  assert_eq!(list["movies"].as_array().unwrap().len(), 1);

  let (status, _) =
    send(&state, "POST", &format!("/favorites/add/{user}/{}", Uuid::new_v4()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, list) =
    send(&state, "DELETE", &format!("/favorites/remove/{user}/{movie_id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(list["movies"].as_array().unwrap().is_empty());

  let (status, _) = send(&state, "POST", &format!("/favorites/{user}"), None).await;
  assert_eq!(status, StatusCode::CREATED);
  let (_, all) = send(&state, "GET", "/favorites", None).await;
  assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn movie_crud() {
  let state = make_state().await;
  let (_, movie) = send(
    &state,
    "POST",
    "/movies",
    Some(json!({ "title": "Alien", "apiId": "348", "imageUrl": "https://img.example.com/alien.jpg" })),
  )
  .await;
  let uri = format!("/movies/{}", movie["id"].as_str().unwrap());

  let (status, updated) = send(&state, "PUT", &uri, Some(json!({ "title": "Aliens" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["title"], "Aliens");
  assert_eq!(updated["apiId"], "348");

  let (status, _) = send(&state, "DELETE", &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&state, "GET", &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
