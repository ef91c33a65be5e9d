//! Integration tests for the typed account, dashboard, admin and news calls

use std::sync::Arc;

use chrono::{Duration, Utc};
use dn7x7_core::api::{ApiClient, ApiError, ClientOptions, NewsClient};
use dn7x7_core::auth::{MemoryTokenStore, TokenStore};
use dn7x7_core::models::{
    LogFilter, NewApiKey, NewUser, NewsCategory, NewsQuery, ProfileUpdate, Role, StatusFilter,
    TimeRange, UserUpdate,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_with(server: &MockServer, access: Option<&str>) -> (ApiClient, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::with_tokens(access, access.map(|_| "R1")));
    let client = ApiClient::new(ClientOptions::with_base_url(server.uri()), store.clone()).unwrap();
    (client, store)
}

fn me_body() -> serde_json::Value {
    json!({
        "id": 7,
        "email": "asha@example.com",
        "name": "Asha Rao",
        "organization": "Amul",
        "profile_image": null,
        "role": "admin",
        "date_joined": "2025-01-10T09:30:00Z"
    })
}

fn admin_user_body(id: i64, is_active: bool) -> serde_json::Value {
    json!({
        "id": id,
        "email": "vikram@example.com",
        "name": "Vikram",
        "role": "user",
        "is_active": is_active,
        "is_staff": false
    })
}

#[tokio::test]
async fn test_login_stores_tokens_and_fetches_profile() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, None).await;

    Mock::given(method("POST"))
        .and(path("/accounts/jwt/create/"))
        .and(body_json(json!({"email": "asha@example.com", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/users/me/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .expect(1)
        .mount(&server)
        .await;

    let user = client.login("asha@example.com", "s3cret").await.unwrap();

    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.display_name(), "Asha Rao (Amul)");
    assert_eq!(store.access_token().unwrap().as_deref(), Some("A1"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R1"));
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_login_request_carries_no_bearer() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, Some("stale")).await;

    Mock::given(method("POST"))
        .and(path("/accounts/jwt/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "A1", "refresh": "R1"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/users/me/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .mount(&server)
        .await;

    client.login("asha@example.com", "s3cret").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let login = requests
        .iter()
        .find(|r| r.url.path() == "/accounts/jwt/create/")
        .unwrap();
    assert!(login.headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_signup_validation_errors_are_per_field() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, None).await;

    Mock::given(method("POST"))
        .and(path("/accounts/users/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "email": ["user with this email already exists."],
            "password": ["This password is too short.", "This password is too common."]
        })))
        .mount(&server)
        .await;

    let new_user = NewUser {
        email: "asha@example.com".to_string(),
        name: "Asha".to_string(),
        password: "abc".to_string(),
        re_password: Some("abc".to_string()),
        organization: None,
    };

    match client.signup(&new_user).await {
        Err(ApiError::Validation(errors)) => {
            assert_eq!(errors.field("email"), ["user with this email already exists."]);
            assert_eq!(errors.field("password").len(), 2);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_restore_session_clears_unusable_tokens() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, Some("A1")).await;

    Mock::given(method("GET"))
        .and(path("/accounts/users/me/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(client.restore_session().await.unwrap().is_none());
    assert_eq!(store.access_token().unwrap(), None);

    // Nothing stored: no request at all
    assert!(client.restore_session().await.unwrap().is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_logout_clears_tokens_before_calling_backend() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, Some("A1")).await;

    Mock::given(method("POST"))
        .and(path("/accounts/token/logout/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/jwt/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client.logout().await;

    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_update_me_sends_multipart() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, Some("A1")).await;

    Mock::given(method("PATCH"))
        .and(path("/accounts/users/me/"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(me_body()))
        .expect(1)
        .mount(&server)
        .await;

    let update = ProfileUpdate {
        name: Some("Asha Rao".to_string()),
        organization: Some("Amul".to_string()),
        profile_image: None,
    };
    client.update_me(&update).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"organization\""));
}

#[tokio::test]
async fn test_dashboard_keys_and_credits() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, Some("A1")).await;

    Mock::given(method("POST"))
        .and(path("/dashboard/create_key/"))
        .and(body_json(json!({"name": "newsroom", "daily_limit": 250})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 3,
            "name": "newsroom",
            "key": "dn7x7_0123456789abcdef",
            "created_at": "2025-03-01T10:00:00Z",
            "is_active": true,
            "daily_limit": 250
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dashboard/3/revoke_key/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "key revoked"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard/credits/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "daily_free_credits": 0, "purchased_credits": 0, "remaining_credits": 0
        })))
        .mount(&server)
        .await;

    let key = client
        .create_key(&NewApiKey::new("newsroom").with_daily_limit(250))
        .await
        .unwrap();
    assert_eq!(key.masked(), "dn7x7_0123...");

    let revoked = client.revoke_key(key.id).await.unwrap();
    assert_eq!(revoked.status, "key revoked");

    assert!(client.credits().await.unwrap().is_exhausted());
}

fn call_log(endpoint: &str, status_code: u16, age: Duration) -> serde_json::Value {
    json!({
        "endpoint": endpoint,
        "method": "GET",
        "status_code": status_code,
        "ip_address": null,
        "timestamp": (Utc::now() - age).to_rfc3339(),
    })
}

#[tokio::test]
async fn test_logs_send_filter_and_apply_it_locally() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, Some("A1")).await;

    Mock::given(method("GET"))
        .and(path("/dashboard/logs/"))
        .and(query_param("time_range", "7d"))
        .and(query_param("status_filter", "error"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            call_log("/api/news/", 200, Duration::hours(2)),
            call_log("/api/news/9/", 402, Duration::days(1)),
            call_log("/api/news/8/", 404, Duration::days(6)),
            call_log("/api/news/7/", 500, Duration::days(20)),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = LogFilter {
        time_range: TimeRange::LastWeek,
        status_filter: StatusFilter::Error,
    };
    let logs = client.logs(&filter).await.unwrap();

    let endpoints: Vec<&str> = logs.iter().map(|log| log.endpoint.as_str()).collect();
    assert_eq!(endpoints, ["/api/news/9/", "/api/news/8/"]);
}

#[tokio::test]
async fn test_logs_drop_calls_outside_the_window() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, Some("A1")).await;

    Mock::given(method("GET"))
        .and(path("/dashboard/logs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            call_log("/api/news/", 200, Duration::minutes(1)),
            call_log("/api/news/3/", 200, Duration::days(3)),
        ])))
        .mount(&server)
        .await;

    let filter = LogFilter {
        time_range: TimeRange::LastHour,
        status_filter: StatusFilter::All,
    };
    let logs = client.logs(&filter).await.unwrap();

    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].endpoint, "/api/news/");
}

#[tokio::test]
async fn test_admin_actions() {
    let server = MockServer::start().await;
    let (client, _store) = client_with(&server, Some("A1")).await;

    Mock::given(method("GET"))
        .and(path("/accounts/admin/users/"))
        .and(query_param("search", "vikram"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([admin_user_body(12, true)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/admin/users/"))
        .and(body_json(json!({"email": "vikram@example.com", "name": "Vikram", "password": "tmp-Pass-91"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(admin_user_body(12, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/admin/users/12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(admin_user_body(12, true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/admin/users/12/toggle_active/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "is_active": false})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/admin/users/12/logs/"))
        .and(query_param("time_range", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/admin/users/12/add_credits/"))
        .and(body_json(json!({"credits": 500})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "credits added", "total_credits": 520})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/accounts/admin/users/12/"))
        .and(body_json(json!({"is_active": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(admin_user_body(12, false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts/admin/users/12/toggle_staff/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "is_staff": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/accounts/admin/users/12/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_user(&NewUser {
            email: "vikram@example.com".to_string(),
            name: "Vikram".to_string(),
            password: "tmp-Pass-91".to_string(),
            re_password: None,
            organization: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, 12);
    assert_eq!(client.get_user(12).await.unwrap().role, Role::User);

    let users = client.list_users(Some("vikram")).await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].is_active);

    let added = client.add_credits(12, 500).await.unwrap();
    assert_eq!(added.total_credits, 520);

    let update = UserUpdate {
        is_active: Some(false),
        ..UserUpdate::default()
    };
    assert!(!client.update_user(12, &update).await.unwrap().is_active);

    assert!(client.toggle_staff(12).await.unwrap().is_staff);
    assert!(!client.toggle_active(12).await.unwrap().is_active);
    assert!(client.user_logs(12, TimeRange::All).await.unwrap().is_empty());
    client.delete_user(12).await.unwrap();
}

#[tokio::test]
async fn test_admin_endpoints_forbidden_for_regular_users() {
    let server = MockServer::start().await;
    let (client, store) = client_with(&server, Some("A1")).await;

    Mock::given(method("GET"))
        .and(path("/accounts/admin/users/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"detail": "You do not have permission to perform this action."})),
        )
        .mount(&server)
        .await;

    let result = client.list_users(None).await;
    assert!(matches!(result, Err(ApiError::AccessDenied(_))));
    assert!(!result.unwrap_err().requires_login());
    assert_eq!(store.access_token().unwrap().as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_news_client_sends_api_key() {
    let server = MockServer::start().await;
    let news = NewsClient::new(&server.uri(), "dn7x7_partner").unwrap();

    Mock::given(method("GET"))
        .and(path("/news/"))
        .and(header("x-api-key", "dn7x7_partner"))
        .and(query_param("category", "global"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 40,
                "title": "EU dairy exports slow",
                "excerpt": "Shipments fell...",
                "url": "https://dairynews7x7.com/news/eu-exports",
                "published_at": "2025-04-02T07:00:00Z",
                "categories": ["Global News"]
            }],
            "count": 11, "page": 2, "page_size": 10, "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = NewsQuery {
        category: Some(NewsCategory::Global),
        page: Some(2),
        page_size: None,
    };
    let page = news.list(&query).await.unwrap();

    assert_eq!(page.results[0].id, 40);
    assert!(!page.has_next());
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_news_client_out_of_credits() {
    let server = MockServer::start().await;
    let news = NewsClient::new(&server.uri(), "dn7x7_partner").unwrap();

    Mock::given(method("GET"))
        .and(path("/news/40/"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({"error": "Insufficient credits"})))
        .mount(&server)
        .await;

    assert!(matches!(
        news.get_article(40).await,
        Err(ApiError::InsufficientCredits(_))
    ));
}
