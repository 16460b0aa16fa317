//! AppContext wiring against a real encrypted database, with Google and
//! OpenAI endpoints served by wiremock.

use chrono::{Duration, TimeZone, Utc};
use daybook_api::AppContext;
use daybook_core::UserRepository;
use daybook_domain::config::{Config, DatabaseConfig, GoogleConfig, OpenAiConfig};
use daybook_domain::{DaybookError, EventInput, Origin, SaveOptions, UnifiedEventFilters};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn base_config(dir: &TempDir) -> Config {
    Config {
        database: DatabaseConfig {
            path: dir.path().join("daybook.db").to_string_lossy().into_owned(),
            pool_size: 4,
            encryption_key: Some(TEST_DB_KEY.to_string()),
        },
        ..Config::default()
    }
}

fn google_config(server: &MockServer) -> GoogleConfig {
    let mut google = GoogleConfig::new("client", "secret", "http://localhost:3000/oauth/callback");
    google.token_url = format!("{}/token", server.uri());
    google.api_base_url = format!("{}/calendar/v3", server.uri());
    google
}

#[tokio::test(flavor = "multi_thread")]
async fn local_only_context_creates_and_lists_events() {
    let dir = TempDir::new().unwrap();
    let ctx = AppContext::new(base_config(&dir)).expect("context");
    ctx.health_check().expect("healthy database");

    let user = ctx.users.create("solo@example.com", None).await.unwrap();
    let start = Utc::now() + Duration::hours(2);

    let saved = ctx
        .unified
        .save_event(
            user.id,
            EventInput { title: Some("Focus block".into()), start_time: Some(start), ..EventInput::default() },
            SaveOptions::create_in(Origin::External),
        )
        .await
        .expect("falls back to local");

    assert!(saved.id.starts_with("local_"));
    assert_eq!(saved.end_time, start + Duration::hours(1));

    let events = ctx.unified.get_all_events(user.id, UnifiedEventFilters::default()).await.unwrap();
    assert_eq!(events.len(), 1);
    assert!(!ctx.unified.has_google_integration(user.id).await);

    let status = ctx.unified.get_integration_status(user.id).await;
    assert!(!status.connected);
    assert!(!status.has_credential);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_integrations_report_config_errors() {
    let dir = TempDir::new().unwrap();
    let ctx = AppContext::new(base_config(&dir)).expect("context");
    let user = ctx.users.create("solo@example.com", None).await.unwrap();

    assert!(matches!(ctx.google(), Err(DaybookError::Config(_))));
    assert!(matches!(
        ctx.create_event_from_text(user.id, "gym tomorrow").await,
        Err(DaybookError::Config(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_encryption_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = base_config(&dir);
    config.database.encryption_key = None;

    assert!(matches!(AppContext::new(config), Err(DaybookError::Security(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn google_connect_flow_enables_external_reads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.ctx",
            "refresh_token": "1//ctx",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "primary", "summary": "Me", "primary": true }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "g1",
                "summary": "Board meeting",
                "start": { "dateTime": "2099-01-05T09:00:00Z" },
                "end": { "dateTime": "2099-01-05T10:00:00Z" }
            }]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = base_config(&dir);
    config.google = Some(google_config(&server));
    let ctx = AppContext::new(config).expect("context");
    let user = ctx.users.create("linked@example.com", Some("Linked")).await.unwrap();

    let consent = ctx.google().unwrap().get_authorization_url().unwrap();
    assert!(consent.contains("access_type=offline"));

    ctx.connect_google(user.id, "auth-code").await.expect("code exchange");

    let status = ctx.unified.get_integration_status(user.id).await;
    assert!(status.connected);
    assert!(status.has_credential);
    assert_eq!(status.calendars.len(), 1);

    let local_start = Utc.with_ymd_and_hms(2099, 1, 5, 8, 0, 0).unwrap();
    ctx.unified
        .save_event(
            user.id,
            EventInput { title: Some("Prep".into()), start_time: Some(local_start), ..EventInput::default() },
            SaveOptions::default(),
        )
        .await
        .unwrap();

    let events = ctx.unified.get_all_events(user.id, UnifiedEventFilters::default()).await.unwrap();
    let ids: Vec<&str> = events.iter().map(|event| event.id.as_str()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[0].starts_with("local_"));
    assert_eq!(ids[1], "external_g1");

    ctx.disconnect_google(user.id).await.unwrap();
    assert!(!ctx.unified.has_google_integration(user.id).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn natural_language_creation_persists_local_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": json!({
                "title": "Dentist",
                "description": null,
                "location": "Main St",
                "start_time": "2099-02-01T15:00:00Z",
                "end_time": null,
                "is_all_day": false,
                "recurrence": "monthly"
            }).to_string() } }]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = base_config(&dir);
    config.openai = Some(OpenAiConfig {
        api_key: "sk-test".into(),
        model: "gpt-4o-mini".into(),
        api_url: format!("{}/v1/chat/completions", server.uri()),
    });
    let ctx = AppContext::new(config).expect("context");
    let user = ctx.users.create("nlp@example.com", None).await.unwrap();

    let event = ctx
        .create_event_from_text(user.id, "dentist on Main St Feb 1st 3pm, monthly")
        .await
        .expect("event created");

    assert_eq!(event.title, "Dentist");
    assert_eq!(event.end_time, Utc.with_ymd_and_hms(2099, 2, 1, 16, 0, 0).unwrap());
    assert_eq!(event.recurrence, daybook_domain::Recurrence::Monthly);
    assert_eq!(ctx.local_events.count(user.id).await.unwrap(), 1);
}
