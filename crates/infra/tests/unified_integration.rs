//! End-to-end coverage of the unified layer over the real adapters: SQLCipher
//! repositories for local events and credentials, and the Google client
//! against a wiremock server.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use daybook_core::{CredentialRepository, LocalEventStore, UnifiedEventService, UserRepository};
use daybook_domain::config::{GoogleConfig, ProviderConfig};
use daybook_domain::{
    CalendarProvider, DaybookError, EventInput, NewCredential, Origin, Recurrence, SaveOptions,
    UnifiedEventFilters,
};
use daybook_infra::{
    DbManager, GoogleCalendarClient, GoogleCredentialManager, HttpClient,
    SqlCipherCredentialRepository, SqlCipherLocalEventRepository, SqlCipherUserRepository,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

struct Harness {
    #[allow(dead_code)]
    temp_dir: TempDir,
    service: UnifiedEventService,
    credentials: Arc<SqlCipherCredentialRepository>,
    user_id: i64,
}

impl Harness {
    async fn new(server: &MockServer) -> Self {
        let temp_dir = TempDir::new().expect("temporary directory should be created");
        let db = Arc::new(
            DbManager::new(temp_dir.path().join("unified.db"), 4, Some(TEST_DB_KEY))
                .expect("database manager should initialise"),
        );
        db.run_migrations().expect("schema migrations should apply");

        let user = SqlCipherUserRepository::new(Arc::clone(&db))
            .create("harness@example.com", None)
            .await
            .expect("user should be created");

        let credentials = Arc::new(SqlCipherCredentialRepository::new(Arc::clone(&db)));
        let http = HttpClient::builder()
            .timeout(StdDuration::from_secs(5))
            .max_attempts(1)
            .build()
            .expect("http client");

        let mut google = GoogleConfig::new("client", "secret", "http://localhost/cb");
        google.token_url = format!("{}/token", server.uri());
        google.api_base_url = format!("{}/calendar/v3", server.uri());

        let manager = Arc::new(GoogleCredentialManager::new(google, http.clone(), credentials.clone()));
        let client = Arc::new(GoogleCalendarClient::new(Arc::clone(&manager), http));
        let store = Arc::new(LocalEventStore::new(Arc::new(SqlCipherLocalEventRepository::new(db))));

        let service = UnifiedEventService::new(store)
            .with_external(client, manager)
            .with_settings(ProviderConfig { timeout_secs: 5, ..ProviderConfig::default() });

        Self { temp_dir, service, credentials, user_id: user.id }
    }

    async fn connect(&self) {
        self.credentials
            .upsert(NewCredential {
                user_id: self.user_id,
                provider: CalendarProvider::Google,
                access_token: "ya29.harness".into(),
                refresh_token: Some("1//harness".into()),
                expires_at: Some(Utc::now() + Duration::hours(1)),
                scope: None,
            })
            .await
            .expect("credential should persist");
    }
}

async fn mount_session_check(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/calendar/v3/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn local_event_lifecycle_through_unified_ids() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).await;
    let start = Utc.with_ymd_and_hms(2030, 6, 1, 18, 0, 0).unwrap();

    let created = harness
        .service
        .save_event(
            harness.user_id,
            EventInput {
                title: Some("  Book club  ".into()),
                start_time: Some(start),
                recurrence: Some(Recurrence::Monthly),
                ..EventInput::default()
            },
            SaveOptions::default(),
        )
        .await
        .expect("local create");
    assert_eq!(created.title, "Book club");
    assert!(created.is_recurring());

    let renamed = harness
        .service
        .save_event(
            harness.user_id,
            EventInput { location: Some("Library".into()), ..EventInput::default() },
            SaveOptions::update(created.id.clone()),
        )
        .await
        .expect("local update");
    assert_eq!(renamed.location.as_deref(), Some("Library"));
    assert_eq!(renamed.title, "Book club");
    assert_eq!(renamed.start_time, start);

    let found = harness.service.search_all_events(harness.user_id, "LIBRARY").await.unwrap();
    assert_eq!(found.len(), 1);

    harness.service.delete_event(harness.user_id, &created.id, None).await.expect("delete");
    let again = harness.service.delete_event(harness.user_id, &created.id, None).await;
    assert!(matches!(again, Err(DaybookError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn sub_second_start_is_kept_exactly() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).await;
    let start = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap() + Duration::milliseconds(750);

    let saved = harness
        .service
        .save_event(
            harness.user_id,
            EventInput {
                title: Some("Launch".into()),
                start_time: Some(start),
                ..EventInput::default()
            },
            SaveOptions::default(),
        )
        .await
        .expect("local create");
    assert_eq!(saved.start_time, start);
    assert_eq!(saved.end_time, start + Duration::hours(1));

    let listed = harness
        .service
        .get_all_events(harness.user_id, UnifiedEventFilters::default())
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].start_time, start);
    assert_eq!(listed[0], saved);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_user_is_rejected_on_local_create() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).await;

    let result = harness
        .service
        .save_event(
            harness.user_id + 100,
            EventInput { title: Some("Ghost".into()), start_time: Some(Utc::now()), ..EventInput::default() },
            SaveOptions::default(),
        )
        .await;

    assert_eq!(result.unwrap_err(), DaybookError::UserNotFound(harness.user_id + 100));
}

#[tokio::test(flavor = "multi_thread")]
async fn external_create_update_and_delete_are_routed_to_google() {
    let server = MockServer::start().await;
    mount_session_check(&server).await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(body_partial_json(json!({ "summary": "Launch", "recurrence": ["RRULE:FREQ=WEEKLY"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "gl1",
            "summary": "Launch",
            "start": { "dateTime": "2030-07-01T09:00:00Z" },
            "end": { "dateTime": "2030-07-01T10:00:00Z" },
            "recurrence": ["RRULE:FREQ=WEEKLY"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/calendar/v3/calendars/primary/events/gl1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid attendee email." }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calendar/v3/calendars/primary/events/gl1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server).await;
    harness.connect().await;

    let created = harness
        .service
        .save_event(
            harness.user_id,
            EventInput {
                title: Some("Launch".into()),
                start_time: Some(Utc.with_ymd_and_hms(2030, 7, 1, 9, 0, 0).unwrap()),
                recurrence: Some(Recurrence::Weekly),
                ..EventInput::default()
            },
            SaveOptions::create_in(Origin::External),
        )
        .await
        .expect("external create");
    assert_eq!(created.id, "external_gl1");
    assert_eq!(created.recurrence, Recurrence::Weekly);

    let update = harness
        .service
        .save_event(
            harness.user_id,
            EventInput { title: Some("Launch v2".into()), ..EventInput::default() },
            SaveOptions::update("external_gl1"),
        )
        .await;
    assert_eq!(update.unwrap_err().to_string(), "ProviderApiError: Invalid attendee email.");

    harness.service.delete_event(harness.user_id, "external_gl1", None).await.expect("external delete");
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_provider_leaves_local_reads_intact() {
    let server = MockServer::start().await;
    mount_session_check(&server).await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&server).await;
    harness.connect().await;
    harness
        .service
        .save_event(
            harness.user_id,
            EventInput {
                title: Some("Offline-safe".into()),
                start_time: Some(Utc::now() + Duration::hours(3)),
                ..EventInput::default()
            },
            SaveOptions::default(),
        )
        .await
        .unwrap();

    let events = harness.service.get_all_events(harness.user_id, UnifiedEventFilters::default()).await.unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].origin, Origin::Local);
    assert!(harness.service.has_google_integration(harness.user_id).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_ids_never_reach_a_backend() {
    let server = MockServer::start().await;
    let harness = Harness::new(&server).await;

    for raw in ["garbage", "local_", "local_abc", "external_"] {
        let result = harness.service.delete_event(harness.user_id, raw, None).await;
        assert!(matches!(result, Err(DaybookError::InvalidEventId(_))), "{raw}");
    }
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
