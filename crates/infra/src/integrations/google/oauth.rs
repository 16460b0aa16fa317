//! Google OAuth2 credential manager
//!
//! Owns the authorization-code flow and the refresh grant. Credentials are
//! persisted through the [`CredentialRepository`] port; everything that
//! answers "is this user connected" degrades to `None`/`false` instead of
//! failing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use daybook_core::{CredentialRepository, ProviderCredentials};
use daybook_domain::config::GoogleConfig;
use daybook_domain::{
    CalendarProvider, Credential, DaybookError, NewCredential, ProviderSession, Result,
};
use reqwest::{Method, Response};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::types::{error_message, TokenResponse};
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Read and write access to events on every calendar of the account.
pub const GOOGLE_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

const PROVIDER: CalendarProvider = CalendarProvider::Google;

pub struct GoogleCredentialManager {
    config: GoogleConfig,
    http: HttpClient,
    repository: Arc<dyn CredentialRepository>,
}

impl GoogleCredentialManager {
    pub fn new(config: GoogleConfig, http: HttpClient, repository: Arc<dyn CredentialRepository>) -> Self {
        Self { config, http, repository }
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Consent URL requesting calendar read/write with offline access.
    ///
    /// `prompt=consent` forces Google to issue a refresh token even when the
    /// user has authorized the client before.
    ///
    /// # Errors
    /// `Config` when the configured authorization endpoint is not a URL.
    pub fn get_authorization_url(&self) -> Result<String> {
        self.build_authorization_url(None)
    }

    /// Same as [`Self::get_authorization_url`] with an opaque `state` value
    /// echoed back on the callback.
    pub fn get_authorization_url_with_state(&self, state: &str) -> Result<String> {
        self.build_authorization_url(Some(state))
    }

    fn build_authorization_url(&self, state: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&self.config.auth_url).map_err(|err| {
            DaybookError::Config(format!("invalid Google authorization URL: {err}"))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.redirect_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", GOOGLE_CALENDAR_SCOPE)
                .append_pair("access_type", "offline")
                .append_pair("prompt", "consent");
            if let Some(state) = state {
                query.append_pair("state", state);
            }
        }

        Ok(url.into())
    }

    /// Exchange an authorization code and store the resulting credential.
    ///
    /// # Errors
    /// - `MissingAccessToken` when the token response has no access token
    /// - `Auth` when Google rejects the code
    /// - `Network` on transport failure
    #[instrument(skip(self, code))]
    pub async fn exchange_code_for_credential(&self, user_id: i64, code: &str) -> Result<Credential> {
        let code = code.trim();
        if code.is_empty() {
            return Err(DaybookError::InvalidInput("authorization code is required".into()));
        }

        let token = self
            .request_token(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        let access_token = token.access_token().ok_or(DaybookError::MissingAccessToken)?.to_string();
        let expires_at = expiry_from(token.expires_in, Utc::now())?;

        let credential = self
            .repository
            .upsert(NewCredential {
                user_id,
                provider: PROVIDER,
                access_token,
                refresh_token: token.refresh_token.clone(),
                expires_at,
                scope: token.scope.clone(),
            })
            .await?;

        info!(user_id, has_refresh_token = credential.refresh_token.is_some(), "stored Google credential");
        Ok(credential)
    }

    pub async fn get_credential(&self, user_id: i64) -> Result<Option<Credential>> {
        self.repository.get(user_id, PROVIDER).await
    }

    /// Usable session for `user_id`, refreshing an expired token first.
    ///
    /// Returns `None` when the user never connected, the stored token is
    /// blank, storage fails or the refresh is rejected.
    ///
    /// Two concurrent callers holding the same expired credential both
    /// refresh; the later `update_tokens` write wins and either access
    /// token stays valid at Google until it expires.
    #[instrument(skip(self))]
    pub async fn get_authenticated_session(&self, user_id: i64) -> Option<ProviderSession> {
        let credential = match self.repository.get(user_id, PROVIDER).await {
            Ok(Some(credential)) => credential,
            Ok(None) => return None,
            Err(err) => {
                warn!(user_id, error = %err, "failed to load Google credential");
                return None;
            }
        };

        if !credential.has_access_token() {
            return None;
        }

        if !credential.is_expired_at(Utc::now()) {
            return Some(session_from(&credential));
        }

        match self.refresh(&credential).await {
            Ok(refreshed) => Some(session_from(&refreshed)),
            Err(err) => {
                warn!(user_id, error = %err, "Google token refresh failed");
                None
            }
        }
    }

    /// Whether a session exists and Google accepts it for one cheap call.
    pub async fn has_valid_session(&self, user_id: i64) -> bool {
        let Some(session) = self.get_authenticated_session(user_id).await else {
            return false;
        };

        let url = format!("{}/users/me/calendarList", self.config.api_base_url);
        let request = self
            .http
            .request(Method::GET, url)
            .bearer_auth(&session.access_token)
            .query(&[("maxResults", "1")]);

        match self.http.send(request).await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(user_id, status = %response.status(), "Google session check rejected");
                false
            }
            Err(err) => {
                debug!(user_id, error = %err, "Google session check failed");
                false
            }
        }
    }

    /// Forget the stored credential. Disconnecting an unconnected user is a
    /// no-op.
    pub async fn disconnect(&self, user_id: i64) -> Result<()> {
        let removed = self.repository.delete(user_id, PROVIDER).await?;
        info!(user_id, removed, "disconnected Google calendar");
        Ok(())
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| DaybookError::Auth("credential has no refresh token".into()))?;

        let token = self
            .request_token(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        let access_token = token.access_token().ok_or(DaybookError::MissingAccessToken)?;
        let expires_at = expiry_from(token.expires_in, Utc::now())?;

        let refreshed = self
            .repository
            .update_tokens(
                credential.user_id,
                PROVIDER,
                access_token,
                token.refresh_token.as_deref(),
                expires_at,
            )
            .await?;

        debug!(user_id = credential.user_id, "refreshed Google access token");
        Ok(refreshed)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let request = self.http.request(Method::POST, &self.config.token_url).form(form);
        let response = self.http.send(request).await?;
        let response = ensure_token_success(response).await?;
        response.json::<TokenResponse>().await.map_err(|err| InfraError::from(err).into())
    }
}

async fn ensure_token_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response).await;
    Err(DaybookError::Auth(format!("Google token request failed ({status}): {message}")))
}

/// Absolute expiry for a relative `expires_in`.
///
/// # Errors
/// `Auth` when the lifetime does not fit the calendar range; the token
/// response is then treated as unusable.
fn expiry_from(expires_in: Option<i64>, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    expires_in
        .map(|seconds| {
            TimeDelta::try_seconds(seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| {
                    DaybookError::Auth(format!("Google token lifetime out of range: expires_in={seconds}"))
                })
        })
        .transpose()
}

fn session_from(credential: &Credential) -> ProviderSession {
    ProviderSession {
        user_id: credential.user_id,
        provider: credential.provider,
        access_token: credential.access_token.clone(),
        expires_at: credential.expires_at,
    }
}

#[async_trait]
impl ProviderCredentials for GoogleCredentialManager {
    async fn get_credential(&self, user_id: i64) -> Result<Option<Credential>> {
        GoogleCredentialManager::get_credential(self, user_id).await
    }

    async fn has_valid_session(&self, user_id: i64) -> bool {
        GoogleCredentialManager::has_valid_session(self, user_id).await
    }
}


#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::test_support::fixture;
    use super::*;

    fn stored(user_id: i64, access: &str, refresh: Option<&str>, expires_at: DateTime<Utc>) -> NewCredential {
        NewCredential {
            user_id,
            provider: PROVIDER,
            access_token: access.into(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Some(expires_at),
            scope: None,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn authorization_url_requests_offline_consent() {
        let server = MockServer::start().await;
        let fx = fixture(&server.uri()).await;

        let raw = fx.manager.get_authorization_url_with_state("csrf-123").unwrap();
        let url = Url::parse(&raw).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["prompt"], "consent");
        assert_eq!(params["scope"], GOOGLE_CALENDAR_SCOPE);
        assert_eq!(params["redirect_uri"], "http://localhost:3000/callback");
        assert_eq!(params["state"], "csrf-123");

        let plain = fx.manager.get_authorization_url().unwrap();
        assert!(!plain.contains("state="));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exchange_stores_credential_and_reexchange_updates_in_place() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.first",
                "refresh_token": "1//refresh",
                "expires_in": 3599,
                "scope": GOOGLE_CALENDAR_SCOPE,
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;

        let first = fx.manager.exchange_code_for_credential(fx.user_id, "auth-code").await.unwrap();
        let second = fx.manager.exchange_code_for_credential(fx.user_id, "auth-code").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.access_token, "ya29.first");
        assert_eq!(second.refresh_token.as_deref(), Some("1//refresh"));
        assert!(second.expires_at.unwrap() > Utc::now());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exchange_without_access_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": 3599 })))
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;

        let result = fx.manager.exchange_code_for_credential(fx.user_id, "auth-code").await;

        assert_eq!(result.unwrap_err(), DaybookError::MissingAccessToken);
        assert!(fx.manager.get_credential(fx.user_id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_code_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Malformed auth code."
            })))
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;

        match fx.manager.exchange_code_for_credential(fx.user_id, "stale").await {
            Err(DaybookError::Auth(message)) => assert!(message.contains("Malformed auth code.")),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn session_is_none_without_credential() {
        let server = MockServer::start().await;
        let fx = fixture(&server.uri()).await;

        assert!(fx.manager.get_authenticated_session(fx.user_id).await.is_none());
        assert!(!fx.manager.has_valid_session(fx.user_id).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn valid_token_is_returned_without_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;
        let later = Utc::now() + Duration::hours(1);
        fx.credentials.upsert(stored(fx.user_id, "ya29.live", Some("1//r"), later)).await.unwrap();

        let session = fx.manager.get_authenticated_session(fx.user_id).await.unwrap();

        assert_eq!(session.access_token, "ya29.live");
        assert_eq!(session.user_id, fx.user_id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_token_is_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=1%2F%2Fr"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "ya29.fresh", "expires_in": 3600 })),
            )
            .expect(1)
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;
        let past = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        fx.credentials.upsert(stored(fx.user_id, "ya29.stale", Some("1//r"), past)).await.unwrap();

        let session = fx.manager.get_authenticated_session(fx.user_id).await.unwrap();
        assert_eq!(session.access_token, "ya29.fresh");

        let persisted = fx.manager.get_credential(fx.user_id).await.unwrap().unwrap();
        assert_eq!(persisted.access_token, "ya29.fresh");
        assert_eq!(persisted.refresh_token.as_deref(), Some("1//r"));
        assert!(persisted.expires_at.unwrap() > Utc::now());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_refresh_degrades_to_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;
        let past = Utc::now() - Duration::minutes(5);
        fx.credentials.upsert(stored(fx.user_id, "ya29.stale", Some("1//r"), past)).await.unwrap();

        assert!(fx.manager.get_authenticated_session(fx.user_id).await.is_none());

        let untouched = fx.manager.get_credential(fx.user_id).await.unwrap().unwrap();
        assert_eq!(untouched.access_token, "ya29.stale");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn out_of_range_token_lifetime_degrades_to_no_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "ya29.fresh", "expires_in": i64::MAX })),
            )
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;
        let past = Utc::now() - Duration::minutes(5);
        fx.credentials.upsert(stored(fx.user_id, "ya29.stale", Some("1//r"), past)).await.unwrap();

        assert!(fx.manager.get_authenticated_session(fx.user_id).await.is_none());
        assert!(!fx.manager.has_valid_session(fx.user_id).await);

        let untouched = fx.manager.get_credential(fx.user_id).await.unwrap().unwrap();
        assert_eq!(untouched.access_token, "ya29.stale");

        let err = fx.manager.exchange_code_for_credential(fx.user_id, "4/code").await.unwrap_err();
        assert!(matches!(err, DaybookError::Auth(ref message) if message.contains("out of range")), "{err:?}");
    }

    #[test]
    fn expiry_is_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(expiry_from(Some(3600), now).unwrap(), Some(now + Duration::hours(1)));
        assert_eq!(expiry_from(None, now).unwrap(), None);
        assert!(expiry_from(Some(i64::MAX), now).is_err());
        assert!(expiry_from(Some(i64::MIN), now).is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_token_without_refresh_token_is_not_connected() {
        let server = MockServer::start().await;
        let fx = fixture(&server.uri()).await;
        let past = Utc::now() - Duration::minutes(5);
        fx.credentials.upsert(stored(fx.user_id, "ya29.stale", None, past)).await.unwrap();

        assert!(fx.manager.get_authenticated_session(fx.user_id).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn live_call_decides_session_validity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/users/me/calendarList"))
            .and(query_param("maxResults", "1"))
            .and(header("authorization", "Bearer ya29.live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/calendar/v3/users/me/calendarList"))
            .and(header("authorization", "Bearer ya29.revoked"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let fx = fixture(&server.uri()).await;
        let later = Utc::now() + Duration::hours(1);

        fx.credentials.upsert(stored(fx.user_id, "ya29.live", None, later)).await.unwrap();
        assert!(fx.manager.has_valid_session(fx.user_id).await);

        fx.credentials.upsert(stored(fx.user_id, "ya29.revoked", None, later)).await.unwrap();
        assert!(!fx.manager.has_valid_session(fx.user_id).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_provider_means_no_valid_session() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let fx = fixture(&uri).await;
        let later = Utc::now() + Duration::hours(1);
        fx.credentials.upsert(stored(fx.user_id, "ya29.live", None, later)).await.unwrap();
        drop(server);

        assert!(!fx.manager.has_valid_session(fx.user_id).await);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn disconnect_removes_credential_and_is_idempotent() {
        let server = MockServer::start().await;
        let fx = fixture(&server.uri()).await;
        let later = Utc::now() + Duration::hours(1);
        fx.credentials.upsert(stored(fx.user_id, "ya29.live", None, later)).await.unwrap();

        fx.manager.disconnect(fx.user_id).await.unwrap();
        fx.manager.disconnect(fx.user_id).await.unwrap();

        assert!(fx.manager.get_credential(fx.user_id).await.unwrap().is_none());
        assert!(fx.manager.get_authenticated_session(fx.user_id).await.is_none());
    }
}
