//! REST implementation of the provider boundaries
//!
//! `RestProvider` talks to a Supabase-compatible backend: the auth service
//! for session lookup and sign-out, the `rest/v1` endpoint for profile
//! record reads and writes, and the storage service for binary assets.
//! One instance implements all three boundary traits and can be shared
//! behind `Arc` across the store and the mutator.
//!
//! Session-change events are emitted locally after state-changing calls
//! (sign-in, sign-up, sign-out), which is how the original provider client
//! notifies subscribers: the backend has no push channel for this.

use crate::providers::{
    AssetStore, AuthChangeHub, AuthChangeSubscription, ProviderAuthError, ProviderError,
    RecordStore, SessionLookup, SessionProvider,
};
use crate::session::{SESSION_MISSING_ERROR_NAME, SESSION_MISSING_PHRASE};
use crate::settings::SessyncSettings;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::RwLock;
use url::Url;

/// Supabase-compatible REST client for sessions, records, and assets
pub struct RestProvider {
    base_url: String,
    api_key: String,
    access_token: RwLock<Option<String>>,
    client: reqwest::Client,
    events: AuthChangeHub,
}

impl RestProvider {
    /// Create a provider for the given backend base URL and API key
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: RwLock::new(None),
            client: reqwest::Client::new(),
            events: AuthChangeHub::new(),
        }
    }

    /// Create a provider wired from loaded settings
    #[must_use]
    pub fn from_settings(settings: &SessyncSettings) -> Self {
        let provider = Self::new(
            &settings.provider.base_url,
            &settings.provider.resolved_api_key(),
        );
        provider.set_access_token(settings.provider.resolved_access_token().as_deref());
        provider
    }

    /// Install or clear the bearer token used for authenticated calls
    ///
    /// # Panics
    /// Panics if the token lock is poisoned.
    pub fn set_access_token(&self, token: Option<&str>) {
        *self.access_token.write().unwrap() = token.map(ToString::to_string);
    }

    /// Current bearer token, falling back to the API key for anonymous calls
    fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn has_access_token(&self) -> bool {
        self.access_token.read().unwrap().is_some()
    }

    /// Build a `rest/v1` URL with a `select` list and a key-equality filter
    fn record_url(
        &self,
        table: &str,
        columns: Option<&str>,
        key_column: &str,
        key_value: &str,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{table}", self.base_url))
            .map_err(|e| ProviderError::new(&format!("Invalid record URL: {e}")))?;
        if let Some(columns) = columns {
            url.query_pairs_mut().append_pair("select", columns);
        }
        url.query_pairs_mut()
            .append_pair(key_column, &format!("eq.{key_value}"));
        Ok(url)
    }

    /// Exchange email/password credentials for a session
    ///
    /// Pass-through to the auth service; sessync does not implement the
    /// provider's authentication protocol itself. On success the token is
    /// installed and subscribers receive an authenticated change event.
    ///
    /// # Errors
    /// Returns an error if the request fails or the provider rejects the
    /// credentials.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionLookup, ProviderError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        self.credential_request(&url, email, password).await
    }

    /// Register a new account with the auth service
    ///
    /// # Errors
    /// Returns an error if the request fails or the provider rejects the
    /// registration.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SessionLookup, ProviderError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        self.credential_request(&url, email, password).await
    }

    async fn credential_request(
        &self,
        url: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionLookup, ProviderError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| ProviderError::new(&format!("Auth request failed: {e}")))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ProviderError::with_status(
                &extract_error_message(&body),
                status.as_u16(),
            ));
        }

        if let Some(token) = body.get("access_token").and_then(Value::as_str) {
            self.set_access_token(Some(token));
        }
        let lookup = body
            .get("user")
            .and_then(parse_user)
            .map_or_else(SessionLookup::anonymous, |user| {
                SessionLookup::authenticated(&user.0, &user.1)
            });
        self.events.emit(&lookup);
        Ok(lookup)
    }

    /// Fetch the authenticated user from the auth service
    async fn fetch_user(&self) -> SessionLookup {
        if !self.has_access_token() {
            // Without a stored session there is nothing to look up; report
            // the same condition the auth service would.
            return SessionLookup::failed(ProviderAuthError::named(
                SESSION_MISSING_ERROR_NAME,
                "Auth session missing",
            ));
        }

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return SessionLookup::failed(ProviderAuthError::message_only(&format!(
                    "User lookup request failed: {e}"
                )));
            }
        };

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            log::debug!("User lookup returned {status}: treating as missing session");
            return SessionLookup::failed(ProviderAuthError::named(
                SESSION_MISSING_ERROR_NAME,
                &extract_error_message(&body),
            ));
        }
        if !status.is_success() {
            return SessionLookup::failed(ProviderAuthError {
                name: body
                    .get("error_code")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
                message: extract_error_message(&body),
            });
        }

        parse_user(&body).map_or_else(
            || {
                SessionLookup::failed(ProviderAuthError::message_only(
                    "User lookup response had no user object",
                ))
            },
            |(id, email)| SessionLookup::authenticated(&id, &email),
        )
    }
}

#[async_trait]
impl SessionProvider for RestProvider {
    async fn get_session(&self) -> SessionLookup {
        self.fetch_user().await
    }

    async fn get_user(&self) -> SessionLookup {
        self.fetch_user().await
    }

    fn on_auth_state_change(&self) -> AuthChangeSubscription {
        self.events.subscribe()
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if !self.has_access_token() {
            // Already signed out; succeed without a round trip.
            self.events.emit(&SessionLookup::anonymous());
            return Ok(());
        }

        let url = format!("{}/auth/v1/logout", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| ProviderError::new(&format!("Sign-out request failed: {e}")))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = extract_error_message(&body);

        // A session the backend no longer knows about is already signed out.
        let session_missing = status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::NOT_FOUND
            || message.to_lowercase().contains(SESSION_MISSING_PHRASE);
        if !status.is_success() && !session_missing {
            return Err(ProviderError::with_status(&message, status.as_u16()));
        }

        self.set_access_token(None);
        self.events.emit(&SessionLookup::anonymous());
        log::info!("Signed out of provider session");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for RestProvider {
    async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        fields: &Value,
    ) -> Result<(), ProviderError> {
        let url = self.record_url(table, None, key_column, key_value)?;
        log::debug!("Updating {table} where {key_column} = {key_value}");

        let response = self
            .client
            .patch(url)
            .header("apikey", &self.api_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(self.bearer())
            .json(fields)
            .send()
            .await
            .map_err(|e| ProviderError::new(&format!("Record update request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(ProviderError::with_status(
                &extract_error_message(&body),
                status.as_u16(),
            ));
        }
        Ok(())
    }

    async fn select(
        &self,
        table: &str,
        columns: &str,
        key_column: &str,
        key_value: &str,
    ) -> Result<Option<Value>, ProviderError> {
        let url = self.record_url(table, Some(columns), key_column, key_value)?;

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            // Single-object response; zero rows comes back as 406
            .header("Accept", "application/vnd.pgrst.object+json")
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| ProviderError::new(&format!("Record select request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_ACCEPTABLE || status == reqwest::StatusCode::NOT_FOUND
        {
            return Ok(None);
        }
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            return Err(ProviderError::with_status(
                &extract_error_message(&body),
                status.as_u16(),
            ));
        }
        Ok(Some(body))
    }
}

#[async_trait]
impl AssetStore for RestProvider {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<(), ProviderError> {
        let url = format!("{}/storage/v1/object/{bucket}/{key}", self.base_url);
        log::debug!("Uploading {} bytes to {bucket}/{key}", bytes.len());

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Content-Type", content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .bearer_auth(self.bearer())
            .body(bytes)
            .send()
            .await
            .map_err(|e| ProviderError::new(&format!("Asset upload request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(ProviderError::with_status(
                &extract_error_message(&body),
                status.as_u16(),
            ));
        }
        Ok(())
    }

    fn get_public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.base_url)
    }
}

/// Pull an `{id, email}` pair out of a provider user object
fn parse_user(body: &Value) -> Option<(String, String)> {
    let id = body.get("id").and_then(Value::as_str)?;
    let email = body.get("email").and_then(Value::as_str)?;
    Some((id.to_string(), email.to_string()))
}

/// Best-effort extraction of a human-readable message from an error body
fn extract_error_message(body: &Value) -> String {
    for field in ["message", "msg", "error_description", "error"] {
        if let Some(msg) = body.get(field).and_then(Value::as_str) {
            return msg.to_string();
        }
    }
    "Request rejected by provider".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = RestProvider::new("https://proj.supabase.co/", "anon-key");
        assert_eq!(
            provider.get_public_url("avatars", "u1/avatar.png"),
            "https://proj.supabase.co/storage/v1/object/public/avatars/u1/avatar.png"
        );
    }

    #[test]
    fn record_url_carries_select_and_filter() {
        let provider = RestProvider::new("https://proj.supabase.co", "anon-key");
        let url = provider
            .record_url("profiles", Some("email,full_name"), "id", "u1")
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/profiles");
        let query = url.query().unwrap();
        assert!(query.contains("select=email%2Cfull_name"));
        assert!(query.contains("id=eq.u1"));
    }

    #[test]
    fn bearer_falls_back_to_api_key() {
        let provider = RestProvider::new("https://proj.supabase.co", "anon-key");
        assert_eq!(provider.bearer(), "anon-key");

        provider.set_access_token(Some("user-token"));
        assert_eq!(provider.bearer(), "user-token");

        provider.set_access_token(None);
        assert_eq!(provider.bearer(), "anon-key");
    }

    #[tokio::test]
    async fn missing_token_resolves_to_session_missing_without_network() {
        let provider = RestProvider::new("https://proj.supabase.co", "anon-key");
        let lookup = provider.get_user().await;
        let error = lookup.error.unwrap();
        assert_eq!(error.name.as_deref(), Some(SESSION_MISSING_ERROR_NAME));
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_successful_noop() {
        let provider = RestProvider::new("https://proj.supabase.co", "anon-key");
        let mut sub = provider.on_auth_state_change();

        provider.sign_out().await.unwrap();
        let event = sub.next().await.unwrap();
        assert!(event.user.is_none() && event.error.is_none());
    }

    #[test]
    fn error_message_extraction_prefers_message_field() {
        let body = serde_json::json!({ "message": "boom", "error": "other" });
        assert_eq!(extract_error_message(&body), "boom");
        assert_eq!(
            extract_error_message(&Value::Null),
            "Request rejected by provider"
        );
    }
}
