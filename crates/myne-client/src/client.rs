//! Session client: token acquisition, logout, action execution.

use std::collections::HashMap;

use reqwest::{StatusCode, header};
use serde::Serialize;

use crate::{
    graph::ActionResult,
    source::{RedirectSource, TokenStore},
    token::{SessionToken, TOKEN_KEY},
};

/// Base URL of the Myne manager, where apps register and users log in.
pub const MANAGER_URL: &str = "https://app.myne.systems";

/// Client error.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("user is not logged in")]
    NotLoggedIn,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("request to the Myne service failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Myne service returned {status}: {reason}")]
    Remote { status: u16, reason: String },
    #[error("could not decode action response: {0}")]
    ResponseDecode(#[from] serde_json::Error),
}

/// Client for one Myne session.
///
/// Holds at most one [`SessionToken`]; token presence is the logged-in
/// state, the two cannot disagree. Acquisition runs once at construction:
/// the redirect parameter wins over the store, sources are never merged.
pub struct SessionClient<S>
where
    S: TokenStore,
{
    http: reqwest::Client,
    store: S,
    token: Option<SessionToken>,
}

impl<S> SessionClient<S>
where
    S: TokenStore,
{
    /// Create a client, acquiring a token from `redirect` or `store`.
    ///
    /// Never fails: a malformed token from either source is logged at warn
    /// level and the client starts logged out. A malformed redirect token
    /// does not fall back to the store.
    #[must_use]
    pub fn new(redirect: &dyn RedirectSource, store: S) -> Self {
        let token = acquire_token(redirect, &store);
        Self {
            http: reqwest::Client::new(),
            store,
            token,
        }
    }

    /// Whether a session token is held.
    #[must_use]
    pub fn user_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// The held session token, if any.
    #[must_use]
    pub fn session_token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Close the session remotely, then clear all local session state.
    ///
    /// # Errors
    /// `NotLoggedIn` if no token is held (checked before any I/O),
    /// `Network` on transport failure, `Remote` on a non-2xx response.
    /// Local state is only cleared after the service confirms the close.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotLoggedIn)?;

        let response = self
            .http
            .post(format!("{}/sessions/close", token.myne_url))
            .bearer_auth(&token.auth_token)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response.status()));
        }

        self.store.remove(TOKEN_KEY);
        self.token = None;
        Ok(())
    }

    /// Run a named action with string key-value parameters.
    ///
    /// # Errors
    /// `NotLoggedIn` and `InvalidArgument` (empty action name) are checked
    /// in that order before any I/O. `Network` on transport failure,
    /// `Remote` on a non-2xx response, `ResponseDecode` if a successful
    /// response body is not a valid action result.
    pub async fn execute_action(
        &self,
        action_name: &str,
        params: &HashMap<String, String>,
    ) -> Result<ActionResult, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotLoggedIn)?;
        if action_name.is_empty() {
            return Err(ClientError::InvalidArgument(
                "an action name must be specified".into(),
            ));
        }

        let response = self
            .http
            .post(format!("{}/actions/run", token.myne_url))
            .bearer_auth(&token.auth_token)
            .json(&ActionRequest {
                action_name,
                action_query_params: params,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(remote_error(response.status()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Registration URL on the Myne manager for out-of-band login.
///
/// The caller is responsible for navigating to it; no request is made here.
/// Parameters are interpolated literally, without percent-encoding, to stay
/// wire-compatible with the manager's raw handling of `redirectUrl`; values
/// containing `&` or `=` will not survive the trip.
#[must_use]
pub fn registration_url(app_id: &str, redirect_url: &str) -> String {
    format!("{MANAGER_URL}/apps/app-manifest/view?appId={app_id}&register=true&redirectUrl={redirect_url}")
}

fn acquire_token(redirect: &dyn RedirectSource, store: &dyn TokenStore) -> Option<SessionToken> {
    if let Some(raw) = redirect.get(TOKEN_KEY) {
        return decode_or_warn(&raw, "redirect parameter");
    }
    if let Some(raw) = store.get(TOKEN_KEY) {
        return decode_or_warn(&raw, "token store");
    }
    tracing::warn!("user not logged in");
    None
}

fn decode_or_warn(raw: &str, origin: &str) -> Option<SessionToken> {
    match SessionToken::decode(raw) {
        Ok(token) => Some(token),
        Err(e) => {
            tracing::warn!("ignoring malformed session token from {origin}: {e}");
            None
        }
    }
}

fn remote_error(status: StatusCode) -> ClientError {
    ClientError::Remote {
        status: status.as_u16(),
        reason: status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_owned(),
    }
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    action_name: &'a str,
    action_query_params: &'a HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MemoryTokenStore, QueryString};

    fn encoded(myne_url: &str) -> String {
        SessionToken {
            user_id: "user-1".into(),
            app_id: "app-1".into(),
            myne_url: myne_url.into(),
            auth_token: "secret".into(),
        }
        .encode()
    }

    #[test]
    fn test_registration_url_is_literal() {
        assert_eq!(
            registration_url("abc123", "https://x.test/cb"),
            "https://app.myne.systems/apps/app-manifest/view?appId=abc123&register=true&redirectUrl=https://x.test/cb"
        );
    }

    #[test]
    fn test_redirect_parameter_wins_over_store() {
        let store = MemoryTokenStore::new();
        store.insert(TOKEN_KEY, encoded("https://stored.test"));
        let redirect = QueryString::new(format!("{TOKEN_KEY}={}", encoded("https://redirect.test")));

        let client = SessionClient::new(&redirect, store);
        assert!(client.user_logged_in());
        assert_eq!(client.session_token().unwrap().myne_url, "https://redirect.test");
    }

    #[test]
    fn test_store_used_when_no_redirect_parameter() {
        let store = MemoryTokenStore::new();
        store.insert(TOKEN_KEY, encoded("https://stored.test"));

        let client = SessionClient::new(&QueryString::new(""), store);
        assert!(client.user_logged_in());
        assert_eq!(client.session_token().unwrap().myne_url, "https://stored.test");
    }

    #[test]
    fn test_no_source_means_logged_out() {
        let client = SessionClient::new(&QueryString::new(""), MemoryTokenStore::new());
        assert!(!client.user_logged_in());
        assert!(client.session_token().is_none());
    }

    #[test]
    fn test_malformed_redirect_token_means_logged_out() {
        let store = MemoryTokenStore::new();
        // a valid stored token must NOT rescue a malformed redirect token
        store.insert(TOKEN_KEY, encoded("https://stored.test"));
        let redirect = QueryString::new(format!("{TOKEN_KEY}=not!!base64"));

        let client = SessionClient::new(&redirect, store);
        assert!(!client.user_logged_in());
    }

    #[test]
    fn test_malformed_stored_token_means_logged_out() {
        let store = MemoryTokenStore::new();
        store.insert(
            TOKEN_KEY,
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b"not json"),
        );
        let client = SessionClient::new(&QueryString::new(""), store);
        assert!(!client.user_logged_in());
    }
}
