//! Session token wire format.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query-parameter and store key under which the encoded token travels.
pub const TOKEN_KEY: &str = "myneToken";

/// Bearer credential for one Myne session.
///
/// Minted by the Myne manager and handed to the app via redirect as the
/// standard base64 encoding of a UTF-8 JSON object. Opaque to the client
/// beyond this structure; `myne_url` names the service instance the token
/// is valid against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    /// Myne user the session belongs to.
    pub user_id: String,
    /// App Manifest the session was registered under.
    pub app_id: String,
    /// Base URL of the service instance to talk to.
    pub myne_url: String,
    /// Bearer token for the `Authorization` header.
    pub auth_token: String,
}

/// Token decode error.
///
/// Deliberately does not echo the raw blob back in the message.
#[derive(Debug, Error)]
pub enum TokenDecodeError {
    #[error("session token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("session token does not decode to a valid token object: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionToken {
    /// Decode an encoded token blob: base64, then JSON.
    ///
    /// # Errors
    /// Returns `TokenDecodeError` if either step fails, including when the
    /// payload parses as JSON but is not a token object.
    pub fn decode(raw: &str) -> Result<Self, TokenDecodeError> {
        let bytes = BASE64.decode(raw.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Encode this token the way the manager does, for local minting.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serializing a struct of plain strings cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        BASE64.encode(json)
    }
}
