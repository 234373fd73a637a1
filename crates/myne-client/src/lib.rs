//! Client for the Myne graph-query service.
//!
//! Provides:
//! - `SessionClient` - Session lifecycle and action execution
//! - `SessionToken` - The base64/JSON bearer credential handed over by redirect
//! - `RedirectSource` / `TokenStore` - Injectable token acquisition seams
//! - Graph result types (`Node`, `Relation`, `ActionResult`)

pub mod client;
pub mod graph;
pub mod source;
pub mod token;

pub use client::{ClientError, MANAGER_URL, SessionClient, registration_url};
pub use graph::{ActionResult, Node, Relation};
pub use source::{FileTokenStore, MemoryTokenStore, QueryString, RedirectSource, TokenStore};
pub use token::{SessionToken, TOKEN_KEY, TokenDecodeError};
