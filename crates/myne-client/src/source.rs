//! Injectable token acquisition sources.
//!
//! The browser original reads `location.search` and `localStorage` directly.
//! Here both are seams: a [`RedirectSource`] for the one-shot redirect
//! parameter and a [`TokenStore`] for the persistent key-value store, so the
//! client can be driven deterministically in tests and embedded in any host.

use std::{collections::HashMap, fs, path::PathBuf, sync::RwLock};

/// Read-only source of redirect query parameters, consulted once at
/// client construction.
pub trait RedirectSource {
    /// Value of the parameter `key`, if present.
    fn get(&self, key: &str) -> Option<String>;
}

/// A raw URL query string, e.g. `"page=2&myneToken=eyJ..."`.
///
/// Values are returned verbatim: no percent-decoding is applied, matching
/// the literal interpolation the manager uses when appending the token to
/// the redirect URL.
#[derive(Debug, Clone)]
pub struct QueryString(String);

impl QueryString {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if let Some(stripped) = raw.strip_prefix('?') {
            Self(stripped.to_owned())
        } else {
            Self(raw)
        }
    }
}

impl RedirectSource for QueryString {
    fn get(&self, key: &str) -> Option<String> {
        self.0
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_owned())
    }
}

/// Persistent key-value store holding the encoded token between visits.
///
/// Reads are infallible by contract: an implementation that hits an I/O
/// error reports it out of band (e.g. a log line) and answers `None`, so
/// client construction can never fail on a broken store.
pub trait TokenStore: Send + Sync {
    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Delete `key`. Deleting an absent key is a no-op.
    fn remove(&self, key: &str);
}

impl<T> TokenStore for std::sync::Arc<T>
where
    T: TokenStore + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// In-memory store.
///
/// Useful for tests and hosts that manage persistence themselves.
/// Data is lost on drop.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, as the redirect landing page would after login.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), value.into());
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

/// File-backed store: one JSON object of string keys and values.
///
/// The native stand-in for browser local storage. A missing or unreadable
/// file is treated as empty; write failures on removal are logged and
/// otherwise ignored, since the in-memory session state is authoritative.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> HashMap<String, String> {
        let Ok(bytes) = fs::read(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("token store {} is corrupt, treating as empty: {e}", self.path.display());
                HashMap::new()
            }
        }
    }

    fn save(&self, entries: &HashMap<String, String>) {
        let json = match serde_json::to_vec(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("could not serialize token store: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            tracing::warn!("could not write token store {}: {e}", self.path.display());
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    fn remove(&self, key: &str) {
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.save(&entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_lookup() {
        let qs = QueryString::new("page=2&myneToken=abc=def&other=1");
        assert_eq!(qs.get("myneToken").as_deref(), Some("abc=def"));
        assert_eq!(qs.get("page").as_deref(), Some("2"));
        assert_eq!(qs.get("missing"), None);
    }

    #[test]
    fn test_query_string_strips_leading_question_mark() {
        let qs = QueryString::new("?myneToken=abc");
        assert_eq!(qs.get("myneToken").as_deref(), Some("abc"));
    }

    #[test]
    fn test_empty_query_string() {
        assert_eq!(QueryString::new("").get("myneToken"), None);
    }

    #[test]
    fn test_memory_store_insert_get_remove() {
        let store = MemoryTokenStore::new();
        store.insert("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
        // removing again is a no-op
        store.remove("k");
    }

    #[test]
    fn test_file_store_persists_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, r#"{"myneToken":"abc"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get("myneToken").as_deref(), Some("abc"));

        store.remove("myneToken");
        assert_eq!(store.get("myneToken"), None);

        // the file itself no longer holds the key either
        let reloaded = FileTokenStore::new(&path);
        assert_eq!(reloaded.get("myneToken"), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("myneToken"), None);
        store.remove("myneToken");
    }

    #[test]
    fn test_file_store_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();
        assert_eq!(FileTokenStore::new(&path).get("myneToken"), None);
    }
}
