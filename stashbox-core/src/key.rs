//! Cache key derivation.
//!
//! A [`CacheKey`] is a filesystem-safe identifier derived from the request
//! method and URL. It consists of two parts:
//!
//! 1. **Prefix** - `{method}_{host}_{path}` with every run of characters outside
//!    `[A-Za-z0-9_-]` collapsed into a single `_`, truncated to 40 characters.
//! 2. **Digest** - lowercase hex SHA-1 of `{method}::{full_url}` (query included).
//!
//! The prefix only makes file names readable. Two URLs differing only in their
//! query share a prefix; the digest tells them apart.
//!
//! The URL is hashed in its [`Uri`] display form, which always carries a path:
//! `http://example.com` is hashed as `http://example.com/`, so both spellings
//! share a record. Caches written by tools that hash the bare authority form
//! will not be found for such URLs.
//!
//! ```
//! use http::{Method, Uri};
//! use stashbox_core::CacheKey;
//!
//! let uri: Uri = "http://example.com/a?x=1".parse().unwrap();
//! let key = CacheKey::new(&Method::GET, &uri);
//! assert_eq!(key.prefix(), "GET_example_com__a");
//! assert_eq!(
//!     key.to_string(),
//!     "GET_example_com__a1c5ff486ebe2bd427ba9afdabdcea7f0a61c9fd6"
//! );
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use http::{Method, Uri};
use regex::Regex;
use sha1::{Digest, Sha1};

use crate::request::RequestHead;

/// Maximum length of the human-readable key prefix.
pub const PREFIX_LEN: usize = 40;

static INVALID_FILE_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^-_0-9a-zA-Z]+").expect("file name sanitization pattern is valid")
});

/// Deterministic identifier of a request, derived from its method and URL only.
///
/// Headers and body never take part in the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: String,
    digest: String,
}

impl CacheKey {
    /// Derives the key for `method` + `uri`.
    pub fn new(method: &Method, uri: &Uri) -> Self {
        let readable = format!("{}_{}_{}", method, host(uri), uri.path());
        let mut prefix = sanitize(&readable).into_owned();
        // sanitized output is pure ASCII, so byte truncation is safe
        prefix.truncate(PREFIX_LEN);

        let mut hasher = Sha1::new();
        hasher.update(method.as_str().as_bytes());
        hasher.update(b"::");
        hasher.update(uri.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());

        CacheKey { prefix, digest }
    }

    /// Derives the key for a request head.
    pub fn from_head(head: &RequestHead) -> Self {
        Self::new(head.method(), head.uri())
    }

    /// Sanitized, truncated `{method}_{host}_{path}` part of the key.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Hex encoded SHA-1 digest of `{method}::{url}`.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.digest)
    }
}

/// Replaces each run of characters outside `[A-Za-z0-9_-]` with one `_`.
pub fn sanitize(input: &str) -> Cow<'_, str> {
    INVALID_FILE_NAME_CHARS.replace_all(input, "_")
}

/// Host with an explicit port when present, without user info.
fn host(uri: &Uri) -> Cow<'_, str> {
    match (uri.host(), uri.port()) {
        (Some(host), Some(port)) => Cow::Owned(format!("{host}:{}", port.as_str())),
        (Some(host), None) => Cow::Borrowed(host),
        (None, _) => Cow::Borrowed(""),
    }
}
