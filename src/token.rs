//! Bearer token validation and persistence.
//!
//! The token is an opaque credential issued by the server's login flow. The
//! client never inspects it beyond a structural sanity check: a usable token
//! splits into exactly three `.`-separated segments. That check is *not* a
//! cryptographic verification - the server remains the authority on whether
//! a token is actually good.
//!
//! [`TokenStore`] persists the credential in a single named filesystem slot.
//! Storage is strictly best-effort: some environments forbid writing to the
//! chosen location, and the client must degrade to unauthenticated behavior
//! rather than fail. Every storage error is therefore swallowed at this
//! boundary and surfaced only as a debug log line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Structural validity check for a bearer token.
///
/// Returns `true` iff the token is present and splitting it on `.` yields
/// exactly three segments. Pure, never panics.
///
/// ```
/// use ci_http_client::is_valid_token;
///
/// assert!(is_valid_token(Some("header.payload.signature")));
/// assert!(!is_valid_token(Some("not-a-token")));
/// assert!(!is_valid_token(None));
/// ```
pub fn is_valid_token(token: Option<&str>) -> bool {
    matches!(token, Some(t) if t.split('.').count() == 3)
}

/// Durable single-slot storage for the bearer token.
///
/// The slot is one file holding the token verbatim. Reads and writes never
/// return an error; an unavailable or corrupt slot behaves as "no token".
#[derive(Debug, Clone)]
pub struct TokenStore {
    slot: PathBuf,
}

impl TokenStore {
    /// Create a store backed by the given slot path.
    ///
    /// The path is not touched until the first read or write.
    pub fn new(slot: impl Into<PathBuf>) -> Self {
        TokenStore { slot: slot.into() }
    }

    /// Path of the backing slot.
    pub fn slot(&self) -> &Path {
        &self.slot
    }

    /// Read the persisted token.
    ///
    /// A stored value that fails the structural check is deleted and `None`
    /// is returned, so a corrupt slot heals itself on the next read. An
    /// unreadable slot also yields `None`.
    pub fn stored_token(&self) -> Option<String> {
        let token = fs::read_to_string(&self.slot).ok()?;
        if !is_valid_token(Some(&token)) {
            self.remove_slot();
            return None;
        }
        Some(token)
    }

    /// Persist the token, or clear the slot.
    ///
    /// An invalid token (including `None`) deletes any stored value. Storage
    /// errors are swallowed; this operation never fails.
    pub fn store_token(&self, token: Option<&str>) {
        match token {
            Some(token) if is_valid_token(Some(token)) => {
                if let Some(parent) = self.slot.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                if let Err(err) = fs::write(&self.slot, token) {
                    debug!(slot = %self.slot.display(), %err, "could not persist token");
                }
            }
            _ => self.remove_slot(),
        }
    }

    fn remove_slot(&self) {
        match fs::remove_file(&self.slot) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => debug!(slot = %self.slot.display(), %err, "could not clear token slot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("auth_token"));
        (dir, store)
    }

    #[test]
    fn three_segments_are_valid() {
        assert!(is_valid_token(Some("h.p.s")));
        assert!(is_valid_token(Some("..")));
    }

    #[test]
    fn other_shapes_are_invalid() {
        assert!(!is_valid_token(None));
        assert!(!is_valid_token(Some("")));
        assert!(!is_valid_token(Some("a.b")));
        assert!(!is_valid_token(Some("a.b.c.d")));
    }

    #[test]
    fn valid_token_round_trips() {
        let (_dir, store) = store();
        store.store_token(Some("h.p.s"));
        assert_eq!(store.stored_token().as_deref(), Some("h.p.s"));
    }

    #[test]
    fn invalid_token_clears_slot() {
        let (_dir, store) = store();
        store.store_token(Some("h.p.s"));
        store.store_token(Some("not-a-token"));
        assert_eq!(store.stored_token(), None);

        store.store_token(Some("h.p.s"));
        store.store_token(None);
        assert_eq!(store.stored_token(), None);
    }

    #[test]
    fn corrupt_slot_heals_on_read() {
        let (_dir, store) = store();
        fs::write(store.slot(), "garbage").unwrap();
        assert_eq!(store.stored_token(), None);
        assert!(!store.slot().exists());
    }

    #[test]
    fn missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested/dir/auth_token"));
        store.store_token(Some("h.p.s"));
        assert_eq!(store.stored_token().as_deref(), Some("h.p.s"));
    }

    #[test]
    fn unavailable_storage_degrades_to_no_token() {
        let store = TokenStore::new("/proc/definitely/not/writable/auth_token");
        store.store_token(Some("h.p.s"));
        assert_eq!(store.stored_token(), None);
    }
}
