//! Cookie and key/value persistence seams.
//!
//! # Design
//! - Browser implementations live in the web crate; the widgets only see
//!   these traits.
//! - [`MemoryCookieJar`] follows `document.cookie`: writes take attribute
//!   strings, reads return `name=value; ...` for live cookies only.
//! - [`MemoryStorage`] follows `localStorage` and can be told to reject
//!   writes, mirroring quota and private-mode failures.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use thiserror::Error;

/// Result alias for storage writes.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failures surfaced to widgets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The store refused the write.
    #[error("storage quota exceeded")]
    QuotaExceeded {
        /// Key being written.
        key: String,
    },
    /// No storage is available in this context.
    #[error("storage unavailable")]
    Unavailable {
        /// Operation attempted.
        operation: &'static str,
    },
}

/// `document.cookie`-shaped store.
pub trait CookieStore {
    /// Every live cookie as `name=value` pairs joined by `"; "`.
    fn cookie_string(&self) -> String;

    /// Write one cookie using `Set-Cookie` attribute syntax.
    fn set_cookie(&self, cookie: &str);
}

/// `localStorage`-shaped store.
pub trait KeyValueStore {
    /// Stored value for `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] when the store rejects the write.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`; absent keys are ignored.
    fn remove(&self, key: &str);
}

impl<T: CookieStore + ?Sized> CookieStore for &T {
    fn cookie_string(&self) -> String {
        (**self).cookie_string()
    }

    fn set_cookie(&self, cookie: &str) {
        (**self).set_cookie(cookie);
    }
}

impl<T: CookieStore + ?Sized> CookieStore for Rc<T> {
    fn cookie_string(&self) -> String {
        (**self).cookie_string()
    }

    fn set_cookie(&self, cookie: &str) {
        (**self).set_cookie(cookie);
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

#[derive(Clone, Debug)]
struct StoredCookie {
    value: String,
    expires: Option<DateTime<Utc>>,
}

/// In-memory cookie jar with its own clock.
#[derive(Debug)]
pub struct MemoryCookieJar {
    now: Cell<DateTime<Utc>>,
    cookies: RefCell<BTreeMap<String, StoredCookie>>,
    writes: RefCell<Vec<String>>,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl MemoryCookieJar {
    /// Empty jar whose clock reads `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
            cookies: RefCell::new(BTreeMap::new()),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Current jar time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    /// Move the jar clock forward.
    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }

    /// Raw cookie strings written so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }
}

impl CookieStore for MemoryCookieJar {
    fn cookie_string(&self) -> String {
        let now = self.now.get();
        self.cookies
            .borrow()
            .iter()
            .filter(|(_, cookie)| cookie.expires.is_none_or(|at| at > now))
            .map(|(name, cookie)| format!("{name}={}", cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn set_cookie(&self, cookie: &str) {
        self.writes.borrow_mut().push(cookie.to_string());
        let mut parts = cookie.split(';');
        let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        let now = self.now.get();
        let mut expires = None;
        for attribute in parts {
            let Some((key, raw)) = attribute.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "expires" => expires = parse_cookie_date(raw.trim()),
                "max-age" => {
                    if let Some(delta) = raw
                        .trim()
                        .parse::<i64>()
                        .ok()
                        .and_then(TimeDelta::try_seconds)
                    {
                        expires = Some(
                            now.checked_add_signed(delta)
                                .unwrap_or(DateTime::<Utc>::MAX_UTC),
                        );
                    }
                }
                _ => {}
            }
        }
        let mut cookies = self.cookies.borrow_mut();
        if expires.is_some_and(|at| at <= now) {
            cookies.remove(name);
        } else {
            cookies.insert(
                name.to_string(),
                StoredCookie {
                    value: value.trim().to_string(),
                    expires,
                },
            );
        }
    }
}

/// Parse an `expires` attribute (`Thu, 01 Jan 1970 00:00:00 GMT`).
#[must_use]
pub fn parse_cookie_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw
        .strip_suffix(" GMT")
        .or_else(|| raw.strip_suffix(" UTC"))
        .unwrap_or(raw);
    NaiveDateTime::parse_from_str(trimmed, "%a, %d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// In-memory `localStorage`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
    reject_writes: Cell<bool>,
}

impl MemoryStorage {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later write fail with [`StorageError::QuotaExceeded`].
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.reject_writes.get() {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jar() -> MemoryCookieJar {
        MemoryCookieJar::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn cookies_expire_with_the_jar_clock() {
        let jar = jar();
        jar.set_cookie("consent=accepted; expires=Sun, 02 Mar 2025 12:00:00 GMT; path=/");
        jar.set_cookie("session=abc; path=/");
        assert_eq!(jar.cookie_string(), "consent=accepted; session=abc");

        jar.advance(TimeDelta::days(2));
        assert_eq!(jar.cookie_string(), "session=abc");
    }

    #[test]
    fn past_expiry_and_zero_max_age_delete() {
        let jar = jar();
        jar.set_cookie("a=1; path=/");
        jar.set_cookie("b=2; path=/");
        jar.set_cookie("a=; expires=Thu, 01 Jan 1970 00:00:00 UTC; path=/;");
        jar.set_cookie("b=2; max-age=0");
        assert_eq!(jar.cookie_string(), "");
        assert_eq!(jar.writes().len(), 4);
    }

    #[test]
    fn malformed_cookie_writes_are_ignored() {
        let jar = jar();
        jar.set_cookie("no-equals-sign");
        jar.set_cookie("=orphan");
        assert_eq!(jar.cookie_string(), "");
    }

    #[test]
    fn memory_storage_can_reject_writes() {
        let storage = MemoryStorage::new();
        assert!(storage.set("k", "v").is_ok());
        assert_eq!(storage.get("k").as_deref(), Some("v"));

        storage.reject_writes(true);
        assert_eq!(
            storage.set("k", "w"),
            Err(StorageError::QuotaExceeded {
                key: "k".to_string()
            })
        );
        assert_eq!(storage.get("k").as_deref(), Some("v"));

        storage.remove("k");
        assert!(storage.is_empty());
    }

    #[test]
    fn shared_handles_forward_to_the_same_store() {
        let storage = Rc::new(MemoryStorage::new());
        let handle = Rc::clone(&storage);
        assert!(handle.set("pwa", "1").is_ok());
        assert_eq!(storage.len(), 1);
        assert_eq!((&*storage).get("pwa").as_deref(), Some("1"));
    }
}
