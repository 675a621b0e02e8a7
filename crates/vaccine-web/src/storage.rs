//! `document.cookie` and `localStorage` behind the widget storage traits.

use gloo::utils::{document, window};
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, Storage};
use vaccine_widgets::{CookieStore, KeyValueStore, StorageError, StorageResult};

/// The page's cookie jar.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserCookies;

impl CookieStore for BrowserCookies {
    fn cookie_string(&self) -> String {
        document()
            .dyn_into::<HtmlDocument>()
            .ok()
            .and_then(|html| html.cookie().ok())
            .unwrap_or_default()
    }

    fn set_cookie(&self, cookie: &str) {
        let written = document()
            .dyn_into::<HtmlDocument>()
            .ok()
            .is_some_and(|html| html.set_cookie(cookie).is_ok());
        if !written {
            tracing::warn!("cookie write rejected");
        }
    }
}

/// The page's `localStorage`; private browsing may deny it.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserStorage;

impl BrowserStorage {
    fn raw(operation: &'static str) -> StorageResult<Storage> {
        window()
            .local_storage()
            .ok()
            .flatten()
            .ok_or(StorageError::Unavailable { operation })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::raw("get").ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Self::raw("set")?
            .set_item(key, value)
            .map_err(|_| StorageError::QuotaExceeded {
                key: key.to_string(),
            })
    }

    fn remove(&self, key: &str) {
        if let Ok(storage) = Self::raw("remove") {
            if storage.remove_item(key).is_err() {
                tracing::debug!(key, "storage removal rejected");
            }
        }
    }
}
