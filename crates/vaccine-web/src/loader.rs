//! CMS resource loading.
//!
//! # Design
//! - Stylesheets start together and are awaited with `Promise.allSettled`;
//!   scripts, JSON documents and modules load one at a time.
//! - Tags already on the page are left alone.
//! - A failing resource is logged and counted; loading carries on.

use std::collections::BTreeMap;

use gloo::utils::document;
use gloo_net::http::Request;
use js_sys::{Array, Function, Promise, Reflect};
use serde_json::Value;
use vaccine_config::{ResourceKind, ResourceManifest, config_key, presence_key};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlHeadElement, HtmlLinkElement, HtmlScriptElement};

use crate::dom;
use crate::error::{WebError, WebResult};

/// Outcome of a loader pass.
#[derive(Debug, Default)]
pub(crate) struct LoadedResources {
    /// JSON documents keyed by file stem.
    pub(crate) documents: BTreeMap<String, Value>,
    /// Resources injected or fetched.
    pub(crate) loaded: usize,
    /// Resources that failed.
    pub(crate) failed: usize,
}

fn already_present(kind: ResourceKind, path: &str) -> bool {
    let key = presence_key(path);
    let selector = match kind {
        ResourceKind::Stylesheet => format!("link[href*=\"{key}\"]"),
        ResourceKind::Script | ResourceKind::Module => format!("script[src*=\"{key}\"]"),
        ResourceKind::Json => return false,
    };
    dom::query_first(&selector).is_some()
}

/// Promise settled by the element's `load`/`error` handlers.
fn settle_on_load(set_handlers: impl Fn(&Function, &Function)) -> Promise {
    Promise::new(&mut |resolve, reject| set_handlers(&resolve, &reject))
}

fn inject_stylesheet(head: &HtmlHeadElement, url: &str) -> WebResult<Promise> {
    let link = dom::create("link")?
        .dyn_into::<HtmlLinkElement>()
        .map_err(|_| WebError::js("createElement", "link is not an HtmlLinkElement"))?;
    link.set_rel("stylesheet");
    link.set_href(url);
    let promise = settle_on_load(|resolve, reject| {
        link.set_onload(Some(resolve));
        link.set_onerror(Some(reject));
    });
    dom::append(head, &link)?;
    Ok(promise)
}

async fn inject_script(head: &HtmlHeadElement, url: &str, module: bool) -> WebResult<()> {
    let script = dom::create("script")?
        .dyn_into::<HtmlScriptElement>()
        .map_err(|_| WebError::js("createElement", "script is not an HtmlScriptElement"))?;
    if module {
        script.set_type("module");
    }
    script.set_async(false);
    script.set_src(url);
    let promise = settle_on_load(|resolve, reject| {
        script.set_onload(Some(resolve));
        script.set_onerror(Some(reject));
    });
    dom::append(head, &script)?;
    JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|_| WebError::Resource {
            url: url.to_string(),
            message: "script failed to load".to_string(),
        })
}

async fn fetch_json(url: &str) -> WebResult<Value> {
    let failed = |message: String| WebError::Resource {
        url: url.to_string(),
        message,
    };
    let response = Request::get(url)
        .send()
        .await
        .map_err(|err| failed(err.to_string()))?;
    if !response.ok() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    response
        .json::<Value>()
        .await
        .map_err(|err| failed(err.to_string()))
}

async fn await_stylesheets(pending: Vec<(String, Promise)>, outcome: &mut LoadedResources) {
    if pending.is_empty() {
        return;
    }
    let promises: Array = pending.iter().map(|(_, promise)| promise.clone()).collect();
    let settled = match JsFuture::from(Promise::all_settled(&promises)).await {
        Ok(settled) => Array::from(&settled),
        Err(err) => {
            tracing::warn!(error = %WebError::from_js("Promise.allSettled", &err).detail(), "stylesheet phase failed");
            outcome.failed += pending.len();
            return;
        }
    };
    for ((url, _), result) in pending.iter().zip(settled.iter()) {
        let status = Reflect::get(&result, &JsValue::from_str("status"))
            .ok()
            .and_then(|status| status.as_string());
        if status.as_deref() == Some("fulfilled") {
            outcome.loaded += 1;
        } else {
            outcome.failed += 1;
            tracing::warn!(url, "stylesheet failed to load");
        }
    }
}

/// Run every phase of the manifest.
///
/// # Errors
///
/// Returns [`WebError::MissingElement`] when the document has no `<head>`.
/// Individual resource failures are logged and counted instead.
pub(crate) async fn load_resources(
    manifest: &ResourceManifest,
    cache_buster: &str,
) -> WebResult<LoadedResources> {
    let head = document().head().ok_or_else(|| WebError::MissingElement {
        selector: "head".to_string(),
    })?;
    let mut outcome = LoadedResources::default();

    for phase in manifest.phases() {
        if phase.resources.is_empty() {
            continue;
        }
        tracing::debug!(phase = phase.name, count = phase.resources.len(), "loading resources");
        let mut pending = Vec::new();
        for path in &phase.resources {
            if already_present(phase.kind, path) {
                tracing::debug!(path = %path, "resource already on page");
                continue;
            }
            let url = manifest.url(phase.kind, path, cache_buster);
            let result = match phase.kind {
                ResourceKind::Stylesheet => inject_stylesheet(&head, &url).map(|promise| {
                    pending.push((url.clone(), promise));
                }),
                ResourceKind::Script => inject_script(&head, &url, false).await,
                ResourceKind::Module => inject_script(&head, &url, true).await,
                ResourceKind::Json => fetch_json(&url).await.map(|document| {
                    outcome
                        .documents
                        .insert(config_key(path).to_string(), document);
                }),
            };
            match result {
                Ok(()) if phase.parallel => {}
                Ok(()) => outcome.loaded += 1,
                Err(err) => {
                    outcome.failed += 1;
                    tracing::warn!(path = %path, error = %err.detail(), "resource failed to load");
                }
            }
        }
        if phase.parallel {
            await_stylesheets(pending, &mut outcome).await;
        }
    }

    tracing::info!(loaded = outcome.loaded, failed = outcome.failed, "resources loaded");
    Ok(outcome)
}
