//! CMS resource manifest.
//!
//! # Design
//! - URLs are `<origin>/<hash><base path><relative path>?v=<buster>`; the
//!   hash segment depends on the resource kind.
//! - Loading happens in phases: stylesheets together, then each script or
//!   data tier one resource at a time.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// What a resource is and how it is injected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// `<link rel="stylesheet">`.
    Stylesheet,
    /// Classic `<script>`.
    Script,
    /// `<script type="module">`.
    Module,
    /// JSON document fetched and kept by file stem.
    Json,
}

/// CMS content hash per resource kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceHashes {
    /// Hash for stylesheets.
    pub css: String,
    /// Hash for scripts and modules.
    pub script: String,
    /// Hash for JSON documents.
    pub json: String,
}

impl Default for ResourceHashes {
    fn default() -> Self {
        Self {
            css: defaults::RESOURCE_HASH.to_string(),
            script: defaults::RESOURCE_HASH.to_string(),
            json: defaults::RESOURCE_HASH.to_string(),
        }
    }
}

/// One loading phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadPhase {
    /// Phase label used in logs.
    pub name: &'static str,
    /// Kind shared by every resource in the phase.
    pub kind: ResourceKind,
    /// Start every resource at once and wait for all of them.
    pub parallel: bool,
    /// Relative paths in load order.
    pub resources: Vec<String>,
}

/// Resources loaded before the widgets start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceManifest {
    /// Load resources at startup; off when the page template carries them.
    pub enabled: bool,
    /// Asset host; empty for same-origin URLs.
    pub origin: String,
    /// Hash segment per kind.
    pub hashes: ResourceHashes,
    /// Folder below the hash segment.
    pub base_path: String,
    /// Stylesheets.
    pub css: Vec<String>,
    /// Third-party scripts.
    pub external_js: Vec<String>,
    /// JSON documents.
    pub config: Vec<String>,
    /// Additional module scripts.
    pub modules: Vec<String>,
}

impl Default for ResourceManifest {
    fn default() -> Self {
        Self {
            enabled: true,
            origin: defaults::RESOURCE_ORIGIN.to_string(),
            hashes: ResourceHashes::default(),
            base_path: defaults::RESOURCE_BASE_PATH.to_string(),
            css: [
                "styles/styles-min-vb.css",
                "styles/style.css",
                "styles/table-responsive.css",
                "styles/vb-header.css",
                "styles/vb-tables.css",
            ]
            .map(str::to_string)
            .to_vec(),
            external_js: [
                "scripts/external-scripts/tailwind.js",
                "scripts/external-scripts/local-bs.js",
            ]
            .map(str::to_string)
            .to_vec(),
            config: vec!["scripts/atomic-components/design-tokens/event-types.json".to_string()],
            modules: Vec::new(),
        }
    }
}

impl ResourceManifest {
    /// Hash segment for a resource kind.
    #[must_use]
    pub fn hash_for(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Stylesheet => &self.hashes.css,
            ResourceKind::Script | ResourceKind::Module => &self.hashes.script,
            ResourceKind::Json => &self.hashes.json,
        }
    }

    /// Absolute (or root-relative) URL for a resource.
    #[must_use]
    pub fn url(&self, kind: ResourceKind, path: &str, cache_buster: &str) -> String {
        let mut url = self.origin.trim_end_matches('/').to_string();
        let hash = self.hash_for(kind).trim_matches('/');
        if !hash.is_empty() {
            url.push('/');
            url.push_str(hash);
        }
        let base = self.base_path.trim_matches('/');
        if !base.is_empty() {
            url.push('/');
            url.push_str(base);
        }
        url.push('/');
        url.push_str(path.trim_start_matches('/'));
        if !cache_buster.is_empty() {
            url.push_str("?v=");
            url.push_str(cache_buster);
        }
        url
    }

    /// Phases in load order.
    #[must_use]
    pub fn phases(&self) -> Vec<LoadPhase> {
        vec![
            LoadPhase {
                name: "stylesheets",
                kind: ResourceKind::Stylesheet,
                parallel: true,
                resources: self.css.clone(),
            },
            LoadPhase {
                name: "external scripts",
                kind: ResourceKind::Script,
                parallel: false,
                resources: self.external_js.clone(),
            },
            LoadPhase {
                name: "configuration",
                kind: ResourceKind::Json,
                parallel: false,
                resources: self.config.clone(),
            },
            LoadPhase {
                name: "modules",
                kind: ResourceKind::Module,
                parallel: false,
                resources: self.modules.clone(),
            },
        ]
    }

    /// Every relative path, in load order.
    #[must_use]
    pub fn all_resources(&self) -> Vec<String> {
        self.phases()
            .into_iter()
            .flat_map(|phase| phase.resources)
            .collect()
    }
}

/// Key a JSON document is stored under: its file stem.
#[must_use]
pub fn config_key(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.strip_suffix(".json").unwrap_or(file)
}

/// Path used to detect an already injected tag (query string removed).
#[must_use]
pub fn presence_key(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_origin_hash_base_and_buster() {
        let manifest = ResourceManifest::default();
        assert_eq!(
            manifest.url(ResourceKind::Stylesheet, "styles/style.css", "1700000000000"),
            "https://www.ptj.se/49f763/globalassets/vaccincenter-varvet/styles/style.css?v=1700000000000"
        );
    }

    #[test]
    fn url_uses_kind_specific_hash_and_tolerates_slashes() {
        let manifest = ResourceManifest {
            origin: "https://cdn.example/".to_string(),
            hashes: ResourceHashes {
                css: "aa11".to_string(),
                script: "/bb22/".to_string(),
                json: String::new(),
            },
            base_path: "assets".to_string(),
            ..ResourceManifest::default()
        };
        assert_eq!(
            manifest.url(ResourceKind::Module, "/app.js", ""),
            "https://cdn.example/bb22/assets/app.js"
        );
        assert_eq!(
            manifest.url(ResourceKind::Json, "event-types.json", "7"),
            "https://cdn.example/assets/event-types.json?v=7"
        );
        let relative = ResourceManifest {
            origin: String::new(),
            ..manifest
        };
        assert_eq!(
            relative.url(ResourceKind::Stylesheet, "a.css", ""),
            "/aa11/assets/a.css"
        );
    }

    #[test]
    fn phases_load_css_in_parallel_then_tiers_in_order() {
        let manifest = ResourceManifest::default();
        let phases = manifest.phases();
        let names: Vec<_> = phases.iter().map(|phase| phase.name).collect();
        assert_eq!(
            names,
            vec!["stylesheets", "external scripts", "configuration", "modules"]
        );
        assert!(phases[0].parallel);
        assert!(phases[1..].iter().all(|phase| !phase.parallel));
        assert_eq!(phases[0].resources.len(), 5);
        assert_eq!(manifest.all_resources().len(), 8);
    }

    #[test]
    fn keys_strip_folders_extensions_and_queries() {
        assert_eq!(
            config_key("scripts/atomic-components/design-tokens/event-types.json"),
            "event-types"
        );
        assert_eq!(config_key("plain"), "plain");
        assert_eq!(presence_key("styles/style.css?v=1"), "styles/style.css");
    }
}
