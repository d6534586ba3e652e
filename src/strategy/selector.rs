//! Request classification.
//!
//! Rules are checked in a fixed order: non-`GET` and non-web schemes bypass the cache,
//! then static assets (known root paths or file extensions) go cache-first, then dynamic
//! content (path patterns) goes stale-while-revalidate, and everything else is
//! network-first.

use super::{BypassReason, Route, Strategy};
use crate::types::Request;
use crate::{Error, ErrorContext, Result};
use arc_swap::ArcSwap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Classification data. Extend these lists to change routing; executors are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRules {
    /// Exact paths treated as static assets.
    #[serde(default = "default_static_paths")]
    pub static_paths: Vec<String>,
    /// File extensions (without the dot, case-insensitive) treated as static assets.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,
    /// Regexes over the URL path identifying dynamic content pages.
    #[serde(default = "default_dynamic_patterns")]
    pub dynamic_patterns: Vec<String>,
}

fn default_static_paths() -> Vec<String> {
    ["/", "/manifest.json", "/favicon.ico"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_static_extensions() -> Vec<String> {
    [
        "js", "mjs", "css", "woff", "woff2", "ttf", "otf", "eot", "png", "jpg", "jpeg", "gif",
        "svg", "webp", "avif", "ico",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_dynamic_patterns() -> Vec<String> {
    [
        "^/categories(/|$)",
        "^/prompts(/|$)",
        "^/guides(/|$)",
        "^/resources(/|$)",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            static_paths: default_static_paths(),
            static_extensions: default_static_extensions(),
            dynamic_patterns: default_dynamic_patterns(),
        }
    }
}

impl ClassificationRules {
    pub fn with_static_path(mut self, path: impl Into<String>) -> Self {
        self.static_paths.push(path.into());
        self
    }

    pub fn with_static_extension(mut self, ext: impl Into<String>) -> Self {
        self.static_extensions.push(ext.into());
        self
    }

    pub fn with_dynamic_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.dynamic_patterns.push(pattern.into());
        self
    }
}

struct CompiledRules {
    static_paths: HashSet<String>,
    static_extensions: HashSet<String>,
    dynamic_patterns: Vec<Regex>,
}

impl CompiledRules {
    fn compile(rules: &ClassificationRules) -> Result<Self> {
        let dynamic_patterns = rules
            .dynamic_patterns
            .iter()
            .enumerate()
            .map(|(i, p)| {
                Regex::new(p).map_err(|e| {
                    Error::configuration_with_context(
                        format!("invalid dynamic pattern: {}", e),
                        ErrorContext::new()
                            .with_field_path(format!("rules.dynamic_patterns[{}]", i))
                            .with_details(p.clone()),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            static_paths: rules.static_paths.iter().cloned().collect(),
            static_extensions: rules
                .static_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            dynamic_patterns,
        })
    }

    fn is_static(&self, path: &str) -> bool {
        if self.static_paths.contains(path) {
            return true;
        }
        extension(path)
            .map(|ext| self.static_extensions.contains(&ext))
            .unwrap_or(false)
    }

    fn is_dynamic(&self, path: &str) -> bool {
        self.dynamic_patterns.iter().any(|re| re.is_match(path))
    }
}

/// Lower-cased extension of the last path segment, if any.
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Maps requests to a [`Route`]. Pure and total; rules can be swapped at runtime.
pub struct Classifier {
    rules: ArcSwap<CompiledRules>,
}

impl Classifier {
    pub fn new(rules: &ClassificationRules) -> Result<Self> {
        Ok(Self {
            rules: ArcSwap::from_pointee(CompiledRules::compile(rules)?),
        })
    }

    /// Replace the rule set. On error the previous rules stay in effect.
    pub fn reload(&self, rules: &ClassificationRules) -> Result<()> {
        self.rules.store(Arc::new(CompiledRules::compile(rules)?));
        Ok(())
    }

    pub fn route(&self, request: &Request) -> Route {
        if !request.is_read() {
            return Route::Bypass(BypassReason::NonReadMethod);
        }
        if !request.is_web_scheme() {
            return Route::Bypass(BypassReason::NonWebScheme);
        }
        Route::Cache(self.classify_path(request.path()))
    }

    /// Strategy for a path, ignoring method and scheme.
    pub fn classify_path(&self, path: &str) -> Strategy {
        let rules = self.rules.load();
        if rules.is_static(path) {
            Strategy::CacheFirst
        } else if rules.is_dynamic(path) {
            Strategy::StaleWhileRevalidate
        } else {
            Strategy::NetworkFirst
        }
    }
}
