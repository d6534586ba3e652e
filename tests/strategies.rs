//! Strategy executor behavior through the worker facade.

mod common;

use async_trait::async_trait;
use common::{config, get, harness, harness_with, url};
use offline_cache::cache::{CacheEntry, CacheStore, MemoryStore, RequestKey};
use offline_cache::strategy::{BypassReason, Route, Strategy};
use offline_cache::telemetry::CacheEvent;
use offline_cache::types::{Request, Response};
use offline_cache::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[tokio::test]
async fn test_cache_first_hit_makes_no_network_call() {
    let h = harness();
    let static_partition = h.worker.partitions().static_assets.clone();
    h.worker
        .registry()
        .put(&static_partition, &get("/app.js"), &Response::ok("console.log(1)"))
        .await
        .unwrap();

    let resp = h.worker.fetch(&get("/app.js")).await.unwrap();
    assert_eq!(resp.text(), "console.log(1)");
    assert_eq!(h.net.total_calls(), 0);
    assert_eq!(h.sink.events_of_kind("hit").len(), 1);
}

#[tokio::test]
async fn test_cache_first_miss_stores_in_static_partition() {
    let h = harness();
    h.net.serve("/styles/site.css", Response::ok("body{}"));

    let first = h.worker.fetch(&get("/styles/site.css")).await.unwrap();
    assert_eq!(first.status, 200);
    let second = h.worker.fetch(&get("/styles/site.css")).await.unwrap();
    assert_eq!(second.text(), "body{}");

    assert_eq!(h.net.calls_to("/styles/site.css"), 1);
    let entry = h
        .worker
        .registry()
        .match_request(&h.worker.partitions().static_assets, &get("/styles/site.css"))
        .await
        .unwrap();
    assert!(entry.is_some());
}

#[tokio::test]
async fn test_cache_first_miss_offline_propagates_network_error() {
    let h = harness();
    h.net.set_offline(true);

    let err = h.worker.fetch(&get("/logo.png")).await.unwrap_err();
    assert!(err.is_network());
    // Not turned into a 503 either: cache-first has no fallback path.
    assert!(h.worker.respond(&get("/logo.png")).await.is_err());
}

#[tokio::test]
async fn test_error_responses_are_returned_but_never_stored() {
    let h = harness();
    h.net.serve("/missing.js", Response::new(404, "nope"));

    let resp = h.worker.fetch(&get("/missing.js")).await.unwrap();
    assert_eq!(resp.status, 404);
    let again = h.worker.fetch(&get("/missing.js")).await.unwrap();
    assert_eq!(again.status, 404);

    assert_eq!(h.net.calls_to("/missing.js"), 2);
    assert_eq!(h.worker.cache_size().await.unwrap(), 0);
    match &h.sink.events_of_kind("not_stored")[0] {
        CacheEvent::NotStored { status, .. } => assert_eq!(*status, 404),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_swr_serves_stale_then_refreshes() {
    let h = harness();
    let dynamic = h.worker.partitions().dynamic.clone();
    h.worker
        .registry()
        .put(&dynamic, &get("/categories/writing"), &Response::ok("stale"))
        .await
        .unwrap();
    h.net.serve("/categories/writing", Response::ok("fresh"));

    let resp = h.worker.fetch(&get("/categories/writing")).await.unwrap();
    assert_eq!(resp.text(), "stale");

    h.worker.settle().await;
    assert_eq!(h.net.calls_to("/categories/writing"), 1);
    let entry = h
        .worker
        .registry()
        .match_request(&dynamic, &get("/categories/writing"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.response.text(), "fresh");

    let next = h.worker.fetch(&get("/categories/writing")).await.unwrap();
    assert_eq!(next.text(), "fresh");
}

#[tokio::test]
async fn test_swr_returns_before_slow_revalidation_finishes() {
    let h = harness();
    let dynamic = h.worker.partitions().dynamic.clone();
    h.worker
        .registry()
        .put(&dynamic, &get("/prompts/42"), &Response::ok("cached"))
        .await
        .unwrap();
    h.net.serve("/prompts/42", Response::ok("updated"));
    h.net.set_delay(Duration::from_millis(200));

    let resp = tokio::time::timeout(
        Duration::from_millis(100),
        h.worker.fetch(&get("/prompts/42")),
    )
    .await
    .expect("stale response must not wait for the network")
    .unwrap();
    assert_eq!(resp.text(), "cached");
    assert_eq!(h.worker.signals().revalidations_in_flight, 1);

    h.worker.settle().await;
    assert_eq!(h.worker.signals().revalidations_in_flight, 0);
}

#[tokio::test]
async fn test_swr_background_failure_is_reported_not_raised() {
    let h = harness();
    let dynamic = h.worker.partitions().dynamic.clone();
    h.worker
        .registry()
        .put(&dynamic, &get("/guides/intro"), &Response::ok("cached guide"))
        .await
        .unwrap();
    h.net.set_offline(true);

    let resp = h.worker.fetch(&get("/guides/intro")).await.unwrap();
    assert_eq!(resp.text(), "cached guide");
    h.worker.settle().await;

    let failures = h.sink.events_of_kind("revalidation_failed");
    assert_eq!(failures.len(), 1);
    let entry = h
        .worker
        .registry()
        .match_request(&dynamic, &get("/guides/intro"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.response.text(), "cached guide");
}

#[tokio::test]
async fn test_swr_miss_waits_for_network() {
    let h = harness();
    h.net.serve("/resources/list", Response::ok("resources"));

    let resp = h.worker.fetch(&get("/resources/list")).await.unwrap();
    assert_eq!(resp.text(), "resources");
    assert_eq!(h.worker.signals().revalidations_in_flight, 0);
    let entry = h
        .worker
        .registry()
        .match_request(&h.worker.partitions().dynamic, &get("/resources/list"))
        .await
        .unwrap();
    assert!(entry.is_some());

    h.net.set_offline(true);
    let err = h.worker.fetch(&get("/resources/other")).await.unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_network_first_prefers_network_and_stores_generic() {
    let h = harness();
    let generic = h.worker.partitions().generic.clone();
    h.worker
        .registry()
        .put(&generic, &get("/api/data"), &Response::ok("old"))
        .await
        .unwrap();
    h.net.serve("/api/data", Response::ok("new"));

    let resp = h.worker.fetch(&get("/api/data")).await.unwrap();
    assert_eq!(resp.text(), "new");
    let entry = h
        .worker
        .registry()
        .match_request(&generic, &get("/api/data"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.response.text(), "new");
}

#[tokio::test]
async fn test_network_first_passes_server_errors_through() {
    let h = harness();
    let generic = h.worker.partitions().generic.clone();
    h.worker
        .registry()
        .put(&generic, &get("/api/data"), &Response::ok("cached"))
        .await
        .unwrap();
    h.net.serve("/api/data", Response::new(500, "boom"));

    let resp = h.worker.fetch(&get("/api/data")).await.unwrap();
    assert_eq!(resp.status, 500);
    let entry = h
        .worker
        .registry()
        .match_request(&generic, &get("/api/data"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.response.text(), "cached");
}

#[tokio::test]
async fn test_network_first_falls_back_across_partitions() {
    let h = harness();
    // Stored under the static partition by a previous install.
    let static_partition = h.worker.partitions().static_assets.clone();
    h.worker
        .registry()
        .put(&static_partition, &get("/about"), &Response::ok("about page"))
        .await
        .unwrap();
    h.net.set_offline(true);

    let resp = h.worker.fetch(&get("/about")).await.unwrap();
    assert_eq!(resp.text(), "about page");
    match &h.sink.events_of_kind("network_fallback")[0] {
        CacheEvent::NetworkFallback { partition, .. } => assert_eq!(partition, "static-v1"),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_network_first_prefers_static_over_generic_on_fallback() {
    let h = harness();
    let parts = h.worker.partitions().clone();
    let registry = h.worker.registry();
    registry.put(&parts.generic, &get("/about"), &Response::ok("generic")).await.unwrap();
    registry.put(&parts.static_assets, &get("/about"), &Response::ok("static")).await.unwrap();
    h.net.set_offline(true);

    let resp = h.worker.fetch(&get("/about")).await.unwrap();
    assert_eq!(resp.text(), "static");
}

#[tokio::test]
async fn test_network_first_unavailable_offline_with_empty_cache() {
    let h = harness();
    h.net.set_offline(true);

    let err = h.worker.fetch(&get("/api/data")).await.unwrap_err();
    assert!(err.is_unavailable());
    match err {
        Error::Unavailable { url: failed, .. } => assert_eq!(failed, url("/api/data")),
        other => panic!("unexpected error {:?}", other),
    }

    let resp = h.worker.respond(&get("/api/data")).await.unwrap();
    assert_eq!(resp.status, 503);
    assert!(resp.header("content-type").unwrap().starts_with("text/plain"));
    assert_eq!(h.sink.events_of_kind("unavailable").len(), 2);
}

/// Store that reads fine but rejects every write.
struct FullStore {
    inner: MemoryStore,
}

#[async_trait]
impl CacheStore for FullStore {
    async fn open(&self, partition: &str) -> Result<()> {
        self.inner.open(partition).await
    }

    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>> {
        self.inner.get(partition, key).await
    }

    async fn put(&self, _partition: &str, _entry: CacheEntry) -> Result<()> {
        Err(Error::storage_with_context(
            "quota exceeded",
            ErrorContext::new().with_source("full_store"),
        ))
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        self.inner.delete_partition(partition).await
    }

    async fn partitions(&self) -> Result<Vec<String>> {
        self.inner.partitions().await
    }

    async fn partition_size(&self, partition: &str) -> Result<u64> {
        self.inner.partition_size(partition).await
    }

    async fn entry_count(&self, partition: &str) -> Result<usize> {
        self.inner.entry_count(partition).await
    }

    fn name(&self) -> &'static str {
        "full"
    }
}

#[tokio::test]
async fn test_failed_cache_write_still_serves_network_response() {
    let h = harness_with(
        config(),
        Arc::new(FullStore {
            inner: MemoryStore::new(),
        }),
    );
    h.net.serve("/api/data", Response::ok("fresh data"));
    h.net.serve("/app.js", Response::ok("bundle"));
    h.net.serve("/prompts/9", Response::ok("prompt nine"));

    // One request per strategy: network-first, cache-first, stale-while-revalidate miss.
    for (path, body) in [
        ("/api/data", "fresh data"),
        ("/app.js", "bundle"),
        ("/prompts/9", "prompt nine"),
    ] {
        let resp = h.worker.fetch(&get(path)).await.unwrap();
        assert_eq!(resp.status, 200, "{}", path);
        assert_eq!(resp.text(), body, "{}", path);
    }

    let failures = h.sink.events_of_kind("store_failed");
    assert_eq!(failures.len(), 3);
    assert!(matches!(
        &failures[0],
        CacheEvent::StoreFailed { url, error, .. }
            if url.ends_with("/api/data") && error.contains("quota exceeded")
    ));
    assert!(h.sink.events_of_kind("stored").is_empty());
    assert_eq!(h.worker.registry().stats().errors, 3);
}

#[tokio::test]
async fn test_non_read_requests_bypass_the_cache() {
    let h = harness();
    let post = Request::new("POST", Url::parse(&url("/api/data")).unwrap());
    assert_eq!(
        h.worker.route(&post),
        Route::Bypass(BypassReason::NonReadMethod)
    );

    assert!(h.worker.handle_fetch(&post).await.unwrap().is_none());
    h.net.serve("/api/data", Response::ok("created"));
    let resp = h.worker.respond(&post).await.unwrap();
    assert_eq!(resp.text(), "created");

    assert_eq!(h.worker.cache_size().await.unwrap(), 0);
    assert!(h.worker.registry().list_names().await.unwrap().is_empty());
    assert_eq!(h.sink.events_of_kind("bypassed").len(), 2);
}

#[tokio::test]
async fn test_non_web_scheme_bypasses() {
    let h = harness();
    let ext = Request::get("chrome-extension://abcdef/app.js").unwrap();
    assert_eq!(
        h.worker.route(&ext),
        Route::Bypass(BypassReason::NonWebScheme)
    );
    assert!(h.worker.handle_fetch(&ext).await.unwrap().is_none());
    assert_eq!(h.net.total_calls(), 0);
}

#[tokio::test]
async fn test_routing_table() {
    let h = harness();
    let cases = [
        ("/", Strategy::CacheFirst),
        ("/manifest.json", Strategy::CacheFirst),
        ("/fonts/inter.woff2", Strategy::CacheFirst),
        ("/categories", Strategy::StaleWhileRevalidate),
        ("/prompts/12?sort=new", Strategy::StaleWhileRevalidate),
        ("/api/data", Strategy::NetworkFirst),
        ("/categoriesx", Strategy::NetworkFirst),
    ];
    for (path, expected) in cases {
        assert_eq!(h.worker.route(&get(path)), Route::Cache(expected), "{}", path);
    }
}

#[tokio::test]
async fn test_fragment_does_not_split_cache_entries() {
    let h = harness();
    h.net.serve("/app.js", Response::ok("js"));

    h.worker.fetch(&get("/app.js")).await.unwrap();
    h.worker.fetch(&get("/app.js#section")).await.unwrap();
    assert_eq!(h.net.calls_to("/app.js"), 1);
}
