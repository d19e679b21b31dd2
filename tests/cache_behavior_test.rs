//! Cache coherence through the public interface: TTL accounting, fragment
//! identity and freshness guarantees.

use redquery::{FakeClock, MockTransport, RedfishError, RedfishInterface, TimeBasedCache};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

fn service() -> Arc<MockTransport> {
    let transport = Arc::new(MockTransport::new());
    transport.add_resource(
        "/u",
        json!({
            "@odata.id": "/u",
            "Id": "1",
            "Name": "MyResource",
            "Status": {"State": "Enabled"}
        }),
    );
    transport
}

fn interface_over(transport: Arc<MockTransport>, clock: Arc<FakeClock>) -> RedfishInterface {
    RedfishInterface::new(transport, clock, Duration::from_secs(60))
}

#[tokio::test]
async fn test_transport_counts_across_the_ttl() {
    let transport = service();
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let interface = interface_over(transport.clone(), clock.clone());

    // t = 0: miss.
    interface.cached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 1);

    // t = 1s: hit.
    clock.advance(Duration::from_secs(1));
    interface.cached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 1);

    // t = 61s: expired.
    clock.advance(Duration::from_secs(60));
    interface.cached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 2);
}

#[tokio::test]
async fn test_fragments_of_one_uri_share_one_fetch() {
    let transport = service();
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let interface = interface_over(transport.clone(), clock);

    let status = interface.cached_get_uri("/u#/Status").await.unwrap();
    let name = interface.cached_get_uri("/u#/Name").await.unwrap();

    assert_eq!(
        status.as_object().unwrap().payload()["State"],
        json!("Enabled")
    );
    assert_eq!(name.as_scalar(), Some(&json!("MyResource")));
    assert_eq!(transport.get_count("/u"), 1);
}

#[tokio::test]
async fn test_ensure_fresh_fetch_accounting() {
    let transport = service();
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let interface = interface_over(transport.clone(), clock.clone());

    // Primed by a live fetch: ensure_fresh costs nothing.
    let live = interface.cached_get_uri("/u").await.unwrap();
    live.as_object().unwrap().ensure_fresh().await.unwrap();
    assert_eq!(transport.get_count("/u"), 1);

    // Served from cache: ensure_fresh re-fetches exactly once.
    clock.advance(Duration::from_secs(1));
    let cached = interface.cached_get_uri("/u").await.unwrap();
    let refreshed = cached.as_object().unwrap().ensure_fresh().await.unwrap();
    assert!(refreshed.is_fresh());
    assert_eq!(transport.get_count("/u"), 2);

    // Past the TTL the cached GET itself re-fetches, so ensure_fresh is
    // again free.
    clock.advance(Duration::from_secs(61));
    let refetched = interface.cached_get_uri("/u").await.unwrap();
    refetched.as_object().unwrap().ensure_fresh().await.unwrap();
    assert_eq!(transport.get_count("/u"), 3);
}

#[tokio::test]
async fn test_ensure_fresh_without_odata_id_fails_cleanly() {
    let transport = Arc::new(MockTransport::new());
    transport.add_resource("/u", json!({"Id": "1", "Name": "NoCanonicalUri"}));
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let interface = interface_over(transport.clone(), clock);

    interface.cached_get_uri("/u").await.unwrap();
    let cached = interface.cached_get_uri("/u").await.unwrap();

    let result = cached.as_object().unwrap().ensure_fresh().await;
    assert!(matches!(result, Err(RedfishError::NoOdataId)));

    // The cached copy is untouched: the next cached GET is still a hit.
    interface.cached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 1);
}

#[tokio::test]
async fn test_uncached_get_leaves_cache_cold() {
    let transport = service();
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let interface = interface_over(transport.clone(), clock);

    interface.uncached_get_uri("/u").await.unwrap();
    interface.uncached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 2);
}

#[tokio::test]
async fn test_clear_all_invalidates_shared_cache() {
    let transport = service();
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let cache = Arc::new(TimeBasedCache::new(
        transport.clone(),
        clock,
        Duration::from_secs(60),
    ));
    let interface = RedfishInterface::with_cache(cache.clone());

    interface.cached_get_uri("/u").await.unwrap();
    interface.cached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 1);

    cache.clear_all().await;
    interface.cached_get_uri("/u").await.unwrap();
    assert_eq!(transport.get_count("/u"), 2);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_in_flight_fetch() {
    let transport = service();
    let clock = Arc::new(FakeClock::new(UNIX_EPOCH));
    let interface = Arc::new(interface_over(transport.clone(), clock));

    let (a, b) = tokio::join!(
        interface.cached_get_uri("/u"),
        interface.cached_get_uri("/u")
    );
    a.unwrap();
    b.unwrap();
    assert_eq!(transport.get_count("/u"), 1);
}
