use ridepath_cache::{EtaCache, FileStore, KeyValueStore, ETA_CACHE_KEY};
use ridepath_core::NewEtaCacheEntry;
use ridepath_test_utils::ManualClock;
use std::sync::Arc;

const NOW_MS: i64 = 1_700_000_000_000;

fn new_entry() -> NewEtaCacheEntry {
    NewEtaCacheEntry {
        start_city_id: 10,
        end_city_id: 20,
        start_city: "Leeds".to_string(),
        end_city: "York".to_string(),
        eta_minutes: 38,
        distance_km: 41.5,
    }
}

#[tokio::test]
async fn entry_survives_new_cache_instance() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::at_millis(NOW_MS));

    let first = EtaCache::new(Arc::new(FileStore::new(dir.path())), clock.clone());
    first.put(new_entry()).await;
    drop(first);

    let second = EtaCache::new(Arc::new(FileStore::new(dir.path())), clock);
    let hit = second.get(10, 20).await.expect("entry persisted on disk");
    assert_eq!(hit.start_city, "Leeds");
    assert_eq!(hit.eta_minutes, 38);
    assert_eq!(hit.timestamp, NOW_MS);
}

#[tokio::test]
async fn stored_json_uses_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()));
    let cache = EtaCache::new(store.clone(), Arc::new(ManualClock::at_millis(NOW_MS)));
    cache.put(new_entry()).await;

    let raw = store.get(ETA_CACHE_KEY).await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["startCityId"], 10);
    assert_eq!(json["distanceKm"], 41.5);
    assert_eq!(json["timestamp"], NOW_MS);
}

#[tokio::test]
async fn truncated_file_is_treated_as_miss_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("route_eta_cache.json"), "{\"startCityId\":10,").unwrap();

    let cache = EtaCache::new(
        Arc::new(FileStore::new(dir.path())),
        Arc::new(ManualClock::at_millis(NOW_MS)),
    );
    assert!(cache.get(10, 20).await.is_none());
    assert!(!dir.path().join("route_eta_cache.json").exists());
}
