//! A driver's day wired through `DriverServices`

use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use ridepath_cache::MemoryStore;
use ridepath_core::{RideType, RidepathConfig, StopStatus};
use ridepath_driver::{DriverServices, RouteSetupError, TraversalState};
use ridepath_test_utils::{
    city, route_cities_response, stops, FakeChatApi, FakeDriverApi, ManualClock,
};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000;

fn services(api: Arc<FakeDriverApi>) -> DriverServices {
    DriverServices::new(
        api,
        Arc::new(FakeChatApi::new()),
        Arc::new(MemoryStore::new()),
        Arc::new(ManualClock::at_secs(NOW)),
        RidepathConfig::default(),
    )
}

#[tokio::test]
async fn setup_resolve_and_drive() {
    let mut eta = route_cities_response(3, 9, "Leeds", "York");
    eta.eta_minutes = Some(45);
    eta.distance_km = Some(40.5);
    let api = Arc::new(
        FakeDriverApi::new()
            .with_route_cities(route_cities_response(3, 9, "Leeds", "York"))
            .with_eta_response(eta)
            .with_stops(stops(3, NOW + 20 * 60)),
    );
    let services = services(api.clone());

    let form = services.route_setup();
    form.add_city(city(3, "Leeds"));
    let err = form
        .submit(
            RideType::School,
            NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RouteSetupError::Validation(_)));

    form.add_city(city(9, "York"));
    form.submit(
        RideType::School,
        NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(api.saved_routes().len(), 1);

    let resolver = services.resolver();
    let header = resolver.resolve().await.unwrap();
    assert_eq!(header.eta_minutes, Some(45));
    let again = services.resolver().resolve().await.unwrap();
    assert_eq!(again, header);
    assert_eq!(api.eta_calls(), 1);

    let traversal = services.traversal();
    traversal.load(None).await.unwrap();
    let first = traversal.current().unwrap();
    assert_eq!(traversal.stop_eta_label(&first), "20 min");

    while traversal.current().is_some() {
        traversal.mark_current_complete("").await.unwrap();
    }

    match traversal.state() {
        TraversalState::Completed { stops } => {
            assert_eq!(stops.len(), 3);
            assert!(stops.iter().all(|s| s.status == StopStatus::Completed));
        }
        other => panic!("expected completed route, got {other:?}"),
    }
}
