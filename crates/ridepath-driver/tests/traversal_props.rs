use proptest::prelude::*;
use ridepath_core::ApiError;
use ridepath_driver::{RouteTraversal, TraversalError};
use ridepath_test_utils::{stops, FakeDriverApi, ManualClock};
use std::sync::Arc;

const NOW: i64 = 1_700_000_000;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_n_confirmations_complete_n_stops(n in 0usize..24) {
        runtime().block_on(async {
            let api = Arc::new(FakeDriverApi::new().with_stops(stops(n, NOW)));
            let traversal = RouteTraversal::new(api.clone(), Arc::new(ManualClock::at_secs(NOW)));
            traversal.load(None).await.unwrap();

            for _ in 0..n {
                traversal.mark_current_complete("").await.unwrap();
            }

            assert_eq!(traversal.current_index(), n);
            assert!(traversal.current().is_none());
            assert!(traversal.is_completed());
            assert_eq!(api.attendance_calls().len(), n);
        });
    }

    #[test]
    fn prop_cursor_counts_only_confirmed_attendance(
        n in 1usize..12,
        outcomes in proptest::collection::vec(any::<bool>(), 0..40),
    ) {
        runtime().block_on(async {
            let api = Arc::new(FakeDriverApi::new().with_stops(stops(n, NOW)));
            let traversal = RouteTraversal::new(api.clone(), Arc::new(ManualClock::at_secs(NOW)));
            traversal.load(None).await.unwrap();

            let mut confirmed = 0usize;
            for ok in outcomes {
                let before = traversal.current_index();
                if !ok {
                    api.fail_next_attendance(ApiError::Transport("dropped".into()));
                }
                let result = traversal.mark_current_complete("").await;

                if confirmed == n {
                    assert_eq!(result, Err(TraversalError::NoCurrentStop));
                } else if ok {
                    assert!(result.is_ok());
                    confirmed += 1;
                } else {
                    assert!(matches!(result, Err(TraversalError::Attendance(_))));
                }

                assert!(traversal.current_index() >= before);
                assert_eq!(traversal.current_index(), confirmed);
            }
        });
    }
}
