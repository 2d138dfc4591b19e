//! Integration tests for Store action broadcasting
//!
//! Actions produced by effects are observable, which is what the HTTP shell
//! relies on to answer a request once a background fetch has landed.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use busdesk_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use busdesk_runtime::{Store, StoreError};
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum LookupAction {
    /// Ask for the seats of a schedule
    Lookup { schedule: u64 },
    /// Lookup finished
    Found { schedule: u64, seats: Vec<u32> },
    /// Request that never produces anything
    Silent,
}

#[derive(Debug, Clone, Default)]
struct LookupState {
    lookups: u32,
    seats: Vec<u32>,
}

#[derive(Clone)]
struct LookupReducer;

impl Reducer for LookupReducer {
    type State = LookupState;
    type Action = LookupAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            LookupAction::Lookup { schedule } => {
                state.lookups += 1;
                smallvec![Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some(LookupAction::Found {
                        schedule,
                        seats: vec![1, 2, 3],
                    })
                })]
            },
            LookupAction::Found { seats, .. } => {
                state.seats = seats;
                smallvec![Effect::None]
            },
            LookupAction::Silent => smallvec![Effect::future(async { None })],
        }
    }
}

fn store() -> Store<LookupState, LookupAction, (), LookupReducer> {
    Store::new(LookupState::default(), LookupReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn subscribers_observe_effect_results() {
    let store = store();
    let mut rx = store.subscribe_actions();

    store.send(LookupAction::Lookup { schedule: 7 }).await.unwrap();

    let observed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("observer timed out")
        .unwrap();
    assert_eq!(
        observed,
        LookupAction::Found {
            schedule: 7,
            seats: vec![1, 2, 3]
        }
    );
}

#[tokio::test]
async fn initial_actions_are_not_broadcast() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(LookupAction::Silent).await.unwrap();
    handle.wait().await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn send_and_wait_for_times_out_without_match() {
    let store = store();
    let result = store
        .send_and_wait_for(
            LookupAction::Silent,
            |a| matches!(a, LookupAction::Found { .. }),
            Duration::from_millis(50),
        )
        .await;
    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn concurrent_lookups_all_settle() {
    let store = store();
    let mut handles = Vec::new();
    for schedule in 0..5 {
        handles.push(store.send(LookupAction::Lookup { schedule }).await.unwrap());
    }
    for handle in &mut handles {
        handle.wait().await;
    }

    let (lookups, seats) = store.state(|s| (s.lookups, s.seats.clone())).await;
    assert_eq!(lookups, 5);
    assert_eq!(seats, vec![1, 2, 3]);
}
