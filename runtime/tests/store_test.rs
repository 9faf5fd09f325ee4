//! Integration tests for Store effect execution and action feedback

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;
use todo_sync_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use todo_sync_runtime::Store;
use tokio::sync::Notify;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Start a chain of `steps` follow-up actions
    Start { steps: u32 },
    /// One link of the chain
    Step { n: u32 },
    /// Emit several actions sequentially
    Fanout,
    /// Emit several actions concurrently
    Concurrent,
    /// Record a value
    Record { value: u32 },
    /// Mark state, then wait on the gate before producing `Released`
    Gated,
    /// Produced once the gate opens
    Released,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    steps: Vec<u32>,
    recorded: Vec<u32>,
    gated: bool,
    released: bool,
}

#[derive(Clone, Default)]
struct TestEnvironment {
    gate: Arc<Notify>,
}

struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Start { steps } => (1..=steps)
                .map(|n| Effect::emit(TestAction::Step { n }))
                .collect(),
            TestAction::Step { n } => {
                state.steps.push(n);
                smallvec![Effect::None]
            }
            TestAction::Fanout => smallvec![Effect::chain(vec![
                Effect::emit(TestAction::Record { value: 1 }),
                Effect::None,
                Effect::emit(TestAction::Record { value: 2 }),
            ])],
            TestAction::Concurrent => smallvec![Effect::merge(vec![
                Effect::Future(Box::pin(async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Some(TestAction::Record { value: 10 })
                })),
                Effect::emit(TestAction::Record { value: 20 }),
            ])],
            TestAction::Record { value } => {
                state.recorded.push(value);
                smallvec![Effect::None]
            }
            TestAction::Gated => {
                state.gated = true;
                let gate = Arc::clone(&env.gate);
                smallvec![Effect::Future(Box::pin(async move {
                    gate.notified().await;
                    Some(TestAction::Released)
                }))]
            }
            TestAction::Released => {
                state.released = true;
                smallvec![Effect::None]
            }
        }
    }
}

fn test_store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment::default())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn send_returns_produced_actions_in_reduction_order() {
    let store = test_store();

    let produced = store.send(TestAction::Start { steps: 2 }).await;

    assert_eq!(
        produced,
        vec![TestAction::Step { n: 1 }, TestAction::Step { n: 2 }]
    );
    assert_eq!(store.state(|s| s.steps.clone()).await, vec![1, 2]);
}

#[tokio::test]
async fn send_without_effects_produces_nothing() {
    let store = test_store();

    let produced = store.send(TestAction::Start { steps: 0 }).await;

    assert!(produced.is_empty());
    assert!(store.state(|s| s.steps.is_empty()).await);
}

#[tokio::test]
async fn sequential_effects_run_in_order() {
    let store = test_store();

    let produced = store.send(TestAction::Fanout).await;

    assert_eq!(produced.len(), 2);
    assert_eq!(store.state(|s| s.recorded.clone()).await, vec![1, 2]);
}

#[tokio::test]
async fn parallel_effects_report_in_effect_order() {
    let store = test_store();

    let produced = store.send(TestAction::Concurrent).await;

    // The slow effect is listed first, so it is reported first...
    assert_eq!(
        produced,
        vec![
            TestAction::Record { value: 10 },
            TestAction::Record { value: 20 }
        ]
    );
    // ...but the fast one was reduced first.
    assert_eq!(store.state(|s| s.recorded.clone()).await, vec![20, 10]);
}

#[tokio::test]
async fn produced_actions_are_broadcast() {
    let store = test_store();
    let mut rx = store.subscribe_actions();

    store.send(TestAction::Fanout).await;

    assert_eq!(rx.recv().await.unwrap(), TestAction::Record { value: 1 });
    assert_eq!(rx.recv().await.unwrap(), TestAction::Record { value: 2 });
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn state_lock_is_released_while_an_effect_is_pending() {
    let env = TestEnvironment::default();
    let gate = Arc::clone(&env.gate);
    let store = Store::new(TestState::default(), TestReducer, env);

    let observer = async {
        // Give the send a chance to reach its pending effect
        tokio::time::sleep(Duration::from_millis(10)).await;
        let (gated, released) = store.state(|s| (s.gated, s.released)).await;
        gate.notify_one();
        (gated, released)
    };

    let (produced, (gated, released)) = tokio::join!(store.send(TestAction::Gated), observer);

    assert!(gated, "reducer state change must be visible mid-flight");
    assert!(!released, "result action must not be applied before the gate opens");
    assert_eq!(produced, vec![TestAction::Released]);
    assert!(store.state(|s| s.released).await);
}

#[test]
fn send_stays_pending_until_its_effect_completes() {
    let env = TestEnvironment::default();
    let gate = Arc::clone(&env.gate);
    let store = Store::new(TestState::default(), TestReducer, env);

    let mut send = tokio_test::task::spawn(store.send(TestAction::Gated));
    tokio_test::assert_pending!(send.poll());

    gate.notify_one();
    assert!(send.is_woken());
    let produced = tokio_test::assert_ready!(send.poll());
    assert_eq!(produced, vec![TestAction::Released]);
}
