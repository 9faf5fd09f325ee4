//! # Todo Sync Runtime
//!
//! Runtime implementation for the todo-sync architecture.
//!
//! The [`Store`] owns a state value, runs the reducer for every action sent
//! to it, and executes the returned effects. Actions produced by effects are
//! broadcast to observers and fed back into the reducer, so a single `send`
//! drives a whole command → remote call → result event chain.
//!
//! ## Execution model
//!
//! - The reducer runs while holding the state write lock. The lock is
//!   released before any effect is awaited, so concurrent `send` calls
//!   interleave at remote-call boundaries.
//! - Effects are awaited by the caller of `send`. When `send` returns, every
//!   action in its feedback chain has been reduced.
//! - `send` returns the actions the chain produced, in the order they were
//!   reduced. Callers use them to learn the outcome of a command.
//!
//! ## Example
//!
//! ```ignore
//! use todo_sync_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action and inspect what its effects produced
//! let produced = store.send(Action::DoSomething).await;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use futures::future::BoxFuture;
use std::sync::Arc;
use todo_sync_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{broadcast, RwLock};

pub use store::Store;

/// Default capacity of the action broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 16;

/// Store module - the runtime coordinator
pub mod store {
    use super::{broadcast, Arc, BoxFuture, Effect, Reducer, RwLock, DEFAULT_BROADCAST_CAPACITY};

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        /// Every action produced by an effect is sent here before it is
        /// reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// The action broadcast channel buffers
        /// [`DEFAULT_BROADCAST_CAPACITY`] actions per observer.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Create a new Store with custom action broadcast capacity
        ///
        /// Increase the capacity if observers frequently lag.
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock and runs the reducer
        /// 2. Releases the lock
        /// 3. Executes the returned effects in order, awaiting each one
        /// 4. Feeds every produced action back through `send` (recursively)
        ///
        /// # Returns
        ///
        /// All actions produced while processing `action`, depth-first, in the
        /// order they were reduced. The initial action is not included.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates to the caller.
        /// Reducers should be pure functions that do not panic.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Vec<A> {
            metrics::counter!("store.actions.total").increment(1);

            let effects = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            let mut produced = Vec::new();
            for effect in effects {
                produced.extend(self.execute_effect(effect).await);
            }
            produced
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only effect results are broadcast, not the actions passed to
        /// [`Store::send`]. A receiver that falls more than the channel
        /// capacity behind gets `RecvError::Lagged` and skips ahead.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Execute one effect, returning the actions its feedback chain produced
        ///
        /// - `None`: No-op
        /// - `Future`: Awaits the computation, reduces the resulting action if `Some`
        /// - `Sequential`: Executes effects in order, waiting for each to complete
        /// - `Parallel`: Executes effects concurrently; results keep effect order
        fn execute_effect(&self, effect: Effect<A>) -> BoxFuture<'_, Vec<A>> {
            Box::pin(async move {
                match effect {
                    Effect::None => {
                        metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                        Vec::new()
                    },
                    Effect::Future(fut) => {
                        metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                        let Some(action) = fut.await else {
                            tracing::trace!("Effect::Future completed with no action");
                            return Vec::new();
                        };

                        tracing::trace!("Effect::Future produced an action, sending to store");
                        // No receivers is the normal case; nothing to report
                        let _ = self.action_broadcast.send(action.clone());

                        let mut produced = vec![action.clone()];
                        produced.extend(self.send(action).await);
                        produced
                    },
                    Effect::Sequential(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "sequential")
                            .increment(1);

                        let mut produced = Vec::new();
                        for effect in effects {
                            produced.extend(self.execute_effect(effect).await);
                        }
                        produced
                    },
                    Effect::Parallel(effects) => {
                        metrics::counter!("store.effects.executed", "type" => "parallel")
                            .increment(1);

                        let runs = effects.into_iter().map(|effect| self.execute_effect(effect));
                        futures::future::join_all(runs)
                            .await
                            .into_iter()
                            .flatten()
                            .collect()
                    },
                }
            })
        }
    }
}
