//! Mutation state machine

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationState<V, T> {
    pub status: MutationStatus,
    /// Variables of the latest call
    pub variables: Option<V>,
    pub data: Option<T>,
    pub error: Option<Error>,
    /// When the latest call was submitted
    pub submitted_at: Option<DateTime<Utc>>,
    generation: u64,
}

impl<V, T> Default for MutationState<V, T> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            variables: None,
            data: None,
            error: None,
            submitted_at: None,
            generation: 0,
        }
    }
}

impl<V, T> MutationState<V, T> {
    pub fn is_idle(&self) -> bool {
        self.status == MutationStatus::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == MutationStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

type Mutator<V, T> = dyn Fn(V) -> BoxFuture<'static, Result<T>> + Send + Sync;

/// A write operation with observable state
pub struct Mutation<V, T> {
    mutator: Arc<Mutator<V, T>>,
    state: Mutex<MutationState<V, T>>,
}

impl<V, T> Mutation<V, T>
where
    V: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    /// Create a mutation around `mutator`
    pub fn new<F, Fut>(mutator: F) -> Self
    where
        F: Fn(V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            mutator: Arc::new(move |vars| mutator(vars).boxed()),
            state: Mutex::new(MutationState::default()),
        }
    }

    /// Submit `vars`; returns the state once this call settles
    pub async fn mutate(&self, vars: V) -> MutationState<V, T> {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.status = MutationStatus::Loading;
            state.variables = Some(vars.clone());
            state.data = None;
            state.error = None;
            state.submitted_at = Some(Utc::now());
            state.generation
        };

        debug!("Submitting mutation {}", generation);
        let result = (self.mutator)(vars).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!("Discarding superseded mutation result {}", generation);
            return state.clone();
        }

        match result {
            Ok(data) => {
                state.status = MutationStatus::Success;
                state.data = Some(data);
            }
            Err(e) => {
                warn!("Mutation failed: {}", e);
                state.status = MutationStatus::Error;
                state.error = Some(e);
            }
        }
        state.clone()
    }

    /// Back to idle; a call still in flight is discarded when it lands
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let generation = state.generation + 1;
        *state = MutationState {
            generation,
            ..MutationState::default()
        };
    }

    /// Current snapshot
    pub fn state(&self) -> MutationState<V, T> {
        self.state.lock().clone()
    }
}

impl<V, T> std::fmt::Debug for Mutation<V, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("status", &self.state.lock().status)
            .finish_non_exhaustive()
    }
}
