//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio::time::Instant;

use crate::api::{ApiRequest, AttemptError, Dispatch, DispatchFuture, RawResponse};

/// Scripted dispatcher that returns pre-seeded outcomes in FIFO order.
///
/// Every request is recorded together with the (tokio) instant it was
/// dispatched, so tests running on paused time can assert on backoff and
/// polling cadence.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDispatcher {
    outcomes: Arc<Mutex<VecDeque<Result<RawResponse, AttemptError>>>>,
    requests: Arc<Mutex<Vec<DispatchRecord>>>,
}

/// A single request seen by [`ScriptedDispatcher`].
#[derive(Clone, Debug)]
pub struct DispatchRecord {
    /// The request as handed to the dispatcher.
    pub request: ApiRequest,
    /// When the request was dispatched.
    pub at: Instant,
}

impl ScriptedDispatcher {
    /// Creates a dispatcher with no queued outcomes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, outcome: Result<RawResponse, AttemptError>) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    /// Queues a response with a text body.
    pub fn push_response(&self, status: u16, text: impl Into<String>) {
        self.push(Ok(RawResponse {
            status,
            text: text.into(),
        }));
    }

    /// Queues a response with a JSON body.
    pub fn push_json(&self, status: u16, body: &Value) {
        self.push_response(status, body.to_string());
    }

    /// Queues an execution status response.
    pub fn push_status(&self, execution_id: &str, status: &str) {
        self.push_json(
            200,
            &serde_json::json!({"id": execution_id, "status": status}),
        );
    }

    /// Queues a failed attempt.
    pub fn push_failure(&self, error: AttemptError) {
        self.push(Err(error));
    }

    /// Returns a snapshot of every request dispatched so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.records()
            .into_iter()
            .map(|record| record.request)
            .collect()
    }

    /// Returns a snapshot of every dispatch with its timestamp.
    #[must_use]
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests dispatched so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of queued outcomes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Dispatch for ScriptedDispatcher {
    fn dispatch<'a>(&'a self, request: &'a ApiRequest) -> DispatchFuture<'a> {
        Box::pin(async move {
            self.requests
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(DispatchRecord {
                    request: request.clone(),
                    at: Instant::now(),
                });
            self.outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| {
                    Err(AttemptError::Connect(String::from(
                        "no scripted response available",
                    )))
                })
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
