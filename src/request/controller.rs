use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use metrics::{counter, histogram};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tokio::sync::{watch, Mutex};

use super::error::FetchError;

pub type FetchFuture<T> = BoxFuture<'static, Result<T, FetchError>>;

type Operation<A, T> = Arc<dyn Fn(A) -> FetchFuture<T> + Send + Sync>;

/// Pipeline phase derived from a `RequestState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Whether data from the previous cycle stays visible while a call is in
/// flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingPolicy {
    #[default]
    RetainData,
    ClearData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> RequestState<T> {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.data.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}

/// Result handed back to the caller of `execute`.
///
/// Serializes as `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            Outcome::Success(data) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
            }
            Outcome::Failure(error) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

/// Wraps an async operation in an idle/loading/success/error state record.
///
/// Overlapping calls are allowed. Every call takes a generation number and
/// only the most recently *started* generation may write its result into the
/// state; anything older is handed back to its caller and otherwise dropped.
/// `reset` also bumps the generation, so a call still in flight when the
/// controller is reset can never bring its data back.
pub struct RequestController<A, T> {
    op: Operation<A, T>,
    policy: LoadingPolicy,
    inner: Arc<Mutex<ControllerInner<T>>>,
    state_rx: watch::Receiver<RequestState<T>>,
}

struct ControllerInner<T> {
    generation: u64,
    state: RequestState<T>,
    state_tx: watch::Sender<RequestState<T>>,
}

impl<T: Clone> ControllerInner<T> {
    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

/// Clears `loading` if an `execute` future is dropped before it settles and
/// its generation is still current.
struct InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<ControllerInner<T>>>,
    generation: u64,
    settled: bool,
}

impl<T> Drop for InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(generation = self.generation, "Request abandoned outside a runtime");
            return;
        };
        let inner = Arc::clone(&self.inner);
        let generation = self.generation;
        runtime.spawn(async move {
            let mut inner = inner.lock().await;
            if inner.generation == generation && inner.state.loading {
                inner.state.loading = false;
                inner.publish();
                tracing::debug!(generation, "Caller dropped in-flight request");
            }
        });
    }
}

impl<A, T> Clone for RequestController<A, T> {
    fn clone(&self) -> Self {
        Self {
            op: Arc::clone(&self.op),
            policy: self.policy,
            inner: Arc::clone(&self.inner),
            state_rx: self.state_rx.clone(),
        }
    }
}

impl<A, T> RequestController<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F>(op: F) -> Self
    where
        F: Fn(A) -> FetchFuture<T> + Send + Sync + 'static,
    {
        Self::with_policy(op, LoadingPolicy::default())
    }

    pub fn with_policy<F>(op: F, policy: LoadingPolicy) -> Self
    where
        F: Fn(A) -> FetchFuture<T> + Send + Sync + 'static,
    {
        let (state_tx, state_rx) = watch::channel(RequestState::default());
        Self {
            op: Arc::new(op),
            policy,
            inner: Arc::new(Mutex::new(ControllerInner {
                generation: 0,
                state: RequestState::default(),
                state_tx,
            })),
            state_rx,
        }
    }

    /// Run the operation once and fold its result into the state if this call
    /// is still the latest one.
    pub async fn execute(&self, args: A) -> Outcome<T> {
        let generation = {
            let mut inner = self.inner.lock().await;
            inner.generation += 1;
            inner.state.loading = true;
            inner.state.error = None;
            if self.policy == LoadingPolicy::ClearData {
                inner.state.data = None;
            }
            inner.publish();
            inner.generation
        };
        let mut in_flight = InFlight {
            inner: Arc::clone(&self.inner),
            generation,
            settled: false,
        };

        counter!("request_executions_total").increment(1);
        tracing::debug!(generation, "Request started");

        let started = Instant::now();
        let result = (self.op)(args).await;
        histogram!("request_duration_seconds").record(started.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(data) => Outcome::Success(data),
            Err(e) => {
                tracing::warn!(generation, error = %e, "Request failed");
                Outcome::Failure(e.user_message())
            }
        };

        let mut inner = self.inner.lock().await;
        in_flight.settled = true;
        if inner.generation != generation {
            counter!("stale_results_discarded").increment(1);
            tracing::debug!(
                generation,
                current = inner.generation,
                "Discarding result from superseded request"
            );
            return outcome;
        }

        inner.state = match &outcome {
            Outcome::Success(data) => RequestState {
                data: Some(data.clone()),
                loading: false,
                error: None,
            },
            Outcome::Failure(error) => {
                counter!("request_failures_total").increment(1);
                RequestState {
                    data: None,
                    loading: false,
                    error: Some(error.clone()),
                }
            }
        };
        inner.publish();

        outcome
    }

    /// Back to idle. Does not cancel an in-flight call; its result will be
    /// discarded when it lands.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.state = RequestState::default();
        inner.publish();
        tracing::debug!(generation = inner.generation, "Request state reset");
    }

    /// Clear a top-level error message without touching anything else.
    pub async fn dismiss_error(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state.error.take().is_some() {
            inner.publish();
        }
    }

    pub async fn state(&self) -> RequestState<T> {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;

    fn echo_controller() -> RequestController<Result<u32, FetchError>, u32> {
        RequestController::new(|result: Result<u32, FetchError>| async move { result }.boxed())
    }

    #[tokio::test]
    async fn test_success_transitions_to_ready() {
        let controller = echo_controller();
        assert_eq!(controller.state().await.phase(), Phase::Idle);

        let outcome = controller.execute(Ok(7)).await;
        assert_eq!(outcome, Outcome::Success(7));

        let state = controller.state().await;
        assert_eq!(state.phase(), Phase::Ready);
        assert_eq!(state.data, Some(7));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_failure_maps_error_message() {
        let controller = echo_controller();
        let outcome = controller
            .execute(Err(FetchError::Network("connection refused".into())))
            .await;

        assert_eq!(
            outcome,
            Outcome::Failure(crate::request::NETWORK_ERROR_MESSAGE.into())
        );
        let state = controller.state().await;
        assert_eq!(state.phase(), Phase::Failed);
        assert!(state.data.is_none());
    }

    #[tokio::test]
    async fn test_retain_and_clear_policies_while_loading() {
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
        let gate = std::sync::Mutex::new(Some(rx));
        let controller = RequestController::with_policy(
            move |first: bool| {
                let rx = if first { None } else { gate.lock().unwrap().take() };
                async move {
                    match rx {
                        Some(rx) => rx.await.map_err(|e| FetchError::Other(e.to_string())),
                        None => Ok(1),
                    }
                }
                .boxed()
            },
            LoadingPolicy::ClearData,
        );

        controller.execute(true).await;
        assert_eq!(controller.state().await.data, Some(1));

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.execute(false).await }
        });
        tokio::task::yield_now().await;
        while !controller.state().await.loading {
            tokio::task::yield_now().await;
        }
        assert!(controller.state().await.data.is_none());

        tx.send(2).unwrap();
        assert_eq!(pending.await.unwrap(), Outcome::Success(2));
        assert_eq!(controller.state().await.data, Some(2));
    }

    #[tokio::test]
    async fn test_dismiss_error_returns_to_idle() {
        let controller = echo_controller();
        controller.execute(Err(FetchError::Other("boom".into()))).await;
        controller.dismiss_error().await;
        assert_eq!(controller.state().await.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_subscribers_see_latest_state() {
        let controller = echo_controller();
        let rx = controller.subscribe();
        controller.execute(Ok(3)).await;
        assert_eq!(rx.borrow().data, Some(3));
    }

    #[test]
    fn test_outcome_serialization() {
        let ok = serde_json::to_value(Outcome::Success(5)).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "data": 5 }));

        let err = serde_json::to_value(Outcome::<u32>::Failure("timeout".into())).unwrap();
        assert_eq!(err, serde_json::json!({ "success": false, "error": "timeout" }));
    }
}
