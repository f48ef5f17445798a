//! Lifecycle bindings between API calls and screens.
//!
//! The UI never awaits a request directly. A [`Query`] or [`Mutation`]
//! spawns the call onto the runtime and the event loop observes settlement
//! by polling on tick, so the interface keeps drawing while requests are in
//! flight.

use std::future::Future;

use anyhow::Result;
use futures_util::FutureExt;
use tokio::task::JoinHandle;

#[derive(Debug)]
pub enum QueryState<T> {
    /// Nothing fetched yet (or the cache was invalidated).
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        QueryState::Idle
    }
}

/// Read binding: fetch-on-demand with an in-flight guard and a cached
/// result that survives until invalidated.
#[derive(Debug)]
pub struct Query<T> {
    state: QueryState<T>,
    task: Option<JoinHandle<Result<T>>>,
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self { state: QueryState::Idle, task: None }
    }
}

impl<T: Send + 'static> Query<T> {
    pub fn new() -> Self {
        Self { state: QueryState::Idle, task: None }
    }

    /// Starts a fetch unless one is already in flight.
    pub fn spawn<F>(&mut self, fut: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if self.task.is_some() {
            return;
        }
        self.state = QueryState::Loading;
        self.task = Some(tokio::spawn(fut));
    }

    /// Non-blocking: moves a settled task's output into the state.
    pub fn poll(&mut self) {
        if !self.task.as_ref().is_some_and(JoinHandle::is_finished) {
            return;
        }
        if let Some(task) = self.task.take() {
            self.state = match task.now_or_never() {
                Some(Ok(Ok(value))) => QueryState::Ready(value),
                Some(Ok(Err(err))) => QueryState::Failed(err.to_string()),
                Some(Err(err)) => QueryState::Failed(format!("task failed: {err}")),
                None => QueryState::Failed("task never settled".to_string()),
            };
        }
    }

    /// Drops the cached value; the next screen entry refetches.
    pub fn invalidate(&mut self) {
        self.abort();
        self.state = QueryState::Idle;
    }

    /// Cancels an in-flight fetch (screen unmount).
    pub fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if matches!(self.state, QueryState::Loading) {
            self.state = QueryState::Idle;
        }
    }

    pub fn state(&self) -> &QueryState<T> {
        &self.state
    }

    pub fn data(&self) -> Option<&T> {
        match &self.state {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Moves a ready value out, leaving the binding idle. Used where the
    /// caller adopts the fetched data into its own state.
    pub fn take_ready(&mut self) -> Option<T> {
        if matches!(self.state, QueryState::Ready(_)) {
            match std::mem::take(&mut self.state) {
                QueryState::Ready(value) => Some(value),
                _ => None,
            }
        } else {
            None
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            QueryState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, QueryState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Loading)
    }
}

/// Write binding: at most one request in flight, settlement observed
/// exactly once so the caller can tell success from failure.
#[derive(Debug)]
pub struct Mutation<T> {
    task: Option<JoinHandle<Result<T>>>,
}

impl<T> Default for Mutation<T> {
    fn default() -> Self {
        Self { task: None }
    }
}

impl<T: Send + 'static> Mutation<T> {
    pub fn new() -> Self {
        Self { task: None }
    }

    /// Returns `false` while a previous request is still pending.
    #[must_use]
    pub fn submit<F>(&mut self, fut: F) -> bool
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if self.task.is_some() {
            return false;
        }
        self.task = Some(tokio::spawn(fut));
        true
    }

    pub fn is_pending(&self) -> bool {
        self.task.is_some()
    }

    /// Yields the settled outcome once; `None` while still pending.
    pub fn poll_settled(&mut self) -> Option<Result<T, String>> {
        if !self.task.as_ref().is_some_and(JoinHandle::is_finished) {
            return None;
        }
        let task = self.task.take()?;
        Some(match task.now_or_never() {
            Some(Ok(Ok(value))) => Ok(value),
            Some(Ok(Err(err))) => Err(err.to_string()),
            Some(Err(err)) => Err(format!("task failed: {err}")),
            None => Err("task never settled".to_string()),
        })
    }

    pub fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    async fn settle_query<T: Send + 'static>(query: &mut Query<T>) {
        for _ in 0..100 {
            query.poll();
            if !query.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("query did not settle");
    }

    #[tokio::test]
    async fn query_moves_from_loading_to_ready() {
        let mut query = Query::new();
        query.spawn(async { Ok(42u32) });
        assert!(query.is_loading());

        settle_query(&mut query).await;
        assert_eq!(query.data(), Some(&42));
    }

    #[tokio::test]
    async fn query_failure_is_observable() {
        let mut query: Query<u32> = Query::new();
        query.spawn(async { Err(anyhow::anyhow!("connection refused")) });

        settle_query(&mut query).await;
        assert_eq!(query.error(), Some("connection refused"));
    }

    #[tokio::test]
    async fn spawn_is_guarded_while_in_flight() {
        let counter = Arc::new(AtomicU32::new(0));
        let mut query = Query::new();

        for _ in 0..3 {
            let counter = Arc::clone(&counter);
            query.spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(())
            });
        }

        settle_query(&mut query).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_returns_to_idle() {
        let mut query = Query::new();
        query.spawn(async { Ok("cached".to_string()) });
        settle_query(&mut query).await;
        assert!(query.data().is_some());

        query.invalidate();
        assert!(query.is_idle());
        assert!(query.data().is_none());
    }

    #[tokio::test]
    async fn take_ready_moves_the_value_out() {
        let mut query = Query::new();
        query.spawn(async { Ok(vec![1, 2, 3]) });
        settle_query(&mut query).await;

        assert_eq!(query.take_ready(), Some(vec![1, 2, 3]));
        assert!(query.is_idle());
        assert_eq!(query.take_ready(), None);
    }

    #[tokio::test]
    async fn abort_cancels_an_inflight_fetch() {
        let touched = Arc::new(AtomicU32::new(0));
        let mut query = Query::new();
        let flag = Arc::clone(&touched);
        query.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        query.abort();
        assert!(query.is_idle());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(touched.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mutation_refuses_a_second_submit_while_pending() {
        let mut mutation = Mutation::new();
        assert!(mutation.submit(async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(())
        }));
        assert!(!mutation.submit(async { Ok(()) }));
        assert!(mutation.is_pending());
    }

    #[tokio::test]
    async fn mutation_settles_exactly_once() {
        let mut mutation = Mutation::new();
        assert!(mutation.submit(async { Ok(7u32) }));

        let mut outcome = None;
        for _ in 0..100 {
            outcome = mutation.poll_settled();
            if outcome.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(outcome, Some(Ok(7)));
        assert!(!mutation.is_pending());
        assert!(mutation.poll_settled().is_none());
    }
}
