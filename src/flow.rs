//! The guide request flow: captured input, request state and the dispatcher
//! that moves between them.

use log::{error, info, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::client::GuideService;
use crate::model::{GuideQuery, GuideResult};
use crate::GuideError;

/// Message shown to the user for every failed request, whatever the cause.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Unable to fetch tourist guide information. Please check that the guide service is reachable and try again.";

/// Where the flow currently is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Success(GuideResult),
    Failed(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }
}

/// Why a submit did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyQuery,
    Busy,
}

/// What a call to [`GuideFlow::submit`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was sent and the flow settled in `Success`
    Succeeded,
    /// A request was sent and the flow settled in `Failed`
    Failed,
    /// No request was sent and the state is untouched
    Ignored(IgnoreReason),
}

/// Callback invoked with the new state after every transition
pub type Renderer = Box<dyn Fn(&RequestState) + Send + Sync>;

struct Inner {
    input: String,
    state: RequestState,
}

/// State holder for one guide search surface.
///
/// At most one request is in flight per flow: `submit` claims the `Loading`
/// state under the lock before it awaits the service, and every other
/// `submit` made until the response lands is ignored.
///
/// State changes and renderer calls are serialized together, so the renderer
/// always sees states in the order they were set. The renderer may read the
/// flow but must not call `submit` or `dismiss`.
pub struct GuideFlow<S> {
    service: S,
    inner: Mutex<Inner>,
    render: Mutex<()>,
    renderer: Option<Renderer>,
}

impl<S: GuideService> GuideFlow<S> {
    pub fn new(service: S) -> Self {
        GuideFlow {
            service,
            inner: Mutex::new(Inner {
                input: String::new(),
                state: RequestState::Idle,
            }),
            render: Mutex::new(()),
            renderer: None,
        }
    }

    /// Install the single callback that redraws the view on state changes
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&RequestState) + Send + Sync + 'static,
    ) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn state(&self) -> RequestState {
        self.lock().state.clone()
    }

    /// Last text typed into the search input
    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    /// Search for the currently captured input
    pub async fn submit_input(&self) -> SubmitOutcome {
        let input = self.input();
        self.submit(&input).await
    }

    /// Request a guide for `raw`.
    ///
    /// Empty queries and submits made while a request is outstanding are
    /// ignored without touching the state. If the returned future is dropped
    /// before the response lands, the flow moves to `Failed`.
    pub async fn submit(&self, raw: &str) -> SubmitOutcome {
        let query = {
            let _render = self.render_lock();
            let query = {
                let mut inner = self.lock();
                if inner.state.is_loading() {
                    return SubmitOutcome::Ignored(IgnoreReason::Busy);
                }
                let query = match GuideQuery::parse(raw) {
                    Ok(query) => query,
                    Err(_) => return SubmitOutcome::Ignored(IgnoreReason::EmptyQuery),
                };
                inner.input = raw.to_string();
                inner.state = RequestState::Loading;
                query
            };
            self.notify(&RequestState::Loading);
            query
        };
        info!("Requesting guide for {:?}", query.as_str());

        let mut in_flight = InFlight {
            flow: self,
            query: &query,
            settled: false,
        };
        let response = self.service.tourist_guide(&query).await;
        in_flight.settled = true;

        match response {
            Ok(result) => {
                info!("Guide for {:?} received", query.as_str());
                self.transition(RequestState::Success(result));
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                log_failure(&query, &e);
                self.transition(RequestState::Failed(GENERIC_FAILURE_MESSAGE.to_string()));
                SubmitOutcome::Failed
            }
        }
    }

    /// Dismiss a shown error and go back to an empty search.
    ///
    /// Returns whether anything was dismissed.
    pub fn dismiss(&self) -> bool {
        let _render = self.render_lock();
        {
            let mut inner = self.lock();
            if !matches!(inner.state, RequestState::Failed(_)) {
                return false;
            }
            inner.state = RequestState::Idle;
        }
        self.notify(&RequestState::Idle);
        true
    }

    fn transition(&self, next: RequestState) {
        let _render = self.render_lock();
        self.lock().state = next.clone();
        self.notify(&next);
    }

    fn notify(&self, state: &RequestState) {
        if let Some(renderer) = &self.renderer {
            renderer(state);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render_lock(&self) -> MutexGuard<'_, ()> {
        self.render.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the `Loading` claim of a submit whose future is dropped mid-request.
struct InFlight<'a, S: GuideService> {
    flow: &'a GuideFlow<S>,
    query: &'a GuideQuery,
    settled: bool,
}

impl<S: GuideService> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(
            "Guide request for {:?} abandoned before a response arrived",
            self.query.as_str()
        );
        self.flow
            .transition(RequestState::Failed(GENERIC_FAILURE_MESSAGE.to_string()));
    }
}

fn log_failure(query: &GuideQuery, e: &GuideError) {
    match e {
        GuideError::Status { status, body } => {
            error!(
                "Guide request for {:?} rejected with status {}: {}",
                query.as_str(),
                status,
                body
            );
        }
        other => error!("Guide request for {:?} failed: {}", query.as_str(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn paris() -> GuideResult {
        GuideResult {
            place: "Paris".to_string(),
            introduction: "The city of light.".to_string(),
            top_attractions: vec!["Eiffel Tower".to_string()],
            famous_foods: vec!["Croissant".to_string()],
            cultural_highlights: vec!["Louvre".to_string()],
            travel_tips: vec!["Book ahead".to_string()],
        }
    }

    /// Answers every query with a fixed result or a status error, optionally
    /// holding the response until released.
    struct FakeService {
        calls: AtomicUsize,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    impl FakeService {
        fn ok() -> Self {
            FakeService {
                calls: AtomicUsize::new(0),
                fail: false,
                gate: None,
            }
        }

        fn failing() -> Self {
            FakeService {
                fail: true,
                ..FakeService::ok()
            }
        }

        fn gated(gate: Arc<Notify>) -> Self {
            FakeService {
                gate: Some(gate),
                ..FakeService::ok()
            }
        }
    }

    #[async_trait]
    impl GuideService for FakeService {
        async fn tourist_guide(&self, query: &GuideQuery) -> Result<GuideResult, GuideError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(GuideError::Status {
                    status: 503,
                    body: "model overloaded".to_string(),
                });
            }
            Ok(GuideResult {
                place: query.as_str().to_string(),
                ..paris()
            })
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let flow = GuideFlow::new(FakeService::ok());
        assert_eq!(flow.state(), RequestState::Idle);
        assert_eq!(flow.input(), "");
    }

    #[tokio::test]
    async fn test_submit_success() {
        let flow = GuideFlow::new(FakeService::ok());

        let outcome = flow.submit("Paris").await;

        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert_eq!(flow.state(), RequestState::Success(paris()));
        assert_eq!(flow.service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_failure_uses_generic_message() {
        let flow = GuideFlow::new(FakeService::failing());

        let outcome = flow.submit("Paris").await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(
            flow.state(),
            RequestState::Failed(GENERIC_FAILURE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_ignored() {
        let flow = GuideFlow::new(FakeService::ok());

        for raw in ["", "   ", "\t\n"] {
            assert_eq!(
                flow.submit(raw).await,
                SubmitOutcome::Ignored(IgnoreReason::EmptyQuery)
            );
        }

        assert_eq!(flow.state(), RequestState::Idle);
        assert_eq!(flow.service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_query_keeps_previous_result() {
        let flow = GuideFlow::new(FakeService::ok());
        flow.submit("Paris").await;

        flow.submit("  ").await;

        assert_eq!(flow.state(), RequestState::Success(paris()));
        assert_eq!(flow.input(), "Paris");
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_ignored() {
        let gate = Arc::new(Notify::new());
        let flow = Arc::new(GuideFlow::new(FakeService::gated(gate.clone())));

        let first = tokio::spawn({
            let flow = flow.clone();
            async move { flow.submit("Paris").await }
        });
        while !flow.state().is_loading() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            flow.submit("Berlin").await,
            SubmitOutcome::Ignored(IgnoreReason::Busy)
        );
        assert!(flow.state().is_loading());

        gate.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Succeeded);
        assert_eq!(flow.service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(flow.input(), "Paris");
    }

    #[tokio::test]
    async fn test_dismiss_returns_to_idle_and_keeps_input() {
        let flow = GuideFlow::new(FakeService::failing());
        flow.submit("  Atlantis ").await;

        assert!(flow.dismiss());

        assert_eq!(flow.state(), RequestState::Idle);
        assert_eq!(flow.input(), "  Atlantis ");
    }

    #[tokio::test]
    async fn test_dismiss_outside_failure_does_nothing() {
        let flow = GuideFlow::new(FakeService::ok());
        assert!(!flow.dismiss());

        flow.submit("Paris").await;
        assert!(!flow.dismiss());
        assert_eq!(flow.state(), RequestState::Success(paris()));
    }

    #[tokio::test]
    async fn test_renderer_sees_loading_before_result() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let flow = GuideFlow::new(FakeService::ok()).with_renderer({
            let seen = seen.clone();
            move |state: &RequestState| seen.lock().unwrap().push(state.clone())
        });

        flow.submit("Paris").await;
        flow.submit("Paris").await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                RequestState::Loading,
                RequestState::Success(paris()),
                RequestState::Loading,
                RequestState::Success(paris()),
            ]
        );
    }

    #[tokio::test]
    async fn test_resubmit_after_failure_clears_error() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let flow = GuideFlow::new(FakeService::failing()).with_renderer({
            let seen = seen.clone();
            move |state: &RequestState| seen.lock().unwrap().push(state.clone())
        });

        flow.submit("Paris").await;
        flow.submit("Rome").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[2], RequestState::Loading);
        assert_eq!(flow.input(), "Rome");
    }

    #[tokio::test]
    async fn test_submit_input_uses_captured_text() {
        let flow = GuideFlow::new(FakeService::ok());
        flow.set_input(" Kyoto ");

        assert_eq!(flow.submit_input().await, SubmitOutcome::Succeeded);
        match flow.state() {
            RequestState::Success(result) => assert_eq!(result.place, "Kyoto"),
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropped_submit_releases_guard() {
        let gate = Arc::new(Notify::new());
        let flow = GuideFlow::new(FakeService::gated(gate.clone()));

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), flow.submit("Paris")).await;
        assert!(abandoned.is_err());
        assert_eq!(
            flow.state(),
            RequestState::Failed(GENERIC_FAILURE_MESSAGE.to_string())
        );

        gate.notify_one();
        assert_eq!(flow.submit("Rome").await, SubmitOutcome::Succeeded);
        match flow.state() {
            RequestState::Success(result) => assert_eq!(result.place, "Rome"),
            other => panic!("Expected success, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_renderer_order_matches_state_order() {
        let drawing_paris = Arc::new(Notify::new());
        let drawn = Arc::new(Mutex::new(Vec::new()));
        let flow = Arc::new(GuideFlow::new(FakeService::ok()).with_renderer({
            let drawing_paris = drawing_paris.clone();
            let drawn = drawn.clone();
            move |state: &RequestState| {
                if matches!(state, RequestState::Success(r) if r.place == "Paris") {
                    drawing_paris.notify_one();
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                drawn.lock().unwrap().push(state.clone());
            }
        }));

        let first = tokio::spawn({
            let flow = flow.clone();
            async move { flow.submit("Paris").await }
        });
        drawing_paris.notified().await;
        assert_eq!(flow.submit("Rome").await, SubmitOutcome::Succeeded);
        first.await.unwrap();

        let drawn = drawn.lock().unwrap();
        let last = drawn.last().cloned();
        assert_eq!(last, Some(flow.state()));
        match last {
            Some(RequestState::Success(result)) => assert_eq!(result.place, "Rome"),
            other => panic!("Expected Rome drawn last, got {:?}", other),
        }
        assert_eq!(drawn.len(), 4);
        assert_eq!(drawn[2], RequestState::Loading);
    }
}
