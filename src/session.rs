//! Async driver connecting the search controller to a [`NewsApi`].
//!
//! The controller decides *what* to request; the [`Session`] decides *when*
//! requests run, according to the configured [`OverlapPolicy`]:
//!
//! | Policy | New submission while a request is in flight |
//! |--------|---------------------------------------------|
//! | `LatestWins` | The in-flight request is aborted; the new one starts |
//! | `Queue` | The new request waits until the running one finishes |
//! | `Unordered` | Both run; whichever finishes last wins |
//!
//! Requests run on spawned tasks and report back over an mpsc channel, so
//! the caller stays responsive while waiting. [`Session::next_completion`]
//! is cancel-safe and can sit in a `tokio::select!` next to user input.

use crate::api::NewsApi;
use crate::config::OverlapPolicy;
use crate::controller::{SearchController, SearchState, Ticket};
use crate::error::{FetchError, ValidationError};
use crate::models::DisplayItem;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// A finished request travelling back from its task.
#[derive(Debug)]
struct Completion {
    ticket: Ticket,
    outcome: Result<Vec<DisplayItem>, FetchError>,
}

/// Reports a ticket as interrupted if its task ends without a completion,
/// so a panicking request can never leave the state stuck in `Loading`.
struct CompletionGuard {
    ticket: Option<Ticket>,
    tx: mpsc::UnboundedSender<Completion>,
}

impl CompletionGuard {
    fn complete(mut self, outcome: Result<Vec<DisplayItem>, FetchError>) {
        if let Some(ticket) = self.ticket.take() {
            let _ = self.tx.send(Completion { ticket, outcome });
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            let _ = self.tx.send(Completion {
                ticket,
                outcome: Err(FetchError::Interrupted),
            });
        }
    }
}

/// Owns the controller and every request task started on its behalf.
pub struct Session<A: NewsApi> {
    api: Arc<A>,
    controller: SearchController,
    in_flight: HashMap<u64, JoinHandle<()>>,
    waiting: VecDeque<Ticket>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl<A: NewsApi> Session<A> {
    pub fn new(api: A, policy: OverlapPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api: Arc::new(api),
            controller: SearchController::new(policy),
            in_flight: HashMap::new(),
            waiting: VecDeque::new(),
            tx,
            rx,
        }
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn state(&self) -> &SearchState {
        self.controller.state()
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.controller.set_query(text);
    }

    /// Submit the current query and start (or queue) its request.
    #[instrument(level = "debug", skip(self), fields(query = %self.controller.query()))]
    pub fn submit(&mut self) -> Result<(), ValidationError> {
        let policy = self.controller.policy();
        let result = self.controller.submit();

        if policy == OverlapPolicy::LatestWins {
            self.abort_in_flight();
        }
        let ticket = result?;

        match policy {
            OverlapPolicy::Queue if !self.in_flight.is_empty() => {
                debug!(seq = ticket.seq, queued = self.waiting.len() + 1, "Queued search");
                self.waiting.push_back(ticket);
            }
            _ => self.start(ticket),
        }
        Ok(())
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `true` if the state changed. Pending forever when nothing is
    /// in flight, which is what a `select!` loop wants.
    pub async fn next_completion(&mut self) -> bool {
        let Some(completion) = self.rx.recv().await else {
            return false;
        };
        let seq = completion.ticket.seq;

        if self.in_flight.remove(&seq).is_none() {
            debug!(seq, "Dropping completion from aborted request");
            return false;
        }

        let applied = self.controller.resolve(&completion.ticket, completion.outcome);

        if self.in_flight.is_empty() {
            if let Some(next) = self.waiting.pop_front() {
                self.start(next);
            }
        }
        applied
    }

    /// Drive outstanding requests until the state leaves `Loading`.
    pub async fn settle(&mut self) -> &SearchState {
        while self.controller.is_loading() {
            self.next_completion().await;
        }
        self.controller.state()
    }

    /// Set the query, submit, and wait for the outcome.
    #[instrument(level = "info", skip(self, query))]
    pub async fn search(&mut self, query: impl Into<String>) -> &SearchState {
        self.set_query(query);
        if self.submit().is_err() {
            return self.controller.state();
        }
        self.settle().await
    }

    fn start(&mut self, ticket: Ticket) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let seq = ticket.seq;

        debug!(seq, query = %ticket.query, "Starting request");
        let query = ticket.query.clone();
        let guard = CompletionGuard {
            ticket: Some(ticket),
            tx,
        };
        let handle = tokio::spawn(async move {
            let outcome = api.search(&query).await;
            guard.complete(outcome);
        });
        self.in_flight.insert(seq, handle);
    }

    fn abort_in_flight(&mut self) {
        let superseded: Vec<u64> = self.in_flight.keys().copied().collect();
        for seq in superseded {
            if let Some(handle) = self.in_flight.remove(&seq) {
                handle.abort();
            }
            self.controller.discard(seq);
            info!(seq, "Aborted superseded request");
        }
    }
}

impl<A: NewsApi> Drop for Session<A> {
    fn drop(&mut self) {
        for handle in self.in_flight.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EMPTY_QUERY_MESSAGE, FETCH_FAILED_MESSAGE};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    enum Reply {
        Items(Vec<DisplayItem>),
        Status(u16),
    }

    impl Reply {
        fn into_outcome(self) -> Result<Vec<DisplayItem>, FetchError> {
            match self {
                Reply::Items(items) => Ok(items),
                Reply::Status(code) => Err(FetchError::Status(code)),
            }
        }
    }

    /// In-memory API. Queries with a gate wait until the test releases them;
    /// everything else answers immediately with one item titled after the query.
    #[derive(Default)]
    struct FakeApi {
        calls: Arc<Mutex<Vec<String>>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    }

    impl FakeApi {
        fn gate(&self, query: &str) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(query.to_string(), rx);
            tx
        }
    }

    impl NewsApi for FakeApi {
        async fn search(&self, query: &str) -> Result<Vec<DisplayItem>, FetchError> {
            self.calls.lock().unwrap().push(query.to_string());
            let gate = self.gates.lock().unwrap().remove(query);
            match gate {
                Some(rx) => match rx.await {
                    Ok(reply) => reply.into_outcome(),
                    Err(_) => Err(FetchError::Timeout),
                },
                None => Ok(vec![item(query)]),
            }
        }
    }

    fn item(title: &str) -> DisplayItem {
        DisplayItem {
            title: title.to_string(),
            url: format!("https://news.example/{title}"),
            image: "img".to_string(),
            description: None,
            source_name: None,
            published_at: None,
        }
    }

    async fn let_tasks_run() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_search_calls_api_once_with_query() {
        let api = FakeApi::default();
        let calls = Arc::clone(&api.calls);
        let mut session = Session::new(api, OverlapPolicy::LatestWins);

        let state = session.search("Indonesia").await.clone();

        assert_eq!(state, SearchState::Success(vec![item("Indonesia")]));
        assert_eq!(*calls.lock().unwrap(), vec!["Indonesia".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_query_never_calls_api() {
        let api = FakeApi::default();
        let calls = Arc::clone(&api.calls);
        let mut session = Session::new(api, OverlapPolicy::LatestWins);

        let state = session.search("   ").await.clone();
        let_tasks_run().await;

        assert_eq!(state, SearchState::Failed(EMPTY_QUERY_MESSAGE.to_string()));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loading_spans_submit_to_resolution() {
        let api = FakeApi::default();
        let release = api.gate("Japan");
        let mut session = Session::new(api, OverlapPolicy::LatestWins);

        assert!(!session.is_loading());
        session.set_query("Japan");
        session.submit().unwrap();
        assert!(session.is_loading());

        let_tasks_run().await;
        assert!(session.is_loading());

        let _ = release.send(Reply::Status(503));
        assert!(session.next_completion().await);
        assert!(!session.is_loading());
        assert_eq!(
            session.state(),
            &SearchState::Failed(FETCH_FAILED_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_latest_wins_aborts_superseded_request() {
        let api = FakeApi::default();
        let first = api.gate("first");
        let second = api.gate("second");
        let calls = Arc::clone(&api.calls);
        let mut session = Session::new(api, OverlapPolicy::LatestWins);

        session.set_query("first");
        session.submit().unwrap();
        let_tasks_run().await;
        session.set_query("second");
        session.submit().unwrap();
        let_tasks_run().await;

        let _ = first.send(Reply::Items(vec![item("first")]));
        let _ = second.send(Reply::Items(vec![item("second")]));

        let state = session.settle().await.clone();
        assert_eq!(state, SearchState::Success(vec![item("second")]));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_queue_runs_requests_in_order() {
        let api = FakeApi::default();
        let first = api.gate("first");
        let second = api.gate("second");
        let calls = Arc::clone(&api.calls);
        let mut session = Session::new(api, OverlapPolicy::Queue);

        session.set_query("first");
        session.submit().unwrap();
        session.set_query("second");
        session.submit().unwrap();
        let_tasks_run().await;
        assert_eq!(*calls.lock().unwrap(), vec!["first".to_string()]);

        let _ = first.send(Reply::Items(vec![item("first")]));
        assert!(!session.next_completion().await);
        assert!(session.is_loading());

        let_tasks_run().await;
        assert_eq!(calls.lock().unwrap().len(), 2);

        let _ = second.send(Reply::Items(vec![item("second")]));
        assert!(session.next_completion().await);
        assert_eq!(session.state(), &SearchState::Success(vec![item("second")]));
    }

    #[tokio::test]
    async fn test_unordered_later_arrival_wins() {
        let api = FakeApi::default();
        let first = api.gate("first");
        let second = api.gate("second");
        let mut session = Session::new(api, OverlapPolicy::Unordered);

        session.set_query("first");
        session.submit().unwrap();
        session.set_query("second");
        session.submit().unwrap();
        let_tasks_run().await;

        let _ = second.send(Reply::Items(vec![item("second")]));
        assert!(session.next_completion().await);
        assert_eq!(session.state(), &SearchState::Success(vec![item("second")]));

        let _ = first.send(Reply::Items(vec![item("first")]));
        assert!(session.next_completion().await);
        assert_eq!(session.state(), &SearchState::Success(vec![item("first")]));
    }

    struct PanickingApi;

    impl NewsApi for PanickingApi {
        async fn search(&self, query: &str) -> Result<Vec<DisplayItem>, FetchError> {
            panic!("backend exploded on {query}");
        }
    }

    #[tokio::test]
    async fn test_panicking_request_still_clears_loading() {
        let mut session = Session::new(PanickingApi, OverlapPolicy::LatestWins);

        let state = session.search("Japan").await.clone();
        assert_eq!(state, SearchState::Failed(FETCH_FAILED_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_resubmit_after_failure() {
        let api = FakeApi::default();
        let release = api.gate("Korea");
        let mut session = Session::new(api, OverlapPolicy::LatestWins);

        let _ = release.send(Reply::Status(500));
        assert!(matches!(session.search("Korea").await, SearchState::Failed(_)));

        let state = session.search("Korea").await.clone();
        assert_eq!(state, SearchState::Success(vec![item("Korea")]));
    }
}
