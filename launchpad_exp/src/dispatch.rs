use crate::config::{FailurePolicy, WaitPolicy};
use crate::machine::Transport;
use crate::progress::TracingProgressBar;
use crate::request::RemoteRequest;
use launchpad::NodeIndex;
use std::sync::Arc;
use thiserror::Error;
use tracing_futures::Instrument;

/// A node whose remote session couldn't be established or exited with an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node {node} ({address}): {reason}")]
pub struct DispatchError {
    pub node: NodeIndex,
    pub address: String,
    pub reason: String,
}

/// Outcome of dispatching a list of requests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    attempted: Vec<NodeIndex>,
    failures: Vec<DispatchError>,
}

impl DispatchSummary {
    /// Nodes for which a session was attempted, in dispatch order.
    pub fn attempted(&self) -> &[NodeIndex] {
        &self.attempted
    }

    pub fn failures(&self) -> &[DispatchError] {
        &self.failures
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, node: NodeIndex, result: Result<(), DispatchError>) {
        self.attempted.push(node);
        if let Err(e) = result {
            self.failures.push(e);
        }
    }
}

pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    wait: WaitPolicy,
    failure: FailurePolicy,
    progress: TracingProgressBar,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        wait: WaitPolicy,
        failure: FailurePolicy,
    ) -> Self {
        Self {
            transport,
            wait,
            failure,
            progress: TracingProgressBar::hidden(),
        }
    }

    /// Reports every completed dispatch to `progress`.
    pub fn set_progress(&mut self, progress: TracingProgressBar) {
        self.progress = progress;
    }

    /// Runs a single request and waits for it to exit.
    pub async fn dispatch(
        &self,
        request: &RemoteRequest,
    ) -> Result<(), DispatchError> {
        exec(self.transport.as_ref(), request).await
    }

    /// Runs every request according to the wait and failure policies.
    /// - sequential: one at a time, in order; with `FailurePolicy::Abort`,
    ///   the first failure stops the remaining requests
    /// - parallel: every request is started right away; all of them are
    ///   attempted regardless of the failure policy
    pub async fn dispatch_all(
        &self,
        requests: Vec<RemoteRequest>,
    ) -> DispatchSummary {
        match self.wait {
            WaitPolicy::Sequential => self.sequential(requests).await,
            WaitPolicy::Parallel => self.parallel(requests).await,
        }
    }

    async fn sequential(
        &self,
        requests: Vec<RemoteRequest>,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for request in requests {
            let span = tracing::info_span!("dispatch", node = request.node());
            let result = self.dispatch(&request).instrument(span).await;
            let failed = result.is_err();
            self.completed(&request, &result);
            summary.record(request.node(), result);

            if failed && self.failure.is_abort() {
                tracing::warn!(
                    "aborting: node {} failed, skipping the remaining nodes",
                    request.node()
                );
                break;
            }
        }
        summary
    }

    async fn parallel(&self, requests: Vec<RemoteRequest>) -> DispatchSummary {
        // start every session
        let (requests, handles): (Vec<_>, Vec<_>) = requests
            .into_iter()
            .map(|request| {
                let transport = Arc::clone(&self.transport);
                let span =
                    tracing::info_span!("dispatch", node = request.node());
                let task = request.clone();
                let handle = tokio::spawn(
                    async move { exec(transport.as_ref(), &task).await }
                        .instrument(span),
                );
                (request, handle)
            })
            .unzip();

        // and wait for all of them
        let mut summary = DispatchSummary::default();
        let results = futures::future::join_all(handles).await;
        for (request, joined) in requests.iter().zip(results) {
            let result = joined.unwrap_or_else(|e| {
                Err(DispatchError {
                    node: request.node(),
                    address: request.address().to_string(),
                    reason: format!("dispatch task failed: {}", e),
                })
            });
            self.completed(request, &result);
            summary.record(request.node(), result);
        }
        summary
    }

    fn completed(
        &self,
        request: &RemoteRequest,
        result: &Result<(), DispatchError>,
    ) {
        match result {
            Ok(()) => tracing::info!(
                "node {} done ({})",
                request.node(),
                request.address()
            ),
            Err(e) if self.failure.is_abort() => tracing::error!("{}", e),
            Err(e) => tracing::warn!("{}; continuing", e),
        }
        self.progress.inc();
    }
}

async fn exec(
    transport: &dyn Transport,
    request: &RemoteRequest,
) -> Result<(), DispatchError> {
    tracing::debug!("{}", request);
    transport.exec(request).await.map_err(|e| DispatchError {
        node: request.node(),
        address: request.address().to_string(),
        reason: format!("{:#}", e),
    })
}
