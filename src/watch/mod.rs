pub mod file;

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::action::{ActionExecutor, Outcome, Policy, Severity};
use crate::page::types::{Extraction, Signature};
use crate::resolve::Resolver;

/// Supplies the current page snapshot as HTML.
pub trait DocumentSource: Send + Sync {
    fn snapshot(&self) -> Result<String>;
}

/// Kind of change reported by a mutation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Structure,
    Attributes,
}

/// Source of page change notifications.
pub trait MutationSource: Send + Sync {
    fn subscribe(&self) -> Result<Subscription>;
}

/// Live subscription. Cancelling (or dropping) it unsubscribes.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<Mutation>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        events: mpsc::UnboundedReceiver<Mutation>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            cancel: Some(Box::new(cancel)),
        }
    }

    async fn next(&mut self) -> Option<Mutation> {
        self.events.recv().await
    }

    /// Swallow whatever queued up; returns how many.
    fn drain(&mut self) -> usize {
        let mut drained = 0;
        while self.events.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }

    pub fn cancel(mut self) {
        self.unsubscribe();
    }

    fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
        self.events.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Watching,
    Checking,
    Resolving,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopTiming {
    /// Quiet period that folds a burst of mutations into one check.
    pub debounce: Duration,
    /// Wait after spotting a new question so every option has rendered.
    pub settle_delay: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub questions_seen: u64,
    pub resolutions: u64,
    pub selections: u64,
}

/// Watches the page and resolves each distinct question once.
pub struct ChangeDetector {
    document: Arc<dyn DocumentSource>,
    mutations: Arc<dyn MutationSource>,
    resolver: Arc<Resolver>,
    executor: ActionExecutor,
    policy: Policy,
    timing: LoopTiming,
    continuous: bool,
    state: watch::Sender<LoopState>,
    last_signature: Option<Signature>,
    summary: WatchSummary,
}

/// Control handle for a running detector. Dropping it detaches the loop.
pub struct WatchHandle {
    stop: watch::Sender<bool>,
    state: watch::Receiver<LoopState>,
    task: JoinHandle<WatchSummary>,
}

impl WatchHandle {
    /// Request a stop. Safe at any point, including mid-resolution; a result
    /// that lands after this is discarded.
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    /// Where the loop currently is.
    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Wait for the loop to end.
    pub async fn join(&mut self) -> Result<WatchSummary> {
        (&mut self.task).await.context("watch loop task failed")
    }
}

impl ChangeDetector {
    pub fn new(
        document: Arc<dyn DocumentSource>,
        mutations: Arc<dyn MutationSource>,
        resolver: Arc<Resolver>,
        executor: ActionExecutor,
        policy: Policy,
        timing: LoopTiming,
        continuous: bool,
    ) -> Self {
        Self {
            document,
            mutations,
            resolver,
            executor,
            policy,
            timing,
            continuous,
            state: watch::channel(LoopState::Idle).0,
            last_signature: None,
            summary: WatchSummary::default(),
        }
    }

    fn set_state(&self, state: LoopState) {
        self.state.send_replace(state);
    }

    /// Subscribe and run the loop on a task.
    pub fn start(self) -> Result<WatchHandle> {
        let subscription = self
            .mutations
            .subscribe()
            .context("Failed to subscribe to page mutations")?;
        let (stop_tx, stop_rx) = watch::channel(false);
        self.set_state(LoopState::Watching);
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(subscription, stop_rx));
        Ok(WatchHandle {
            stop: stop_tx,
            state,
            task,
        })
    }

    async fn run(mut self, mut subscription: Subscription, mut stop: watch::Receiver<bool>) -> WatchSummary {
        info!(
            continuous = self.continuous,
            auto_act = self.policy.auto_act,
            threshold = self.policy.threshold,
            "watching for questions"
        );

        // The page may already show a question.
        let mut flow = self.check(&mut stop).await;

        while flow.is_continue() {
            tokio::select! {
                _ = stop_requested(&mut stop) => break,
                event = subscription.next() => {
                    let Some(kind) = event else {
                        info!("mutation source closed");
                        break;
                    };
                    if !sleep_unless_stopped(self.timing.debounce, &mut stop).await {
                        break;
                    }
                    let folded = subscription.drain();
                    debug!(?kind, folded, "page changed");
                    flow = self.check(&mut stop).await;
                }
            }
        }

        self.set_state(LoopState::Stopped);
        subscription.cancel();
        info!(
            questions = self.summary.questions_seen,
            resolutions = self.summary.resolutions,
            selections = self.summary.selections,
            "watch loop stopped"
        );
        self.summary
    }

    /// Re-extract and resolve if a new question is showing.
    async fn check(&mut self, stop: &mut watch::Receiver<bool>) -> ControlFlow<()> {
        self.set_state(LoopState::Checking);

        let Some(first) = self.read_question() else {
            self.set_state(LoopState::Watching);
            return ControlFlow::Continue(());
        };
        if self.is_last(&first) {
            debug!("question unchanged, skipping");
            self.set_state(LoopState::Watching);
            return ControlFlow::Continue(());
        }

        if !sleep_unless_stopped(self.timing.settle_delay, stop).await {
            return ControlFlow::Break(());
        }

        // Read again once options have had time to render.
        let Some(settled) = self.read_question() else {
            self.set_state(LoopState::Watching);
            return ControlFlow::Continue(());
        };
        if self.is_last(&settled) {
            self.set_state(LoopState::Watching);
            return ControlFlow::Continue(());
        }
        let Some(question) = settled.question else {
            self.set_state(LoopState::Watching);
            return ControlFlow::Continue(());
        };
        if settled.answers.is_empty() {
            // Not recorded: a later mutation retries this question.
            debug!(question = %question.text, "no answer options yet");
            self.set_state(LoopState::Watching);
            return ControlFlow::Continue(());
        }

        self.last_signature = Some(question.signature.clone());
        self.summary.questions_seen += 1;
        info!(
            number = self.summary.questions_seen,
            question = %question.text,
            options = settled.answers.len(),
            detected_at = %question.detected_at.to_rfc3339(),
            "new question"
        );

        self.set_state(LoopState::Resolving);
        let result = self.resolver.resolve(&question, &settled.answers).await;
        self.summary.resolutions += 1;

        if *stop.borrow() {
            info!(question = %question.text, "stopped during resolution, result discarded");
            return ControlFlow::Break(());
        }

        let outcome = tokio::select! {
            outcome = self.executor.act(&result, self.policy) => outcome,
            _ = stop_requested(stop) => {
                info!("stopped before acting, result discarded");
                return ControlFlow::Break(());
            }
        };
        debug!(?outcome, "action complete");
        if matches!(outcome, Outcome::Selected { .. }) {
            self.summary.selections += 1;
        }

        self.set_state(LoopState::Watching);
        if self.continuous {
            ControlFlow::Continue(())
        } else {
            info!("single-shot mode, done");
            ControlFlow::Break(())
        }
    }

    /// Snapshot and probe. `None` when there is no question on the page.
    fn read_question(&self) -> Option<Extraction> {
        let html = match self.document.snapshot() {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "snapshot failed");
                self.executor
                    .reporter()
                    .report(&format!("Could not read the page: {:#}", e), Severity::Error);
                return None;
            }
        };
        let extraction = crate::page::probe(&html);
        if extraction.question.is_none() {
            debug!("no question on page");
            return None;
        }
        Some(extraction)
    }

    fn is_last(&self, extraction: &Extraction) -> bool {
        match (&extraction.question, &self.last_signature) {
            (Some(q), Some(last)) => q.signature == *last,
            _ => false,
        }
    }
}

/// Resolves once a stop has been requested. A dropped handle never resolves.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let detached = stop.wait_for(|stopped| *stopped).await.is_err();
    if detached {
        std::future::pending::<()>().await;
    }
}

/// Sleep for `duration`; `false` if a stop arrived first.
async fn sleep_unless_stopped(duration: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = stop_requested(stop) => false,
    }
}
