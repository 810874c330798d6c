//! Keeps at most one inference request in flight.
//!
//! The decision loop and the inference worker only share one thing: a [`Mailbox`] with a single
//! slot. The loop claims the slot when it dispatches a request, the worker fills it when the
//! request resolves (successfully or not), and the loop empties it once it has applied the result.
//! While the slot is claimed or full, new sampling opportunities are skipped, not queued.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::frame::Frame;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type OracleFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BoxError>> + Send + 'a>>;

/// Anything that can look at the screen and the recent history and decide what to do next. This
/// will usually be a remote vision model, so calls can take seconds and can fail.
pub trait Oracle: Send + Sync {
    fn infer<'a>(&'a self, frame: &'a Frame, history: &'a str) -> OracleFuture<'a>;
}

/// Everything needed for one inference call. Consumed by that call.
#[derive(Debug, Clone)]
pub struct DecisionRequest {
    /// Requests are numbered from 1.
    pub turn: u64,
    /// The tick the frame was sampled on.
    pub tick: u64,
    pub frame: Frame,
    pub history: String,
}

/// The resolution of one request. Failed requests still produce a decision whose text describes
/// the failure; that text is never a recognized action, so it translates to a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub turn: u64,
    pub tick: u64,
    pub text: String,
    pub failed: bool,
    pub elapsed: Duration,
}

impl Decision {
    fn failure(turn: u64, tick: u64, reason: impl std::fmt::Display, elapsed: Duration) -> Self {
        Self {
            turn,
            tick,
            text: format!("[ERROR] {reason}"),
            failed: true,
            elapsed,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum PendingInference {
    #[default]
    Idle,
    InFlight {
        turn: u64,
    },
    ResultReady(Decision),
}

/// The single slot shared between the loop and the inference worker. The worker only ever
/// delivers into it; the loop is the only one that claims and empties it.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<PendingInference>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PendingInference> {
        // Nothing panics while holding the lock, but a poisoned slot is still a valid slot
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> PendingInference {
        self.lock().clone()
    }

    pub fn is_idle(&self) -> bool {
        matches!(*self.lock(), PendingInference::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(*self.lock(), PendingInference::InFlight { .. })
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), PendingInference::ResultReady(_))
    }

    /// Moves the slot from idle to in-flight. Returns false if the slot was not idle.
    fn claim(&self, turn: u64) -> bool {
        let mut slot = self.lock();
        if !matches!(*slot, PendingInference::Idle) {
            return false;
        }
        *slot = PendingInference::InFlight { turn };
        true
    }

    /// Fills the slot with the result of the in-flight request. Deliveries for any other turn are
    /// dropped.
    fn deliver(&self, decision: Decision) -> bool {
        let mut slot = self.lock();
        match *slot {
            PendingInference::InFlight { turn } if turn == decision.turn => {
                *slot = PendingInference::ResultReady(decision);
                true
            }
            _ => false,
        }
    }

    /// Empties the slot if it holds a result.
    fn take(&self) -> Option<Decision> {
        let mut slot = self.lock();
        match std::mem::take(&mut *slot) {
            PendingInference::ResultReady(decision) => Some(decision),
            other => {
                *slot = other;
                None
            }
        }
    }
}

/// Dispatches requests to an [`Oracle`], one at a time.
///
/// Dispatching spawns a task onto the current tokio runtime, so `try_dispatch` must be called from
/// within one.
pub struct InferenceGate {
    oracle: Arc<dyn Oracle>,
    mailbox: Arc<Mailbox>,
    timeout: Option<Duration>,
    dispatched: u64,
    consumed: u64,
}

impl InferenceGate {
    /// Creates an idle gate. Without a timeout, an oracle that never answers blocks all future
    /// dispatches.
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Option<Duration>) -> Self {
        Self {
            oracle,
            mailbox: Arc::new(Mailbox::new()),
            timeout,
            dispatched: 0,
            consumed: 0,
        }
    }

    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    pub fn is_idle(&self) -> bool {
        self.mailbox.is_idle()
    }

    /// Sends the request off to the oracle unless the gate is busy. The gate is busy both while a
    /// request is in flight and while its result is waiting to be consumed.
    pub fn try_dispatch(&mut self, request: DecisionRequest) -> bool {
        if !self.mailbox.claim(request.turn) {
            debug!(turn = request.turn, "inference gate busy, skipping request");
            return false;
        }
        self.dispatched += 1;
        let oracle = Arc::clone(&self.oracle);
        let mailbox = Arc::clone(&self.mailbox);
        let timeout = self.timeout;
        tokio::spawn(async move {
            let decision = consult(oracle, request, timeout).await;
            if !mailbox.deliver(decision) {
                warn!("inference result arrived for a request that is no longer in flight");
            }
        });
        true
    }

    /// Takes the result of the last request if it has arrived, freeing the gate.
    pub fn poll_and_clear(&mut self) -> Option<Decision> {
        let decision = self.mailbox.take()?;
        self.consumed += 1;
        Some(decision)
    }

    /// The number of requests that have been dispatched.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// The number of results that have been handed back through `poll_and_clear`.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Requests that were dispatched but whose results have not been consumed. Always 0 or 1.
    pub fn outstanding(&self) -> u64 {
        self.dispatched - self.consumed
    }
}

/// Runs one request to completion. The oracle call gets its own task so that a panic inside it or
/// a timeout is turned into a failed decision instead of leaving the slot in flight forever.
async fn consult(
    oracle: Arc<dyn Oracle>,
    request: DecisionRequest,
    timeout: Option<Duration>,
) -> Decision {
    let DecisionRequest {
        turn,
        tick,
        frame,
        history,
    } = request;
    let start = Instant::now();
    let mut call = tokio::spawn(async move { oracle.infer(&frame, &history).await });
    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut call).await {
            Ok(joined) => joined,
            Err(_) => {
                call.abort();
                warn!(turn, "inference timed out after {limit:?}");
                let reason = format!("inference timed out after {limit:?}");
                return Decision::failure(turn, tick, reason, start.elapsed());
            }
        },
        None => call.await,
    };
    let elapsed = start.elapsed();
    match joined {
        Ok(Ok(text)) => {
            debug!(turn, elapsed_ms = elapsed.as_millis() as u64, "inference answered");
            Decision {
                turn,
                tick,
                text,
                failed: false,
                elapsed,
            }
        }
        Ok(Err(err)) => {
            warn!(turn, "inference failed: {err}");
            Decision::failure(turn, tick, format!("inference failed: {err}"), elapsed)
        }
        Err(err) => {
            warn!(turn, "inference worker died: {err}");
            Decision::failure(turn, tick, worker_failure(&err), elapsed)
        }
    }
}

fn worker_failure(err: &JoinError) -> &'static str {
    if err.is_panic() {
        "inference worker panicked"
    } else {
        "inference worker was cancelled"
    }
}
