//! The frame-paced control loop that ties everything together.
//!
//! Each step, the loop advances the emulator, requests a decision on every sampling boundary
//! (unless one is already outstanding), applies a decision if one has landed, and saves the state
//! when the snapshot policy says so. The loop never waits on the model; it only checks the
//! inference gate's mailbox.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use derive_more::Display;
use tracing::{debug, error, info, warn};

use crate::action::translate;
use crate::config::PilotConfig;
use crate::emulator::Emulator;
use crate::error::PilotError;
use crate::gate::{Decision, DecisionRequest, InferenceGate, Oracle};
use crate::history::{HistoryEntry, RollingHistory};
use crate::journal::DecisionJournal;
use crate::snapshot::{SaveSlot, SnapshotPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum LoopState {
    Running,
    /// The session is over, but the final snapshot has not been taken yet.
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StopReason {
    /// The emulator reported that the game session ended.
    #[display("session ended")]
    SessionEnded,
    /// The shutdown signal fired (Ctrl-C, by default).
    #[display("interrupted")]
    Interrupted,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub turns: u64,
    pub decisions_applied: u64,
    pub snapshots_written: u64,
    pub stop_reason: StopReason,
}

pub struct DecisionLoop<E> {
    emulator: E,
    gate: InferenceGate,
    history: RollingHistory,
    policy: SnapshotPolicy,
    slot: SaveSlot,
    journal: Option<DecisionJournal>,
    decision_interval: u64,
    frame_scale: usize,
    pace: Duration,
    state: LoopState,
    tick: u64,
    turn: u64,
    decisions_applied: u64,
    snapshots_written: u64,
}

impl<E: Emulator> DecisionLoop<E> {
    /// Sets up a session around an already-constructed emulator and oracle. If there is a save
    /// state at the configured path, it is loaded into the emulator. A save state that fails to
    /// load is logged and the session starts fresh.
    pub fn new(
        config: &PilotConfig,
        emulator: E,
        oracle: Arc<dyn Oracle>,
    ) -> Result<Self, PilotError> {
        config.validate()?;
        let mut pilot = Self {
            emulator,
            gate: InferenceGate::new(oracle, config.inference_timeout()),
            history: RollingHistory::new(config.history_capacity),
            policy: SnapshotPolicy::new(config.snapshot_interval),
            slot: SaveSlot::new(&config.save_state_path),
            journal: config.journal_dir.as_ref().map(DecisionJournal::new),
            decision_interval: config.decision_interval,
            frame_scale: config.frame_scale,
            pace: config.pace(),
            state: LoopState::Running,
            tick: 0,
            turn: 0,
            decisions_applied: 0,
            snapshots_written: 0,
        };
        pilot.restore();
        Ok(pilot)
    }

    fn restore(&mut self) {
        let path = self.slot.path().display().to_string();
        match self.slot.restore(&mut self.emulator) {
            Ok(true) => info!(path = %path, "resumed from save state"),
            Ok(false) => info!(path = %path, "no save state found, starting a new game"),
            Err(err) => {
                warn!(path = %path, "could not load save state, starting a new game: {err}")
            }
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The number of decisions that have been requested so far.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn gate(&self) -> &InferenceGate {
        &self.gate
    }

    pub fn emulator(&self) -> &E {
        &self.emulator
    }

    /// Runs a single step of the loop. Once the emulator reports that the session has ended, this
    /// does nothing and the loop waits for `shutdown`.
    ///
    /// Requests are dispatched onto the current tokio runtime.
    pub fn step(&mut self) -> Result<LoopState, PilotError> {
        if self.state != LoopState::Running {
            return Ok(self.state);
        }
        if !self.emulator.advance()? {
            info!(tick = self.tick, "the emulator has stopped");
            self.state = LoopState::Stopping;
            return Ok(self.state);
        }
        self.tick += 1;

        if self.tick % self.decision_interval == 0 && self.gate.is_idle() {
            self.request_decision()?;
        }
        if let Some(decision) = self.gate.poll_and_clear() {
            self.apply(decision)?;
        }
        if self.policy.is_due(self.tick) {
            self.snapshot("periodic");
            self.policy.record(self.tick);
        }
        Ok(self.state)
    }

    fn request_decision(&mut self) -> Result<(), PilotError> {
        let frame = self.emulator.capture_frame()?.scaled(self.frame_scale);
        let turn = self.turn + 1;
        if let Some(journal) = &self.journal {
            if let Err(err) = journal.record_frame(turn, &frame) {
                warn!(turn, "could not journal frame: {err}");
            }
        }
        let request = DecisionRequest {
            turn,
            tick: self.tick,
            frame,
            history: self.history.render(),
        };
        if self.gate.try_dispatch(request) {
            self.turn = turn;
            info!(tick = self.tick, turn, "requested a decision");
        }
        Ok(())
    }

    fn apply(&mut self, decision: Decision) -> Result<(), PilotError> {
        let Decision {
            turn, text, failed, ..
        } = decision;
        let action = translate(&text);
        match action.button() {
            Some(button) => {
                info!(tick = self.tick, turn, %action, "pressing {button} for reply {text:?}");
                self.emulator.apply_input(button)?;
            }
            None if failed => {
                warn!(tick = self.tick, turn, "no input, the request failed: {text}")
            }
            None => info!(tick = self.tick, turn, "no input for reply {text:?}"),
        }
        if let Some(journal) = &self.journal {
            if let Err(err) = journal.record_decision(turn, &text) {
                warn!(turn, "could not journal decision: {err}");
            }
        }
        self.history.append(HistoryEntry::decision(self.tick, &text));
        self.decisions_applied += 1;
        Ok(())
    }

    /// Saves the emulator's state. Failures are logged and the session carries on.
    fn snapshot(&mut self, reason: &str) {
        match self.slot.persist(&mut self.emulator) {
            Ok(bytes) => {
                self.snapshots_written += 1;
                info!(
                    tick = self.tick,
                    bytes,
                    path = %self.slot.path().display(),
                    "saved state ({reason})"
                );
            }
            Err(err) => warn!(tick = self.tick, "could not save state ({reason}): {err}"),
        }
    }

    /// Takes the final snapshot and releases the emulator. An inference that is still in flight is
    /// abandoned. Calling this more than once does nothing.
    pub fn shutdown(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.state = LoopState::Stopping;
        if !self.gate.is_idle() {
            debug!(turn = self.turn, "abandoning the outstanding decision");
        }
        self.snapshot("shutdown");
        self.emulator.shutdown();
        self.state = LoopState::Stopped;
        info!(tick = self.tick, "emulator stopped");
    }

    /// Runs the loop until the session ends or Ctrl-C is pressed.
    pub async fn run(self) -> Result<RunSummary, PilotError> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("could not listen for Ctrl-C: {err}");
                std::future::pending::<()>().await
            }
        })
        .await
    }

    /// Runs the loop until the session ends, the loop faults, or `interrupt` resolves. In every
    /// case, the shutdown sequence runs before this returns. A fault is returned as an error after
    /// the shutdown.
    pub async fn run_until<F>(mut self, interrupt: F) -> Result<RunSummary, PilotError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);
        info!(tick = self.tick, "decision loop starting");
        let outcome = loop {
            match panic::catch_unwind(AssertUnwindSafe(|| self.step())) {
                Ok(Ok(LoopState::Running)) => {}
                Ok(Ok(_)) => break Ok(StopReason::SessionEnded),
                Ok(Err(err)) => break Err(err),
                Err(payload) => {
                    break Err(PilotError::Panicked {
                        message: panic_message(&*payload),
                    })
                }
            }
            tokio::select! {
                () = &mut interrupt => {
                    info!(tick = self.tick, "interrupted");
                    break Ok(StopReason::Interrupted);
                }
                () = tokio::time::sleep(self.pace) => {}
            }
        };
        if let Err(err) = &outcome {
            error!(tick = self.tick, "decision loop fault: {err}");
        }
        self.shutdown();
        let stop_reason = outcome?;
        Ok(RunSummary {
            ticks: self.tick,
            turns: self.turn,
            decisions_applied: self.decisions_applied,
            snapshots_written: self.snapshots_written,
            stop_reason,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&'static str>() {
        Some(s) => (*s).to_owned(),
        None => match payload.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "Box<Any>".to_owned(),
        },
    }
}
