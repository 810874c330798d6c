#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use pilot::{
    BoxError, Button, DecisionLoop, DecisionRequest, Emulator, EmulatorError, Frame, Oracle,
    OracleFuture, PilotConfig, SCREEN_HEIGHT,
};
use tokio::sync::Semaphore;

/// Everything a `ScriptedEmulator` was asked to do. Shared between clones so that tests can look
/// at it after the decision loop has consumed the emulator.
#[derive(Debug, Default)]
pub struct EmulatorLog {
    pub ticks: u64,
    /// Each press, with the tick it happened on.
    pub pressed: Vec<(u64, Button)>,
    /// The tick of every save state that was handed out.
    pub saves: Vec<u64>,
    pub loaded: Option<Vec<u8>>,
    pub frames_captured: u64,
    pub shutdowns: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedEmulator {
    pub log: Arc<Mutex<EmulatorLog>>,
    /// The session ends once this many ticks have run.
    pub limit: Option<u64>,
    /// `advance` errors on this tick.
    pub fail_at: Option<u64>,
    /// `advance` panics on this tick.
    pub panic_at: Option<u64>,
    pub fail_saves: bool,
    pub fail_loads: bool,
    /// `capture_frame` hands back a screen with no columns.
    pub empty_frames: bool,
}

impl ScriptedEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ending_after(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn log(&self) -> MutexGuard<'_, EmulatorLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Emulator for ScriptedEmulator {
    fn advance(&mut self) -> Result<bool, EmulatorError> {
        let mut log = self.log();
        if self.limit.is_some_and(|limit| log.ticks >= limit) {
            return Ok(false);
        }
        log.ticks += 1;
        let tick = log.ticks;
        drop(log);
        if self.fail_at == Some(tick) {
            return Err(EmulatorError::new("the cartridge fell out"));
        }
        if self.panic_at == Some(tick) {
            panic!("the emulator exploded on tick {tick}");
        }
        Ok(true)
    }

    fn capture_frame(&mut self) -> Result<Frame, EmulatorError> {
        self.log().frames_captured += 1;
        if self.empty_frames {
            return Frame::from_rgba(0, SCREEN_HEIGHT, Vec::new()).map_err(EmulatorError::from);
        }
        Ok(blank_frame())
    }

    fn apply_input(&mut self, button: Button) -> Result<(), EmulatorError> {
        let mut log = self.log();
        let tick = log.ticks;
        log.pressed.push((tick, button));
        Ok(())
    }

    fn save_state(&mut self) -> Result<Vec<u8>, EmulatorError> {
        if self.fail_saves {
            return Err(EmulatorError::new("the battery is dead"));
        }
        let mut log = self.log();
        let tick = log.ticks;
        log.saves.push(tick);
        Ok(tick.to_le_bytes().to_vec())
    }

    fn load_state(&mut self, state: &[u8]) -> Result<(), EmulatorError> {
        if self.fail_loads {
            return Err(EmulatorError::new("corrupt save state"));
        }
        self.log().loaded = Some(state.to_vec());
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log().shutdowns += 1;
    }
}

pub fn blank_frame() -> Frame {
    Frame::from_rgba(2, 2, vec![0; 16]).unwrap()
}

pub fn request(turn: u64) -> DecisionRequest {
    DecisionRequest {
        turn,
        tick: 300 * turn,
        frame: blank_frame(),
        history: String::new(),
    }
}

/// A config that saves into the given directory and does not pause between ticks.
pub fn config(dir: &Path) -> PilotConfig {
    PilotConfig {
        save_state_path: dir.join("saves").join("game.state"),
        pace_ms: 0,
        ..PilotConfig::default()
    }
}

/// Answers immediately with the same reply every time.
pub struct Reply(pub &'static str);

impl Oracle for Reply {
    fn infer<'a>(&'a self, _frame: &'a Frame, _history: &'a str) -> OracleFuture<'a> {
        Box::pin(async move { Ok(self.0.to_owned()) })
    }
}

/// Holds every request until the test releases it. Records the history text of each request.
pub struct HeldOracle {
    reply: String,
    permits: Semaphore,
    histories: Mutex<Vec<String>>,
}

impl HeldOracle {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_owned(),
            permits: Semaphore::new(0),
            histories: Mutex::new(Vec::new()),
        })
    }

    /// Lets one request (current or future) through.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }

    pub fn histories(&self) -> Vec<String> {
        self.histories.lock().unwrap().clone()
    }
}

impl Oracle for HeldOracle {
    fn infer<'a>(&'a self, _frame: &'a Frame, history: &'a str) -> OracleFuture<'a> {
        Box::pin(async move {
            self.histories.lock().unwrap().push(history.to_owned());
            self.permits.acquire().await?.forget();
            Ok::<_, BoxError>(self.reply.clone())
        })
    }
}

pub struct Failing;

impl Oracle for Failing {
    fn infer<'a>(&'a self, _frame: &'a Frame, _history: &'a str) -> OracleFuture<'a> {
        Box::pin(async move { Err(BoxError::from("the model is overloaded")) })
    }
}

pub struct Panicking;

impl Oracle for Panicking {
    fn infer<'a>(&'a self, _frame: &'a Frame, _history: &'a str) -> OracleFuture<'a> {
        Box::pin(explode())
    }
}

async fn explode() -> Result<String, BoxError> {
    panic!("the model exploded")
}

/// Never answers.
pub struct Silent;

impl Oracle for Silent {
    fn infer<'a>(&'a self, _frame: &'a Frame, _history: &'a str) -> OracleFuture<'a> {
        Box::pin(std::future::pending::<Result<String, BoxError>>())
    }
}

/// Polls the condition until it holds, giving spawned tasks a chance to run in between.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("timed out waiting for condition")
}

/// Steps the loop until the condition holds.
pub async fn step_until<E: Emulator>(
    pilot: &mut DecisionLoop<E>,
    mut done: impl FnMut(&DecisionLoop<E>) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done(pilot) {
            pilot.step().unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("timed out stepping the loop")
}

/// Starts a loop around a clone of the emulator, so the caller can keep inspecting its log.
pub fn start(
    config: &PilotConfig,
    emulator: &ScriptedEmulator,
    oracle: Arc<dyn Oracle>,
) -> DecisionLoop<ScriptedEmulator> {
    DecisionLoop::new(config, emulator.clone(), oracle).unwrap()
}
