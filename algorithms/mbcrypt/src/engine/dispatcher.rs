//! Pool Coordinator
//!
//! Owns a fixed set of execution units and drives one batch at a time:
//! 1. `execute` derives every lane job locally and posts one per unit
//! 2. Replies are fed through `handle_reply` in arrival order
//! 3. When every lane is done the results are combined in lane order
//!
//! Any stale reply, protocol violation or unit fault is terminal: the
//! coordinator moves to `Failed` and must be rebuilt.

use crate::engine::parallel::{check_params, combine_lane_results, LaneJob};
use crate::engine::unit::{ExecutionUnit, StartCommand, ThreadUnit, UnitCommand, UnitReply};
use crate::types::{Digest, MbcryptError, Result, MAX_POOL_UNITS};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::fmt;
use tracing::{debug, info, warn};

/// Progress share kept back for the combine step.
const PROGRESS_SCALE: f64 = 0.99;

/// Smallest progress increase worth forwarding.
const PROGRESS_STEP: f64 = 0.02;

/// Self-test password.
pub const SELFTEST_PASSWORD: &[u8] = b"Super Secret Password";

/// Self-test salt.
pub const SELFTEST_SALT: [u8; 16] = [
    0x71, 0xd7, 0x9f, 0x82, 0x18, 0xa3, 0x92, 0x59, 0xa7, 0xa2, 0x9a, 0xab, 0xb2, 0xdb, 0xaf, 0xc3,
];

/// Self-test cost.
pub const SELFTEST_COST: u32 = 5;

/// Known self-test digests, indexed by `lanes - 1`.
pub const SELFTEST_DIGESTS: [&str; 8] = [
    "4c8e4f9b7267c8b2ff82a8b35881335eefee9aec4ac336531b231097a8e6c4ab",
    "549fad09e5ac86cf33b9048707dfc7c7cf933002116ea0cbca5af37d26936570",
    "b83562e8f0e2d4fd3982959db12a3ddf103abb36677aee45d1178972b4be9113",
    "a11b44ca410502c1ff194ebf45eb52a73d806c0e16ec0a8bd300185e897a7454",
    "8956a7822d0d964b0fd27384d7724edf531bec298dfe55159614c407e95cf7a6",
    "f9783582cfe39424661c8d52d832a88e864d309cb03411b20634d2a74893288f",
    "5ff4fb39192cb7e30dfce3745089727b03325a1f140867e4507ff1216fe16b4b",
    "051649e792038cfd492ac24b33474b4803c8c2ae4f90fe28eab407e7066fcc4a",
];

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Pool construction parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of units, and therefore lanes. Part of the digest.
    pub lanes: usize,
    /// Thread name prefix; unit `i` is named `{thread_name}-{i}`.
    pub thread_name: String,
}

impl PoolConfig {
    /// Config for `lanes` units with the default thread name.
    #[must_use]
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes,
            ..Self::default()
        }
    }

    /// Set the thread name prefix.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Check the lane count against `1..=31`.
    ///
    /// # Errors
    /// [`MbcryptError::InvalidLaneCount`] outside that range.
    pub const fn validate(&self) -> Result<()> {
        if self.lanes == 0 || self.lanes > MAX_POOL_UNITS {
            return Err(MbcryptError::InvalidLaneCount(self.lanes));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            lanes: 4,
            thread_name: "mbcrypt-unit".into(),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Where the coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Ready for `execute`.
    Idle,
    /// A batch is in flight.
    Busy,
    /// A batch failed; terminal.
    Failed,
    /// `shutdown` was called; terminal.
    Shutdown,
}

/// Handle to the result of one `execute` call.
///
/// Resolved by the coordinator; pass it to
/// [`PoolCoordinator::wait`] to drive the batch to completion.
#[derive(Debug)]
pub struct PendingDigest {
    generation: u64,
    result: Receiver<Result<Digest>>,
}

impl PendingDigest {
    /// Generation of the batch this handle belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The outcome, if the batch has settled.
    #[must_use]
    pub fn try_result(&self) -> Option<Result<Digest>> {
        self.result.try_recv().ok()
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Single-flight dispatcher over a fixed set of execution units.
///
/// All state changes happen on the caller's thread in response to
/// [`handle_reply`](Self::handle_reply); no locks are involved.
pub struct PoolCoordinator<U: ExecutionUnit = ThreadUnit> {
    units: Vec<U>,
    replies: Receiver<UnitReply>,
    state: PoolState,
    generation: u64,
    lane_results: Vec<Option<String>>,
    lanes_done: usize,
    last_reported: f64,
    progress: Box<dyn FnMut(f64) + Send>,
    pending: Option<Sender<Result<Digest>>>,
}

impl PoolCoordinator<ThreadUnit> {
    /// Start one thread unit per lane.
    ///
    /// # Errors
    /// Invalid config or a thread that fails to spawn.
    pub fn spawn(config: &PoolConfig) -> Result<Self> {
        config.validate()?;

        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();
        let units = (0..config.lanes)
            .map(|i| ThreadUnit::spawn(i, &config.thread_name, reply_tx.clone()))
            .collect::<Result<Vec<_>>>()?;
        // Units hold the only senders: all of them gone means the channel disconnects
        drop(reply_tx);

        info!(lanes = config.lanes, "spawned mbcrypt pool");
        Self::with_units(units, reply_rx)
    }
}

impl<U: ExecutionUnit> PoolCoordinator<U> {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Coordinate caller-provided units that answer on `replies`.
    ///
    /// # Errors
    /// [`MbcryptError::InvalidLaneCount`] unless there are 1..=31 units.
    pub fn with_units(units: Vec<U>, replies: Receiver<UnitReply>) -> Result<Self> {
        PoolConfig::new(units.len()).validate()?;
        let lanes = units.len();
        Ok(Self {
            units,
            replies,
            state: PoolState::Idle,
            generation: 0,
            lane_results: vec![None; lanes],
            lanes_done: 0,
            last_reported: 0.0,
            progress: Box::new(|_| {}),
            pending: None,
        })
    }

    /// Receive progress in `[0, 1]` during each batch. The final call of a
    /// successful batch is always exactly `1.0`.
    pub fn set_progress_callback(&mut self, callback: impl FnMut(f64) + Send + 'static) {
        self.progress = Box::new(callback);
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Lane count (one lane per unit).
    pub fn lanes(&self) -> usize {
        self.units.len()
    }

    /// Generation of the most recent batch (0 before the first).
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> PoolState {
        self.state
    }

    // =========================================================================
    // BATCH LIFECYCLE
    // =========================================================================

    /// Start a batch and return its pending result.
    ///
    /// Only derived lane inputs are posted to the units. Lane `lanes - 1`
    /// is the one asked for progress.
    ///
    /// # Errors
    /// - [`MbcryptError::Busy`] while a batch is in flight (that batch is untouched)
    /// - [`MbcryptError::PoolFailed`] / [`MbcryptError::PoolShutdown`] in a terminal state
    /// - Validation errors, leaving the coordinator idle
    pub fn execute(&mut self, password: &[u8], salt: &[u8], cost: u32) -> Result<PendingDigest> {
        match self.state {
            PoolState::Idle => {}
            PoolState::Busy => return Err(MbcryptError::Busy(self.generation)),
            PoolState::Failed => return Err(MbcryptError::PoolFailed),
            PoolState::Shutdown => return Err(MbcryptError::PoolShutdown),
        }
        check_params(password, salt, cost)?;

        let lanes = self.lanes();
        let generation = self.generation + 1;
        let jobs = LaneJob::derive_all(lanes, password, salt, cost, generation)?;

        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        self.generation = generation;
        self.lane_results.iter_mut().for_each(|r| *r = None);
        self.lanes_done = 0;
        self.last_reported = 0.0;
        self.pending = Some(result_tx);
        self.state = PoolState::Busy;

        for (unit, job) in self.units.iter().zip(jobs) {
            let report_progress = job.lane_index == lanes - 1;
            if let Err(e) = unit.post(UnitCommand::Start(StartCommand::from_job(job, report_progress)))
            {
                self.fail(e.clone());
                return Err(e);
            }
        }

        debug!(generation, lanes, cost, "dispatched batch");
        Ok(PendingDigest {
            generation,
            result: result_rx,
        })
    }

    /// Feed replies to the coordinator until `pending` settles.
    ///
    /// # Errors
    /// Whatever the batch was rejected with.
    pub fn wait(&mut self, pending: PendingDigest) -> Result<Digest> {
        loop {
            match pending.result.try_recv() {
                Ok(result) => return result,
                Err(TryRecvError::Disconnected) => return Err(MbcryptError::PoolFailed),
                Err(TryRecvError::Empty) => {}
            }

            if self.state != PoolState::Busy || pending.generation != self.generation {
                return Err(MbcryptError::Protocol(format!(
                    "generation {} is not in flight",
                    pending.generation
                )));
            }

            match self.replies.recv() {
                Ok(reply) => self.handle_reply(reply),
                Err(_) => self.fail(MbcryptError::Protocol(
                    "every execution unit disconnected".into(),
                )),
            }
        }
    }

    /// `execute` then `wait`.
    ///
    /// # Errors
    /// As [`execute`](Self::execute) and [`wait`](Self::wait).
    pub fn hash(&mut self, password: &[u8], salt: &[u8], cost: u32) -> Result<Digest> {
        let pending = self.execute(password, salt, cost)?;
        self.wait(pending)
    }

    /// Apply one unit reply.
    ///
    /// Replies after a terminal state are ignored. A reply from another
    /// generation, or any reply while idle, fails the coordinator.
    pub fn handle_reply(&mut self, reply: UnitReply) {
        if matches!(self.state, PoolState::Failed | PoolState::Shutdown) {
            return;
        }

        match reply {
            UnitReply::Fault { lane, message } => {
                warn!(lane, generation = self.generation, %message, "execution unit fault");
                self.fail(MbcryptError::UnitFault { lane, message });
            }
            UnitReply::Progress {
                lane,
                percent,
                generation,
            } => {
                if self.accept(lane, generation) {
                    self.on_progress(percent);
                }
            }
            UnitReply::Done {
                lane,
                hash,
                generation,
            } => {
                if self.accept(lane, generation) {
                    self.on_done(lane, hash);
                }
            }
        }
    }

    /// Validate a reply's generation and lane, failing on mismatch.
    fn accept(&mut self, lane: usize, generation: u64) -> bool {
        if generation != self.generation {
            warn!(
                received = generation,
                expected = self.generation,
                "stale reply"
            );
            self.fail(MbcryptError::StaleGeneration {
                received: generation,
                expected: self.generation,
            });
            return false;
        }
        if self.state != PoolState::Busy {
            self.fail(MbcryptError::Protocol(format!(
                "reply from lane {lane} with no batch in flight"
            )));
            return false;
        }
        if lane >= self.lanes() {
            self.fail(MbcryptError::Protocol(format!(
                "reply from unknown lane {lane}"
            )));
            return false;
        }
        true
    }

    fn on_progress(&mut self, percent: f64) {
        let scaled = percent * PROGRESS_SCALE;
        if scaled - self.last_reported >= PROGRESS_STEP || scaled >= 1.0 {
            (self.progress)(scaled);
            self.last_reported = scaled;
        }
    }

    fn on_done(&mut self, lane: usize, hash: String) {
        if self.lane_results[lane].is_some() {
            self.fail(MbcryptError::Protocol(format!(
                "lane {lane} reported twice"
            )));
            return;
        }
        self.lane_results[lane] = Some(hash);
        self.lanes_done += 1;

        if self.lanes_done == self.lanes() {
            self.on_all_done();
        }
    }

    fn on_all_done(&mut self) {
        let results: Vec<String> = self.lane_results.iter_mut().filter_map(Option::take).collect();

        match combine_lane_results(&results) {
            Ok(digest) => {
                (self.progress)(1.0);
                self.state = PoolState::Idle;
                debug!(generation = self.generation, "batch complete");
                if let Some(tx) = self.pending.take() {
                    let _ = tx.send(Ok(digest));
                }
            }
            Err(e) => {
                warn!(generation = self.generation, error = %e, "combine failed");
                self.fail(e);
            }
        }
    }

    /// Enter `Failed` and reject the pending result. Only the first failure
    /// reaches the caller.
    fn fail(&mut self, error: MbcryptError) {
        if matches!(self.state, PoolState::Failed | PoolState::Shutdown) {
            return;
        }
        self.state = PoolState::Failed;
        if let Some(tx) = self.pending.take() {
            let _ = tx.send(Err(error));
        }
    }

    // =========================================================================
    // SELF-TEST & SHUTDOWN
    // =========================================================================

    /// Hash the self-test vector and compare with the known digest for this
    /// lane count. Lane counts above 8 have no known digest and pass.
    ///
    /// # Errors
    /// [`MbcryptError::SelfTestMismatch`] on a wrong digest, or any batch error.
    pub fn selftest(&mut self) -> Result<()> {
        let digest = self.hash(SELFTEST_PASSWORD, &SELFTEST_SALT, SELFTEST_COST)?;
        let lanes = self.lanes();

        match SELFTEST_DIGESTS.get(lanes - 1) {
            Some(expected) if hex::encode(digest) == *expected => Ok(()),
            Some(_) => {
                warn!(lanes, got = %hex::encode(digest), "self-test mismatch");
                Err(MbcryptError::SelfTestMismatch(lanes))
            }
            None => {
                info!(lanes, "self-test digest unknown for this lane count");
                Ok(())
            }
        }
    }

    /// Tell every unit to stop and refuse further work. Safe to call at any
    /// time and more than once; lanes already running are not interrupted.
    pub fn shutdown(&mut self) {
        if self.state == PoolState::Shutdown {
            return;
        }
        self.state = PoolState::Shutdown;
        if let Some(tx) = self.pending.take() {
            let _ = tx.send(Err(MbcryptError::PoolShutdown));
        }
        for unit in &self.units {
            let _ = unit.post(UnitCommand::Shutdown);
        }
        info!(lanes = self.units.len(), "mbcrypt pool shut down");
    }
}

impl<U: ExecutionUnit> Drop for PoolCoordinator<U> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<U: ExecutionUnit> fmt::Debug for PoolCoordinator<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolCoordinator")
            .field("lanes", &self.units.len())
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("lanes_done", &self.lanes_done)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
