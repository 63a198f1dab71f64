//! Execution Units
//!
//! The message contract between the pool coordinator and the units that run
//! lanes, plus a thread-backed unit. A unit only ever sees derived lane
//! inputs, never the caller's password.

use crate::engine::parallel::{bcrypt_lane, LaneJob};
use crate::types::{MbcryptError, Result, LANE_PASSWORD_LEN, SALT_SIZE};
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};
use zeroize::Zeroizing;

// =============================================================================
// MESSAGES
// =============================================================================

/// Work order for one lane of one batch.
pub struct StartCommand {
    /// Lane to compute.
    pub lane_index: usize,
    /// 64 lowercase hex characters.
    pub lane_hex_password: Zeroizing<String>,
    /// 32 hex characters encoding the 16-byte lane salt.
    pub lane_salt_hex: String,
    /// bcrypt cost.
    pub cost: u32,
    /// Batch tag, echoed in every reply.
    pub generation: u64,
    /// Whether the unit should send `Progress` replies.
    pub report_progress: bool,
}

impl StartCommand {
    /// Wrap a derived job for transmission.
    #[must_use]
    pub fn from_job(job: LaneJob, report_progress: bool) -> Self {
        let LaneJob {
            lane_index,
            lane_hex_password,
            lane_salt,
            cost,
            generation,
        } = job;
        Self {
            lane_index,
            lane_hex_password,
            lane_salt_hex: hex::encode(lane_salt),
            cost,
            generation,
            report_progress,
        }
    }
}

impl fmt::Debug for StartCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartCommand")
            .field("lane_index", &self.lane_index)
            .field("lane_hex_password", &"<redacted>")
            .field("lane_salt_hex", &self.lane_salt_hex)
            .field("cost", &self.cost)
            .field("generation", &self.generation)
            .field("report_progress", &self.report_progress)
            .finish()
    }
}

/// Coordinator to unit.
#[derive(Debug)]
pub enum UnitCommand {
    /// Compute one lane.
    Start(StartCommand),
    /// Stop after the current lane. No reply is sent.
    Shutdown,
}

/// Unit to coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitReply {
    /// Fraction of the lane completed, in `[0, 1]`.
    Progress {
        /// Reporting lane.
        lane: usize,
        /// Unscaled bcrypt progress.
        percent: f64,
        /// Generation from the start command.
        generation: u64,
    },
    /// Lane finished.
    Done {
        /// Finished lane.
        lane: usize,
        /// 31-character lane result.
        hash: String,
        /// Generation from the start command.
        generation: u64,
    },
    /// The unit could not compute its lane.
    Fault {
        /// Failing lane.
        lane: usize,
        /// What went wrong.
        message: String,
    },
}

// =============================================================================
// UNIT TRAIT
// =============================================================================

/// Something that accepts lane commands and answers on the coordinator's
/// reply channel.
///
/// `post` must not block on the lane computation; replies arrive later.
pub trait ExecutionUnit: Send {
    /// Deliver a command.
    ///
    /// # Errors
    /// The unit can no longer receive commands.
    fn post(&self, command: UnitCommand) -> Result<()>;
}

// =============================================================================
// THREAD UNIT
// =============================================================================

/// An OS thread running one lane at a time.
///
/// Dropping the unit closes its mailbox; the thread exits once its current
/// lane (if any) is finished. It is never joined.
pub struct ThreadUnit {
    mailbox: Sender<UnitCommand>,
    _thread: JoinHandle<()>,
}

impl ThreadUnit {
    /// Spawn unit `index`, answering on `replies`.
    ///
    /// # Errors
    /// [`MbcryptError::Spawn`] if the OS refuses the thread.
    pub fn spawn(index: usize, name: &str, replies: Sender<UnitReply>) -> Result<Self> {
        let (mailbox, inbox) = crossbeam_channel::unbounded();
        let thread = thread::Builder::new()
            .name(format!("{name}-{index}"))
            .spawn(move || unit_loop(&inbox, &replies))
            .map_err(|e| MbcryptError::Spawn(e.to_string()))?;

        Ok(Self {
            mailbox,
            _thread: thread,
        })
    }
}

impl ExecutionUnit for ThreadUnit {
    fn post(&self, command: UnitCommand) -> Result<()> {
        self.mailbox
            .send(command)
            .map_err(|_| MbcryptError::Protocol("execution unit mailbox closed".into()))
    }
}

fn unit_loop(inbox: &Receiver<UnitCommand>, replies: &Sender<UnitReply>) {
    for command in inbox {
        match command {
            UnitCommand::Start(start) => {
                let lane = start.lane_index;
                let reply = match panic::catch_unwind(AssertUnwindSafe(|| run_start(&start, replies)))
                {
                    Ok(Ok(hash)) => UnitReply::Done {
                        lane,
                        hash,
                        generation: start.generation,
                    },
                    Ok(Err(e)) => UnitReply::Fault {
                        lane,
                        message: e.to_string(),
                    },
                    Err(_) => UnitReply::Fault {
                        lane,
                        message: "lane computation panicked".into(),
                    },
                };
                if replies.send(reply).is_err() {
                    // Coordinator is gone
                    break;
                }
            }
            UnitCommand::Shutdown => break,
        }
    }
}

/// Validate and run one start command.
fn run_start(start: &StartCommand, replies: &Sender<UnitReply>) -> Result<String> {
    if start.lane_hex_password.len() != LANE_PASSWORD_LEN {
        return Err(MbcryptError::InvalidLanePassword);
    }
    if start.lane_salt_hex.len() != 2 * SALT_SIZE {
        return Err(MbcryptError::InvalidSaltLength(start.lane_salt_hex.len() / 2));
    }
    let salt = hex::decode(&start.lane_salt_hex)
        .map_err(|_| MbcryptError::MalformedEncoding("lane salt is not hex"))?;

    debug!(
        lane = start.lane_index,
        generation = start.generation,
        cost = start.cost,
        "unit started lane"
    );

    let (lane, generation) = (start.lane_index, start.generation);
    let mut report = |percent: f64| {
        let _ = replies.send(UnitReply::Progress {
            lane,
            percent,
            generation,
        });
    };
    let progress: Option<&mut dyn FnMut(f64)> = if start.report_progress {
        Some(&mut report)
    } else {
        None
    };

    let result = bcrypt_lane(&start.lane_hex_password, &salt, start.cost, progress);
    match &result {
        Ok(_) => debug!(lane, generation, "unit finished lane"),
        Err(e) => warn!(lane, generation, error = %e, "unit failed lane"),
    }
    result
}

// =============================================================================
// TESTS
// =============================================================================
