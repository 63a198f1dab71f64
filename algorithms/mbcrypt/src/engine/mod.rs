//! Execution Engine
//!
//! Lane protocol, execution units and the pool coordinator.

pub mod dispatcher;
pub mod parallel;
pub mod unit;

pub use dispatcher::{PendingDigest, PoolConfig, PoolCoordinator, PoolState};
pub use parallel::{
    bcrypt_lane, combine_lane_results, hash_lane, hash_parallel, hash_with_single_thread,
    lane_password, lane_salt, LaneJob,
};
pub use unit::{ExecutionUnit, StartCommand, ThreadUnit, UnitCommand, UnitReply};
