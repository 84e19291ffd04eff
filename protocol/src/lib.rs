use std::path::PathBuf;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

pub mod codec;
pub mod coordinator_msg;
pub mod handshake;
pub mod worker_msg;

pub use coordinator_msg::CoordinatorMsg;
pub use worker_msg::WorkerMsg;

/// Rank of a worker inside the pool, assigned at join time. Rank 0 is the
/// coordinator itself and never appears on the wire.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord, From, Display,
)]
pub struct WorkerId(u32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Log,
    Gamma,
    AdaptiveLog,
}

/// The full operator parameter set. Every dispatch carries all of it; each
/// operator reads only its own pair and ignores the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneParams {
    pub f_stop: f32,
    pub gamma: f32,
    pub q: f32,
    pub k: f32,
    pub b: f32,
    pub ld_max: f32,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            f_stop: 0.0,
            gamma: 0.0,
            q: 0.0,
            k: 0.0,
            b: 1.0,
            ld_max: 0.0,
        }
    }
}

/// One unit of work: a single source file plus the batch-wide settings.
/// Immutable once built; the coordinator's queue owns it until dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub images_path: PathBuf,
    pub dst_path: PathBuf,
    pub file_name: String,
    pub operator: OperatorKind,
    pub params: ToneParams,
    pub block_size: u32,
}

impl JobSpec {
    pub fn src(&self) -> PathBuf {
        self.images_path.join(&self.file_name)
    }
}
