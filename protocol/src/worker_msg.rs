use serde::{Deserialize, Serialize};

use crate::WorkerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerMsg {
    Join(crate::handshake::JoinReq),
    Done(JobReport),
    Failed(JobFailure),
}

/// Completion report for one job. `elapsed` is the worker's self-measured
/// transform time in seconds, not wall-clock including I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub worker_id: WorkerId,
    pub elapsed: f32,
    pub file_name: String,
}

/// A failure report aborts the whole batch; there is no per-job retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub worker_id: WorkerId,
    pub file_name: String,
    pub error: String,
}
