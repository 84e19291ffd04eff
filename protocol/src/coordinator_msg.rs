use serde::{Deserialize, Serialize};

use crate::{handshake::JoinAck, JobSpec};

/// Everything the coordinator may say to a worker. One envelope per frame,
/// decoded once and matched on; `Finish` is the only terminal signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CoordinatorMsg {
    Welcome(JoinAck),
    Work(JobSpec),
    Finish,
}
