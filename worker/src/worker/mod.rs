use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use protocol::{
    codec::WorkerCodec,
    handshake::JoinReq,
    worker_msg::{JobFailure, JobReport},
    CoordinatorMsg, JobSpec, WorkerId, WorkerMsg,
};
use tokio::{net::TcpStream, time};
use tracing::{error, info};
use utils::macros::codec::tokio_util;

pub mod job;
pub mod tonemap;

type Framed = tokio_util::codec::Framed<TcpStream, WorkerCodec>;

/// One worker process: a rank and a channel to the coordinator. Runs jobs
/// strictly one at a time; the loop has nothing else to poll while a job is
/// in flight.
pub struct Worker {
    id: WorkerId,
    conn: Connection,
}

impl Worker {
    /// Connects and joins the pool, blocking until the coordinator assigns a
    /// rank.
    pub async fn join(addr: &str) -> Result<Self> {
        let mut conn = Connection::connect_until_success(addr).await;
        conn.send(WorkerMsg::Join(JoinReq {
            pid: utils::process::get_self_pid(),
        }))
        .await?;

        let id = match conn.next().await.context("await welcome")? {
            CoordinatorMsg::Welcome(ack) => ack.worker_id,
            other => bail!("expected welcome, got {other:?}"),
        };
        info!(rank = %id, "joined pool");
        Ok(Self { id, conn })
    }

    /// The control loop: one envelope decoded per iteration until the
    /// terminal `Finish` arrives.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.conn.next().await? {
                CoordinatorMsg::Work(spec) => self.work(spec).await?,
                CoordinatorMsg::Finish => {
                    info!(rank = %self.id, "finishing up");
                    return Ok(());
                }
                CoordinatorMsg::Welcome(_) => bail!("unexpected welcome after join"),
            }
        }
    }

    async fn work(&mut self, spec: JobSpec) -> Result<()> {
        let file_name = spec.file_name.clone();
        match job::run(&spec) {
            Ok(elapsed) => {
                self.conn
                    .send(WorkerMsg::Done(JobReport {
                        worker_id: self.id,
                        elapsed,
                        file_name,
                    }))
                    .await
            }
            Err(err) => {
                error!(?err, file = %file_name, "job failed");
                // Tell the coordinator before unwinding so the batch aborts
                // as a whole instead of hanging on a missing report.
                let failure = WorkerMsg::Failed(JobFailure {
                    worker_id: self.id,
                    file_name,
                    error: format!("{err:#}"),
                });
                utils::log_if_err!(self.conn.send(failure).await, "report failure");
                Err(err)
            }
        }
    }
}

struct Connection {
    conn: Framed,
}

impl Connection {
    /// Workers may start before the coordinator is listening; retry with a
    /// capped backoff until the connect succeeds.
    async fn connect_until_success(addr: &str) -> Self {
        let mut wait = Duration::from_secs(1);
        let max = Duration::from_secs(20);

        let conn = loop {
            match Self::framed(addr).await {
                Ok(f) => break f,
                Err(err) => {
                    error!(%addr, "connection error: {err:#}");
                    time::sleep(wait).await;
                    wait = (wait + Duration::from_secs(2)).min(max);
                }
            }
        };
        Connection { conn }
    }

    async fn framed(addr: &str) -> Result<Framed> {
        let tcp = TcpStream::connect(addr).await?;
        Ok(Framed::new(tcp, WorkerCodec::new()))
    }

    async fn send(&mut self, msg: WorkerMsg) -> Result<()> {
        self.conn.send(msg).await.context("send to coordinator")
    }

    /// A dropped or corrupt channel mid-batch is fatal; there is no
    /// reconnect once the pool has formed.
    async fn next(&mut self) -> Result<CoordinatorMsg> {
        match self.conn.next().await {
            Some(Ok(msg)) => Ok(msg),
            Some(Err(err)) => Err(err).context("receive from coordinator"),
            None => bail!("coordinator closed the connection"),
        }
    }
}
