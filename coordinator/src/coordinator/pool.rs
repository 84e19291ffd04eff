use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use protocol::{
    codec::CoordinatorCodec, handshake::JoinAck, worker_msg::JobReport, CoordinatorMsg, JobSpec,
    WorkerId, WorkerMsg,
};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};
use utils::macros::codec::tokio_util;

type Framed = tokio_util::codec::Framed<TcpStream, CoordinatorCodec>;

/// One connected worker: its rank and the framed channel to it. Messages on
/// the channel arrive in send order; ordering across links is unconstrained.
pub struct WorkerLink {
    id: WorkerId,
    conn: Framed,
}

impl WorkerLink {
    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub async fn dispatch(&mut self, job: JobSpec) -> Result<()> {
        debug!(rank = %self.id, file = %job.file_name, "dispatching");
        self.send(CoordinatorMsg::Work(job)).await
    }

    pub async fn finish(&mut self) -> Result<()> {
        debug!(rank = %self.id, "sending finish");
        self.send(CoordinatorMsg::Finish).await
    }

    async fn send(&mut self, msg: CoordinatorMsg) -> Result<()> {
        self.conn
            .send(msg)
            .await
            .with_context(|| format!("send to worker {}", self.id))
    }

    /// Blocks until this worker's next completion report. A failure report,
    /// an out-of-protocol message, or a dropped connection aborts the batch.
    pub async fn recv_report(&mut self) -> Result<(WorkerId, JobReport)> {
        match self.conn.next().await {
            Some(Ok(WorkerMsg::Done(report))) => Ok((self.id, report)),
            Some(Ok(WorkerMsg::Failed(failure))) => bail!(
                "worker {} failed on {}: {}",
                failure.worker_id,
                failure.file_name,
                failure.error
            ),
            Some(Ok(WorkerMsg::Join(_))) => bail!("worker {} sent a second join", self.id),
            Some(Err(err)) => Err(err).with_context(|| format!("receive from worker {}", self.id)),
            None => bail!("worker {} disconnected mid-batch", self.id),
        }
    }
}

/// Accepts exactly `count` workers from the listener and assigns ranks
/// 1..=count in join order. The pool is fixed for the lifetime of the run.
pub async fn bootstrap(listener: TcpListener, count: u32) -> Result<Vec<WorkerLink>> {
    if count == 0 {
        bail!("need at least one worker");
    }
    info!(count, "waiting for workers to join");

    let mut links = Vec::with_capacity(count as usize);
    for rank in 1..=count {
        let (stream, addr) = listener.accept().await.context("accept worker")?;
        let link = join(stream, WorkerId::from(rank))
            .await
            .with_context(|| format!("handshake with {addr}"))?;
        info!(rank = %link.id, %addr, "worker joined");
        links.push(link);
    }
    Ok(links)
}

async fn join(stream: TcpStream, id: WorkerId) -> Result<WorkerLink> {
    let mut conn = Framed::new(stream, CoordinatorCodec::new());
    match conn.next().await {
        Some(Ok(WorkerMsg::Join(req))) => debug!(pid = req.pid, rank = %id, "join request"),
        Some(Ok(other)) => bail!("expected join, got {other:?}"),
        Some(Err(err)) => return Err(err.context("read join request")),
        None => bail!("worker hung up before joining"),
    }
    conn.send(CoordinatorMsg::Welcome(JoinAck { worker_id: id }))
        .await
        .context("send welcome")?;
    Ok(WorkerLink { id, conn })
}
