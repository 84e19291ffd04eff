pub mod pool;
pub mod report;

use anyhow::Result;
use protocol::{worker_msg::JobReport, JobSpec, WorkerId};
use tracing::{debug, info};

use self::{pool::WorkerLink, report::ReportSink};

/// Owns the job queue and the worker pool for one batch. Picks a scheduling
/// regime by comparing job count to pool size, drives it to completion, and
/// finishes every worker exactly once.
pub struct Coordinator {
    links: Vec<WorkerLink>,
}

impl Coordinator {
    pub fn new(links: Vec<WorkerLink>) -> Self {
        Self { links }
    }

    pub async fn run(&mut self, jobs: Vec<JobSpec>, sink: &mut ReportSink) -> Result<()> {
        let res = self.dispatch_all(jobs, sink).await;
        if res.is_err() {
            // The batch is aborting; drain the pool so no worker blocks
            // forever waiting for an envelope that will never come.
            self.finish_all_best_effort().await;
        }
        res
    }

    async fn dispatch_all(&mut self, jobs: Vec<JobSpec>, sink: &mut ReportSink) -> Result<()> {
        if jobs.len() >= self.links.len() {
            debug!(jobs = jobs.len(), workers = self.links.len(), "oversubscribed regime");
            self.run_oversubscribed(jobs, sink).await
        } else {
            debug!(jobs = jobs.len(), workers = self.links.len(), "undersubscribed regime");
            self.run_undersubscribed(jobs, sink).await
        }
    }

    /// Jobs ≥ workers: flood one job per worker, then keep handing the next
    /// job to whichever worker reports first. Arrival order is the whole
    /// load-balancing mechanism.
    async fn run_oversubscribed(
        &mut self,
        mut queue: Vec<JobSpec>,
        sink: &mut ReportSink,
    ) -> Result<()> {
        let total = queue.len();

        for link in &mut self.links {
            let job = queue.pop().expect("at least one job per worker");
            link.dispatch(job).await?;
        }

        // Exactly one report per job; the queue drains strictly through
        // reassignment to finishers.
        let mut received = 0;
        while received < total {
            let (rank, report) = self.recv_any().await?;
            received += 1;
            sink.job_done(&report);

            if let Some(job) = queue.pop() {
                self.link_mut(rank).dispatch(job).await?;
            }
        }

        for link in &mut self.links {
            link.finish().await?;
        }
        info!(total, "batch drained");
        Ok(())
    }

    /// Jobs < workers: one-to-one assignment in rank order, no reassignment.
    /// Busy workers are drained and finished in rank order, not arrival
    /// order; surplus workers are finished right after so the whole pool
    /// terminates.
    async fn run_undersubscribed(
        &mut self,
        mut jobs: Vec<JobSpec>,
        sink: &mut ReportSink,
    ) -> Result<()> {
        let busy = jobs.len();

        for (link, job) in self.links.iter_mut().zip(jobs.drain(..)) {
            link.dispatch(job).await?;
        }

        for link in &mut self.links[..busy] {
            let (_, report) = link.recv_report().await?;
            sink.job_done(&report);
            link.finish().await?;
        }

        for link in &mut self.links[busy..] {
            link.finish().await?;
        }
        info!(total = busy, "batch drained");
        Ok(())
    }

    /// Blocks until any worker's next report; which one arrives first is
    /// unconstrained. Frame reads are cancel-safe, so the losing futures
    /// drop without losing buffered bytes.
    async fn recv_any(&mut self) -> Result<(WorkerId, JobReport)> {
        let reads = self
            .links
            .iter_mut()
            .map(|link| Box::pin(link.recv_report()));
        let (res, _, _) = futures::future::select_all(reads).await;
        res
    }

    fn link_mut(&mut self, id: WorkerId) -> &mut WorkerLink {
        self.links
            .iter_mut()
            .find(|link| link.id() == id)
            .expect("rank was assigned from this pool")
    }

    async fn finish_all_best_effort(&mut self) {
        for link in &mut self.links {
            utils::log_if_err!(link.finish().await, "finish worker on abort");
        }
    }
}
