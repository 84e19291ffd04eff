use std::time::Instant;

use protocol::worker_msg::JobReport;

/// Stdout sink for the batch's timing lines. Each completed job prints
/// `<file><sep><elapsed><sep><worker>`; the closing line attributes the
/// whole batch's wall-clock to rank 0. Logs go to stderr so this stream
/// stays machine-readable.
pub struct ReportSink {
    separator: String,
    started: Instant,
    completed: Vec<JobReport>,
}

impl ReportSink {
    pub fn new(separator: &str) -> Self {
        Self {
            separator: separator.to_string(),
            started: Instant::now(),
            completed: Vec::new(),
        }
    }

    pub fn job_done(&mut self, report: &JobReport) {
        println!(
            "{file}{sep}{elapsed}{sep}{worker}",
            file = report.file_name,
            sep = self.separator,
            elapsed = report.elapsed,
            worker = report.worker_id,
        );
        self.completed.push(report.clone());
    }

    /// Closes the batch: prints the wall-clock line and returns how many
    /// jobs completed.
    pub fn close(self) -> usize {
        println!(
            "batch time{sep}{batch}{sep}0",
            sep = self.separator,
            batch = self.started.elapsed().as_secs_f64(),
        );
        self.completed.len()
    }
}
