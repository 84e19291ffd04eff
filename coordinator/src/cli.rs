use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use protocol::{JobSpec, OperatorKind, ToneParams};

/// Band granularity handed to the transform with every job.
pub const DEFAULT_BLOCK_SIZE: u32 = 32;

/// Distributes a directory of HDR images across a pool of tone-mapping
/// workers and reports per-job timings.
#[derive(Debug, Parser)]
pub struct Args {
    /// Directory containing the source images.
    pub images_src: PathBuf,

    /// Directory the mapped images are written to.
    pub results_dst: PathBuf,

    /// Separator between the fields of each timing line.
    pub output_separator: String,

    /// Number of workers that must join before dispatch begins.
    #[arg(long)]
    pub workers: u32,

    /// Address to listen on for the worker pool.
    #[arg(long, default_value = "127.0.0.1:8388")]
    pub listen: String,

    #[command(subcommand)]
    pub operator: OperatorArgs,
}

/// The operator applied to every image of the batch, with its two
/// parameters.
#[derive(Debug, Subcommand)]
pub enum OperatorArgs {
    /// Logarithmic mapping.
    Log { k: f32, q: f32 },
    /// Gamma correction after an f-stop exposure adjustment.
    Gamma { gamma: f32, f_stop: f32 },
    /// Adaptive logarithmic mapping.
    AdapLog { b: f32, ld_max: f32 },
}

impl OperatorArgs {
    pub fn kind(&self) -> OperatorKind {
        match self {
            OperatorArgs::Log { .. } => OperatorKind::Log,
            OperatorArgs::Gamma { .. } => OperatorKind::Gamma,
            OperatorArgs::AdapLog { .. } => OperatorKind::AdaptiveLog,
        }
    }

    /// Fills the operator's own pair on top of the defaults; the rest of the
    /// set travels untouched.
    pub fn params(&self) -> ToneParams {
        let mut params = ToneParams::default();
        match *self {
            OperatorArgs::Log { k, q } => {
                params.k = k;
                params.q = q;
            }
            OperatorArgs::Gamma { gamma, f_stop } => {
                params.gamma = gamma;
                params.f_stop = f_stop;
            }
            OperatorArgs::AdapLog { b, ld_max } => {
                params.b = b;
                params.ld_max = ld_max;
            }
        }
        params
    }
}

/// Lists the source directory and builds one job per regular file. The queue
/// is popped from the back, so dispatch order is unspecified on purpose.
pub fn build_jobs(args: &Args) -> Result<Vec<JobSpec>> {
    let operator = args.operator.kind();
    let params = args.operator.params();

    let entries = std::fs::read_dir(&args.images_src)
        .with_context(|| format!("list {}", args.images_src.display()))?;

    let mut jobs = Vec::new();
    for entry in entries {
        let entry = entry.context("read directory entry")?;
        if !entry.file_type().context("stat directory entry")?.is_file() {
            continue;
        }
        jobs.push(JobSpec {
            images_path: args.images_src.clone(),
            dst_path: args.results_dst.clone(),
            file_name: entry.file_name().to_string_lossy().into_owned(),
            operator,
            params,
            block_size: DEFAULT_BLOCK_SIZE,
        });
    }

    ensure!(
        !jobs.is_empty(),
        "no images found in {}",
        args.images_src.display()
    );
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_args_fill_only_their_own_pair() {
        let log = OperatorArgs::Log { k: 0.7, q: 1.1 };
        assert_eq!(log.kind(), OperatorKind::Log);
        let p = log.params();
        assert_eq!((p.k, p.q), (0.7, 1.1));
        assert_eq!(p.b, 1.0);
        assert_eq!((p.gamma, p.f_stop, p.ld_max), (0.0, 0.0, 0.0));

        let gamma = OperatorArgs::Gamma {
            gamma: 2.2,
            f_stop: -1.0,
        };
        assert_eq!(gamma.kind(), OperatorKind::Gamma);
        let p = gamma.params();
        assert_eq!((p.gamma, p.f_stop), (2.2, -1.0));

        let adap = OperatorArgs::AdapLog {
            b: 0.85,
            ld_max: 100.0,
        };
        assert_eq!(adap.kind(), OperatorKind::AdaptiveLog);
        let p = adap.params();
        assert_eq!((p.b, p.ld_max), (0.85, 100.0));
    }

    #[test]
    fn build_jobs_skips_directories_and_rejects_empty_batches() {
        let tmp = std::env::temp_dir().join(format!("tonebatch-cli-{}", std::process::id()));
        std::fs::create_dir_all(tmp.join("nested")).unwrap();
        std::fs::write(tmp.join("a.hdr"), b"x").unwrap();
        std::fs::write(tmp.join("b.hdr"), b"x").unwrap();

        let mut args = Args {
            images_src: tmp.clone(),
            results_dst: "out".into(),
            output_separator: ",".into(),
            workers: 2,
            listen: String::new(),
            operator: OperatorArgs::Log { k: 1.0, q: 1.0 },
        };

        let jobs = build_jobs(&args).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.images_path == tmp));

        args.images_src = tmp.join("nested");
        assert!(build_jobs(&args).is_err());

        std::fs::remove_dir_all(tmp).unwrap();
    }
}
