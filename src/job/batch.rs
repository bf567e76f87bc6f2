//! Concurrent execution of many panorama jobs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::JobError;
use crate::matcher::{ByteComposite, MatchConfig};
use crate::raster::{bytes_to_image, encode_png};
use crate::supply::ImageSupplier;

use super::{run_job, PanoramaJob};

/// Default number of panoramas built at once.
pub const DEFAULT_CONCURRENT_JOBS: usize = 4;

/// Settings for a [`BatchRunner`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory receiving `<name>.png`
    pub output_dir: PathBuf,

    /// Maximum panoramas in flight
    pub jobs: usize,

    pub config: MatchConfig,
}

impl BatchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            jobs: DEFAULT_CONCURRENT_JOBS,
            config: MatchConfig::default(),
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }
}

/// A job that did not produce output.
#[derive(Debug, Clone)]
pub struct FailedJob {
    pub name: String,
    pub error: JobError,
}

/// Outcome of a batch, in submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Job name and the file written for it
    pub succeeded: Vec<(String, PathBuf)>,

    pub failed: Vec<FailedJob>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs panorama jobs concurrently against one shared supplier.
///
/// A failing job is logged and reported; it never stops its siblings.
pub struct BatchRunner {
    supplier: Arc<dyn ImageSupplier>,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(supplier: Arc<dyn ImageSupplier>, options: BatchOptions) -> Self {
        Self { supplier, options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub async fn run(&self, jobs: Vec<PanoramaJob>) -> BatchReport {
        let permits = Arc::new(Semaphore::new(self.options.jobs.max(1)));
        let mut pending = JoinSet::new();
        let names: Vec<String> = jobs.iter().map(|job| job.name.clone()).collect();

        for (index, job) in jobs.into_iter().enumerate() {
            let permits = permits.clone();
            let supplier = self.supplier.clone();
            let config = self.options.config.clone();
            let output_dir = self.options.output_dir.clone();

            pending.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => build_and_write(&job, supplier.as_ref(), &config, &output_dir).await,
                    Err(e) => Err(JobError::Join(e.to_string())),
                };
                (index, result)
            });
        }

        let mut outcomes: Vec<Option<Result<PathBuf, JobError>>> = vec![None; names.len()];
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((index, result)) => outcomes[index] = Some(result),
                Err(e) => error!(error = %e, "panorama task aborted"),
            }
        }

        let mut report = BatchReport::default();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            match outcome {
                Some(Ok(path)) => {
                    info!(job = %name, path = %path.display(), "wrote panorama");
                    report.succeeded.push((name, path));
                }
                Some(Err(error)) => {
                    error!(job = %name, error = %error, "panorama failed");
                    report.failed.push(FailedJob { name, error });
                }
                None => {
                    let error = JobError::Join("task did not complete".to_string());
                    error!(job = %name, error = %error, "panorama failed");
                    report.failed.push(FailedJob { name, error });
                }
            }
        }
        report
    }
}

async fn build_and_write(
    job: &PanoramaJob,
    supplier: &dyn ImageSupplier,
    config: &MatchConfig,
    output_dir: &Path,
) -> Result<PathBuf, JobError> {
    let composite = run_job(job, supplier, config).await?;
    let path = output_dir.join(format!("{}.png", job.name));
    write_png(&composite, &path).await?;
    Ok(path)
}

/// Encode a composite as PNG and write it.
pub async fn write_png(composite: &ByteComposite, path: &Path) -> Result<(), JobError> {
    let png = encode_png(&bytes_to_image(&composite.bytes)?)?;
    let output_error = |e: std::io::Error| JobError::Output {
        path: path.display().to_string(),
        message: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(output_error)?;
    }
    tokio::fs::write(path, png).await.map_err(output_error)
}
