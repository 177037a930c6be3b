//! Asynchronous export jobs
//!
//! Submitting an export returns an [`ExportJob`] handle. The original
//! workflow started a task and exited without looking back; here that
//! fire-and-forget behavior is one explicit policy ([`ExportJob::detach`])
//! next to waiting ([`ExportJob::wait`]) and polling
//! ([`ExportJob::status`]).

use crate::error::{ExportError, Result};
use crate::raster_ops::resample_nearest;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vegtrack_core::aoi::Aoi;
use vegtrack_core::io::write_geotiff;
use vegtrack_core::raster::Raster;

/// Parameters for one export
#[derive(Debug, Clone)]
pub struct ExportTask {
    /// Label used for the output file name
    pub description: String,
    /// Ground sample distance of the written raster, in map units
    pub scale: f64,
    /// Region ring as (x, y) vertices; pixels outside it are nodata
    /// in the output
    pub region: Vec<(f64, f64)>,
    /// Directory the output is written into
    pub destination: PathBuf,
}

/// Observable state of an export job
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed(PathBuf),
    Failed(String),
}

/// Owns the runtime export jobs run on.
///
/// Jobs live as long as the client: dropping the client cancels any
/// still-running detached job, which is exactly the lifetime the
/// original one-shot workflow had.
pub struct ExportClient {
    rt: Arc<tokio::runtime::Runtime>,
}

impl ExportClient {
    pub fn new() -> Result<Self> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| ExportError::Runtime(e.to_string()))?;
        Ok(Self { rt: Arc::new(rt) })
    }

    /// Submit an export. Returns immediately with a job handle.
    pub fn submit(&self, raster: Raster<f64>, task: ExportTask) -> ExportJob {
        let status = Arc::new(Mutex::new(JobStatus::Pending));
        let status_inner = Arc::clone(&status);
        let description = task.description.clone();

        let handle = self.rt.spawn(async move {
            set_status(&status_inner, JobStatus::Running);
            let result = tokio::task::spawn_blocking(move || run_export(raster, task))
                .await
                .map_err(|e| ExportError::Join(e.to_string()))
                .and_then(|r| r);

            match result {
                Ok(path) => {
                    info!(job = %description, path = %path.display(), "export completed");
                    set_status(&status_inner, JobStatus::Completed(path.clone()));
                    Ok(path)
                }
                Err(e) => {
                    set_status(&status_inner, JobStatus::Failed(e.to_string()));
                    Err(e)
                }
            }
        });

        ExportJob {
            rt: Arc::clone(&self.rt),
            status,
            handle,
        }
    }
}

fn set_status(slot: &Mutex<JobStatus>, status: JobStatus) {
    if let Ok(mut guard) = slot.lock() {
        *guard = status;
    }
}

fn run_export(raster: Raster<f64>, task: ExportTask) -> Result<PathBuf> {
    if task.scale <= 0.0 {
        return Err(ExportError::InvalidScale(task.scale));
    }
    std::fs::create_dir_all(&task.destination)?;

    debug!(
        scale = task.scale,
        vertices = task.region.len(),
        "clipping and resampling for export"
    );
    let region = Aoi::from_ring(&task.region)?;
    let resampled = resample_nearest(&region.clip(&raster), task.scale)?;

    let path = task.destination.join(format!("{}.tif", task.description));
    write_geotiff(&resampled, &path)?;
    Ok(path)
}

/// Handle to a submitted export
pub struct ExportJob {
    rt: Arc<tokio::runtime::Runtime>,
    status: Arc<Mutex<JobStatus>>,
    handle: JoinHandle<Result<PathBuf>>,
}

impl ExportJob {
    /// Current job state, without blocking
    pub fn status(&self) -> JobStatus {
        self.status
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| JobStatus::Failed("status lock poisoned".to_string()))
    }

    /// Block until the job finishes and return the output path
    pub fn wait(self) -> Result<PathBuf> {
        self.rt
            .block_on(self.handle)
            .map_err(|e| ExportError::Join(e.to_string()))?
    }

    /// Explicitly drop the handle and let the job run unobserved
    pub fn detach(self) {
        drop(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vegtrack_core::io::read_geotiff;
    use vegtrack_core::raster::GeoTransform;

    fn test_raster() -> Raster<f64> {
        let mut r = Raster::filled(10, 10, 0.5);
        r.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        r
    }

    fn test_task(dir: &std::path::Path) -> ExportTask {
        ExportTask {
            description: "ndviChange_test".to_string(),
            scale: 30.0,
            region: vec![(0.0, 0.0), (300.0, 0.0), (300.0, 300.0), (0.0, 300.0)],
            destination: dir.to_path_buf(),
        }
    }

    #[test]
    fn submitted_job_completes_and_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let client = ExportClient::new().unwrap();

        let job = client.submit(test_raster(), test_task(dir.path()));
        let path = job.wait().unwrap();

        assert!(path.ends_with("ndviChange_test.tif"));
        let back: Raster<f64> = read_geotiff(&path).unwrap();
        assert_eq!(back.shape(), (10, 10));
    }

    #[test]
    fn region_masks_pixels_outside_the_ring() {
        let dir = tempfile::tempdir().unwrap();
        let client = ExportClient::new().unwrap();

        // ring covering only the left half of the raster
        let mut task = test_task(dir.path());
        task.region = vec![(0.0, 0.0), (150.0, 0.0), (150.0, 300.0), (0.0, 300.0)];

        let job = client.submit(test_raster(), task);
        let path = job.wait().unwrap();

        let back: Raster<f64> = read_geotiff(&path).unwrap();
        assert_eq!(back.shape(), (10, 10));
        assert_eq!(back.get(0, 0).unwrap(), 0.5);
        assert!(back.get(0, 9).unwrap().is_nan());
    }

    #[test]
    fn bad_scale_fails_the_job() {
        let dir = tempfile::tempdir().unwrap();
        let client = ExportClient::new().unwrap();

        let mut task = test_task(dir.path());
        task.scale = -1.0;
        let job = client.submit(test_raster(), task);

        assert!(job.wait().is_err());
    }

    #[test]
    fn detach_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let client = ExportClient::new().unwrap();

        let job = client.submit(test_raster(), test_task(dir.path()));
        job.detach();
        // the client is still alive here, so the job may finish; we
        // only assert that detaching returned immediately
    }
}
