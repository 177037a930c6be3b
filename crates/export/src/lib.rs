//! # Vegtrack Export
//!
//! Output paths for finished rasters:
//!
//! - [`ExportClient::submit`]: asynchronous export jobs returning an
//!   explicit [`ExportJob`] handle; the caller chooses to wait, poll
//!   status, or detach.
//! - [`download_url`]: direct download of a raster (or a mosaicked
//!   collection of rasters) at a fixed 30-unit ground sample distance,
//!   returning a `file://` URL.

pub mod download;
pub mod error;
pub mod job;
pub mod raster_ops;

pub use download::{download_url, DownloadSource, DOWNLOAD_SCALE};
pub use error::{ExportError, Result};
pub use job::{ExportClient, ExportJob, ExportTask, JobStatus};
pub use raster_ops::{mosaic_first_valid, resample_nearest};
