//! VegTrack CLI - NDVI change and trend analysis for Landsat time series

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vegtrack_algorithms::change::{percent_change, zscore_anomaly};
use vegtrack_algorithms::indices::{attach_ndvi, NDVI_BAND};
use vegtrack_algorithms::mask::mask_scene;
use vegtrack_algorithms::temporal::{temporal_mean, temporal_stddev};
use vegtrack_algorithms::trend::linear_fit;
use vegtrack_colormap::{raster_to_rgba, ColorRamp, ColormapParams};
use vegtrack_core::{Aoi, PipelineConfig, Raster, SceneCollection, Sensor, VizRange};
use vegtrack_export::{ExportClient, ExportJob, ExportTask};

mod manifest;

use manifest::load_collection;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vegtrack")]
#[command(author, version, about = "NDVI change and trend analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a scene manifest
    Info {
        /// Scene manifest (JSON)
        manifest: PathBuf,
    },
    /// Percent change and z-score anomaly between two periods
    Change {
        /// Manifest for the reference period (Landsat-5 archive)
        before: PathBuf,
        /// Manifest for the current period (Landsat-8 archive)
        after: PathBuf,
        /// Pipeline configuration (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
        /// Also write colormapped PNG previews
        #[arg(long)]
        png: bool,
        /// Submit exports without waiting for them to finish
        #[arg(long)]
        detach: bool,
    },
    /// Per-pixel linear NDVI trend over both archive windows
    Trend {
        /// One or more scene manifests, merged before fitting
        #[arg(required = true)]
        manifests: Vec<PathBuf>,
        /// Pipeline configuration (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,
        /// Also write colormapped PNG previews
        #[arg(long)]
        png: bool,
        /// Submit exports without waiting for them to finish
        #[arg(long)]
        detach: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn read_scenes(path: &Path) -> Result<SceneCollection> {
    let pb = spinner("Reading scenes...");
    let collection = load_collection(path)?;
    pb.finish_and_clear();
    info!("{}: {} scenes", path.display(), collection.len());
    Ok(collection)
}

/// Seasonal, cloud and AOI filters, then per-scene masking and NDVI.
fn prepare(
    collection: SceneCollection,
    config: &PipelineConfig,
    aoi: &Aoi,
) -> Result<SceneCollection> {
    let filtered = collection
        .filter_months(config.month_range())
        .filter_cloud_cover(config.cloud_threshold)
        .filter_bounds(aoi);
    let prepared = filtered.try_map(|mut scene| {
        mask_scene(&mut scene)?;
        attach_ndvi(scene)
    })?;
    Ok(prepared)
}

/// Keep each scene only inside its archive's window: Landsat-5 scenes
/// are held to the reference window, Landsat-8 scenes to the current
/// one.
fn filter_sensor_windows(collection: SceneCollection, config: &PipelineConfig) -> SceneCollection {
    let scenes: Vec<_> = collection
        .into_iter()
        .filter(|scene| {
            let window = match scene.sensor() {
                Sensor::Landsat5 => &config.before_window,
                Sensor::Landsat8 => &config.after_window,
            };
            scene.acquired() >= window.start_utc() && scene.acquired() <= window.end_utc()
        })
        .collect();
    SceneCollection::from_scenes(scenes)
}

fn submit_export(
    client: &ExportClient,
    raster: Raster<f64>,
    description: &str,
    config: &PipelineConfig,
    out_dir: &Path,
) -> ExportJob {
    client.submit(
        raster,
        ExportTask {
            description: description.to_string(),
            scale: config.export_scale,
            region: config.aoi_ring.clone(),
            destination: out_dir.to_path_buf(),
        },
    )
}

fn finish_jobs(jobs: Vec<(String, ExportJob)>, detach: bool) -> Result<()> {
    if detach {
        let count = jobs.len();
        for (name, job) in jobs {
            info!("{} submitted", name);
            job.detach();
        }
        println!("{} exports left running; completion is not reported.", count);
        return Ok(());
    }
    for (name, job) in jobs {
        let path = job
            .wait()
            .with_context(|| format!("Export {} failed", name))?;
        println!("{} saved to: {}", name, path.display());
    }
    Ok(())
}

fn write_png(raster: &Raster<f64>, range: VizRange, ramp: ColorRamp, path: &Path) -> Result<()> {
    let params = ColormapParams::with_range(ramp, range.min, range.max);
    let rgba = raster_to_rgba(raster, &params);

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, raster.cols() as u32, raster.rows() as u32);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut png_writer = encoder.write_header().context("Failed to write PNG header")?;
    png_writer
        .write_image_data(&rgba)
        .context("Failed to write PNG data")?;
    println!("Preview saved to: {}", path.display());
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { manifest } => {
            let collection = read_scenes(&manifest)?;
            let l5 = collection
                .iter()
                .filter(|s| s.sensor() == Sensor::Landsat5)
                .count();
            println!("Manifest: {}", manifest.display());
            println!(
                "Scenes: {} ({} Landsat-5, {} Landsat-8)",
                collection.len(),
                l5,
                collection.len() - l5
            );
            for scene in collection.iter() {
                let (rows, cols) = scene.shape();
                println!(
                    "  {}  {}  cloud {:>5.1}%  {} x {}  bands: {}",
                    scene.acquired().format("%Y-%m-%d"),
                    scene.sensor().name(),
                    scene.cloud_cover(),
                    cols,
                    rows,
                    scene.band_names().join(", ")
                );
            }
        }

        // ── Change / anomaly ─────────────────────────────────────────
        Commands::Change {
            before,
            after,
            config,
            out_dir,
            png,
            detach,
        } => {
            let config = load_config(config.as_deref())?;
            let aoi = Aoi::from_ring(&config.aoi_ring)?;

            let before_window = &config.before_window;
            let after_window = &config.after_window;
            let before = read_scenes(&before)?
                .filter_date(before_window.start_utc(), before_window.end_utc());
            let after =
                read_scenes(&after)?.filter_date(after_window.start_utc(), after_window.end_utc());

            let start = Instant::now();
            let pb = spinner("Masking and computing NDVI...");
            let before = prepare(before, &config, &aoi)?;
            let after = prepare(after, &config, &aoi)?;
            pb.finish_and_clear();
            info!(
                "{} reference scenes, {} current scenes after filtering",
                before.len(),
                after.len()
            );

            let pb = spinner("Reducing time series...");
            let before_mean = temporal_mean(&before, NDVI_BAND)?;
            let before_stddev = temporal_stddev(&before, NDVI_BAND)?;
            let after_mean = temporal_mean(&after, NDVI_BAND)?;

            let change = aoi.clip(&percent_change(&before_mean, &after_mean)?);
            let anomaly = aoi.clip(&zscore_anomaly(&before_mean, &after_mean, &before_stddev)?);
            pb.finish_and_clear();
            info!("Analysis finished in {:.2?}", start.elapsed());

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            if png {
                write_png(
                    &change,
                    config.change_viz,
                    ColorRamp::VegetationChange,
                    &out_dir.join("ndvi_change.png"),
                )?;
                write_png(
                    &anomaly,
                    config.anomaly_viz,
                    ColorRamp::VegetationChange,
                    &out_dir.join("ndvi_anomaly.png"),
                )?;
            }

            let client = ExportClient::new()?;
            let jobs = vec![
                (
                    "NDVI change".to_string(),
                    submit_export(&client, change, "ndvi_change", &config, &out_dir),
                ),
                (
                    "NDVI anomaly".to_string(),
                    submit_export(&client, anomaly, "ndvi_anomaly", &config, &out_dir),
                ),
            ];
            finish_jobs(jobs, detach)?;
        }

        // ── Trend ────────────────────────────────────────────────────
        Commands::Trend {
            manifests,
            config,
            out_dir,
            png,
            detach,
        } => {
            let config = load_config(config.as_deref())?;
            let aoi = Aoi::from_ring(&config.aoi_ring)?;

            let mut merged = SceneCollection::new();
            for path in &manifests {
                merged = merged.merge(read_scenes(path)?);
            }
            let merged = filter_sensor_windows(merged, &config);

            let start = Instant::now();
            let pb = spinner("Masking and computing NDVI...");
            let collection = prepare(merged, &config, &aoi)?.sort_by_time();
            pb.finish_and_clear();
            info!("{} scenes in the fitting archive", collection.len());

            let pb = spinner("Fitting per-pixel trend...");
            let fit = linear_fit(&collection, NDVI_BAND)?;
            let offset = aoi.clip(&fit.offset);
            let scale = aoi.clip(&fit.scale);
            pb.finish_and_clear();
            info!("Fit finished in {:.2?}", start.elapsed());

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            if png {
                let stats = scale.stats();
                let range = VizRange {
                    min: stats.min.unwrap_or(0.0),
                    max: stats.max.unwrap_or(1.0),
                };
                write_png(
                    &scale,
                    range,
                    ColorRamp::VegetationChange,
                    &out_dir.join("ndvi_trend_scale.png"),
                )?;
            }

            let client = ExportClient::new()?;
            let jobs = vec![
                (
                    "Trend offset".to_string(),
                    submit_export(&client, offset, "ndvi_trend_offset", &config, &out_dir),
                ),
                (
                    "Trend scale".to_string(),
                    submit_export(&client, scale, "ndvi_trend_scale", &config, &out_dir),
                ),
            ];
            finish_jobs(jobs, detach)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Utc};
    use vegtrack_core::Scene;

    fn scene(sensor: Sensor, year: i32) -> Scene {
        Scene::new(
            sensor,
            Utc.with_ymd_and_hms(year, 7, 15, 18, 0, 0).unwrap(),
            0.0,
            Raster::<u16>::new(2, 2),
        )
    }

    #[test]
    fn sensor_windows_apply_per_archive() {
        // defaults: reference window 1990-2000, current window 2018-2019
        let config = PipelineConfig::default();
        let collection = SceneCollection::from_scenes(vec![
            scene(Sensor::Landsat5, 1995),
            scene(Sensor::Landsat5, 2014),
            scene(Sensor::Landsat8, 2019),
            scene(Sensor::Landsat8, 1999),
        ]);

        let filtered = filter_sensor_windows(collection, &config);
        let kept: Vec<(Sensor, i32)> = filtered
            .iter()
            .map(|s| (s.sensor(), s.acquired().year()))
            .collect();
        assert_eq!(
            kept,
            vec![(Sensor::Landsat5, 1995), (Sensor::Landsat8, 2019)]
        );
    }
}
