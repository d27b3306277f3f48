// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Scanning a barcode from a still-image camera
//! - Printing the region of readability for a container

use quick_scan::backends::camera::still_image::StillImageProvider;
use quick_scan::frame_processor::{CoordinateSpace, compute_region};
use quick_scan::{AppError, Config, FrameSource, Orientation, RqrrReader, ScanPipeline};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Load the config from `path`, or from the default location
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Scan the given images as a live preview and print the first payload
pub fn scan_images(
    images: Vec<PathBuf>,
    config: &Config,
    timeout_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = StillImageProvider::from_paths(images)
        .with_interval(config.frame_interval())
        .with_sensor(config.sensor_info())
        .with_looping(config.loop_frames);

    let source = FrameSource::new();
    if let Err(e) = source.open(&provider) {
        return Err(AppError::from(e).into());
    }

    let orientation = source
        .compute_display_orientation(config.device_orientation())
        .unwrap_or_default();
    if let Some(region) = source.bounding_rect() {
        println!("Scanning region {} at {}", region, orientation);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let start = Instant::now();

    source.start_preview();
    let summary = runtime.block_on(async {
        let handle = ScanPipeline::new(source.clone(), RqrrReader::new()).spawn(Box::new(
            |payload| {
                println!("{}", payload);
            },
        ));
        handle
            .wait_timeout(Duration::from_secs(timeout_secs))
            .await
    });
    source.stop_preview();
    source.release();

    match summary.payload {
        Some(_) => {
            println!(
                "Decoded after {} frame(s) in {:.2}s",
                summary.attempts,
                start.elapsed().as_secs_f64()
            );
            Ok(())
        }
        None => Err(format!(
            "No barcode found in {} frame(s) within {}s",
            summary.attempts, timeout_secs
        )
        .into()),
    }
}

/// Print the region of readability for a container
pub fn print_region(
    width: u32,
    height: u32,
    degrees: i32,
    sensor: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let orientation = Orientation::from_degrees_int(degrees);
    let space = if sensor {
        CoordinateSpace::Sensor
    } else {
        CoordinateSpace::Ui
    };

    let region = compute_region(width, height, orientation, space);
    if region.is_degenerate() {
        return Err(format!("Container {}x{} is too small for a region", width, height).into());
    }

    println!("{}", region);
    Ok(())
}
