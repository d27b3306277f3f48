// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use quick_scan::SensorFacing;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "quick-scan")]
#[command(about = "Scan barcodes from a live preview")]
#[command(version = env!("SCAN_BUILD_VERSION"))]
struct Cli {
    /// Config file (default: <config dir>/quick-scan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream images as camera preview frames and scan them
    Scan {
        /// Image files streamed as preview frames, in order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Device rotation in degrees
        #[arg(short, long)]
        rotation: Option<i32>,

        /// Sensor mount angle in degrees
        #[arg(short, long)]
        mount: Option<i32>,

        /// Sensor facing
        #[arg(short, long, value_enum)]
        facing: Option<FacingArg>,

        /// Interval between preview frames in milliseconds
        #[arg(short, long)]
        interval: Option<u64>,

        /// Give up after this many seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Stop after the last image instead of starting over
        #[arg(long)]
        no_loop: bool,
    },

    /// Print the region of readability for a container
    Region {
        /// Container width in pixels
        #[arg(long)]
        width: u32,

        /// Container height in pixels
        #[arg(long)]
        height: u32,

        /// Display orientation in degrees
        #[arg(short, long, default_value = "0")]
        orientation: i32,

        /// Compute in sensor space instead of UI space
        #[arg(long)]
        sensor: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    Back,
    Front,
}

impl From<FacingArg> for SensorFacing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Back => SensorFacing::Back,
            FacingArg::Front => SensorFacing::Front,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=quick_scan=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            images,
            rotation,
            mount,
            facing,
            interval,
            timeout,
            no_loop,
        } => {
            let mut config = cli::load_config(cli.config.as_deref())?;
            if let Some(rotation) = rotation {
                config.device_rotation = rotation;
            }
            if let Some(mount) = mount {
                config.sensor_mount_angle = mount;
            }
            if let Some(facing) = facing {
                config.sensor_facing = facing.into();
            }
            if let Some(interval) = interval {
                config.frame_interval_ms = interval;
            }
            if no_loop {
                config.loop_frames = false;
            }
            cli::scan_images(images, &config, timeout)
        }
        Commands::Region {
            width,
            height,
            orientation,
            sensor,
        } => cli::print_region(width, height, orientation, sensor),
    }
}
