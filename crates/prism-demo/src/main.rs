//! prism: switch between color, depth and pixelation passes over a small
//! 3D scene.
//!
//! Usage:
//!   prism [--width W] [--height H] [--pixel-size P] [--pass color|depth|pixelate] [--log FILTER]

mod config;
mod controller;

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use prism_engine::device::{check_adapter, GpuInit};
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::window::{Runtime, RuntimeConfig};

use config::{Cli, DemoConfig, USAGE};
use controller::SceneController;

fn main() -> Result<()> {
    let config = match DemoConfig::from_args(std::env::args().skip(1)) {
        Ok(Cli::Run(config)) => config,
        Ok(Cli::Help) => {
            print!("{USAGE}");
            return Ok(());
        }
        Err(err) => {
            eprintln!("error: {err:#}\n");
            eprint!("{USAGE}");
            return Err(err.context("invalid command line"));
        }
    };

    init_logging(match &config.log_filter {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });

    let adapter = match check_adapter() {
        Ok(adapter) => adapter,
        Err(err) => {
            log::error!("no usable GPU adapter: {err:#}");
            eprintln!("warning: no compatible GPU adapter found; prism needs WebGPU-capable graphics.");
            return Err(err.context("GPU adapter check failed"));
        }
    };
    log::info!("using {adapter}");

    let runtime = RuntimeConfig {
        title: "prism".to_string(),
        initial_size: LogicalSize::new(config.width, config.height),
    };

    let controller = SceneController::new(&config);

    Runtime::run(runtime, GpuInit::default(), controller).context("prism runtime failed")
}
