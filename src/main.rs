//! Face tracking application driving a simulated robot head.

use anyhow::{Context, Result};
use clap::Parser;
use face_tracking::{
    config::{duration_from_secs, Config, EXAMPLE_CONFIG},
    idle::StayStill,
    orchestrator::TrackingOrchestrator,
    simulation::{RandomIdleMotion, SimulatedFaceDetector, SimulatedHead, SyntheticCamera},
};
use log::{info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(long)]
    duration: Option<f64>,

    /// Print an example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Seed for the simulated face and idle motion
    #[arg(long)]
    seed: Option<u64>,

    /// Keep the head still instead of glancing around when nobody is there
    #[arg(long)]
    no_idle_motion: bool,

    /// Camera frame width in pixels
    #[arg(long, default_value = "640")]
    width: u32,

    /// Camera frame height in pixels
    #[arg(long, default_value = "480")]
    height: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face tracking - simulated head");

    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    config.validate().context("Invalid configuration")?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let head = Arc::new(SimulatedHead::default());
    let detector = match args.seed {
        Some(seed) => SimulatedFaceDetector::with_seed(seed),
        None => SimulatedFaceDetector::new(),
    };
    let camera = SyntheticCamera::new(args.width, args.height);
    let depth = config.orchestrator.look_at_depth;

    let mut tracker = if args.no_idle_motion {
        TrackingOrchestrator::new(&config, camera, detector, head, StayStill::default())
    } else {
        let mut idle = RandomIdleMotion::new(head.clone(), depth, 0.2, Duration::from_secs(2));
        if let Some(seed) = args.seed {
            idle = idle.with_seed(seed);
        }
        TrackingOrchestrator::new(&config, camera, detector, head, idle)
    };

    let deadline = match args.duration {
        Some(secs) => {
            let run_for = duration_from_secs(secs).context("Invalid --duration")?;
            Some(Instant::now().checked_add(run_for).context("--duration is too long")?)
        }
        None => None,
    };

    tracker.setup().context("Failed to set up the head")?;
    tracker.run(&stop, deadline)?;
    tracker.shutdown();

    Ok(())
}
