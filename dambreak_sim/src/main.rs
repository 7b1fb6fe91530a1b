//! DamBreak Replay CLI
//!
//! Replay a directory of precomputed dam-break frames against a simulated
//! render host, validate a frame set, or export a run to JSON.

use clap::Parser;
use dambreak_core::{ActivePlayers, DiskReader, EndBehavior, PlaybackConfig};
use dambreak_sim::{validate_frame_set, ReplayOptions, ReplayResult, ReplayRunner, RerunScene};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// DamBreak offline frame playback
#[derive(Parser, Debug)]
#[command(name = "dambreak-replay")]
#[command(about = "Replay precomputed dam-break frames at a fixed cadence", long_about = None)]
struct Args {
    /// JSON playback config (flags below override it)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding DamBreak{i}.txt / Mesh{i}.txt
    #[arg(short, long)]
    base_path: Option<String>,

    /// Number of particle entities
    #[arg(short, long)]
    pool_size: Option<usize>,

    /// Total number of frames on disk
    #[arg(short, long)]
    frames: Option<u32>,

    /// Seconds between frame advances
    #[arg(short, long)]
    interval: Option<f64>,

    /// Players to drive (particles, mesh, both)
    #[arg(long)]
    players: Option<ActivePlayers>,

    /// Hold the last frame instead of looping
    #[arg(long)]
    stop_at_end: bool,

    /// Read the next frame on a background thread
    #[arg(long)]
    prefetch: bool,

    /// Simulated render rate in Hz
    #[arg(long, default_value = "60")]
    render_hz: f64,

    /// Render frame-time jitter as a fraction of a frame
    #[arg(long, default_value = "0")]
    jitter: f64,

    /// Seed for the jitter RNG (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Host time to run for, in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,

    /// Tick on a real-time interval instead of virtual time
    #[arg(long, conflicts_with = "visualize")]
    realtime: bool,

    /// Export recorded frames to a JSON file
    #[arg(long)]
    export: Option<String>,

    /// Decode every frame file and exit
    #[arg(long)]
    validate: bool,

    /// Stream the scene to a Rerun viewer
    #[arg(long)]
    visualize: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn playback_config(&self) -> Result<PlaybackConfig, dambreak_core::ConfigError> {
        let mut config = match &self.config {
            Some(path) => PlaybackConfig::from_json_file(path)?,
            None => PlaybackConfig::default(),
        };

        if let Some(base_path) = &self.base_path {
            config = config.with_base_path(base_path);
        }
        if let Some(pool_size) = self.pool_size {
            config = config.with_pool_size(pool_size);
        }
        if let Some(frames) = self.frames {
            config = config.with_total_frames(frames);
        }
        if let Some(interval) = self.interval {
            config = config.with_tick_interval(interval);
        }
        if let Some(players) = self.players {
            config = config.with_players(players);
        }
        if self.stop_at_end {
            config = config.with_end_behavior(EndBehavior::Stop);
        }
        if self.prefetch {
            config = config.with_prefetch(true);
        }

        config.validate()?;
        Ok(config)
    }

    fn replay_options(&self, seed: u64) -> ReplayOptions {
        ReplayOptions {
            render_hz: self.render_hz,
            jitter: self.jitter,
            seed,
            duration_secs: self.duration,
            record: self.export.is_some(),
        }
    }
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("DamBreak Replay v0.1.0");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = match args.playback_config() {
        Ok(config) => config,
        Err(e) => {
            error!("✗ {}", e);
            std::process::exit(1);
        }
    };

    if args.validate {
        let report = validate_frame_set(&config, Arc::new(DiskReader));
        if report.passed() {
            info!(
                "✓ {} particle frames and {} mesh files decoded",
                report.particle_frames_ok, report.mesh_frames_ok
            );
            return;
        }
        for e in &report.errors {
            error!("  ✗ {}", e);
        }
        error!("❌ {} frame file(s) failed to decode", report.errors.len());
        std::process::exit(1);
    }

    // Determine seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let runner = ReplayRunner::new(config, args.replay_options(seed));

    let outcome = if args.realtime {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build();
        match runtime {
            Ok(rt) => rt.block_on(runner.run_realtime()),
            Err(e) => Err(e.into()),
        }
    } else if args.visualize {
        let mut scene = RerunScene::new("dambreak-replay");
        runner.run_visualized(&mut scene)
    } else {
        runner.run()
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("✗ {}", e);
            std::process::exit(1);
        }
    };

    report(&result);

    if let (Some(path), Some(export)) = (&args.export, &result.export) {
        if let Err(e) = export.write_to_file(path) {
            error!("Failed to write export: {:?}", e);
            std::process::exit(1);
        }
        info!("Exported {} frames to {}", export.frames.len(), path);
    }

    // Exit with proper code for CI
    if !result.passed() {
        std::process::exit(1);
    }
}

fn report(result: &ReplayResult) {
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "seed={} | host ticks={} | advances={} | loops={} | index={} | t={:.2}s{}",
        result.seed,
        result.host_ticks,
        result.advances,
        result.loops,
        result.final_index,
        result.host_time_secs,
        if result.finished { " | finished" } else { "" }
    );

    if result.passed() {
        info!("✅ Playback completed without player failures");
    } else {
        error!("❌ {} player failure(s)", result.failures.len());
        for failure in &result.failures {
            error!("  - {}", failure);
        }
    }
}
