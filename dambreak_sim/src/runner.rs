//! Replay runner - drives a playback session with simulated host ticks.

use crate::exporter::{ReplayExport, ReplayFrame};
use crate::host_clock::SimHostClock;
use crate::visualizer::RerunScene;

use dambreak_core::{
    ConfigError, DiskReader, FrameReader, PlaybackConfig, PlaybackController, PlayerError, TickReport,
};
use dambreak_env::{HeadlessScene, SceneHost};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that stop a replay before it produces a result.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Startup failed: {0}")]
    Startup(#[from] PlayerError),

    #[error("Async runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Host-side options for a replay run.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    /// Nominal render rate of the simulated host
    pub render_hz: f64,

    /// Render frame-time jitter as a fraction of a frame
    pub jitter: f64,

    /// Seed for the jitter RNG
    pub seed: u64,

    /// Host time to run for, in seconds
    pub duration_secs: f64,

    /// Capture every advance for export
    pub record: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            render_hz: 60.0,
            jitter: 0.0,
            seed: 42,
            duration_secs: 10.0,
            record: false,
        }
    }
}

/// A player failure, flattened for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub player: String,
    pub frame: u32,
    pub message: String,
}

impl std::fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} halted at frame {}: {}", self.player, self.frame, self.message)
    }
}

/// Results from a replay run.
#[derive(Debug, Clone)]
pub struct ReplayResult {
    /// Jitter seed used
    pub seed: u64,

    /// Host ticks executed
    pub host_ticks: u64,

    /// Frame advances executed
    pub advances: u64,

    /// Times playback wrapped to the loop restart
    pub loops: u64,

    /// Frame the next advance would apply
    pub final_index: u32,

    /// Host time covered, in seconds
    pub host_time_secs: f64,

    /// Playback reached the bound with stop-at-end
    pub finished: bool,

    /// Player failures in the order they happened
    pub failures: Vec<FailureRecord>,

    /// Recorded frames, when recording was requested
    pub export: Option<ReplayExport>,
}

impl ReplayResult {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs playback sessions against a host.
pub struct ReplayRunner {
    config: PlaybackConfig,
    options: ReplayOptions,
    reader: Arc<dyn FrameReader>,
}

impl ReplayRunner {
    /// Creates a runner reading frames from disk.
    pub fn new(config: PlaybackConfig, options: ReplayOptions) -> Self {
        Self::with_reader(config, options, Arc::new(DiskReader))
    }

    /// Creates a runner with a custom frame reader.
    pub fn with_reader(config: PlaybackConfig, options: ReplayOptions, reader: Arc<dyn FrameReader>) -> Self {
        Self {
            config,
            options,
            reader,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn options(&self) -> &ReplayOptions {
        &self.options
    }

    /// Runs on a fresh headless scene with virtual time.
    pub fn run(&self) -> Result<ReplayResult, ReplayError> {
        let mut scene = HeadlessScene::new();
        self.run_recorded(&mut scene, |scene| scene, |_, _| {})
    }

    /// Runs on a Rerun-backed scene, flushing it after every advance.
    pub fn run_visualized(&self, scene: &mut RerunScene) -> Result<ReplayResult, ReplayError> {
        self.run_recorded(scene, RerunScene::inner, |scene, host_time| scene.flush(host_time))
    }

    fn run_recorded<H, V, F>(&self, host: &mut H, view: V, mut after: F) -> Result<ReplayResult, ReplayError>
    where
        H: SceneHost,
        V: Fn(&H) -> &HeadlessScene,
        F: FnMut(&H, f64),
    {
        let mut export = self.options.record.then(|| self.new_export());

        let mut result = self.run_on(host, |host, controller, report, host_time| {
            if let Some(export) = export.as_mut() {
                if let Some(frame) = ReplayFrame::capture(view(host), controller, report, host_time) {
                    export.add_frame(frame);
                }
            }
            after(host, host_time);
        })?;

        if let Some(mut export) = export {
            export.finalize(result.host_time_secs, result.failures.iter().map(|f| f.to_string()).collect());
            result.export = Some(export);
        }
        Ok(result)
    }

    /// Runs on any scene host with virtual time.
    ///
    /// `on_advance` is called after every tick that advanced a frame, with the
    /// host time in seconds.
    pub fn run_on<H, F>(&self, host: &mut H, mut on_advance: F) -> Result<ReplayResult, ReplayError>
    where
        H: SceneHost,
        F: FnMut(&H, &PlaybackController, &TickReport, f64),
    {
        let mut controller = PlaybackController::with_reader(self.config.clone(), self.reader.clone())?;
        controller.start(host)?;

        let mut clock = SimHostClock::new(self.options.render_hz, self.options.jitter, self.options.seed);
        let limit = duration_limit(self.options.duration_secs);
        let mut failures = Vec::new();

        info!(
            "Replaying {} for {:.1}s at {:.0} Hz (jitter {:.0}%, seed={})",
            self.config.base_path.display(),
            limit.as_secs_f64(),
            self.options.render_hz,
            clock.jitter() * 100.0,
            self.options.seed
        );

        while clock.elapsed() < limit {
            let delta = clock.next_delta();
            let report = controller.update(host, delta);
            if report.advanced() {
                on_advance(host, &controller, &report, clock.elapsed().as_secs_f64());
            }
            collect_failures(&report, &mut failures);

            if report.finished {
                debug!("Playback finished after {} host ticks", clock.ticks());
                break;
            }
        }

        Ok(self.finish(&controller, clock.ticks(), clock.elapsed(), failures))
    }

    /// Runs on a fresh headless scene, ticking on a real-time tokio interval.
    pub async fn run_realtime(&self) -> Result<ReplayResult, ReplayError> {
        let mut scene = HeadlessScene::new();
        let mut controller = PlaybackController::with_reader(self.config.clone(), self.reader.clone())?;
        controller.start(&mut scene)?;

        let period = SimHostClock::new(self.options.render_hz, 0.0, self.options.seed).base();
        let limit = duration_limit(self.options.duration_secs);
        let start = tokio::time::Instant::now();
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut last = start;
        let mut ticks = 0u64;
        let mut failures = Vec::new();
        let mut export = self.options.record.then(|| self.new_export());

        info!("Replaying {} in real time at {:?} per frame", self.config.base_path.display(), period);

        loop {
            let now = interval.tick().await;
            if now.duration_since(start) >= limit {
                break;
            }

            let report = controller.update(&mut scene, now.duration_since(last));
            last = now;
            ticks += 1;
            if let Some(export) = export.as_mut() {
                let host_time = now.duration_since(start).as_secs_f64();
                if let Some(frame) = ReplayFrame::capture(&scene, &controller, &report, host_time) {
                    export.add_frame(frame);
                }
            }
            collect_failures(&report, &mut failures);

            if report.finished {
                break;
            }
        }

        let mut result = self.finish(&controller, ticks, last.duration_since(start), failures);
        if let Some(mut export) = export {
            export.finalize(result.host_time_secs, result.failures.iter().map(|f| f.to_string()).collect());
            result.export = Some(export);
        }
        Ok(result)
    }

    fn new_export(&self) -> ReplayExport {
        ReplayExport::new(
            &self.config.base_path.display().to_string(),
            self.options.seed,
            self.config.total_frames,
            self.config.tick_interval_secs,
        )
    }

    fn finish(
        &self,
        controller: &PlaybackController,
        host_ticks: u64,
        elapsed: Duration,
        failures: Vec<FailureRecord>,
    ) -> ReplayResult {
        let result = ReplayResult {
            seed: self.options.seed,
            host_ticks,
            advances: controller.advances(),
            loops: controller.loops(),
            final_index: controller.current_index(),
            host_time_secs: elapsed.as_secs_f64(),
            finished: controller.is_finished(),
            failures,
            export: None,
        };

        if result.passed() {
            info!(
                "✓ Replay complete: {} advances over {} host ticks ({} loops)",
                result.advances, result.host_ticks, result.loops
            );
        } else {
            warn!("Replay finished with {} player failure(s)", result.failures.len());
        }
        result
    }
}

fn duration_limit(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

fn collect_failures(report: &TickReport, failures: &mut Vec<FailureRecord>) {
    for failure in &report.failures {
        error!("  ✗ {} frame {}: {}", failure.player, failure.frame, failure.error);
        failures.push(FailureRecord {
            player: failure.player.to_string(),
            frame: failure.frame,
            message: failure.error.to_string(),
        });
    }
}
