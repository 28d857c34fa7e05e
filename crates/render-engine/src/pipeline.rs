//! The two-pass hyperlapse pipeline.
//!
//! Pass one decodes every frame, estimates inter-frame motion, and
//! accumulates the camera trajectory. The trajectory is then smoothed,
//! subsampled, and turned into a stabilization plan. Pass two decodes
//! the stream again, keeps every k-th frame, cancels its residual
//! motion, and feeds it to the encoder.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hyperlapse_common::{HyperlapseConfig, HyperlapseError, HyperlapseResult};
use hyperlapse_processing_core::{
    compute_motion_plan, MotionEstimator, StabilizationPlanner, TrajectoryBuilder,
};
use hyperlapse_video_model::{Frame, StabilizationPlan, Trajectory, VideoMeta};

use crate::renderer::renderer_for_plan;
use crate::sink::{FfmpegFrameSink, FrameSink};
use crate::source::{FfmpegFrameSource, FrameSource};

/// One stabilization job: where to read, where to write, how to tune.
#[derive(Debug, Clone)]
pub struct HyperlapseJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub config: HyperlapseConfig,
}

impl HyperlapseJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, config: HyperlapseConfig) -> Self {
        Self {
            input_path: input.into(),
            output_path: output.into(),
            config,
        }
    }
}

/// Where in the pipeline a progress report comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Analyzing,
    Smoothing,
    Rendering,
    Complete,
}

/// A progress report emitted during a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub stage: PipelineStage,
    pub current: u64,
    pub total: u64,
}

impl PipelineProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64
    }
}

pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send>;

/// Everything the analysis pass learns about a stream, without
/// rendering anything. Serializable for machine consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub meta: VideoMeta,
    pub smoothing_window: usize,
    pub retained_frames: usize,
    pub output_fps: f64,
    pub plan: StabilizationPlan,
}

/// Pass one: accumulate the camera trajectory over the whole stream.
///
/// Unreadable frames contribute zero motion, so the trajectory always
/// has exactly one point per declared frame.
pub fn build_trajectory(
    source: &mut dyn FrameSource,
    estimator: &MotionEstimator,
    progress: Option<&ProgressCallback>,
) -> HyperlapseResult<Trajectory> {
    let total = source.meta().total_frames;
    let mut builder = TrajectoryBuilder::new();
    let mut prev: Option<Frame> = None;

    for idx in 0..total {
        let curr = source.read_frame()?;

        if idx > 0 {
            let motion = estimator.estimate(prev.as_ref(), curr.as_ref());
            builder.push_motion(motion);
        }

        prev = curr;

        if let Some(cb) = progress {
            cb(PipelineProgress {
                stage: PipelineStage::Analyzing,
                current: idx + 1,
                total,
            });
        }
    }

    let trajectory = builder.finish();
    tracing::info!(frames = trajectory.len(), "Trajectory accumulated");
    Ok(trajectory)
}

fn validate_job(job: &HyperlapseJob) -> HyperlapseResult<()> {
    job.config.validate()?;
    if job.input_path == job.output_path {
        return Err(HyperlapseError::config(
            "Input and output paths must differ",
        ));
    }
    if !job.input_path.exists() {
        return Err(HyperlapseError::FileNotFound {
            path: job.input_path.clone(),
        });
    }
    Ok(())
}

/// Shared analysis front half: trajectory, motion plan, render plan.
fn analyze_stream(
    job: &HyperlapseJob,
    progress: Option<&ProgressCallback>,
) -> HyperlapseResult<(VideoMeta, hyperlapse_processing_core::MotionPlan, StabilizationPlan)> {
    let mut source = FfmpegFrameSource::open(&job.input_path)?;
    let meta = source.meta();
    tracing::info!(
        input = %job.input_path.display(),
        width = meta.width,
        height = meta.height,
        fps = meta.fps,
        total_frames = meta.total_frames,
        "Analyzing stream"
    );

    let estimator = MotionEstimator::from_config(&job.config);
    let trajectory = build_trajectory(&mut source, &estimator, progress)?;
    drop(source);

    if let Some(cb) = progress {
        cb(PipelineProgress {
            stage: PipelineStage::Smoothing,
            current: 0,
            total: 1,
        });
    }

    let motion_plan = compute_motion_plan(
        &trajectory,
        meta.fps,
        job.config.speed_up as usize,
        job.config.smoothing_secs,
        job.config.poly_order,
    )?;

    let planner = StabilizationPlanner::new(job.config.crop_threshold);
    let plan = planner.plan(&motion_plan.transform, meta.width, meta.height);

    Ok((meta, motion_plan, plan))
}

/// Analyze a stream without rendering: the dry-run entry point.
pub async fn analyze_hyperlapse(
    job: &HyperlapseJob,
    progress: Option<ProgressCallback>,
) -> HyperlapseResult<AnalysisReport> {
    validate_job(job)?;
    let job = job.clone();

    tokio::task::spawn_blocking(move || {
        let (meta, motion_plan, plan) = analyze_stream(&job, progress.as_ref())?;
        Ok(AnalysisReport {
            meta,
            smoothing_window: motion_plan.window,
            retained_frames: motion_plan.transform.len(),
            output_fps: meta.fps,
            plan,
        })
    })
    .await
    .map_err(|e| HyperlapseError::Other(anyhow::anyhow!("Analysis task failed: {e}")))?
}

/// Run a complete stabilization job: analyze, plan, render, encode.
pub async fn run_hyperlapse(
    job: &HyperlapseJob,
    progress: Option<ProgressCallback>,
) -> HyperlapseResult<StabilizationPlan> {
    validate_job(job)?;
    let job = job.clone();

    tokio::task::spawn_blocking(move || {
        let (meta, motion_plan, plan) = analyze_stream(&job, progress.as_ref())?;
        render_pass(&job, meta, &motion_plan.transform, &plan, progress.as_ref())?;

        if let Some(cb) = progress.as_ref() {
            cb(PipelineProgress {
                stage: PipelineStage::Complete,
                current: 1,
                total: 1,
            });
        }
        Ok(plan)
    })
    .await
    .map_err(|e| HyperlapseError::Other(anyhow::anyhow!("Render task failed: {e}")))?
}

/// Pass two: re-decode, keep every k-th frame, cancel residual motion,
/// encode. Ends cleanly if the stream runs short of the declared count.
fn render_pass(
    job: &HyperlapseJob,
    meta: VideoMeta,
    transform: &[hyperlapse_video_model::TrajPoint],
    plan: &StabilizationPlan,
    progress: Option<&ProgressCallback>,
) -> HyperlapseResult<()> {
    let speed_up = job.config.speed_up.max(1) as usize;
    let total = transform.len() as u64;

    tracing::info!(
        output = %job.output_path.display(),
        strategy = ?plan.strategy,
        frames = total,
        speed_up,
        "Rendering stabilized output"
    );

    let mut source = FfmpegFrameSource::open(&job.input_path)?;
    let mut sink = FfmpegFrameSink::create(
        &job.output_path,
        plan.output_width,
        plan.output_height,
        meta.fps,
        &job.config.codec,
    )?;
    let mut renderer = renderer_for_plan(plan);

    'outer: for (i, &offset) in transform.iter().enumerate() {
        let Some(frame) = source.read_frame()? else {
            tracing::warn!(rendered = i, expected = total, "Stream ended early");
            break;
        };

        let stabilized = renderer.render(&frame, offset)?;
        sink.write_frame(&stabilized)?;

        if let Some(cb) = progress {
            cb(PipelineProgress {
                stage: PipelineStage::Rendering,
                current: i as u64 + 1,
                total,
            });
        }

        // Discard the frames the speed-up skips over.
        for _ in 1..speed_up {
            if source.read_frame()?.is_none() {
                break 'outer;
            }
        }
    }

    sink.finish()
}

/// Report whether the external tools the pipeline shells out to are
/// available.
pub fn check_environment() -> Vec<(&'static str, bool)> {
    vec![
        ("ffmpeg", crate::source::command_exists("ffmpeg")),
        ("ffprobe", crate::source::command_exists("ffprobe")),
    ]
}

/// Probe an input file without decoding it.
pub fn probe(path: &Path) -> HyperlapseResult<VideoMeta> {
    if !path.exists() {
        return Err(HyperlapseError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    crate::source::probe_video(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperlapse_processing_core::{
        FeatureDetector, FeaturePoint, FlowTracker, TrackStatus, TrackedPoint,
    };
    use hyperlapse_video_model::GrayImage;

    /// In-memory source producing solid frames that drift rightward.
    struct DriftSource {
        meta: VideoMeta,
        emitted: u64,
        limit: u64,
    }

    impl DriftSource {
        fn new(total_frames: u64, limit: u64) -> Self {
            Self {
                meta: VideoMeta {
                    width: 32,
                    height: 24,
                    fps: 30.0,
                    total_frames,
                },
                emitted: 0,
                limit,
            }
        }
    }

    impl FrameSource for DriftSource {
        fn meta(&self) -> VideoMeta {
            self.meta
        }

        fn read_frame(&mut self) -> HyperlapseResult<Option<Frame>> {
            if self.emitted >= self.limit {
                return Ok(None);
            }
            self.emitted += 1;
            Ok(Some(Frame::black(32, 24, 3)))
        }
    }

    struct OnePointDetector;

    impl FeatureDetector for OnePointDetector {
        fn detect(&self, _image: &GrayImage) -> Vec<FeaturePoint> {
            vec![FeaturePoint { x: 16.0, y: 12.0, score: 1.0 }]
        }
    }

    /// Pretends every feature moved by a fixed amount.
    struct ConstantShift {
        dx: f32,
        dy: f32,
    }

    impl FlowTracker for ConstantShift {
        fn track(
            &self,
            _prev: &GrayImage,
            _next: &GrayImage,
            features: &[FeaturePoint],
        ) -> Vec<TrackedPoint> {
            features
                .iter()
                .map(|p| TrackedPoint {
                    x: p.x + self.dx,
                    y: p.y + self.dy,
                    status: TrackStatus::Tracked,
                })
                .collect()
        }
    }

    fn drift_estimator() -> MotionEstimator {
        MotionEstimator::new(
            Box::new(OnePointDetector),
            Box::new(ConstantShift { dx: 2.0, dy: 1.0 }),
        )
    }

    #[test]
    fn test_trajectory_length_matches_declared_frames() {
        let mut source = DriftSource::new(10, 10);
        let traj = build_trajectory(&mut source, &drift_estimator(), None).unwrap();
        assert_eq!(traj.len(), 10);
    }

    #[test]
    fn test_short_stream_still_yields_full_trajectory() {
        // Reads past the end return None; motion falls back to zero and
        // the trajectory keeps its declared length.
        let mut source = DriftSource::new(10, 6);
        let traj = build_trajectory(&mut source, &drift_estimator(), None).unwrap();
        assert_eq!(traj.len(), 10);
        assert_eq!(traj[9], traj[5]);
    }

    #[test]
    fn test_trajectory_accumulates_motion() {
        // Tracker reports features at +2,+1, so the camera moved -2,-1
        // per transition.
        let mut source = DriftSource::new(5, 5);
        let traj = build_trajectory(&mut source, &drift_estimator(), None).unwrap();
        assert!((traj[4].x - (-8.0)).abs() < 1e-6);
        assert!((traj[4].y - (-4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_progress_reported_per_frame() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let cb: ProgressCallback = Box::new(move |p| {
            assert_eq!(p.stage, PipelineStage::Analyzing);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut source = DriftSource::new(8, 8);
        build_trajectory(&mut source, &drift_estimator(), Some(&cb)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_progress_fraction() {
        let p = PipelineProgress {
            stage: PipelineStage::Rendering,
            current: 5,
            total: 20,
        };
        assert!((p.fraction() - 0.25).abs() < 1e-12);

        let empty = PipelineProgress {
            stage: PipelineStage::Rendering,
            current: 0,
            total: 0,
        };
        assert_eq!(empty.fraction(), 0.0);
    }

    #[test]
    fn test_validate_rejects_same_input_output() {
        let job = HyperlapseJob::new("a.mp4", "a.mp4", HyperlapseConfig::default());
        assert!(validate_job(&job).is_err());
    }
}
