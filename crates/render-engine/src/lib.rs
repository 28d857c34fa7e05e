//! Hyperlapse Render Engine
//!
//! Frame I/O and the two-pass stabilization pipeline that turns a
//! shaky source video into a smoothed time-lapse.
//!
//! # Pipeline Architecture
//!
//! ```text
//! input.mp4 ──pass 1──> MotionEstimator ──> Trajectory
//!                                              │
//!                                     Savitzky-Golay smoothing,
//!                                     subsampling, re-smoothing
//!                                              │
//!                                              ▼
//!                                     TransformTrajectory
//!                                              │
//!                                     StabilizationPlanner
//!                                        (crop | overlay)
//!                                              │
//! input.mp4 ──pass 2──> FrameRenderer <────────┘
//!                           │
//!                           ▼
//!                       output.mp4
//! ```

pub mod pipeline;
pub mod renderer;
pub mod sink;
pub mod source;
pub mod warp;

pub use pipeline::*;
