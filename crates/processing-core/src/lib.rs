//! Hyperlapse Processing Core
//!
//! Turns a raw frame stream into a stabilization plan:
//! - **Motion Estimation:** Corner tracking between consecutive frames
//! - **Trajectory Building:** Accumulating per-frame motion into a camera path
//! - **Smoothing:** Savitzky-Golay filtering of the camera path
//! - **Planning:** The crop-vs-overlay rendering decision
//!
//! This crate is pure computation: no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod features;
pub mod motion;
pub mod optical_flow;
pub mod planner;
pub mod savgol;
pub mod trajectory;

pub use features::{FeatureDetector, FeaturePoint, ShiTomasiDetector};
pub use motion::MotionEstimator;
pub use optical_flow::{FlowTracker, PyramidalLk, TrackStatus, TrackedPoint};
pub use planner::StabilizationPlanner;
pub use trajectory::{compute_motion_plan, MotionPlan, TrajectoryBuilder};
