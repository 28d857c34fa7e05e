//! Hyperlapse Video Model
//!
//! Defines the core data contracts for the stabilization pipeline:
//! - **Frames:** Owned interleaved pixel buffers and grayscale intensity images
//! - **Trajectories:** Per-frame motion vectors and cumulative camera positions
//! - **Plans:** The crop-vs-overlay stabilization decision and output geometry
//!
//! All trajectory coordinates are in source-frame pixels. Positive x points
//! right and positive y points down, matching image conventions.

pub mod frame;
pub mod plan;
pub mod trajectory;

pub use frame::*;
pub use plan::*;
pub use trajectory::*;
