//! CREASE Pose - Synthetic skeletal overlay
//!
//! This is NOT pose estimation. The overlay is a fixed skeleton seeded to
//! a reference batting pose whose points drift slightly on a fixed cadence
//! to look like live tracking.
//!
//! - Keypoints, topology and the seed pose
//! - Joint angle geometry
//! - The drift cadence
//! - Angle readouts and the tracking HUD

pub mod keypoint;
pub mod geometry;
pub mod cadence;
pub mod readout;

pub use keypoint::*;
pub use geometry::*;
pub use cadence::*;
pub use readout::*;
