//! likeness-core — Face-centered stabilization math and mosaic placement.
//!
//! Provides the constant-velocity Kalman filter that smooths the tracked
//! face center, the crop-window resolver, the face-session state machine,
//! the similarity-ranked grid placement, and an SCRFD face detector
//! running via ONNX Runtime.

pub mod crop;
pub mod detector;
pub mod mosaic;
pub mod motion;
pub mod session;
pub mod sprite;
pub mod types;

pub use crop::{CropRect, CropWindowResolver};
pub use detector::{Detector, DetectorError, ScrfdDetector};
pub use mosaic::{MosaicLayout, Placement};
pub use motion::MotionFilter;
pub use session::{FaceSession, SessionEvent};
pub use types::{BoundingBox, GridPosition, MatchEntry, RankedMatches};
