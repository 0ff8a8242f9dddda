//! likeness-hw — Hardware abstraction for color camera capture.
//!
//! Provides V4L2-based camera access producing packed-BGR frames, plus
//! the pixel conversions the stabilization pipeline needs (YUYV decode,
//! RGB emission, bilinear resize).

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, FrameSource, PixelFormat};
pub use frame::Frame;
