//! Constant-velocity Kalman filter for the tracked face center.
//!
//! State vector: [cx, cy, vx, vy]ᵀ (position + velocity in pixels/tick).
//! Measurement:  [cx, cy]ᵀ — the detector bounding-box centroid.
//!
//! Process noise is kept far below measurement noise so the estimate
//! favors the motion model over any single frame's detection.

use nalgebra::{Matrix2, Matrix2x4, Matrix4, Matrix4x2, Vector2, Vector4};

/// Process noise covariance scale (Q).
const PROCESS_NOISE: f32 = 1e-5;
/// Measurement noise covariance scale (R).
const MEASUREMENT_NOISE: f32 = 10.0;
/// Initial state covariance scale; large enough that the first
/// correction locks onto the measurement almost exactly.
const INITIAL_COVARIANCE: f32 = 100.0;

/// Smooths the face-center position across ticks, decoupling transient
/// detection jitter from the cropped output.
///
/// Call order per tick: [`predict`](Self::predict), then
/// [`correct`](Self::correct) when a detection exists. When no detection
/// exists the filter is not corrected; the estimate ages via prediction
/// alone.
pub struct MotionFilter {
    /// State: [cx, cy, vx, vy]
    x: Vector4<f32>,
    /// State covariance
    p: Matrix4<f32>,
    /// State transition matrix (F)
    f: Matrix4<f32>,
    /// Measurement matrix (H): extracts [cx, cy] from state
    h: Matrix2x4<f32>,
    /// Process noise covariance (Q)
    q: Matrix4<f32>,
    /// Measurement noise covariance (R)
    r: Matrix2<f32>,
}

impl MotionFilter {
    pub fn new() -> Self {
        #[rustfmt::skip]
        let f = Matrix4::new(
            1.0, 0.0, 1.0, 0.0,
            0.0, 1.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        #[rustfmt::skip]
        let h = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );

        Self {
            x: Vector4::zeros(),
            p: Matrix4::identity() * INITIAL_COVARIANCE,
            f,
            h,
            q: Matrix4::identity() * PROCESS_NOISE,
            r: Matrix2::identity() * MEASUREMENT_NOISE,
        }
    }

    /// Advance the state one tick under the constant-velocity model.
    /// Returns the predicted center.
    pub fn predict(&mut self) -> (f32, f32) {
        self.x = self.f * self.x;
        self.p = self.f * self.p * self.f.transpose() + self.q;
        (self.x[0], self.x[1])
    }

    /// Fuse a measured face centroid into the state. Returns the
    /// corrected (smoothed) center.
    pub fn correct(&mut self, measurement: (f32, f32)) -> (f32, f32) {
        let z = Vector2::new(measurement.0, measurement.1);
        let innovation = z - self.h * self.x;
        let s = self.h * self.p * self.h.transpose() + self.r;
        // S = H P Hᵀ + R is positive definite for R > 0; the inverse
        // only fails on non-finite input, in which case the measurement
        // is ignored and the prediction stands.
        let Some(s_inv) = s.try_inverse() else {
            return (self.x[0], self.x[1]);
        };
        let k: Matrix4x2<f32> = self.p * self.h.transpose() * s_inv;
        self.x += k * innovation;
        self.p = (Matrix4::identity() - k * self.h) * self.p;
        (self.x[0], self.x[1])
    }

    /// Current position estimate without advancing or correcting.
    pub fn position(&self) -> (f32, f32) {
        (self.x[0], self.x[1])
    }
}

impl Default for MotionFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Corrected output must lie between the prior prediction and the raw
    /// measurement on each axis; smoothing never overshoots.
    #[test]
    fn test_correction_between_prediction_and_measurement() {
        let mut filter = MotionFilter::new();

        let measurements = [
            (100.0, 80.0),
            (104.0, 83.0),
            (97.0, 79.0),
            (110.0, 90.0),
            (250.0, 30.0), // large jump
            (108.0, 88.0),
        ];

        for &(mx, my) in &measurements {
            let (px, py) = filter.predict();
            let (cx, cy) = filter.correct((mx, my));

            let (lo_x, hi_x) = if px <= mx { (px, mx) } else { (mx, px) };
            let (lo_y, hi_y) = if py <= my { (py, my) } else { (my, py) };
            assert!(
                cx >= lo_x - 1e-3 && cx <= hi_x + 1e-3,
                "cx {cx} outside [{lo_x}, {hi_x}]"
            );
            assert!(
                cy >= lo_y - 1e-3 && cy <= hi_y + 1e-3,
                "cy {cy} outside [{lo_y}, {hi_y}]"
            );
        }
    }

    #[test]
    fn test_converges_to_static_measurement() {
        let mut filter = MotionFilter::new();
        for _ in 0..300 {
            filter.predict();
            filter.correct((320.0, 240.0));
        }
        let (x, y) = filter.position();
        assert!((x - 320.0).abs() < 2.0, "x did not converge: {x}");
        assert!((y - 240.0).abs() < 2.0, "y did not converge: {y}");
    }

    #[test]
    fn test_first_correction_locks_near_measurement() {
        let mut filter = MotionFilter::new();
        filter.predict();
        let (x, y) = filter.correct((500.0, 300.0));
        // Wide initial covariance: the first measurement dominates.
        assert!((x - 500.0).abs() < 50.0, "x too far from measurement: {x}");
        assert!((y - 300.0).abs() < 30.0, "y too far from measurement: {y}");
    }

    #[test]
    fn test_prediction_carries_velocity() {
        let mut filter = MotionFilter::new();
        // Constant motion to the right, 5 px/tick.
        for i in 0..100 {
            filter.predict();
            filter.correct((100.0 + 5.0 * i as f32, 200.0));
        }
        let before = filter.position();
        let after = filter.predict();
        assert!(
            after.0 > before.0 + 1.0,
            "prediction did not advance with learned velocity: {before:?} -> {after:?}"
        );
        assert!((after.1 - 200.0).abs() < 5.0);
    }

    #[test]
    fn test_predict_only_keeps_estimate_finite() {
        let mut filter = MotionFilter::new();
        filter.predict();
        filter.correct((50.0, 60.0));
        // Detection gap: prediction only, no correction.
        for _ in 0..50 {
            let (x, y) = filter.predict();
            assert!(x.is_finite() && y.is_finite());
        }
    }
}
