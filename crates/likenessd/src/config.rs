use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing the SCRFD ONNX model.
    pub model_dir: PathBuf,
    /// Side length of the stabilized square crop, in pixels.
    pub square_size: u32,
    /// Thumbnail grid dimensions; rows × cols is the `numVids` sent to
    /// the matcher.
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Capture loop period.
    pub tick_interval: Duration,
}

impl Config {
    /// Load configuration from `LIKENESS_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("LIKENESS_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/usr/share/likeness/models"));

        Self {
            camera_device: std::env::var("LIKENESS_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir,
            square_size: env_u32("LIKENESS_SQUARE_SIZE", 300),
            grid_rows: env_usize("LIKENESS_GRID_ROWS", 11),
            grid_cols: env_usize("LIKENESS_GRID_COLS", 21),
            tick_interval: Duration::from_millis(env_u64("LIKENESS_TICK_MS", 33)),
        }
    }

    /// Path to the SCRFD detection model.
    pub fn scrfd_model_path(&self) -> String {
        self.model_dir
            .join("det_10g.onnx")
            .to_string_lossy()
            .into_owned()
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
