//! Gesture timing and distance thresholds.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// A press released within this many milliseconds counts as a tap.
    pub tap_max_ms: u64,
    /// A press that wanders further than this is no longer a tap.
    pub tap_max_dist_px: f32,
    /// Window after a tap during which another tap extends the count.
    pub multi_tap_window_ms: u64,
    /// Hold duration before a stationary press becomes a long press.
    pub long_press_ms: u64,
    /// Movement allowed while waiting for a long press.
    pub long_press_slop_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_max_ms: 300,
            tap_max_dist_px: 30.0,
            multi_tap_window_ms: 400,
            long_press_ms: 500,
            long_press_slop_px: 6.0,
        }
    }
}

impl GestureConfig {
    /// Reads a config file, falling back to defaults when the file is
    /// missing or malformed.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("ignoring malformed gesture config {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = GestureConfig::default();
        assert!(cfg.tap_max_ms < cfg.long_press_ms);
        assert!(cfg.tap_max_dist_px > cfg.long_press_slop_px);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let cfg: GestureConfig = serde_json::from_str(r#"{"tap_max_ms": 250}"#).unwrap();
        assert_eq!(cfg.tap_max_ms, 250);
        assert_eq!(cfg.long_press_ms, 500);
    }

    #[test]
    fn missing_file_falls_back() {
        let cfg = GestureConfig::load(Path::new("/nonexistent/gestures.json"));
        assert_eq!(cfg.tap_max_ms, GestureConfig::default().tap_max_ms);
    }
}
