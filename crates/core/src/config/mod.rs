use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Settings for the host loop that drives a timeline.
///
/// None of these describe scenes; the scene graph is always built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Frames (beats) shown per second in real-time mode.
    pub fps: u32,
    /// Canvas width in character cells.
    pub width: u16,
    /// Canvas height in character cells.
    pub height: u16,
    pub layers: usize,
    /// Stop after this many frames. `None` runs until the timeline signals
    /// completion.
    pub beats: Option<u64>,
    /// Sleep between frames. Disable for tests and piping.
    pub realtime: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fps: 12,
            width: 60,
            height: 20,
            layers: 3,
            beats: None,
            realtime: true,
        }
    }
}

impl HostConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Wall-clock time of one frame. Zero fps is treated as one frame per second.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(1) / self.fps.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimelineError;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = HostConfig::from_json_str(r#"{ "fps": 30, "beats": 90 }"#).unwrap();

        assert_eq!(config.fps, 30);
        assert_eq!(config.beats, Some(90));
        assert_eq!(config.width, HostConfig::default().width);
        assert!(config.realtime);
    }

    #[test]
    fn frame_interval_follows_fps() {
        let config = HostConfig {
            fps: 4,
            ..Default::default()
        };
        assert_eq!(config.frame_interval().as_millis(), 250);
        let zero = HostConfig {
            fps: 0,
            ..Default::default()
        };
        assert_eq!(zero.frame_interval().as_secs(), 1);
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = HostConfig::from_json_str("{ fps: ").unwrap_err();
        assert!(matches!(err, TimelineError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = HostConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, TimelineError::Io(_)));
    }
}
