//! Configuration for the reference client.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use framelink_core::{SessionConfig, StreamConfig};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Streaming settings.
    pub stream: StreamSection,
    /// Synthetic capture settings.
    pub capture: CaptureSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

/// Streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSection {
    /// WebSocket endpoint to stream to.
    pub endpoint: String,
    /// JPEG quality (1..=100).
    pub jpeg_quality: u8,
    /// Transport handshake deadline in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-frame transmission deadline in milliseconds.
    pub send_timeout_ms: u64,
}

/// Synthetic capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSection {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            stream: StreamSection::default(),
            capture: CaptureSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            endpoint: "ws://10.0.2.2:8080/stream".into(),
            jpeg_quality: 85,
            connect_timeout_ms: 10_000,
            send_timeout_ms: 15_000,
        }
    }
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Convert the streaming settings into a `StreamConfig`.
    pub fn to_stream_config(&self) -> StreamConfig {
        StreamConfig {
            jpeg_quality: self.stream.jpeg_quality.clamp(1, 100),
            session: SessionConfig {
                connect_timeout: Duration::from_millis(self.stream.connect_timeout_ms.max(100)),
                send_timeout: Duration::from_millis(self.stream.send_timeout_ms.max(100)),
            },
            ..StreamConfig::default()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = ClientConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("endpoint"));
        assert!(text.contains("fps"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = ClientConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.stream.endpoint, "ws://10.0.2.2:8080/stream");
        assert_eq!(parsed.capture.fps, 30);
    }

    #[test]
    fn to_stream_config_clamps() {
        let mut cfg = ClientConfig::default();
        cfg.stream.jpeg_quality = 150;
        cfg.stream.connect_timeout_ms = 0;
        let stream = cfg.to_stream_config();
        assert_eq!(stream.jpeg_quality, 100);
        assert_eq!(stream.session.connect_timeout, Duration::from_millis(100));
    }
}
