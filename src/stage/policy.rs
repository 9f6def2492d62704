use std::time::Duration;

use dioxus::logger::tracing::warn;
use serde::{Deserialize, Serialize};

use super::error::StageError;

pub const ATTR_PLAY_WHEN_IN_VIEW: &str = "data-video-play-when-in-view";
pub const ATTR_PRELOAD: &str = "data-video-preload";
pub const ATTR_FADE_IN: &str = "data-video-fade-in";
pub const ATTR_BIND_SCROLL: &str = "data-video-bind-scroll";
pub const ATTR_VOLUME: &str = "data-video-volume";
pub const ATTR_SIZE: &str = "data-video-size";
/// Written back onto each managed element once it has an id.
pub const ATTR_INSTANCE_ID: &str = "data-video-id";

/// How the media is fitted into its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    #[default]
    None,
    Cover,
    Contain,
}

impl SizeMode {
    /// Unknown values map to `None` (no sizing) rather than failing.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "cover" => SizeMode::Cover,
            "contain" => SizeMode::Contain,
            _ => SizeMode::None,
        }
    }

    pub fn is_sized(&self) -> bool {
        !matches!(self, SizeMode::None)
    }
}

/// Snapshot of the configuration flags of one element, read once at discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPolicy {
    pub play_when_in_view: bool,
    pub preload: bool,
    pub fade_in: bool,
    pub initial_volume: f64,
    pub bind_scroll: bool,
    pub size_mode: SizeMode,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            play_when_in_view: false,
            preload: false,
            fade_in: false,
            initial_volume: 0.0,
            bind_scroll: false,
            size_mode: SizeMode::None,
        }
    }
}

impl MediaPolicy {
    /// Build a policy from element attributes.
    ///
    /// `lookup` returns the raw attribute value, or `None` when the attribute
    /// is absent. Malformed values fall back to the field default.
    pub fn from_attributes<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |name: &str| lookup(name).map(|v| v.trim() == "true").unwrap_or(false);

        let defaults = MediaPolicy::default();
        let initial_volume = match lookup(ATTR_VOLUME) {
            Some(raw) => parse_volume(&raw).unwrap_or_else(|| {
                warn!("ignoring malformed {ATTR_VOLUME}={raw:?}");
                defaults.initial_volume
            }),
            None => defaults.initial_volume,
        };

        let size_mode = match lookup(ATTR_SIZE) {
            Some(raw) => {
                let mode = SizeMode::parse(&raw);
                if mode == SizeMode::None {
                    warn!("unrecognised {ATTR_SIZE}={raw:?}, sizing disabled");
                }
                mode
            }
            None => SizeMode::None,
        };

        Self {
            play_when_in_view: flag(ATTR_PLAY_WHEN_IN_VIEW),
            preload: flag(ATTR_PRELOAD),
            fade_in: flag(ATTR_FADE_IN),
            initial_volume,
            bind_scroll: flag(ATTR_BIND_SCROLL),
            size_mode,
        }
    }
}

fn parse_volume(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 1.0))
}

/// Global knobs for the stage. Every field has a default so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default = "default_scroll_apply_interval_ms")]
    pub scroll_apply_interval_ms: u32,
    #[serde(default = "default_stuck_timeout_ms")]
    pub stuck_timeout_ms: u32,
    #[serde(default = "default_fade_in_duration_ms")]
    pub fade_in_duration_ms: u32,
    #[serde(default = "default_preload_nudge_seconds")]
    pub preload_nudge_seconds: f64,
}

fn default_selector() -> String {
    ".js-video-player".to_string()
}

fn default_scroll_apply_interval_ms() -> u32 {
    50
}

fn default_stuck_timeout_ms() -> u32 {
    1000
}

fn default_fade_in_duration_ms() -> u32 {
    1500
}

fn default_preload_nudge_seconds() -> f64 {
    1.0
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            scroll_apply_interval_ms: default_scroll_apply_interval_ms(),
            stuck_timeout_ms: default_stuck_timeout_ms(),
            fade_in_duration_ms: default_fade_in_duration_ms(),
            preload_nudge_seconds: default_preload_nudge_seconds(),
        }
    }
}

impl StageSettings {
    pub fn from_json(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn scroll_apply_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.scroll_apply_interval_ms.max(1)))
    }

    pub fn stuck_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.stuck_timeout_ms))
    }

    pub fn fade_in_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.fade_in_duration_ms))
    }
}
