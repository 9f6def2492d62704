use dioxus::logger::tracing::warn;

use crate::stage::StageSettings;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};

/// localStorage key holding a JSON settings override.
pub const SETTINGS_KEY: &str = "reelstage.settings";

/// Parse an optional JSON override, falling back to defaults when it is
/// missing or malformed.
pub fn settings_from_override(raw: Option<&str>) -> StageSettings {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return StageSettings::default();
    };
    match StageSettings::from_json(raw) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("ignoring {SETTINGS_KEY}: {err}");
            StageSettings::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn load_settings() -> StageSettings {
    let raw = LocalStorage::raw().get_item(SETTINGS_KEY).ok().flatten();
    settings_from_override(raw.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_override_uses_defaults() {
        assert_eq!(settings_from_override(None), StageSettings::default());
        assert_eq!(settings_from_override(Some("  ")), StageSettings::default());
    }

    #[test]
    fn valid_override_is_applied() {
        let settings = settings_from_override(Some(r#"{"scroll_apply_interval_ms": 100}"#));
        assert_eq!(settings.scroll_apply_interval_ms, 100);
    }

    #[test]
    fn malformed_override_falls_back() {
        assert_eq!(
            settings_from_override(Some("[1, 2")),
            StageSettings::default()
        );
    }
}
