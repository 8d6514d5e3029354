//! INI config file loading.
//!
//! Overrides [`EngineConfig`] defaults from `storyatlas/config.ini` in the
//! platform config directory (or an explicit path). Unknown keys are
//! ignored; malformed values fall back to the default with a warning, so a
//! broken config file never prevents playback.
//!
//! ```ini
//! [playback]
//! surface_retry_ms = 250
//!
//! [fade]
//! crossfade_ms = 800
//! quick_update_ms = 150
//!
//! [camera]
//! fly_zoom_threshold = 2.0
//! fit_max_zoom = 17.0
//!
//! [route]
//! default_draw_duration_ms = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::{debug, warn};

use super::EngineConfig;

/// Loader for the engine's INI configuration file.
pub struct ConfigFile;

impl ConfigFile {
    /// Default config file location in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("storyatlas").join("config.ini"))
    }

    /// Load engine configuration, overriding defaults from the default
    /// config file location when it exists.
    pub fn load_default() -> EngineConfig {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => EngineConfig::default(),
        }
    }

    /// Load engine configuration from an explicit path.
    ///
    /// An unreadable file yields the defaults with a warning.
    pub fn load(path: &Path) -> EngineConfig {
        let mut config = EngineConfig::default();
        let ini = match Ini::load_from_file(path) {
            Ok(ini) => ini,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                return config;
            }
        };
        debug!(path = %path.display(), "Loading engine config");

        if let Some(section) = ini.section(Some("playback")) {
            if let Some(ms) = parse_u64(section.get("surface_retry_ms"), "playback.surface_retry_ms") {
                config.playback.surface_retry = Duration::from_millis(ms);
            }
        }
        if let Some(section) = ini.section(Some("fade")) {
            if let Some(ms) = parse_u64(section.get("crossfade_ms"), "fade.crossfade_ms") {
                config.fade.crossfade = Duration::from_millis(ms);
            }
            if let Some(ms) = parse_u64(section.get("quick_update_ms"), "fade.quick_update_ms") {
                config.fade.quick_update = Duration::from_millis(ms);
            }
            if let Some(ms) = parse_u64(section.get("frame_interval_ms"), "fade.frame_interval_ms")
            {
                config.fade.frame_interval = Duration::from_millis(ms.max(1));
            }
        }
        if let Some(section) = ini.section(Some("camera")) {
            if let Some(v) = parse_f64(
                section.get("fly_zoom_threshold"),
                "camera.fly_zoom_threshold",
            ) {
                config.camera.fly_zoom_threshold = v;
            }
            if let Some(v) = parse_f64(section.get("fly_rise"), "camera.fly_rise") {
                config.camera.fly_rise = v;
            }
            if let Some(ms) = parse_u64(section.get("fly_phase1_ms"), "camera.fly_phase1_ms") {
                config.camera.fly_phase1 = Duration::from_millis(ms);
            }
            if let Some(ms) = parse_u64(section.get("fly_phase2_ms"), "camera.fly_phase2_ms") {
                config.camera.fly_phase2 = Duration::from_millis(ms);
            }
            if let Some(v) = parse_f64(section.get("fit_padding_ratio"), "camera.fit_padding_ratio")
            {
                config.camera.fit_padding_ratio = v.clamp(0.0, 1.0);
            }
            if let Some(v) = parse_f64(section.get("fit_max_zoom"), "camera.fit_max_zoom") {
                config.camera.fit_max_zoom = v;
            }
        }
        if let Some(section) = ini.section(Some("route")) {
            if let Some(ms) = parse_u64(
                section.get("default_draw_duration_ms"),
                "route.default_draw_duration_ms",
            ) {
                config.route.default_draw_duration = Duration::from_millis(ms);
            }
            if let Some(ms) = parse_u64(section.get("frame_interval_ms"), "route.frame_interval_ms")
            {
                config.route.frame_interval = Duration::from_millis(ms.max(1));
            }
        }

        config
    }
}

fn parse_u64(value: Option<&str>, key: &str) -> Option<u64> {
    let raw = value?;
    match raw.trim().parse::<u64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = raw, "Ignoring malformed config value");
            None
        }
    }
}

fn parse_f64(value: Option<&str>, key: &str) -> Option<f64> {
    let raw = value?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(key, value = raw, "Ignoring malformed config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_overrides_and_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[fade]\ncrossfade_ms = 500\nquick_update_ms = not-a-number\n\n[camera]\nfly_zoom_threshold = 3.0\n"
        )
        .unwrap();

        let config = ConfigFile::load(file.path());
        assert_eq!(config.fade.crossfade, Duration::from_millis(500));
        // Malformed value keeps the default.
        assert_eq!(
            config.fade.quick_update,
            Duration::from_millis(super::super::DEFAULT_QUICK_UPDATE_MS)
        );
        assert_eq!(config.camera.fly_zoom_threshold, 3.0);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = ConfigFile::load(Path::new("/nonexistent/storyatlas.ini"));
        assert_eq!(
            config.fade.crossfade,
            Duration::from_millis(super::super::DEFAULT_CROSSFADE_MS)
        );
    }
}
