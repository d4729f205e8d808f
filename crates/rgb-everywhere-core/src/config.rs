//! Configuration types for rgb-everywhere.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Region};

/// Application configuration loaded from a JSON or YAML file.
///
/// The flat camelCase keys of the older JSON format (`refresh`, `pathToExe`,
/// `display`) are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Sampling cadence in milliseconds
    #[serde(alias = "refresh", alias = "refreshIntervalMs")]
    pub refresh_interval_ms: u64,
    /// Path to the controller executable
    #[serde(alias = "pathToExe", alias = "controllerExecutablePath")]
    pub controller_executable_path: String,
    /// Index of the display to sample
    #[serde(alias = "display", alias = "displayIndex")]
    pub display_index: usize,
    /// Log every extracted palette
    pub verbose: bool,
    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[serde(alias = "logLevel")]
    pub log_level: String,
    /// Sampling settings
    pub sampling: SamplingSettings,
    /// Change detection settings
    #[serde(alias = "changeDetection")]
    pub change_detection: ChangeDetectionSettings,
    /// Controller process settings
    pub controller: ControllerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 500,
            controller_executable_path: String::new(),
            display_index: 0,
            verbose: false,
            log_level: "info".to_string(),
            sampling: SamplingSettings::default(),
            change_detection: ChangeDetectionSettings::default(),
            controller: ControllerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: AppConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.refresh_interval_ms == 0 {
            return Err(Error::Config("refresh_interval_ms must be > 0".to_string()));
        }

        if self.controller_executable_path.trim().is_empty() {
            return Err(Error::Config(
                "controller_executable_path must be set".to_string(),
            ));
        }

        self.sampling.validate()?;
        self.change_detection.validate()?;
        self.controller.validate()?;

        Ok(())
    }

    /// Sampling cadence as a duration.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

/// Which screen areas to sample and how many colors to take from each.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    /// Regions in declaration order (empty = the whole display)
    pub regions: Vec<Region>,
    /// Dominant colors extracted per region
    #[serde(alias = "colorsPerRegion")]
    pub colors_per_region: usize,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            regions: Vec::new(),
            colors_per_region: 3,
        }
    }
}

impl SamplingSettings {
    /// Validate the sampling settings.
    pub fn validate(&self) -> crate::Result<()> {
        if self.colors_per_region == 0 {
            return Err(Error::Config(
                "sampling.colors_per_region must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Probe-based change detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeDetectionSettings {
    /// Skip full sampling while the probe color is stable
    pub enabled: bool,
    /// Explicit probe region (None = centred square of `probe_size`)
    pub probe: Option<Region>,
    /// Side of the default probe square in pixels
    #[serde(alias = "probeSize")]
    pub probe_size: u32,
    /// Perceptual distance (CIE76 ΔE) above which the screen counts as changed
    pub threshold: f32,
}

impl Default for ChangeDetectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            probe: None,
            probe_size: 64,
            threshold: 51.0,
        }
    }
}

impl ChangeDetectionSettings {
    /// Validate the change detection settings.
    pub fn validate(&self) -> crate::Result<()> {
        if self.probe_size == 0 {
            return Err(Error::Config(
                "change_detection.probe_size must be > 0".to_string(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::Config(format!(
                "change_detection.threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// When the controller process is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// Launch with the first palette's channels as arguments
    #[default]
    FirstPalette,
    /// Launch at startup with the configured static arguments
    Startup,
}

/// What to do when the controller session is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLostPolicy {
    /// Tear down and exit the process
    #[default]
    Exit,
    /// Resample and launch a fresh controller on the next tick
    Relaunch,
    /// Keep sampling without a controller
    Continue,
}

/// Controller process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Static arguments (used in startup launch mode)
    pub args: Vec<String>,
    /// Separator between channel values on the wire
    pub separator: String,
    /// Launch mode
    pub launch: LaunchMode,
    /// Policy on session loss
    #[serde(alias = "onSessionLost")]
    pub on_session_lost: SessionLostPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            separator: ",".to_string(),
            launch: LaunchMode::default(),
            on_session_lost: SessionLostPolicy::default(),
        }
    }
}

impl ControllerSettings {
    /// Validate the controller settings.
    ///
    /// The separator must be non-empty and must not contain digits or line
    /// breaks, otherwise a line could not be split back into channels.
    pub fn validate(&self) -> crate::Result<()> {
        if self.separator.is_empty() {
            return Err(Error::Config(
                "controller.separator cannot be empty".to_string(),
            ));
        }
        if self
            .separator
            .chars()
            .any(|c| c.is_ascii_digit() || c == '\n' || c == '\r')
        {
            return Err(Error::Config(format!(
                "controller.separator {:?} must not contain digits or line breaks",
                self.separator
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        AppConfig {
            controller_executable_path: "/usr/local/bin/pulse".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.refresh_interval_ms, 500);
        assert_eq!(config.display_index, 0);
        assert!(!config.verbose);
        assert_eq!(config.sampling.colors_per_region, 3);
        assert!(config.sampling.regions.is_empty());
        assert!(config.change_detection.enabled);
        assert_eq!(config.change_detection.threshold, 51.0);
        assert_eq!(config.controller.separator, ",");
        assert_eq!(config.controller.launch, LaunchMode::FirstPalette);
        assert_eq!(config.controller.on_session_lost, SessionLostPolicy::Exit);
    }

    #[test]
    fn test_config_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_executable() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_refresh_interval() {
        let mut config = valid_config();
        config.refresh_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_colors_per_region() {
        let mut config = valid_config();
        config.sampling.colors_per_region = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = valid_config();
        config.change_detection.threshold = -1.0;
        assert!(config.validate().is_err());

        config.change_detection.threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_separator() {
        let mut config = valid_config();
        config.controller.separator = String::new();
        assert!(config.validate().is_err());

        config.controller.separator = "0".to_string();
        assert!(config.validate().is_err());

        config.controller.separator = "\n".to_string();
        assert!(config.validate().is_err());

        config.controller.separator = " ".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_refresh_interval() {
        let mut config = valid_config();
        config.refresh_interval_ms = 250;
        assert_eq!(config.refresh_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_parse_legacy_json() {
        let json = r#"{
            "refresh": 100,
            "pathToExe": "C:\\Tools\\color_pulse_by_device_index.exe",
            "display": 1,
            "mode": "kmeans"
        }"#;

        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.refresh_interval_ms, 100);
        assert_eq!(
            config.controller_executable_path,
            "C:\\Tools\\color_pulse_by_device_index.exe"
        );
        assert_eq!(config.display_index, 1);
        assert_eq!(config.sampling.colors_per_region, 3);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
refresh_interval_ms: 200
controller_executable_path: /opt/rgb/controller
display_index: 0
verbose: true
log_level: debug

sampling:
  colors_per_region: 3
  regions:
    - { x: 0, y: 0, width: 640, height: 1080 }
    - { x: 640, y: 0, width: 640, height: 1080 }
    - { x: 1280, y: 0, width: 640, height: 1080 }

change_detection:
  enabled: true
  probe: { x: 900, y: 500, width: 32, height: 32 }
  threshold: 40.5

controller:
  separator: " "
  launch: startup
  on_session_lost: relaunch
  args: ["--device", "0"]
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.refresh_interval_ms, 200);
        assert!(config.verbose);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.sampling.regions.len(), 3);
        assert_eq!(config.sampling.regions[2].x(), 1280);
        assert_eq!(
            config.change_detection.probe,
            Some(Region::new(900, 500, 32, 32).unwrap())
        );
        assert_eq!(config.change_detection.threshold, 40.5);
        assert_eq!(config.controller.separator, " ");
        assert_eq!(config.controller.launch, LaunchMode::Startup);
        assert_eq!(
            config.controller.on_session_lost,
            SessionLostPolicy::Relaunch
        );
        assert_eq!(config.controller.args, vec!["--device", "0"]);
    }

    #[test]
    fn test_yaml_invalid_region() {
        let yaml = r#"
controller_executable_path: /opt/rgb/controller
sampling:
  regions:
    - { x: 0, y: 0, width: 0, height: 10 }
"#;
        assert!(AppConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_yaml_unknown_policy() {
        let yaml = r#"
controller_executable_path: /opt/rgb/controller
controller:
  on_session_lost: retry_forever
"#;
        assert!(matches!(AppConfig::from_yaml(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"refresh": 50, "pathToExe": "/bin/cat"}}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.refresh_interval_ms, 50);
        assert_eq!(config.controller_executable_path, "/bin/cat");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "controller_executable_path: /bin/cat").unwrap();
        writeln!(file, "verbose: true").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(config.verbose);
    }

    #[test]
    fn test_from_missing_file() {
        let result = AppConfig::from_file("/nonexistent/rgbeverywhereconf.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
