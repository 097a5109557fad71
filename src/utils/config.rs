use crate::core::constants::*;
use crate::validation::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tuning parameters for the AR overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArConfig {
    /// Camera horizontal field of view (degrees)
    pub horizontal_fov_deg: f64,
    /// Camera vertical field of view (degrees)
    pub vertical_fov_deg: f64,
    /// Inner margin of the strict visibility cone (degrees)
    pub fov_margin_deg: f64,
    /// Extra cone width for recently visible markers (degrees)
    pub hysteresis_margin_deg: f64,
    /// Grace period after leaving the strict cone (milliseconds)
    pub stickiness_window_ms: u64,
    /// Exclude markers far off the pitch axis
    pub vertical_gating: bool,
    /// Heading smoothing factor (0 < alpha <= 1)
    pub heading_alpha: f64,
    /// Pitch smoothing factor (0 < alpha <= 1)
    pub pitch_alpha: f64,
    /// Heading changes below this are ignored (degrees)
    pub heading_deadzone_deg: f64,
    /// Fixed compass calibration added after smoothing (degrees)
    pub heading_offset_deg: f64,
    /// Closest marker shown (meters)
    pub min_distance_m: f64,
    /// Farthest marker shown (meters)
    pub max_distance_m: f64,
    /// Depth reference for scale, opacity and vertical placement (meters)
    pub max_depth_m: f64,
    /// Keep projected angles this far inside the half FOV (degrees)
    pub edge_epsilon_deg: f64,
    /// Minimum distance between a marker and the screen border (pixels)
    pub screen_margin_px: f64,
    pub far_scale: f64,
    pub near_scale: f64,
    pub far_opacity: f64,
    pub near_opacity: f64,
    /// z-index of a marker at max depth
    pub base_z_index: i32,
    /// Horizontal label centering offset per character (pixels)
    pub label_char_offset_px: f64,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            horizontal_fov_deg: HORIZONTAL_FOV_DEG,
            vertical_fov_deg: VERTICAL_FOV_DEG,
            fov_margin_deg: FOV_MARGIN_DEG,
            hysteresis_margin_deg: HYSTERESIS_DEG,
            stickiness_window_ms: VISIBILITY_STICK_MS,
            vertical_gating: false,
            heading_alpha: SMOOTHING_ALPHA_HEADING,
            pitch_alpha: SMOOTHING_ALPHA_PITCH,
            heading_deadzone_deg: HEADING_DEADZONE_DEG,
            heading_offset_deg: HEADING_OFFSET_DEG,
            min_distance_m: MIN_DISTANCE_M,
            max_distance_m: MAX_DISTANCE_M,
            max_depth_m: MAX_DEPTH_M,
            edge_epsilon_deg: 1.0,
            screen_margin_px: 8.0,
            far_scale: 0.7,
            near_scale: 1.2,
            far_opacity: 0.6,
            near_opacity: 1.0,
            base_z_index: 100,
            label_char_offset_px: 4.0,
        }
    }
}

impl ArConfig {
    pub fn half_fov_deg(&self) -> f64 {
        self.horizontal_fov_deg / 2.0
    }

    /// Check every parameter, returning the first violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            "horizontal_fov_deg",
            self.horizontal_fov_deg,
            self.horizontal_fov_deg > 0.0 && self.horizontal_fov_deg < 180.0,
            "must be in (0, 180)",
        )?;
        check(
            "vertical_fov_deg",
            self.vertical_fov_deg,
            self.vertical_fov_deg > 0.0 && self.vertical_fov_deg < 180.0,
            "must be in (0, 180)",
        )?;
        check(
            "fov_margin_deg",
            self.fov_margin_deg,
            self.fov_margin_deg >= 0.0 && self.fov_margin_deg < self.half_fov_deg(),
            "must be non-negative and smaller than half the FOV",
        )?;
        check(
            "hysteresis_margin_deg",
            self.hysteresis_margin_deg,
            self.hysteresis_margin_deg >= 0.0,
            "must be non-negative",
        )?;
        check_alpha("heading_alpha", self.heading_alpha)?;
        check_alpha("pitch_alpha", self.pitch_alpha)?;
        check(
            "heading_deadzone_deg",
            self.heading_deadzone_deg,
            self.heading_deadzone_deg >= 0.0 && self.heading_deadzone_deg < 180.0,
            "must be in [0, 180)",
        )?;
        check(
            "heading_offset_deg",
            self.heading_offset_deg,
            self.heading_offset_deg.is_finite(),
            "must be finite",
        )?;
        check(
            "min_distance_m",
            self.min_distance_m,
            self.min_distance_m >= 0.0,
            "must be non-negative",
        )?;
        check(
            "max_distance_m",
            self.max_distance_m,
            self.max_distance_m > self.min_distance_m,
            "must be greater than min_distance_m",
        )?;
        check(
            "max_depth_m",
            self.max_depth_m,
            self.max_depth_m > 0.0,
            "must be positive",
        )?;
        check(
            "edge_epsilon_deg",
            self.edge_epsilon_deg,
            self.edge_epsilon_deg > 0.0 && self.edge_epsilon_deg < self.half_fov_deg(),
            "must be positive and smaller than half the FOV",
        )?;
        check(
            "screen_margin_px",
            self.screen_margin_px,
            self.screen_margin_px >= 0.0,
            "must be non-negative",
        )?;
        check(
            "far_scale",
            self.far_scale,
            self.far_scale > 0.0 && self.far_scale <= self.near_scale,
            "must be positive and not above near_scale",
        )?;
        check(
            "far_opacity",
            self.far_opacity,
            (0.0..=1.0).contains(&self.far_opacity) && self.far_opacity <= self.near_opacity,
            "must be in [0, 1] and not above near_opacity",
        )?;
        check(
            "near_opacity",
            self.near_opacity,
            (0.0..=1.0).contains(&self.near_opacity),
            "must be in [0, 1]",
        )?;
        Ok(())
    }
}

fn check(parameter: &str, value: f64, ok: bool, reason: &str) -> Result<(), ConfigError> {
    if ok && !value.is_nan() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
    }
}

fn check_alpha(parameter: &str, alpha: f64) -> Result<(), ConfigError> {
    check(parameter, alpha, alpha > 0.0 && alpha <= 1.0, "must be in (0, 1]")
}

/// Owns the active configuration and its backing file
pub struct ConfigurationManager {
    config: ArConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: ArConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    /// Replace the configuration after validation
    pub fn update_config(&mut self, config: ArConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from a JSON file. Missing keys take defaults.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: ArConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        config.validate()?;

        log::info!("loaded AR configuration from {}", path_str);
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            }
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Set horizontal FOV, returning the previous value
    pub fn set_horizontal_fov(&mut self, fov_deg: f64) -> Result<f64, ConfigError> {
        self.apply(|c| &mut c.horizontal_fov_deg, fov_deg)
    }

    /// Set the stickiness window, returning the previous value
    pub fn set_stickiness_window(&mut self, window_ms: u64) -> u64 {
        let old = self.config.stickiness_window_ms;
        self.config.stickiness_window_ms = window_ms;
        self.is_modified = true;
        old
    }

    /// Set heading smoothing alpha, returning the previous value
    pub fn set_heading_alpha(&mut self, alpha: f64) -> Result<f64, ConfigError> {
        self.apply(|c| &mut c.heading_alpha, alpha)
    }

    /// Set pitch smoothing alpha, returning the previous value
    pub fn set_pitch_alpha(&mut self, alpha: f64) -> Result<f64, ConfigError> {
        self.apply(|c| &mut c.pitch_alpha, alpha)
    }

    /// Set compass calibration offset, returning the previous value
    pub fn set_heading_offset(&mut self, offset_deg: f64) -> Result<f64, ConfigError> {
        self.apply(|c| &mut c.heading_offset_deg, offset_deg)
    }

    /// Set distance bounds, returning the previous pair
    pub fn set_distance_bounds(&mut self, min_m: f64, max_m: f64) -> Result<(f64, f64), ConfigError> {
        let mut candidate = self.config.clone();
        candidate.min_distance_m = min_m;
        candidate.max_distance_m = max_m;
        candidate.validate()?;

        let old = (self.config.min_distance_m, self.config.max_distance_m);
        self.config = candidate;
        self.is_modified = true;
        Ok(old)
    }

    pub fn set_vertical_gating(&mut self, enabled: bool) -> bool {
        let old = self.config.vertical_gating;
        self.config.vertical_gating = enabled;
        self.is_modified = true;
        old
    }

    /// Validate a single-field change on a copy before committing it
    fn apply<F>(&mut self, field: F, value: f64) -> Result<f64, ConfigError>
    where
        F: Fn(&mut ArConfig) -> &mut f64,
    {
        let mut candidate = self.config.clone();
        *field(&mut candidate) = value;
        candidate.validate()?;

        let old = *field(&mut self.config);
        self.config = candidate;
        self.is_modified = true;
        Ok(old)
    }
}
