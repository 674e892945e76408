//! Startup configuration for the R4 control core
//!
//! Loaded from TOML, then optionally adjusted with flat `key=value`
//! overrides. Nothing here is persisted back to disk.

use crate::common::Pose2D;
use crate::control::workspace::WorkspaceBounds;
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct R4Config {
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub sensitivity: SensitivityConfig,
    #[serde(default)]
    pub initial_pose: InitialPoseConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub tick: TickConfig,
}

/// Robot physical constants
#[derive(Clone, Debug, Deserialize)]
pub struct RobotConfig {
    /// Distance between wheel contact points in mm (default: 140)
    #[serde(default = "default_wheel_separation")]
    pub wheel_separation: f64,

    /// Wheel radius in mm (default: 32.5)
    #[serde(default = "default_wheel_radius")]
    pub wheel_radius: f64,
}

/// Legal rectangle for the robot center, centered on the origin
#[derive(Clone, Debug, Deserialize)]
pub struct WorkspaceConfig {
    /// Half extent along X in mm (default: 600, a 1200mm desk)
    #[serde(default = "default_half_width")]
    pub half_width: f64,

    /// Half extent along Z in mm (default: 400, an 800mm desk)
    #[serde(default = "default_half_height")]
    pub half_height: f64,

    /// Keep-out distance from each edge in mm, roughly the robot radius (default: 80)
    #[serde(default = "default_margin")]
    pub margin: f64,
}

/// Full-deflection scale factors for operator input
#[derive(Clone, Debug, Deserialize)]
pub struct SensitivityConfig {
    /// mm/s at full stick (default: 500)
    #[serde(default = "default_max_linear_speed")]
    pub max_linear_speed: f64,

    /// rad/s at full stick (default: 2.0)
    #[serde(default = "default_max_turn_rate")]
    pub max_turn_rate: f64,

    /// Degrees at full stick (default: 90)
    #[serde(default = "default_max_pan")]
    pub max_pan: f64,

    /// Degrees at full stick (default: 45)
    #[serde(default = "default_max_tilt")]
    pub max_tilt: f64,
}

/// Home pose of the robot
#[derive(Clone, Debug, Deserialize)]
pub struct InitialPoseConfig {
    #[serde(default = "default_initial_x")]
    pub x: f64,
    #[serde(default = "default_initial_z")]
    pub z: f64,
    #[serde(default = "default_initial_theta")]
    pub theta: f64,
}

/// Remote command source endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct ChannelConfig {
    /// host:port of the JSON-lines command socket
    #[serde(default = "default_address")]
    pub address: String,
}

/// Tick clock
#[derive(Clone, Debug, Deserialize)]
pub struct TickConfig {
    /// Nominal tick period in ms; actual dt is measured (default: 16)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,
}

fn default_wheel_separation() -> f64 {
    140.0
}
fn default_wheel_radius() -> f64 {
    32.5
}
fn default_half_width() -> f64 {
    600.0
}
fn default_half_height() -> f64 {
    400.0
}
fn default_margin() -> f64 {
    80.0
}
fn default_max_linear_speed() -> f64 {
    500.0
}
fn default_max_turn_rate() -> f64 {
    2.0
}
fn default_max_pan() -> f64 {
    90.0
}
fn default_max_tilt() -> f64 {
    45.0
}
fn default_initial_x() -> f64 {
    400.0
}
fn default_initial_z() -> f64 {
    -200.0
}
fn default_initial_theta() -> f64 {
    180.0
}
fn default_address() -> String {
    "127.0.0.1:8765".to_string()
}
fn default_period_ms() -> u64 {
    16
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            wheel_separation: default_wheel_separation(),
            wheel_radius: default_wheel_radius(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            half_width: default_half_width(),
            half_height: default_half_height(),
            margin: default_margin(),
        }
    }
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            max_linear_speed: default_max_linear_speed(),
            max_turn_rate: default_max_turn_rate(),
            max_pan: default_max_pan(),
            max_tilt: default_max_tilt(),
        }
    }
}

impl Default for InitialPoseConfig {
    fn default() -> Self {
        Self {
            x: default_initial_x(),
            z: default_initial_z(),
            theta: default_initial_theta(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
        }
    }
}

impl InitialPoseConfig {
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.z, self.theta)
    }
}

impl R4Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: R4Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the physical and workspace invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.robot.wheel_separation.is_nan() || self.robot.wheel_separation <= 0.0 {
            return Err(ConfigError::Invalid(
                "Wheel separation must be positive".to_string(),
            ));
        }
        if self.robot.wheel_radius.is_nan() || self.robot.wheel_radius <= 0.0 {
            return Err(ConfigError::Invalid(
                "Wheel radius must be positive".to_string(),
            ));
        }

        WorkspaceBounds::from_config(&self.workspace)?;

        let s = &self.sensitivity;
        for (name, value) in [
            ("max_linear_speed", s.max_linear_speed),
            ("max_turn_rate", s.max_turn_rate),
            ("max_pan", s.max_pan),
            ("max_tilt", s.max_tilt),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }

        if self.tick.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "Tick period must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply flat parameter overrides such as `wheel_radius` or `margin`
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        for (key, &value) in params {
            match key.as_str() {
                "wheel_separation" => self.robot.wheel_separation = value,
                "wheel_radius" => self.robot.wheel_radius = value,
                "half_width" => self.workspace.half_width = value,
                "half_height" => self.workspace.half_height = value,
                "margin" => self.workspace.margin = value,
                "max_linear_speed" => self.sensitivity.max_linear_speed = value,
                "max_turn_rate" => self.sensitivity.max_turn_rate = value,
                "max_pan" => self.sensitivity.max_pan = value,
                "max_tilt" => self.sensitivity.max_tilt = value,
                "period_ms" => {
                    if value < 1.0 {
                        return Err(ConfigError::Invalid(
                            "Tick period must be at least 1ms".to_string(),
                        ));
                    }
                    self.tick.period_ms = value as u64;
                }
                other => return Err(ConfigError::UnknownParameter(other.to_string())),
            }
        }

        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = R4Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.robot.wheel_separation, 140.0);
        assert_eq!(config.robot.wheel_radius, 32.5);
        assert_eq!(config.workspace.half_width, 600.0);
        assert_eq!(config.workspace.margin, 80.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = R4Config::from_toml(
            r#"
            [workspace]
            half_width = 1000.0

            [channel]
            address = "10.0.0.2:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.workspace.half_width, 1000.0);
        assert_eq!(config.workspace.half_height, 400.0);
        assert_eq!(config.channel.address, "10.0.0.2:9000");
        assert_eq!(config.tick.period_ms, 16);
    }

    #[test]
    fn test_margin_must_be_inside_workspace() {
        let result = R4Config::from_toml(
            r#"
            [workspace]
            half_width = 50.0
            margin = 80.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let result = R4Config::from_toml("[robot\nwheel_radius = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_configure_overrides() {
        let mut config = R4Config::default();
        let mut params = HashMap::new();
        params.insert("wheel_radius".to_string(), 40.0);
        params.insert("max_pan".to_string(), 120.0);
        params.insert("period_ms".to_string(), 33.0);

        config.configure(&params).unwrap();
        assert_eq!(config.robot.wheel_radius, 40.0);
        assert_eq!(config.sensitivity.max_pan, 120.0);
        assert_eq!(config.tick.period_ms, 33);
    }

    #[test]
    fn test_configure_rejects_unknown_and_invalid() {
        let mut config = R4Config::default();
        let mut params = HashMap::new();
        params.insert("lookahead_distance".to_string(), 0.8);
        assert!(matches!(
            config.configure(&params),
            Err(ConfigError::UnknownParameter(_))
        ));

        let mut params = HashMap::new();
        params.insert("wheel_radius".to_string(), 0.0);
        assert!(matches!(
            config.configure(&params),
            Err(ConfigError::Invalid(_))
        ));
    }
}
