//! Rectangular workspace limits for the robot center

use crate::config::WorkspaceConfig;
use crate::error::ConfigError;
use nalgebra::Vector2;

/// Legal rectangle for `(x, z)`, centered on the origin.
///
/// The robot center stays within `[-half_width + margin, half_width - margin]`
/// on X and the same with `half_height` on Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkspaceBounds {
    half_width: f64,
    half_height: f64,
    margin: f64,
}

impl WorkspaceBounds {
    /// Create bounds, requiring `half_width > margin >= 0` and likewise for height
    pub fn new(half_width: f64, half_height: f64, margin: f64) -> Result<Self, ConfigError> {
        if margin.is_nan() || margin < 0.0 {
            return Err(ConfigError::Invalid(
                "Workspace margin must be non-negative".to_string(),
            ));
        }
        let too_small = |half: f64| half.is_nan() || half <= margin;
        if too_small(half_width) || too_small(half_height) {
            return Err(ConfigError::Invalid(format!(
                "Workspace half extents ({}, {}) must exceed margin {}",
                half_width, half_height, margin
            )));
        }

        Ok(WorkspaceBounds {
            half_width,
            half_height,
            margin,
        })
    }

    pub fn from_config(config: &WorkspaceConfig) -> Result<Self, ConfigError> {
        Self::new(config.half_width, config.half_height, config.margin)
    }

    /// Largest legal |x|
    pub fn x_limit(&self) -> f64 {
        self.half_width - self.margin
    }

    /// Largest legal |z|
    pub fn z_limit(&self) -> f64 {
        self.half_height - self.margin
    }

    pub fn contains(&self, position: &Vector2<f64>) -> bool {
        position.x.abs() <= self.x_limit() && position.y.abs() <= self.z_limit()
    }

    /// Clamp a proposed `(x, z)` independently per axis.
    ///
    /// Hitting an edge is a normal condition: the position stops at the wall
    /// and nothing else changes.
    pub fn clamp(&self, proposed: Vector2<f64>) -> Vector2<f64> {
        let x_lim = self.x_limit();
        let z_lim = self.z_limit();
        Vector2::new(
            proposed.x.clamp(-x_lim, x_lim),
            proposed.y.clamp(-z_lim, z_lim),
        )
    }
}

impl Default for WorkspaceBounds {
    /// A 1200 x 800 mm desk with an 80 mm keep-out border
    fn default() -> Self {
        WorkspaceBounds {
            half_width: 600.0,
            half_height: 400.0,
            margin: 80.0,
        }
    }
}
