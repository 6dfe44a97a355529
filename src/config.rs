//! Tunables for the wiring engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a [`WiringConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse wiring config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Configuration of gestures, snapping, hit-testing and connection rules.
///
/// Every field has a default, so partial JSON documents are accepted:
///
/// ```
/// use slint_node_wiring::WiringConfig;
///
/// let config = WiringConfig::from_json(r#"{ "snap_radius": 32.0, "forbid_cycles": true }"#).unwrap();
/// assert_eq!(config.snap_radius, 32.0);
/// assert_eq!(config.drag_threshold, 4.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringConfig {
    /// Pointer travel (screen px) before a press on a port becomes a drag.
    pub drag_threshold: f32,
    /// Max distance (canvas units) from the pointer to a candidate's anchor.
    pub snap_radius: f32,
    /// Outward clearance of connection points from the node boundary.
    pub port_standoff: f32,
    /// Distance (canvas units) within which a link counts as hovered.
    pub hover_tolerance: f32,
    /// Polyline samples used when hit-testing bezier links.
    pub hit_samples: usize,
    pub allow_self_loops: bool,
    pub forbid_cycles: bool,
    pub allow_duplicate_connections: bool,
}

impl Default for WiringConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 4.0,
            snap_radius: 24.0,
            port_standoff: crate::anchor::DEFAULT_PORT_STANDOFF,
            hover_tolerance: 6.0,
            hit_samples: 20,
            allow_self_loops: false,
            forbid_cycles: false,
            allow_duplicate_connections: false,
        }
    }
}

impl WiringConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: WiringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("drag_threshold", self.drag_threshold)?;
        non_negative("snap_radius", self.snap_radius)?;
        non_negative("port_standoff", self.port_standoff)?;
        non_negative("hover_tolerance", self.hover_tolerance)?;
        if self.hit_samples == 0 {
            return Err(ConfigError::Invalid {
                field: "hit_samples",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected a finite non-negative number, got {}", value),
        });
    }
    Ok(())
}
