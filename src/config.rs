//! Tunable constants for the world layout and the crossing session.
//!
//! The defaults reproduce the tuning the game ships with. Every field can be
//! overridden from a JSON file; missing fields keep their default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::geometry::{point, Point, Rect};

/// Placement of the canvas, the ground and the two fixed anchors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldLayout {
    /// Width of the world in pixels.
    pub width: f64,
    /// Height of the world in pixels.
    pub height: f64,
    /// Vertical position of the ground line.
    pub ground_y: f64,
    /// Horizontal distance from each world edge to its anchor.
    pub anchor_inset: f64,
    /// Height of the anchors above the ground line.
    pub anchor_height: f64,
    /// Radius used when hit testing joints.
    pub pick_radius: f64,
    /// Radius of the physics body created for every joint.
    pub joint_radius: f64,
    /// Horizontal spawn position of the vehicle.
    pub vehicle_start_x: f64,
    /// Height of the vehicle spawn point above the ground line.
    pub vehicle_start_lift: f64,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            ground_y: 550.0,
            anchor_inset: 200.0,
            anchor_height: 100.0,
            pick_radius: 20.0,
            joint_radius: 10.0,
            vehicle_start_x: 50.0,
            vehicle_start_lift: 50.0,
        }
    }
}

impl WorldLayout {
    /// Position of the left anchor.
    #[must_use]
    pub fn left_anchor(&self) -> Point {
        point(self.anchor_inset, self.ground_y - self.anchor_height)
    }

    /// Position of the right anchor.
    #[must_use]
    pub fn right_anchor(&self) -> Point {
        point(
            self.width - self.anchor_inset,
            self.ground_y - self.anchor_height,
        )
    }

    /// Where the vehicle body is spawned.
    #[must_use]
    pub fn vehicle_start(&self) -> Point {
        point(self.vehicle_start_x, self.ground_y - self.vehicle_start_lift)
    }

    /// Solid ground on either side of the gap, with tops level with the anchors.
    #[must_use]
    pub fn banks(&self) -> [Rect; 2] {
        let left = self.left_anchor();
        let right = self.right_anchor();
        [
            Rect::new(0.0, left.y, left.x, self.height),
            Rect::new(right.x, right.y, self.width, self.height),
        ]
    }
}

/// Parameters for the crossing session and the physics bindings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Maps a strain fraction onto the stress unit used by material strengths.
    pub stress_scale: f64,
    /// Period of the strain evaluation tick.
    pub strain_tick_ms: f64,
    /// Period of the forward push applied to the vehicle.
    pub push_interval_ms: f64,
    /// The vehicle stops being pushed after this long.
    pub push_timeout_ms: f64,
    /// Period of the success/failure poll.
    pub outcome_poll_ms: f64,
    /// Delay between starting a session and spawning the vehicle.
    pub vehicle_spawn_delay_ms: f64,
    /// How long a resolved outcome stays on screen before teardown.
    pub settle_delay_ms: f64,
    /// Length of one physics step.
    pub physics_step_ms: f64,
    /// The crossing succeeds once the vehicle is this close to the right edge.
    pub success_margin: f64,
    /// The crossing fails once the vehicle is this far below the ground line.
    pub failure_drop: f64,
    /// Push force per unit of vehicle mass.
    pub push_factor: f64,
    /// Stiffness of the joint-to-joint beam constraint.
    pub beam_stiffness: f64,
    /// Damping of the joint-to-joint beam constraint.
    pub beam_damping: f64,
    /// Thickness of the deck body the vehicle drives on.
    pub deck_thickness: f64,
    /// Mass of the deck body.
    pub deck_mass: f64,
    /// Stiffness of the pins holding the deck body to its joints.
    pub pin_stiffness: f64,
    /// Damping of the deck pins.
    pub pin_damping: f64,
    /// Seed for the cosmetic break particles.
    pub effects_seed: u64,
    /// World placement.
    pub layout: WorldLayout,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stress_scale: 1000.0,
            strain_tick_ms: 100.0,
            push_interval_ms: 50.0,
            push_timeout_ms: 30_000.0,
            outcome_poll_ms: 500.0,
            vehicle_spawn_delay_ms: 1000.0,
            settle_delay_ms: 3000.0,
            physics_step_ms: 1000.0 / 60.0,
            success_margin: 250.0,
            failure_drop: 100.0,
            push_factor: 0.01,
            beam_stiffness: 0.8,
            beam_damping: 0.1,
            deck_thickness: 12.0,
            deck_mass: 0.05,
            pin_stiffness: 0.95,
            pin_damping: 0.05,
            effects_seed: 0x5eed,
            layout: WorldLayout::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value fails [`SimulationConfig::validate`].
    ///
    /// # Examples
    /// ```
    /// use bridgesim::SimulationConfig;
    ///
    /// let config = SimulationConfig::from_json_str(r#"{ "stress_scale": 800.0 }"#)
    ///     .expect("partial configs keep defaults");
    /// assert_eq!(config.stress_scale, 800.0);
    /// assert_eq!(config.strain_tick_ms, 100.0);
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// same errors as [`SimulationConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("stress_scale", self.stress_scale),
            ("strain_tick_ms", self.strain_tick_ms),
            ("push_interval_ms", self.push_interval_ms),
            ("outcome_poll_ms", self.outcome_poll_ms),
            ("physics_step_ms", self.physics_step_ms),
        ];
        for (field, value) in periods {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number (received {value})"),
                });
            }
        }
        let delays = [
            ("push_timeout_ms", self.push_timeout_ms),
            ("vehicle_spawn_delay_ms", self.vehicle_spawn_delay_ms),
            ("settle_delay_ms", self.settle_delay_ms),
        ];
        for (field, value) in delays {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must not be negative (received {value})"),
                });
            }
        }
        if self.layout.anchor_inset * 2.0 >= self.layout.width {
            return Err(ConfigError::Invalid {
                field: "layout.anchor_inset",
                reason: "anchors overlap".to_string(),
            });
        }
        Ok(())
    }

    /// Horizontal position past which the vehicle has crossed.
    #[must_use]
    pub fn success_x(&self) -> f64 {
        self.layout.width - self.success_margin
    }

    /// Vertical position below which the vehicle has fallen.
    #[must_use]
    pub fn failure_y(&self) -> f64 {
        self.layout.ground_y + self.failure_drop
    }
}
