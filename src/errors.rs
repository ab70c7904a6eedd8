//! Error types produced while editing bridges, starting crossings and
//! loading configuration or saved state.

use petgraph::graph::NodeIndex;
use thiserror::Error;

/// Error returned when an edit to a [`Bridge`](crate::Bridge) is rejected.
///
/// Every variant leaves the bridge untouched.
///
/// # Examples
///
/// ```
/// use bridgesim::{point, Bridge, BuildError};
///
/// let mut bridge = Bridge::default();
/// let (left, _) = bridge.anchors();
/// let far = bridge.add_joint(point(550.0, 450.0)).expect("idle bridge accepts joints");
/// let error = bridge.add_beam(left, far).expect_err("350px exceeds steel's span");
/// assert!(matches!(error, BuildError::BeamTooLong { .. }));
/// assert_eq!(bridge.beam_count(), 0);
/// ```
#[derive(Clone, Debug, Error, PartialEq)]
pub enum BuildError {
    /// Returned for any edit attempted while a crossing is running.
    #[error("the bridge cannot be edited while a simulation is running")]
    Simulating,
    /// Returned when a joint cannot be found in the bridge.
    #[error("joint {0:?} does not exist in this bridge")]
    UnknownJoint(NodeIndex),
    /// Returned when both ends of a beam are the same joint.
    #[error("a beam needs two distinct joints, got {0:?} twice")]
    SameJoint(NodeIndex),
    /// Returned when two joints share a position, so a beam between them
    /// would have zero length.
    #[error("joints {0:?} and {1:?} coincide, so the beam would have zero length")]
    ZeroLengthBeam(NodeIndex, NodeIndex),
    /// Returned when a joint would be placed at a non-finite coordinate.
    #[error("joint position ({x}, {y}) is not a finite point")]
    NonFinitePosition {
        /// Requested horizontal coordinate.
        x: f64,
        /// Requested vertical coordinate.
        y: f64,
    },
    /// Returned when trying to move one of the fixed anchors.
    #[error("joint {0:?} is a fixed anchor and cannot be moved")]
    FixedJoint(NodeIndex),
    /// Returned when the joints are further apart than the material can span.
    #[error(
        "the beam is {length:.0}px long, but {material} can only span up to {max_length:.0}px"
    )]
    BeamTooLong {
        /// Distance between the two joints.
        length: f64,
        /// Longest span allowed by the selected material.
        max_length: f64,
        /// Name of the selected material.
        material: &'static str,
    },
}

/// Error returned when a crossing cannot start.
///
/// Checks run in declaration order and the first failing one is reported.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// A crossing is already in progress.
    #[error("a simulation is already running")]
    AlreadyRunning,
    /// Only the two anchors exist.
    #[error("place some joints to build a bridge structure before starting")]
    NoJoints,
    /// Joints exist but nothing connects them.
    #[error("connect your joints with beams before starting")]
    NoBeams,
    /// There is no path of intact beams between the anchors.
    #[error("there is no continuous path of beams between the two anchor points")]
    NotConnected,
}

/// Error returned when a saved design cannot be rebuilt.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DesignError {
    /// The design names a material that is not in the catalog.
    #[error("unknown material {0:?}")]
    UnknownMaterial(String),
    /// A beam refers to a joint slot the design does not define.
    #[error("beam {beam} refers to joint slot {slot}, but the design has {joints} joints")]
    MissingJoint {
        /// Position of the beam in the design.
        beam: usize,
        /// Offending joint slot.
        slot: usize,
        /// Number of joint slots, anchors included.
        joints: usize,
    },
    /// Replaying an edit failed.
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Error returned when loading a [`SimulationConfig`](crate::SimulationConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value parsed but is not usable.
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Error returned by a [`KeyValueStore`](crate::store::KeyValueStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// A value could not be encoded as JSON.
    #[error("failed to encode stored value: {0}")]
    Encode(#[from] serde_json::Error),
}
