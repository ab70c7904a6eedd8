//! Dismissible notifications shown to the player.

use crate::errors::{BuildError, StartError};
use crate::scoring::Outcome;
use crate::vehicle::VehicleSpec;

/// Visual weight of a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Something the player did was rejected, or the bridge collapsed.
    Error,
    /// Advice or good news.
    Warning,
}

/// A titled message waiting to be dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Visual weight.
    pub kind: NoticeKind,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, message: String) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message,
        }
    }

    /// Notice for a rejected edit.
    #[must_use]
    pub fn from_build_error(error: &BuildError) -> Self {
        match error {
            BuildError::BeamTooLong { .. } => Self::new(
                NoticeKind::Error,
                "Beam Too Long",
                format!(
                    "{}. Try using a different material or placing joints closer together.",
                    capitalize(&error.to_string())
                ),
            ),
            other => Self::new(
                NoticeKind::Error,
                "Action Not Allowed",
                capitalize(&other.to_string()),
            ),
        }
    }

    /// Notice for a crossing that could not start.
    #[must_use]
    pub fn from_start_error(error: StartError) -> Self {
        let title = match error {
            StartError::AlreadyRunning => "Simulation Running",
            StartError::NoJoints => "No Bridge Structure",
            StartError::NoBeams => "No Beams Connected",
            StartError::NotConnected => "Bridge Not Connected",
        };
        Self::new(NoticeKind::Warning, title, capitalize(&error.to_string()))
    }

    /// Notice announcing how a crossing ended.
    #[must_use]
    pub fn crossing(outcome: Outcome, vehicle: &VehicleSpec) -> Self {
        match outcome {
            Outcome::Success => Self::new(
                NoticeKind::Warning,
                "Bridge Success!",
                format!(
                    "Your bridge supported the {} ({}kg). The vehicle made it safely across!",
                    vehicle.class, vehicle.load_weight
                ),
            ),
            Outcome::Failure => Self::new(
                NoticeKind::Error,
                "Bridge Failure!",
                format!(
                    "Your bridge couldn't support the {} ({}kg). The vehicle fell through. \
                     Try stronger materials or a better design.",
                    vehicle.class, vehicle.load_weight
                ),
            ),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
