//! Strain and stress evaluation during a crossing.

use petgraph::graph::EdgeIndex;
use tracing::warn;

use crate::bridge::Bridge;
use crate::geometry::Point;
use crate::physics::{PhysicsBindings, PhysicsDelegate};

/// Whether a beam is being pulled apart or pushed together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceKind {
    /// Longer than its rest length.
    Tension,
    /// Shorter than its rest length.
    Compression,
    /// Exactly at rest length.
    Neutral,
}

impl ForceKind {
    /// Classify a signed strain.
    #[must_use]
    pub fn of_strain(signed_strain: f64) -> Self {
        if signed_strain > 0.0 {
            ForceKind::Tension
        } else if signed_strain < 0.0 {
            ForceKind::Compression
        } else {
            ForceKind::Neutral
        }
    }
}

/// Signed strain of a member stretched from `original` to `current`.
///
/// # Examples
/// ```
/// use bridgesim::strain::signed_strain;
///
/// assert_eq!(signed_strain(100.0, 110.0), 0.1);
/// assert!(signed_strain(100.0, 95.0) < 0.0);
/// ```
#[must_use]
pub fn signed_strain(original: f64, current: f64) -> f64 {
    (current - original) / original
}

/// One measurement of a beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrainReading {
    /// Distance between the beam's end bodies.
    pub current_length: f64,
    /// `(current - original) / original`.
    pub signed_strain: f64,
    /// `|signed_strain| * stress_scale`.
    pub stress: f64,
}

impl StrainReading {
    /// Measure a beam with rest length `original` currently spanning `current`.
    #[must_use]
    pub fn measure(original: f64, current: f64, stress_scale: f64) -> Self {
        let signed_strain = signed_strain(original, current);
        Self {
            current_length: current,
            signed_strain,
            stress: signed_strain.abs() * stress_scale,
        }
    }

    /// Tension, compression or neither.
    #[must_use]
    pub fn force_kind(&self) -> ForceKind {
        ForceKind::of_strain(self.signed_strain)
    }

    /// Whether the reading breaks a beam rated for `max_stress`.
    #[must_use]
    pub fn exceeds(&self, max_stress: f64) -> bool {
        self.stress > max_stress
    }
}

/// A beam that failed on the last tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamBreak {
    /// The beam that broke.
    pub beam: EdgeIndex,
    /// Midpoint of the beam's end bodies when it broke.
    pub midpoint: Point,
    /// Stress that broke it.
    pub stress: f64,
    /// Whether it failed in tension or compression.
    pub kind: ForceKind,
}

/// Periodic strain evaluation over every intact beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrainEvaluator {
    stress_scale: f64,
}

impl StrainEvaluator {
    /// Create an evaluator mapping strain to stress with `stress_scale`.
    #[must_use]
    pub fn new(stress_scale: f64) -> Self {
        Self { stress_scale }
    }

    /// Stress units per unit of strain.
    #[must_use]
    pub fn stress_scale(&self) -> f64 {
        self.stress_scale
    }

    /// Re-measure every intact, bound beam from the delegate's body positions
    /// and break the ones whose stress exceeds their material strength.
    ///
    /// A broken beam is released from the delegate and never measured again in
    /// this session. Beams whose bodies the delegate no longer reports are
    /// skipped.
    pub fn evaluate<P: PhysicsDelegate + ?Sized>(
        &self,
        bridge: &mut Bridge,
        bindings: &mut PhysicsBindings,
        physics: &mut P,
    ) -> Vec<BeamBreak> {
        let measured: Vec<_> = bridge
            .beams()
            .filter(|(_, _, beam)| !beam.is_broken())
            .filter_map(|(id, (a, b), beam)| {
                let body_a = bindings.joint_body(a)?;
                let body_b = bindings.joint_body(b)?;
                let from = physics.body_position(body_a)?;
                let to = physics.body_position(body_b)?;
                let reading = StrainReading::measure(
                    beam.original_length(),
                    from.distance_to(to),
                    self.stress_scale,
                );
                Some((id, reading, beam.max_stress(), from.midpoint(to)))
            })
            .collect();

        let mut breaks = Vec::new();
        for (id, reading, max_stress, midpoint) in measured {
            let Some(beam) = bridge.beam_mut(id) else {
                continue;
            };
            beam.apply_reading(reading);
            if reading.exceeds(max_stress) {
                beam.mark_broken();
                bindings.release_beam(id, physics);
                warn!(
                    beam = id.index(),
                    stress = reading.stress,
                    max_stress,
                    strain = reading.signed_strain,
                    "beam broke"
                );
                breaks.push(BeamBreak {
                    beam: id,
                    midpoint,
                    stress: reading.stress,
                    kind: reading.force_kind(),
                });
            }
        }
        breaks
    }
}
