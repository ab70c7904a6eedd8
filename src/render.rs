//! Presentation helpers: strain colour coding and labels.
//!
//! Tension and compression render differently at the same stress, so the sign
//! of the strain is kept all the way to the colour.

use std::fmt;

use crate::bridge::Beam;
use crate::strain::ForceKind;

/// Strains smaller than this render as unloaded.
pub const NEUTRAL_STRAIN: f64 = 0.001;
/// Strain at which the colour ramp saturates.
pub const SATURATION_STRAIN: f64 = 0.1;

/// A display colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a colour from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` notation.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Grey for unloaded beams.
pub const NEUTRAL_COLOR: Rgb = Rgb::new(0x95, 0xA5, 0xA6);
/// Red for broken beams.
pub const BROKEN_COLOR: Rgb = Rgb::new(0xE7, 0x4C, 0x3C);

/// Direction of the force arrows drawn at a beam's midpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrowDirection {
    /// Arrows point towards the joints: the beam is being pulled apart.
    Outward,
    /// Arrows point towards the midpoint: the beam is being squeezed.
    Inward,
}

/// Channel value for an intensity ramp, rounded like the canvas does.
fn channel(base: f64, drop: f64, intensity: f64) -> u8 {
    (base - intensity * drop).round().clamp(0.0, 255.0) as u8
}

/// Blue ramp used for tension.
#[must_use]
pub fn tension_color(intensity: f64) -> Rgb {
    Rgb::new(channel(100.0, 100.0, intensity), channel(150.0, 50.0, intensity), 255)
}

/// Red ramp used for compression.
#[must_use]
pub fn compression_color(intensity: f64) -> Rgb {
    let fade = channel(100.0, 100.0, intensity);
    Rgb::new(255, fade, fade)
}

/// Colour of a beam given whether a crossing is running.
#[must_use]
pub fn beam_color(beam: &Beam, simulating: bool) -> Rgb {
    if beam.is_broken() {
        return BROKEN_COLOR;
    }
    let strain = beam.signed_strain();
    if !simulating || strain.abs() < NEUTRAL_STRAIN {
        return NEUTRAL_COLOR;
    }
    let intensity = (strain.abs() / SATURATION_STRAIN).min(1.0);
    match ForceKind::of_strain(strain) {
        ForceKind::Tension => tension_color(intensity),
        ForceKind::Compression => compression_color(intensity),
        ForceKind::Neutral => NEUTRAL_COLOR,
    }
}

/// Label such as `1.5% T` for a loaded, intact beam.
#[must_use]
pub fn strain_label(beam: &Beam) -> Option<String> {
    if beam.is_broken() || beam.signed_strain().abs() <= NEUTRAL_STRAIN {
        return None;
    }
    let kind = if beam.signed_strain() > 0.0 { 'T' } else { 'C' };
    Some(format!("{:.1}% {kind}", beam.signed_strain() * 100.0))
}

/// Force arrows to draw on a loaded, intact beam.
#[must_use]
pub fn force_arrows(beam: &Beam) -> Option<ArrowDirection> {
    if beam.is_broken() || beam.signed_strain().abs() <= NEUTRAL_STRAIN {
        return None;
    }
    match ForceKind::of_strain(beam.signed_strain()) {
        ForceKind::Tension => Some(ArrowDirection::Outward),
        ForceKind::Compression => Some(ArrowDirection::Inward),
        ForceKind::Neutral => None,
    }
}
