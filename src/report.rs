use std::fmt;

use bridgesim::material::MATERIALS;
use bridgesim::scoring::Outcome;

use crate::crossing::CrossingSummary;

/// Human readable account of a crossing.
pub struct CrossingReport<'a>(pub &'a CrossingSummary);

impl fmt::Display for CrossingReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        match summary.vehicle {
            Some(vehicle) => writeln!(
                f,
                "Crossing with a {} ({}kg, mass {:.1})",
                vehicle.class, summary.load_weight, vehicle.mass
            )?,
            None => writeln!(f, "Crossing with a {}kg load", summary.load_weight)?,
        }

        let verdict = match summary.outcome {
            Some(Outcome::Success) => "success, the vehicle reached the far bank",
            Some(Outcome::Failure) => "failure, the vehicle fell into the gap",
            None => "undecided when the time limit was reached",
        };
        writeln!(
            f,
            "Outcome after {:.1}s: {verdict}",
            summary.elapsed_ms / 1000.0
        )?;
        if let Some(position) = summary.vehicle_position {
            writeln!(f, "Vehicle position: x = {:.1}, y = {:.1}", position.x, position.y)?;
        }

        write!(
            f,
            "Beams: {} built, {} broken",
            summary.total_beams,
            summary.broken.len()
        )?;
        if summary.broken.is_empty() {
            writeln!(f)?;
        } else {
            let ids: Vec<_> = summary.broken.iter().map(ToString::to_string).collect();
            writeln!(f, " (#{})", ids.join(", #"))?;
        }
        write!(f, "Score: {} ({} pricing)", summary.score, summary.material)
    }
}

/// Render the crossing summary as text.
#[must_use]
pub fn render_summary(summary: &CrossingSummary) -> String {
    CrossingReport(summary).to_string()
}

/// Render the material catalog as a table.
#[must_use]
pub fn render_materials() -> String {
    let mut lines = vec![format!(
        "{:<8} {:>8} {:>6} {:>10}",
        "material", "strength", "cost", "max span"
    )];
    lines.extend(MATERIALS.iter().map(|material| {
        format!(
            "{:<8} {:>8.0} {:>6.0} {:>8.0}px",
            material.name, material.strength, material.cost, material.max_length
        )
    }));
    lines.join("\n")
}
