//! Build-time preview and final crossing scores.

/// Outcome of a crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The vehicle reached the far side.
    Success,
    /// The vehicle fell into the gap.
    Failure,
}

/// Figures the final score is computed from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossingTally {
    /// Beams in the bridge.
    pub total_beams: usize,
    /// Beams that broke during the crossing.
    pub broken_beams: usize,
    /// Cost of one beam of the selected material.
    pub material_cost: f64,
    /// Load weight of the vehicle.
    pub load_weight: f64,
    /// Time from session start to the outcome.
    pub elapsed_ms: f64,
}

impl CrossingTally {
    /// Beams still intact.
    #[must_use]
    pub fn surviving_beams(&self) -> usize {
        self.total_beams.saturating_sub(self.broken_beams)
    }

    /// Fraction of beams that survived, zero for an empty bridge.
    #[must_use]
    pub fn survival_ratio(&self) -> f64 {
        if self.total_beams == 0 {
            0.0
        } else {
            self.surviving_beams() as f64 / self.total_beams as f64
        }
    }
}

/// Score shown while building, before any crossing.
///
/// # Examples
/// ```
/// use bridgesim::scoring::preview_score;
///
/// // 1000 - 10 beams * 10 + 20 * 5
/// assert_eq!(preview_score(10, 10.0, 20.0), 1000);
/// ```
#[must_use]
pub fn preview_score(beam_count: usize, material_cost: f64, load_weight: f64) -> u32 {
    let efficiency = (1000.0 - beam_count as f64 * material_cost).max(0.0);
    let design = load_weight * 5.0;
    to_score(efficiency + design)
}

/// Score awarded once a crossing resolves.
///
/// A success earns a base of 5000, 50 per unit of load, up to 2000 for the
/// fraction of surviving beams, a time bonus worth up to 10 points for
/// finishing under ten seconds and 3000 more when nothing broke, minus five
/// times the total material cost. A failure earns 500 plus 50 per surviving
/// beam.
#[must_use]
pub fn final_score(outcome: Outcome, tally: &CrossingTally) -> u32 {
    let raw = match outcome {
        Outcome::Success => {
            let material_cost = tally.total_beams as f64 * tally.material_cost;
            let time_bonus = (10_000.0 - tally.elapsed_ms).max(0.0);
            let mut score = 5000.0;
            score += tally.load_weight * 50.0;
            score += tally.survival_ratio() * 2000.0;
            score -= material_cost * 5.0;
            score += time_bonus * 0.001;
            if tally.broken_beams == 0 {
                score += 3000.0;
            }
            score
        }
        Outcome::Failure => 500.0 + tally.surviving_beams() as f64 * 50.0,
    };
    to_score(raw)
}

/// Round to the nearest integer and floor at zero.
fn to_score(raw: f64) -> u32 {
    if raw.is_nan() {
        return 0;
    }
    // Saturating float-to-int cast caps the top end.
    raw.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(total_beams: usize, broken_beams: usize) -> CrossingTally {
        CrossingTally {
            total_beams,
            broken_beams,
            material_cost: 5.0,
            load_weight: 60.0,
            elapsed_ms: 0.0,
        }
    }

    #[test]
    fn perfect_wooden_crossing() {
        assert_eq!(final_score(Outcome::Success, &tally(10, 0)), 12_760);
    }

    #[test]
    fn failed_crossing_rewards_surviving_beams() {
        assert_eq!(final_score(Outcome::Failure, &tally(10, 4)), 800);
    }

    #[test]
    fn time_bonus_runs_out_after_ten_seconds() {
        let quick = CrossingTally {
            elapsed_ms: 4_000.0,
            ..tally(10, 0)
        };
        let slow = CrossingTally {
            elapsed_ms: 25_000.0,
            ..tally(10, 0)
        };
        assert_eq!(final_score(Outcome::Success, &quick), 12_756);
        assert_eq!(final_score(Outcome::Success, &slow), 12_750);
    }

    #[test]
    fn broken_beams_cost_the_perfect_bonus() {
        // 5000 + 3000 + 0.8 * 2000 - 250 + 10
        assert_eq!(final_score(Outcome::Success, &tally(10, 2)), 9_360);
    }

    #[test]
    fn expensive_bridges_floor_at_zero() {
        let wasteful = CrossingTally {
            total_beams: 1000,
            broken_beams: 1000,
            material_cost: 10.0,
            load_weight: 20.0,
            elapsed_ms: 60_000.0,
        };
        assert_eq!(final_score(Outcome::Success, &wasteful), 0);
        assert_eq!(preview_score(1000, 10.0, 20.0), 100);
    }

    #[test]
    fn empty_bridge_has_zero_survival_ratio() {
        assert_eq!(tally(0, 0).survival_ratio(), 0.0);
        assert_eq!(final_score(Outcome::Failure, &tally(0, 0)), 500);
    }
}
