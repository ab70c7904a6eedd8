//! Cosmetic particle bursts shown where a beam broke.
//!
//! Bursts are keyed by beam id and break time and never feed back into the
//! mechanical state or the score.

use nalgebra::Vector2;
use petgraph::graph::EdgeIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::Point;

/// Particles spawned per break.
pub const PARTICLES_PER_BURST: usize = 8;
/// Downward acceleration per tick.
const GRAVITY: f64 = 0.2;
/// Life lost per tick.
const DECAY: f64 = 0.02;

/// One fragment of a broken beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Current position.
    pub position: Point,
    /// Displacement per tick.
    pub velocity: Vector2<f64>,
    /// Remaining life, from 1 down to 0.
    pub life: f64,
}

/// Particles spawned for one broken beam.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakBurst {
    /// Beam that broke.
    pub beam: EdgeIndex,
    /// Session clock when it broke.
    pub started_ms: f64,
    /// Live particles.
    pub particles: Vec<Particle>,
}

/// Every live burst of the current crossing.
#[derive(Clone, Debug)]
pub struct BreakEffects {
    bursts: Vec<BreakBurst>,
    rng: StdRng,
}

impl Default for BreakEffects {
    fn default() -> Self {
        Self::new(0)
    }
}

impl BreakEffects {
    /// Create an empty layer with a seeded particle generator.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            bursts: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Live bursts.
    #[must_use]
    pub fn bursts(&self) -> &[BreakBurst] {
        &self.bursts
    }

    /// Whether nothing is animating.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    /// The burst of `beam`, while it lasts.
    #[must_use]
    pub fn burst_for(&self, beam: EdgeIndex) -> Option<&BreakBurst> {
        self.bursts.iter().find(|burst| burst.beam == beam)
    }

    /// Scatter particles around `midpoint`, thrown mostly upwards.
    pub fn spawn(&mut self, beam: EdgeIndex, midpoint: Point, now_ms: f64) {
        let particles = (0..PARTICLES_PER_BURST)
            .map(|_| Particle {
                position: Point::new(
                    midpoint.x + self.rng.gen_range(-10.0..10.0),
                    midpoint.y + self.rng.gen_range(-10.0..10.0),
                ),
                velocity: Vector2::new(
                    self.rng.gen_range(-3.0..3.0),
                    self.rng.gen_range(-3.0..3.0) - 2.0,
                ),
                life: 1.0,
            })
            .collect();
        self.bursts.push(BreakBurst {
            beam,
            started_ms: now_ms,
            particles,
        });
    }

    /// Advance every particle by one tick and drop the dead ones.
    pub fn tick(&mut self) {
        for burst in &mut self.bursts {
            for particle in &mut burst.particles {
                particle.position = Point::from(particle.position.to_vector() + particle.velocity);
                particle.velocity.y += GRAVITY;
                particle.life = (particle.life - DECAY).max(0.0);
            }
            burst.particles.retain(|particle| particle.life > 0.0);
        }
        self.bursts.retain(|burst| !burst.particles.is_empty());
    }

    /// Drop every burst.
    pub fn clear(&mut self) {
        self.bursts.clear();
    }
}
