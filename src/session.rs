//! The crossing session: `Idle -> Running -> Resolved -> Idle`.
//!
//! A [`Simulation`] owns every piece of state a crossing needs: the engine
//! bindings, the timers, the vehicle and the break effects. The bridge and the
//! engine are borrowed for each call, so the session never outlives either.

use nalgebra::Vector2;
use tracing::{debug, info};

use crate::bridge::Bridge;
use crate::config::SimulationConfig;
use crate::connectivity::check_ready;
use crate::effects::BreakEffects;
use crate::errors::{ConfigError, StartError};
use crate::geometry::Point;
use crate::physics::{BodyHandle, BodySpec, PhysicsBindings, PhysicsDelegate};
use crate::scoring::{final_score, CrossingTally, Outcome};
use crate::strain::{BeamBreak, StrainEvaluator};
use crate::timers::{TimerKind, TimerSet};
use crate::vehicle::VehicleSpec;

/// Where the session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No crossing; the bridge is editable.
    Idle,
    /// The vehicle is on its way.
    Running,
    /// An outcome was latched and is on display until the session settles.
    Resolved(Outcome),
}

/// Something that happened while the session advanced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    /// The vehicle entered the world.
    VehicleSpawned(VehicleSpec),
    /// A beam exceeded its strength.
    BeamBroke(BeamBreak),
    /// The crossing ended and was scored.
    Resolved {
        /// How it ended.
        outcome: Outcome,
        /// Final score written to the bridge.
        score: u32,
        /// Vehicle that attempted the crossing.
        vehicle: VehicleSpec,
    },
    /// The vehicle is no longer pushed.
    PushTimedOut,
    /// The session tore down and returned to idle.
    Stopped,
}

/// The vehicle of a running crossing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vehicle {
    /// Engine body.
    pub body: BodyHandle,
    /// Size, mass and class.
    pub spec: VehicleSpec,
}

/// Decide the crossing from the vehicle position.
///
/// Reaching the far side is checked before falling, so a vehicle that
/// satisfies both succeeds.
///
/// # Examples
/// ```
/// use bridgesim::geometry::point;
/// use bridgesim::scoring::Outcome;
/// use bridgesim::session::judge_position;
/// use bridgesim::SimulationConfig;
///
/// let config = SimulationConfig::default();
/// assert_eq!(judge_position(point(960.0, 500.0), &config), Some(Outcome::Success));
/// assert_eq!(judge_position(point(600.0, 660.0), &config), Some(Outcome::Failure));
/// assert_eq!(judge_position(point(600.0, 500.0), &config), None);
/// ```
#[must_use]
pub fn judge_position(position: Point, config: &SimulationConfig) -> Option<Outcome> {
    if position.x > config.success_x() {
        Some(Outcome::Success)
    } else if position.y > config.failure_y() {
        Some(Outcome::Failure)
    } else {
        None
    }
}

/// State of one crossing, reusable across crossings.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    phase: Phase,
    timers: TimerSet,
    bindings: PhysicsBindings,
    evaluator: StrainEvaluator,
    effects: BreakEffects,
    vehicle: Option<Vehicle>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::idle(SimulationConfig::default())
    }
}

impl Simulation {
    /// Create an idle session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails
    /// [`SimulationConfig::validate`].
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::idle(config))
    }

    fn idle(config: SimulationConfig) -> Self {
        Self {
            evaluator: StrainEvaluator::new(config.stress_scale),
            effects: BreakEffects::new(config.effects_seed),
            config,
            phase: Phase::Idle,
            timers: TimerSet::new(),
            bindings: PhysicsBindings::default(),
            vehicle: None,
        }
    }

    /// Parameters of this session.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a crossing holds the bridge.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// The latched outcome, until the session stops.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Milliseconds since the crossing started.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.timers.now()
    }

    /// The vehicle, once spawned.
    #[must_use]
    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    /// Engine handles of the running crossing.
    #[must_use]
    pub fn bindings(&self) -> &PhysicsBindings {
        &self.bindings
    }

    /// Break particles of the running crossing.
    #[must_use]
    pub fn effects(&self) -> &BreakEffects {
        &self.effects
    }

    /// Whether a timer of `kind` is pending.
    #[must_use]
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.is_scheduled(kind)
    }

    /// Begin a crossing over `bridge`.
    ///
    /// The bridge is checked before anything touches the engine; on success
    /// it is locked, bound to `physics` and the session timers are armed.
    ///
    /// # Errors
    ///
    /// Returns [`StartError::AlreadyRunning`] when a crossing is in progress and
    /// the [`check_ready`] errors for a bridge that cannot carry a vehicle.
    pub fn start<P: PhysicsDelegate + ?Sized>(
        &mut self,
        bridge: &mut Bridge,
        physics: &mut P,
    ) -> Result<(), StartError> {
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }
        check_ready(bridge)?;

        bridge.set_locked(true);
        bridge.reset_beams();
        self.bindings = PhysicsBindings::bind(bridge, physics, &self.config);
        self.effects.clear();
        self.vehicle = None;
        self.timers = TimerSet::new();
        self.timers.every(TimerKind::StrainTick, self.config.strain_tick_ms);
        self.timers.every(TimerKind::OutcomePoll, self.config.outcome_poll_ms);
        self.timers
            .after(TimerKind::VehicleSpawn, self.config.vehicle_spawn_delay_ms);
        self.phase = Phase::Running;
        info!(
            joints = bridge.joint_count(),
            beams = bridge.beam_count(),
            load_weight = bridge.load_weight(),
            "crossing started"
        );
        Ok(())
    }

    /// Move the session clock forward by `elapsed_ms`.
    ///
    /// The engine is stepped in slices of the configured physics step; after
    /// each slice every timer that came due fires in deadline order. Does
    /// nothing while idle or for a step that is not a positive finite number.
    pub fn advance<P: PhysicsDelegate + ?Sized>(
        &mut self,
        bridge: &mut Bridge,
        physics: &mut P,
        elapsed_ms: f64,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.is_running() || !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return events;
        }
        let target = self.timers.now() + elapsed_ms;
        let mut clock = self.timers.now();
        while clock < target && self.is_running() {
            let remaining = target - clock;
            let slice = self.config.physics_step_ms.min(remaining);
            physics.step(slice);
            // A slice lost to rounding must not stall the clock.
            clock = if slice >= remaining || clock + slice <= clock {
                target
            } else {
                clock + slice
            };
            while let Some(kind) = self.timers.pop_due(clock) {
                self.fire(kind, bridge, physics, &mut events);
                if !self.is_running() {
                    break;
                }
            }
            self.timers.advance_to(clock);
        }
        events
    }

    /// Tear the crossing down and return to idle.
    ///
    /// Removes everything the session created in `physics`, resets every
    /// beam and unlocks the bridge. No score is computed. Stopping an idle
    /// session does nothing.
    pub fn stop<P: PhysicsDelegate + ?Sized>(&mut self, bridge: &mut Bridge, physics: &mut P) {
        if !self.is_running() {
            return;
        }
        self.timers.cancel_all();
        if let Some(vehicle) = self.vehicle.take() {
            physics.remove_body(vehicle.body);
        }
        self.bindings.release_all(physics);
        self.effects.clear();
        bridge.reset_beams();
        bridge.set_locked(false);
        self.phase = Phase::Idle;
        info!(elapsed_ms = self.timers.now(), "crossing stopped");
    }

    fn fire<P: PhysicsDelegate + ?Sized>(
        &mut self,
        kind: TimerKind,
        bridge: &mut Bridge,
        physics: &mut P,
        events: &mut Vec<SessionEvent>,
    ) {
        match kind {
            TimerKind::StrainTick => {
                let breaks = self.evaluator.evaluate(bridge, &mut self.bindings, physics);
                for broke in breaks {
                    self.effects.spawn(broke.beam, broke.midpoint, self.timers.now());
                    events.push(SessionEvent::BeamBroke(broke));
                }
                self.effects.tick();
            }
            TimerKind::VehicleSpawn => {
                let spec = VehicleSpec::for_load(bridge.load_weight());
                let (width, height) = spec.body_size();
                let body = physics.create_body(
                    BodySpec::rectangle(self.config.layout.vehicle_start(), width, height)
                        .with_mass(spec.mass)
                        .with_friction(0.8, 0.9)
                        .with_restitution(0.3),
                );
                self.vehicle = Some(Vehicle { body, spec });
                self.timers.every(TimerKind::VehiclePush, self.config.push_interval_ms);
                self.timers.after(TimerKind::PushTimeout, self.config.push_timeout_ms);
                info!(class = %spec.class, mass = spec.mass, "vehicle spawned");
                events.push(SessionEvent::VehicleSpawned(spec));
            }
            TimerKind::VehiclePush => {
                if let Some(vehicle) = self.vehicle {
                    let force = vehicle.spec.push_force(self.config.push_factor);
                    physics.apply_force(vehicle.body, Vector2::new(force, 0.0));
                }
            }
            TimerKind::PushTimeout => {
                self.timers.cancel(TimerKind::VehiclePush);
                debug!("vehicle push timed out");
                events.push(SessionEvent::PushTimedOut);
            }
            TimerKind::OutcomePoll => {
                if self.phase != Phase::Running {
                    return;
                }
                let Some(vehicle) = self.vehicle else {
                    return;
                };
                let Some(position) = physics.body_position(vehicle.body) else {
                    return;
                };
                if let Some(outcome) = judge_position(position, &self.config) {
                    self.resolve(outcome, vehicle.spec, bridge, events);
                }
            }
            TimerKind::Settle => {
                self.stop(bridge, physics);
                events.push(SessionEvent::Stopped);
            }
        }
    }

    /// Latch `outcome`, score it and schedule the teardown.
    fn resolve(
        &mut self,
        outcome: Outcome,
        vehicle: VehicleSpec,
        bridge: &mut Bridge,
        events: &mut Vec<SessionEvent>,
    ) {
        let tally = CrossingTally {
            total_beams: bridge.beam_count(),
            broken_beams: bridge.broken_beam_count(),
            material_cost: bridge.material().cost,
            load_weight: bridge.load_weight(),
            elapsed_ms: self.timers.now(),
        };
        let score = final_score(outcome, &tally);
        bridge.set_score(score);
        self.phase = Phase::Resolved(outcome);
        self.timers.cancel(TimerKind::OutcomePoll);
        self.timers.after(TimerKind::Settle, self.config.settle_delay_ms);
        info!(
            ?outcome,
            score,
            broken = tally.broken_beams,
            elapsed_ms = tally.elapsed_ms,
            "crossing resolved"
        );
        events.push(SessionEvent::Resolved {
            outcome,
            score,
            vehicle,
        });
    }
}
