use bridgesim::geometry::Point;
use bridgesim::scoring::Outcome;
use bridgesim::vehicle::VehicleSpec;
use bridgesim::{
    Bridge, ConfigError, PhysicsDelegate, SessionEvent, Simulation, SimulationConfig, StartError,
    VerletWorld,
};
use thiserror::Error;
use tracing::info;

/// Length of one frame of the command line run.
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Why a command line crossing could not run.
#[derive(Debug, Error)]
pub enum CrossingError {
    /// The session refused the configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The bridge cannot be crossed.
    #[error(transparent)]
    Start(#[from] StartError),
}

/// What happened during a command line crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingSummary {
    /// How the crossing ended, if it ended before the time limit.
    pub outcome: Option<Outcome>,
    /// Score left on the bridge.
    pub score: u32,
    /// Session time when the run ended.
    pub elapsed_ms: f64,
    /// Beams in the bridge.
    pub total_beams: usize,
    /// Beams that broke, in the order they broke.
    pub broken: Vec<usize>,
    /// Vehicle sent across.
    pub vehicle: Option<VehicleSpec>,
    /// Where the vehicle was when the outcome was decided, or at the time limit.
    pub vehicle_position: Option<Point>,
    /// Material whose cost was scored.
    pub material: &'static str,
    /// Load weight of the vehicle.
    pub load_weight: f64,
}

/// Drive a crossing over `bridge` with the reference engine until the
/// session settles or `max_seconds` of session time have passed.
pub fn run_crossing(
    bridge: &mut Bridge,
    config: &SimulationConfig,
    max_seconds: f64,
) -> Result<CrossingSummary, CrossingError> {
    let mut physics = VerletWorld::new(&config.layout);
    let mut simulation = Simulation::new(config.clone())?;
    simulation.start(bridge, &mut physics)?;

    let mut summary = CrossingSummary {
        outcome: None,
        score: bridge.score(),
        elapsed_ms: 0.0,
        total_beams: bridge.beam_count(),
        broken: Vec::new(),
        vehicle: None,
        vehicle_position: None,
        material: bridge.material().name,
        load_weight: bridge.load_weight(),
    };
    let limit_ms = max_seconds * 1000.0;
    while simulation.is_running() && simulation.elapsed_ms() < limit_ms {
        for event in simulation.advance(bridge, &mut physics, FRAME_MS) {
            match event {
                SessionEvent::VehicleSpawned(spec) => summary.vehicle = Some(spec),
                SessionEvent::BeamBroke(broke) => summary.broken.push(broke.beam.index()),
                SessionEvent::Resolved { outcome, score, .. } => {
                    summary.outcome = Some(outcome);
                    summary.score = score;
                    summary.vehicle_position = vehicle_position(&simulation, &physics);
                }
                SessionEvent::PushTimedOut | SessionEvent::Stopped => {}
            }
        }
        summary.elapsed_ms = simulation.elapsed_ms();
    }

    if simulation.is_running() {
        if summary.vehicle_position.is_none() {
            summary.vehicle_position = vehicle_position(&simulation, &physics);
        }
        info!(limit_ms, "time limit reached");
        simulation.stop(bridge, &mut physics);
    }
    Ok(summary)
}

fn vehicle_position(simulation: &Simulation, physics: &VerletWorld) -> Option<Point> {
    simulation
        .vehicle()
        .and_then(|vehicle| physics.body_position(vehicle.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_design;
    use bridgesim::WorldLayout;

    #[test]
    fn demo_crossing_runs_and_tears_down() {
        let config = SimulationConfig::default();
        let mut bridge = demo_design().build(&config.layout).expect("demo builds");
        let summary = run_crossing(&mut bridge, &config, 5.0).expect("demo is connected");

        assert_eq!(summary.total_beams, 19);
        assert!(summary.vehicle.is_some());
        assert!(summary.elapsed_ms >= 1000.0);
        assert!(!bridge.is_locked());
        assert_eq!(bridge.broken_beam_count(), 0);
    }

    #[test]
    fn empty_bridge_refuses_to_start() {
        let mut bridge = Bridge::new(&WorldLayout::default());
        assert!(matches!(
            run_crossing(&mut bridge, &SimulationConfig::default(), 1.0),
            Err(CrossingError::Start(StartError::NoJoints))
        ));
    }

    #[test]
    fn invalid_config_is_reported_before_starting() {
        let config = SimulationConfig {
            strain_tick_ms: 0.0,
            ..SimulationConfig::default()
        };
        let mut bridge = demo_design().build(&config.layout).expect("demo builds");
        assert!(matches!(
            run_crossing(&mut bridge, &config, 1.0),
            Err(CrossingError::Config(ConfigError::Invalid { .. }))
        ));
        assert!(!bridge.is_locked());
    }
}
