#![warn(clippy::pedantic)]

use std::collections::HashMap;

use bridgesim::notice::NoticeKind;
use bridgesim::physics::{BodyHandle, BodySpec, ConstraintHandle, ConstraintSpec};
use bridgesim::store::{self, KeyValueStore, MemoryStore, BEST_SCORE_KEY, DESIGN_KEY};
use bridgesim::timers::TimerKind;
use bridgesim::{
    point, Bridge, BridgeBuilder, ClickAction, Design, Outcome, Phase, PhysicsDelegate, Point,
    SessionEvent, Simulation, SimulationConfig, StartError, VerletWorld, WorldLayout,
};
use nalgebra::Vector2;

/// Engine whose bodies stay where they were created until a test moves them.
#[derive(Debug, Default)]
struct StubPhysics {
    next: u64,
    bodies: HashMap<BodyHandle, Point>,
    constraints: HashMap<ConstraintHandle, (BodyHandle, BodyHandle)>,
    pushes: usize,
}

impl StubPhysics {
    fn teleport(&mut self, body: BodyHandle, position: Point) {
        self.bodies.insert(body, position);
    }
}

impl PhysicsDelegate for StubPhysics {
    fn create_body(&mut self, spec: BodySpec) -> BodyHandle {
        self.next += 1;
        let handle = BodyHandle(self.next);
        self.bodies.insert(handle, spec.position);
        handle
    }

    fn create_constraint(&mut self, spec: ConstraintSpec) -> ConstraintHandle {
        self.next += 1;
        let handle = ConstraintHandle(self.next);
        self.constraints.insert(handle, (spec.body_a, spec.body_b));
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
        self.constraints.retain(|_, (a, b)| *a != body && *b != body);
    }

    fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.remove(&constraint);
    }

    fn body_position(&self, body: BodyHandle) -> Option<Point> {
        self.bodies.get(&body).copied()
    }

    fn body_angle(&self, body: BodyHandle) -> Option<f64> {
        self.bodies.get(&body).map(|_| 0.0)
    }

    fn apply_force(&mut self, _body: BodyHandle, _force: Vector2<f64>) {
        self.pushes += 1;
    }

    fn step(&mut self, _dt_ms: f64) {}
}

/// Click a three-panel steel deck into place.
fn click_deck(builder: &mut BridgeBuilder<StubPhysics>) {
    for x in [450.0, 750.0] {
        assert!(matches!(builder.click(point(x, 450.0)), ClickAction::Placed(_)));
    }
    for (from, to) in [(200.0, 450.0), (450.0, 750.0), (750.0, 1000.0)] {
        builder.click(point(from, 450.0));
        assert!(matches!(builder.click(point(to, 450.0)), ClickAction::Connected(_)));
    }
}

#[test]
fn successful_crossing_end_to_end() {
    let mut builder = BridgeBuilder::new(SimulationConfig::default(), StubPhysics::default())
        .expect("default config is valid");
    click_deck(&mut builder);
    builder.set_load_weight(60.0).expect("idle");
    builder.start().expect("deck spans the gap");

    let events = builder.advance(1000.0);
    assert!(matches!(events.as_slice(), [SessionEvent::VehicleSpawned(_)]));
    let vehicle = builder.simulation().vehicle().expect("spawned").body;

    // Drive the vehicle across by hand, one outcome poll per hop.
    for x in [300.0, 600.0, 960.0] {
        builder.physics_mut().teleport(vehicle, point(x, 430.0));
        builder.advance(500.0);
    }

    assert_eq!(builder.simulation().outcome(), Some(Outcome::Success));
    let notice = builder.notice().expect("outcome announced");
    assert_eq!(notice.title, "Bridge Success!");
    assert_eq!(notice.kind, NoticeKind::Warning);
    assert!(notice.message.contains("car (60kg)"));
    let score = builder.bridge().score();
    assert!(score > 10_000);

    let events = builder.advance(3000.0);
    assert_eq!(events.last(), Some(&SessionEvent::Stopped));
    assert_eq!(builder.simulation().phase(), Phase::Idle);
    assert_eq!(builder.bridge().score(), score);
    assert!(builder.physics().bodies.is_empty());
    assert!(builder.physics().constraints.is_empty());
    assert!(builder.physics().pushes > 0);

    let mut memory = MemoryStore::default();
    store::save(&mut memory, DESIGN_KEY, &Design::capture(builder.bridge())).expect("saved");
    assert_eq!(store::record_best_score(&mut memory, score).expect("saved"), score);
    assert_eq!(memory.get(BEST_SCORE_KEY), Some(score.to_string()));
    let saved: Design = store::load_or_default(&memory, DESIGN_KEY);
    assert_eq!(saved.beams.len(), 3);
}

#[test]
fn collapse_is_a_failure_worth_surviving_beams() {
    let config = SimulationConfig::default();
    let mut bridge = Design {
        joints: vec![point(450.0, 450.0), point(750.0, 450.0)],
        beams: ["Steel", "Steel", "Steel"]
            .iter()
            .zip([(0, 2), (2, 3), (3, 1)])
            .map(|(material, (start, end))| bridgesim::design::BeamRecord {
                start,
                end,
                material: (*material).to_string(),
            })
            .collect(),
        load_weight: 90.0,
    }
    .build(&config.layout)
    .expect("valid design");
    let mut physics = StubPhysics::default();
    let mut simulation = Simulation::new(config).expect("default config is valid");
    simulation.start(&mut bridge, &mut physics).expect("connected");
    simulation.advance(&mut bridge, &mut physics, 1000.0);

    // Drop the middle of the deck: both beams touching it overstretch.
    let joint = bridge
        .joints()
        .find(|(_, joint)| joint.position() == point(450.0, 450.0))
        .map(|(id, _)| id)
        .expect("deck joint");
    let body = simulation.bindings().joint_body(joint).expect("bound");
    physics.teleport(body, point(450.0, 1200.0));
    let vehicle = simulation.vehicle().expect("spawned").body;
    physics.teleport(vehicle, point(450.0, 700.0));

    let events = simulation.advance(&mut bridge, &mut physics, 500.0);
    let breaks = events
        .iter()
        .filter(|event| matches!(event, SessionEvent::BeamBroke(_)))
        .count();
    assert_eq!(breaks, 2);
    assert_eq!(bridge.broken_beam_count(), 2);
    assert_eq!(simulation.outcome(), Some(Outcome::Failure));
    // 500 + 50 for the one surviving beam.
    assert_eq!(bridge.score(), 550);
    assert!(!simulation.is_scheduled(TimerKind::OutcomePoll));

    simulation.stop(&mut bridge, &mut physics);
    assert_eq!(bridge.broken_beam_count(), 0);
    assert!(physics.bodies.is_empty());
    assert_eq!(bridge.score(), 550);
}

#[test]
fn start_gate_runs_before_any_body_is_created() {
    let mut physics = StubPhysics::default();
    let mut simulation = Simulation::default();

    let mut bridge = Bridge::default();
    assert_eq!(simulation.start(&mut bridge, &mut physics), Err(StartError::NoJoints));

    bridge.add_joint(point(600.0, 450.0)).expect("idle");
    assert_eq!(simulation.start(&mut bridge, &mut physics), Err(StartError::NoBeams));

    let (left, _) = bridge.anchors();
    let near = bridge.add_joint(point(400.0, 450.0)).expect("idle");
    bridge.add_beam(left, near).expect("fits");
    assert_eq!(
        simulation.start(&mut bridge, &mut physics),
        Err(StartError::NotConnected)
    );
    assert!(physics.bodies.is_empty());
    assert!(!bridge.is_locked());
}

#[test]
fn verlet_world_drives_the_vehicle_forward() {
    let config = SimulationConfig::default();
    let layout = WorldLayout::default();
    let mut bridge = Bridge::new(&layout);
    let (left, right) = bridge.anchors();
    let mut previous = left;
    for x in [450.0, 750.0] {
        let joint = bridge.add_joint(point(x, 450.0)).expect("idle");
        bridge.add_beam(previous, joint).expect("fits");
        previous = joint;
    }
    bridge.add_beam(previous, right).expect("fits");

    let mut physics = VerletWorld::new(&layout);
    let mut simulation = Simulation::new(config).expect("default config is valid");
    simulation.start(&mut bridge, &mut physics).expect("connected");
    for _ in 0..180 {
        simulation.advance(&mut bridge, &mut physics, 1000.0 / 60.0);
    }

    let vehicle = simulation.vehicle().expect("spawned after one second").body;
    let position = physics.body_position(vehicle).expect("live");
    assert!(position.x > 100.0, "vehicle stuck at {position:?}");
    assert!(position.y < 600.0, "vehicle fell through at {position:?}");

    simulation.stop(&mut bridge, &mut physics);
    assert_eq!(physics.body_count(), 0);
    assert_eq!(physics.constraint_count(), 0);
}
