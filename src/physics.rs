//! Seam between the bridge model and the rigid-body engine that moves it.
//!
//! The engine is a black box behind [`PhysicsDelegate`]. The model never stores
//! engine handles itself; [`PhysicsBindings`] maps joint and beam ids to the
//! handles created for the current crossing.

use std::collections::HashMap;

use nalgebra::Vector2;
use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::debug;

use crate::bridge::Bridge;
use crate::config::SimulationConfig;
use crate::geometry::{point, Point};

/// Opaque identifier of a body owned by a [`PhysicsDelegate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Opaque identifier of a constraint owned by a [`PhysicsDelegate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub u64);

/// Collision shape of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Disc centred on the body position.
    Circle {
        /// Radius in pixels.
        radius: f64,
    },
    /// Rectangle centred on the body position, rotated by the body angle.
    Rectangle {
        /// Extent along the body's local X axis.
        width: f64,
        /// Extent along the body's local Y axis.
        height: f64,
    },
}

/// Everything needed to create a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySpec {
    /// Collision shape.
    pub shape: Shape,
    /// Initial position of the centre.
    pub position: Point,
    /// Initial rotation in radians.
    pub angle: f64,
    /// Static bodies never move.
    pub fixed: bool,
    /// Explicit mass; the engine picks one from the shape when `None`.
    pub mass: Option<f64>,
    /// Kinetic friction coefficient.
    pub friction: f64,
    /// Static friction coefficient.
    pub friction_static: f64,
    /// Bounciness.
    pub restitution: f64,
}

impl BodySpec {
    /// A dynamic disc.
    #[must_use]
    pub fn circle(position: Point, radius: f64) -> Self {
        Self::with_shape(Shape::Circle { radius }, position)
    }

    /// A dynamic rectangle.
    #[must_use]
    pub fn rectangle(position: Point, width: f64, height: f64) -> Self {
        Self::with_shape(Shape::Rectangle { width, height }, position)
    }

    fn with_shape(shape: Shape, position: Point) -> Self {
        Self {
            shape,
            position,
            angle: 0.0,
            fixed: false,
            mass: None,
            friction: 0.1,
            friction_static: 0.5,
            restitution: 0.0,
        }
    }

    /// Make the body static.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Set an explicit mass.
    #[must_use]
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Set the initial rotation.
    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    /// Set kinetic and static friction.
    #[must_use]
    pub fn with_friction(mut self, friction: f64, friction_static: f64) -> Self {
        self.friction = friction;
        self.friction_static = friction_static;
        self
    }

    /// Set the restitution.
    #[must_use]
    pub fn with_restitution(mut self, restitution: f64) -> Self {
        self.restitution = restitution;
        self
    }
}

/// A distance constraint between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstraintSpec {
    /// First body, attached at its centre.
    pub body_a: BodyHandle,
    /// Second body.
    pub body_b: BodyHandle,
    /// Attachment point on `body_b`, in its local frame.
    pub point_b: Point,
    /// Fraction of the length error corrected per step, in `(0, 1]`.
    pub stiffness: f64,
    /// Fraction of the relative velocity along the constraint removed per step.
    pub damping: f64,
}

impl ConstraintSpec {
    /// Join the centres of two bodies at their current separation.
    #[must_use]
    pub fn between(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self {
            body_a,
            body_b,
            point_b: point(0.0, 0.0),
            stiffness: 1.0,
            damping: 0.0,
        }
    }

    /// Attach to `body_b` at a local offset instead of its centre.
    #[must_use]
    pub fn at_point_b(mut self, point_b: Point) -> Self {
        self.point_b = point_b;
        self
    }

    /// Set stiffness and damping.
    #[must_use]
    pub fn with_response(mut self, stiffness: f64, damping: f64) -> Self {
        self.stiffness = stiffness;
        self.damping = damping;
        self
    }
}

/// The rigid-body engine driving a crossing.
///
/// Constraints keep the rest length their attachment points had when created.
/// Removing a handle that no longer exists is a no-op.
pub trait PhysicsDelegate {
    /// Add a body to the world.
    fn create_body(&mut self, spec: BodySpec) -> BodyHandle;
    /// Add a constraint to the world.
    fn create_constraint(&mut self, spec: ConstraintSpec) -> ConstraintHandle;
    /// Remove a body and every constraint still attached to it.
    fn remove_body(&mut self, body: BodyHandle);
    /// Remove a constraint.
    fn remove_constraint(&mut self, constraint: ConstraintHandle);
    /// Current centre of a body, `None` once removed.
    fn body_position(&self, body: BodyHandle) -> Option<Point>;
    /// Current rotation of a body, `None` once removed.
    fn body_angle(&self, body: BodyHandle) -> Option<f64>;
    /// Apply a force at the body centre for the next step.
    fn apply_force(&mut self, body: BodyHandle, force: Vector2<f64>);
    /// Advance the world by `dt_ms` milliseconds.
    fn step(&mut self, dt_ms: f64);
}

/// Engine handles created for one beam.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BeamBinding {
    /// Constraint between the two joint bodies.
    pub constraint: ConstraintHandle,
    /// Body the vehicle drives on.
    pub deck: BodyHandle,
    /// Constraints pinning the deck to each joint body.
    pub pins: [ConstraintHandle; 2],
}

/// Indirection table from bridge ids to engine handles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicsBindings {
    joints: HashMap<NodeIndex, BodyHandle>,
    beams: HashMap<EdgeIndex, BeamBinding>,
}

impl PhysicsBindings {
    /// Create bodies for every joint and constraints plus deck bodies for every
    /// intact beam.
    pub fn bind<P: PhysicsDelegate + ?Sized>(
        bridge: &Bridge,
        physics: &mut P,
        config: &SimulationConfig,
    ) -> Self {
        let radius = config.layout.joint_radius;
        let mut joints = HashMap::new();
        for (id, joint) in bridge.joints() {
            let spec = BodySpec::circle(joint.position(), radius).with_friction(0.9, 1.0);
            let spec = if joint.is_fixed() {
                spec.fixed()
            } else {
                spec.with_mass(1.0)
            };
            joints.insert(id, physics.create_body(spec));
        }

        let mut beams = HashMap::new();
        for (id, (a, b), beam) in bridge.beams() {
            if beam.is_broken() {
                continue;
            }
            let (Some(&body_a), Some(&body_b)) = (joints.get(&a), joints.get(&b)) else {
                continue;
            };
            let (Some(from), Some(to)) = (bridge.joint(a), bridge.joint(b)) else {
                continue;
            };
            let (from, to) = (from.position(), to.position());
            let span = from.distance_to(to);

            let constraint = physics.create_constraint(
                ConstraintSpec::between(body_a, body_b)
                    .with_response(config.beam_stiffness, config.beam_damping),
            );
            let deck = physics.create_body(
                BodySpec::rectangle(from.midpoint(to), span, config.deck_thickness)
                    .with_angle(from.angle_to(to))
                    .with_mass(config.deck_mass)
                    .with_friction(0.8, 0.9)
                    .with_restitution(0.1),
            );
            let pin = |physics: &mut P, body, offset| {
                physics.create_constraint(
                    ConstraintSpec::between(body, deck)
                        .at_point_b(point(offset, 0.0))
                        .with_response(config.pin_stiffness, config.pin_damping),
                )
            };
            let pins = [
                pin(&mut *physics, body_a, -span / 2.0),
                pin(&mut *physics, body_b, span / 2.0),
            ];
            beams.insert(
                id,
                BeamBinding {
                    constraint,
                    deck,
                    pins,
                },
            );
        }
        debug!(
            bodies = joints.len() + beams.len(),
            constraints = beams.len() * 3,
            "bridge bound to physics"
        );
        Self { joints, beams }
    }

    /// Body created for a joint.
    #[must_use]
    pub fn joint_body(&self, joint: NodeIndex) -> Option<BodyHandle> {
        self.joints.get(&joint).copied()
    }

    /// Handles created for a beam, until it is released.
    #[must_use]
    pub fn beam(&self, beam: EdgeIndex) -> Option<&BeamBinding> {
        self.beams.get(&beam)
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty() && self.beams.is_empty()
    }

    /// Remove a beam's constraints and deck from the engine.
    ///
    /// Returns `false` when the beam was not bound.
    pub fn release_beam<P: PhysicsDelegate + ?Sized>(
        &mut self,
        beam: EdgeIndex,
        physics: &mut P,
    ) -> bool {
        let Some(binding) = self.beams.remove(&beam) else {
            return false;
        };
        physics.remove_constraint(binding.constraint);
        for pin in binding.pins {
            physics.remove_constraint(pin);
        }
        physics.remove_body(binding.deck);
        true
    }

    /// Remove everything this table created from the engine.
    pub fn release_all<P: PhysicsDelegate + ?Sized>(&mut self, physics: &mut P) {
        let beams: Vec<_> = self.beams.keys().copied().collect();
        for beam in beams {
            self.release_beam(beam, physics);
        }
        for (_, body) in self.joints.drain() {
            physics.remove_body(body);
        }
    }
}
