//! A small position-based engine implementing [`PhysicsDelegate`].
//!
//! Bodies are integrated with Verlet steps and distance constraints are
//! relaxed a fixed number of times per step. A constraint attached off-centre
//! on its second body is a pin: bodies held by pins are carried by the bodies
//! they are pinned to instead of being integrated. Dynamic rectangles that are
//! not pinned are vehicles; they land on the banks of the layout and on top of
//! pinned rectangles, pushing the bodies those are pinned to downwards.

use std::collections::BTreeMap;

use nalgebra::{Rotation2, Vector2};

use crate::config::WorldLayout;
use crate::geometry::{Point, Rect};
use crate::physics::{
    BodyHandle, BodySpec, ConstraintHandle, ConstraintSpec, PhysicsDelegate, Shape,
};

/// Downward acceleration in px/ms².
pub const GRAVITY: f64 = 0.0005;
/// Fraction of velocity lost per step.
pub const AIR_DAMPING: f64 = 0.01;
/// Speed limit in px/ms.
pub const MAX_SPEED: f64 = 0.36;
/// Constraint relaxation passes per step.
pub const SOLVER_ITERATIONS: usize = 2;
/// Mass per px² of bodies created without an explicit mass.
pub const DEFAULT_DENSITY: f64 = 0.001;

#[derive(Clone, Debug)]
struct Body {
    spec: BodySpec,
    position: Vector2<f64>,
    previous: Vector2<f64>,
    angle: f64,
    inverse_mass: f64,
    force: Vector2<f64>,
}

impl Body {
    fn new(spec: BodySpec) -> Self {
        let area = match spec.shape {
            Shape::Circle { radius } => std::f64::consts::PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
        };
        let mass = spec.mass.unwrap_or(area * DEFAULT_DENSITY);
        let inverse_mass = if spec.fixed || mass <= 0.0 { 0.0 } else { 1.0 / mass };
        let position = spec.position.to_vector();
        Self {
            spec,
            position,
            previous: position,
            angle: spec.angle,
            inverse_mass,
            force: Vector2::zeros(),
        }
    }

    fn local_to_world(&self, local: Point) -> Vector2<f64> {
        self.position + Rotation2::new(self.angle) * local.to_vector()
    }
}

#[derive(Clone, Copy, Debug)]
struct Constraint {
    spec: ConstraintSpec,
    rest_length: f64,
}

impl Constraint {
    fn is_pin(&self) -> bool {
        self.spec.point_b != Point::default()
    }
}

/// Reference engine used by the command line and the integration tests.
#[derive(Clone, Debug)]
pub struct VerletWorld {
    next_id: u64,
    bodies: BTreeMap<BodyHandle, Body>,
    constraints: BTreeMap<ConstraintHandle, Constraint>,
    platforms: Vec<Rect>,
    gravity: f64,
}

impl Default for VerletWorld {
    fn default() -> Self {
        Self::new(&WorldLayout::default())
    }
}

impl VerletWorld {
    /// An empty world whose solid ground is the banks of `layout`.
    #[must_use]
    pub fn new(layout: &WorldLayout) -> Self {
        Self {
            next_id: 0,
            bodies: BTreeMap::new(),
            constraints: BTreeMap::new(),
            platforms: layout.banks().to_vec(),
            gravity: GRAVITY,
        }
    }

    /// Replace the downward acceleration.
    #[must_use]
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn integrate(&mut self, dt: f64) {
        let carried = self.carried_bodies();
        let max_step = MAX_SPEED * dt;
        for (handle, body) in &mut self.bodies {
            if body.inverse_mass == 0.0 || carried.contains_key(handle) {
                body.force = Vector2::zeros();
                continue;
            }
            let mut velocity = (body.position - body.previous) * (1.0 - AIR_DAMPING);
            if velocity.norm() > max_step {
                velocity = velocity.normalize() * max_step;
            }
            let acceleration = Vector2::new(0.0, self.gravity) + body.force * body.inverse_mass;
            body.previous = body.position;
            body.position += velocity + acceleration * dt * dt;
            body.force = Vector2::zeros();
        }
    }

    fn relax_constraints(&mut self) {
        let constraints: Vec<_> = self.constraints.values().copied().collect();
        for constraint in constraints.iter().filter(|constraint| !constraint.is_pin()) {
            let spec = constraint.spec;
            let (Some(a), Some(b)) = (self.bodies.get(&spec.body_a), self.bodies.get(&spec.body_b))
            else {
                continue;
            };
            let total = a.inverse_mass + b.inverse_mass;
            let delta = b.position - a.position;
            let distance = delta.norm();
            if total == 0.0 || distance < 1e-9 {
                continue;
            }
            let normal = delta / distance;
            let (share_a, share_b) = (a.inverse_mass / total, b.inverse_mass / total);
            let correction = normal * (distance - constraint.rest_length) * spec.stiffness;
            let relative_speed =
                ((b.position - b.previous) - (a.position - a.previous)).dot(&normal);
            let damping = normal * relative_speed * spec.damping;

            if let Some(a) = self.bodies.get_mut(&spec.body_a) {
                a.position += correction * share_a;
                a.previous -= damping * share_a;
            }
            if let Some(b) = self.bodies.get_mut(&spec.body_b) {
                b.position -= correction * share_b;
                b.previous += damping * share_b;
            }
        }
    }

    /// Pinned bodies with the world anchor and local offset of each pin.
    fn carried_bodies(&self) -> BTreeMap<BodyHandle, Vec<(Vector2<f64>, Vector2<f64>)>> {
        let mut carried: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for constraint in self.constraints.values().filter(|constraint| constraint.is_pin()) {
            let Some(anchor) = self.bodies.get(&constraint.spec.body_a) else {
                continue;
            };
            carried
                .entry(constraint.spec.body_b)
                .or_default()
                .push((anchor.position, constraint.spec.point_b.to_vector()));
        }
        carried
    }

    fn carry_pinned(&mut self) {
        for (handle, pins) in self.carried_bodies() {
            let Some(body) = self.bodies.get_mut(&handle) else {
                continue;
            };
            if let [(anchor_p, local_p), (anchor_q, local_q), ..] = pins.as_slice() {
                let world = anchor_q - anchor_p;
                let local = local_q - local_p;
                body.angle = world.y.atan2(world.x) - local.y.atan2(local.x);
            }
            let rotation = Rotation2::new(body.angle);
            let sum = pins.iter().fold(Vector2::<f64>::zeros(), |sum, &(anchor, local)| {
                sum + anchor - rotation * local
            });
            body.position = sum / pins.len() as f64;
            body.previous = body.position;
        }
    }

    /// Top surfaces of pinned rectangles as segments, with the bodies carrying
    /// each end.
    fn decks(&self) -> Vec<(Vector2<f64>, Vector2<f64>, f64, BodyHandle, BodyHandle)> {
        let carried = self.carried_bodies();
        let mut decks = Vec::new();
        for (handle, body) in &self.bodies {
            let Shape::Rectangle { width, height } = body.spec.shape else {
                continue;
            };
            if !carried.contains_key(handle) {
                continue;
            }
            let mut pins: Vec<_> = self
                .constraints
                .values()
                .filter(|constraint| constraint.is_pin() && constraint.spec.body_b == *handle)
                .map(|constraint| (constraint.spec.point_b.x, constraint.spec.body_a))
                .collect();
            pins.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (Some(&(_, left)), Some(&(_, right))) = (pins.first(), pins.last()) else {
                continue;
            };
            let start = body.local_to_world(Point::new(-width / 2.0, 0.0));
            let end = body.local_to_world(Point::new(width / 2.0, 0.0));
            decks.push((start, end, height / 2.0, left, right));
        }
        decks
    }

    fn collide_vehicles(&mut self) {
        let carried = self.carried_bodies();
        let vehicles: Vec<_> = self
            .bodies
            .iter()
            .filter(|(handle, body)| {
                body.inverse_mass > 0.0
                    && matches!(body.spec.shape, Shape::Rectangle { .. })
                    && !carried.contains_key(handle)
            })
            .map(|(handle, _)| *handle)
            .collect();
        let decks = self.decks();
        for vehicle in vehicles {
            self.land_on_platforms(vehicle);
            self.land_on_decks(vehicle, &decks);
        }
    }

    fn land_on_platforms(&mut self, vehicle: BodyHandle) {
        let Some(body) = self.bodies.get_mut(&vehicle) else {
            return;
        };
        let Shape::Rectangle { width, height } = body.spec.shape else {
            return;
        };
        let (half_w, half_h) = (width / 2.0, height / 2.0);
        for platform in &self.platforms {
            let p = body.position;
            let up = p.y + half_h - platform.top;
            let down = platform.bottom - (p.y - half_h);
            let left = p.x + half_w - platform.left;
            let right = platform.right - (p.x - half_w);
            if up <= 0.0 || down <= 0.0 || left <= 0.0 || right <= 0.0 {
                continue;
            }
            let least = up.min(down).min(left).min(right);
            if least == up {
                body.position.y -= up;
                body.previous.y = body.position.y;
            } else if least == down {
                body.position.y += down;
                body.previous.y = body.position.y;
            } else if least == left {
                body.position.x -= left;
                body.previous.x = body.position.x;
            } else {
                body.position.x += right;
                body.previous.x = body.position.x;
            }
        }
    }

    fn land_on_decks(
        &mut self,
        vehicle: BodyHandle,
        decks: &[(Vector2<f64>, Vector2<f64>, f64, BodyHandle, BodyHandle)],
    ) {
        let Some(body) = self.bodies.get(&vehicle) else {
            return;
        };
        let Shape::Rectangle { height, .. } = body.spec.shape else {
            return;
        };
        let bottom = body.position + Vector2::new(0.0, height / 2.0);
        let inverse_vehicle = body.inverse_mass;

        // Highest surface under the vehicle that it has sunk into.
        let mut support: Option<(f64, f64, BodyHandle, BodyHandle)> = None;
        for &(start, end, half_thickness, left, right) in decks {
            let (lo, hi) = if start.x <= end.x { (start, end) } else { (end, start) };
            let span = hi.x - lo.x;
            if span < 1e-9 || bottom.x < lo.x || bottom.x > hi.x {
                continue;
            }
            let t = (bottom.x - lo.x) / span;
            let surface = lo.y + (hi.y - lo.y) * t - half_thickness;
            let depth = bottom.y - surface;
            if depth <= 0.0 || depth > height / 2.0 + 2.0 * half_thickness {
                continue;
            }
            let t = if start.x <= end.x { t } else { 1.0 - t };
            if support.map_or(true, |(_, best, ..)| depth > best) {
                support = Some((t, depth, left, right));
            }
        }
        let Some((t, depth, left, right)) = support else {
            return;
        };

        let inverse_left = self.bodies.get(&left).map_or(0.0, |body| body.inverse_mass);
        let inverse_right = self.bodies.get(&right).map_or(0.0, |body| body.inverse_mass);
        let total = inverse_vehicle
            + (1.0 - t) * (1.0 - t) * inverse_left
            + t * t * inverse_right;
        if total == 0.0 {
            return;
        }
        let lambda = depth / total;
        if let Some(body) = self.bodies.get_mut(&vehicle) {
            body.position.y -= lambda * inverse_vehicle;
            body.previous.y = body.position.y;
        }
        if let Some(body) = self.bodies.get_mut(&left) {
            body.position.y += lambda * (1.0 - t) * inverse_left;
        }
        if let Some(body) = self.bodies.get_mut(&right) {
            body.position.y += lambda * t * inverse_right;
        }
    }
}

impl PhysicsDelegate for VerletWorld {
    fn create_body(&mut self, spec: BodySpec) -> BodyHandle {
        let handle = BodyHandle(self.next_id());
        self.bodies.insert(handle, Body::new(spec));
        handle
    }

    fn create_constraint(&mut self, spec: ConstraintSpec) -> ConstraintHandle {
        let rest_length = match (self.bodies.get(&spec.body_a), self.bodies.get(&spec.body_b)) {
            (Some(a), Some(b)) => (b.local_to_world(spec.point_b) - a.position).norm(),
            _ => 0.0,
        };
        let handle = ConstraintHandle(self.next_id());
        self.constraints.insert(handle, Constraint { spec, rest_length });
        handle
    }

    fn remove_body(&mut self, body: BodyHandle) {
        self.bodies.remove(&body);
        self.constraints.retain(|_, constraint| {
            constraint.spec.body_a != body && constraint.spec.body_b != body
        });
    }

    fn remove_constraint(&mut self, constraint: ConstraintHandle) {
        self.constraints.remove(&constraint);
    }

    fn body_position(&self, body: BodyHandle) -> Option<Point> {
        self.bodies.get(&body).map(|body| Point::from(body.position))
    }

    fn body_angle(&self, body: BodyHandle) -> Option<f64> {
        self.bodies.get(&body).map(|body| body.angle)
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vector2<f64>) {
        if let Some(body) = self.bodies.get_mut(&body) {
            body.force += force;
        }
    }

    fn step(&mut self, dt_ms: f64) {
        if dt_ms.is_nan() || dt_ms <= 0.0 {
            return;
        }
        self.integrate(dt_ms);
        for _ in 0..SOLVER_ITERATIONS {
            self.relax_constraints();
        }
        self.carry_pinned();
        self.collide_vehicles();
        self.carry_pinned();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::bridge::Bridge;
    use crate::config::SimulationConfig;
    use crate::geometry::point;
    use crate::physics::PhysicsBindings;

    #[test]
    fn free_bodies_fall_and_fixed_ones_stay() {
        let mut world = VerletWorld::default();
        let free = world.create_body(BodySpec::circle(point(600.0, 100.0), 10.0));
        let pinned = world.create_body(BodySpec::circle(point(600.0, 200.0), 10.0).fixed());
        for _ in 0..10 {
            world.step(10.0);
        }
        assert!(world.body_position(free).expect("live").y > 100.0);
        assert_eq!(world.body_position(pinned), Some(point(600.0, 200.0)));
    }

    #[test]
    fn force_is_applied_for_one_step() {
        let mut world = VerletWorld::default().with_gravity(0.0);
        let body = world.create_body(BodySpec::circle(point(600.0, 100.0), 10.0).with_mass(2.0));
        world.apply_force(body, Vector2::new(0.02, 0.0));
        world.step(10.0);
        // a = F / m = 0.01 px/ms², over 10 ms.
        assert_relative_eq!(world.body_position(body).expect("live").x, 601.0, epsilon = 1e-9);
        world.step(10.0);
        assert_relative_eq!(world.body_position(body).expect("live").x, 601.99, epsilon = 1e-9);
    }

    #[test]
    fn constraint_holds_a_hanging_body() {
        let mut world = VerletWorld::default();
        let anchor = world.create_body(BodySpec::circle(point(600.0, 100.0), 10.0).fixed());
        let bob = world.create_body(BodySpec::circle(point(700.0, 100.0), 10.0).with_mass(1.0));
        world.create_constraint(ConstraintSpec::between(anchor, bob).with_response(0.8, 0.1));
        for _ in 0..600 {
            world.step(1000.0 / 60.0);
        }
        let length = world
            .body_position(anchor)
            .zip(world.body_position(bob))
            .map(|(a, b)| a.distance_to(b))
            .expect("both live");
        assert_relative_eq!(length, 100.0, max_relative = 0.05);
        assert!(world.body_position(bob).expect("live").y > 150.0);
    }

    #[test]
    fn removing_a_body_drops_its_constraints() {
        let mut world = VerletWorld::default();
        let a = world.create_body(BodySpec::circle(point(0.0, 0.0), 10.0));
        let b = world.create_body(BodySpec::circle(point(50.0, 0.0), 10.0));
        world.create_constraint(ConstraintSpec::between(a, b));
        world.remove_body(b);
        assert_eq!(world.constraint_count(), 0);
        assert_eq!(world.body_position(b), None);
        world.remove_body(b);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn vehicle_lands_on_the_left_bank() {
        let mut world = VerletWorld::default();
        let layout = WorldLayout::default();
        let vehicle = world.create_body(
            BodySpec::rectangle(layout.vehicle_start(), 64.0, 24.0).with_mass(10.0),
        );
        for _ in 0..30 {
            world.step(1000.0 / 60.0);
        }
        let position = world.body_position(vehicle).expect("live");
        assert_relative_eq!(position.y, layout.left_anchor().y - 12.0, epsilon = 0.5);
        assert_relative_eq!(position.x, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn decks_follow_their_joints() {
        let mut bridge = Bridge::default();
        let (left, _) = bridge.anchors();
        let middle = bridge.add_joint(point(450.0, 450.0)).expect("joint placed");
        let end = bridge.add_joint(point(700.0, 450.0)).expect("joint placed");
        let first = bridge.add_beam(left, middle).expect("beam built");
        bridge.add_beam(middle, end).expect("beam built");

        let mut world = VerletWorld::default();
        let bindings = PhysicsBindings::bind(&bridge, &mut world, &SimulationConfig::default());
        for _ in 0..60 {
            world.step(1000.0 / 60.0);
        }

        let deck = bindings.beam(first).expect("bound").deck;
        let from = world.body_position(bindings.joint_body(left).expect("bound")).expect("live");
        let to = world.body_position(bindings.joint_body(middle).expect("bound")).expect("live");
        let centre = world.body_position(deck).expect("live");
        let expected = from.midpoint(to);
        assert_relative_eq!(centre.x, expected.x, epsilon = 1.0);
        assert_relative_eq!(centre.y, expected.y, epsilon = 1.0);
        assert_relative_eq!(
            world.body_angle(deck).expect("live"),
            from.angle_to(to),
            epsilon = 1e-3
        );
    }
}
