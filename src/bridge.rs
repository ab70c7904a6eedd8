//! Core data structures for the bridge under construction.

use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::config::WorldLayout;
use crate::errors::BuildError;
use crate::geometry::Point;
use crate::material::Material;
use crate::scoring::preview_score;
use crate::strain::StrainReading;
use crate::vehicle::{clamp_load_weight, MIN_LOAD_WEIGHT};

/// A point where beams meet.
#[derive(Clone, Debug, PartialEq)]
pub struct Joint {
    /// Position of the joint in pixels.
    position: Point,
    /// Anchors are fixed; everything the player places is movable.
    fixed: bool,
}

impl Joint {
    /// Position of the joint as last placed or dragged.
    #[must_use]
    pub fn position(&self) -> Point {
        self.position
    }

    /// Whether the joint is one of the two anchors.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }
}

/// A beam connecting two joints, with the mechanical state of the current crossing.
#[derive(Clone, Debug, PartialEq)]
pub struct Beam {
    /// Material selected when the beam was built.
    material: Material,
    /// Rest length recorded at creation.
    original_length: f64,
    /// Length measured on the last strain tick.
    current_length: f64,
    /// Positive in tension, negative in compression.
    signed_strain: f64,
    /// Stress magnitude from the last strain tick.
    stress: f64,
    /// Set once the beam has failed during the current crossing.
    broken: bool,
}

impl Beam {
    /// Build an unloaded beam.
    fn new(material: Material, length: f64) -> Self {
        Self {
            material,
            original_length: length,
            current_length: length,
            signed_strain: 0.0,
            stress: 0.0,
            broken: false,
        }
    }

    /// Material the beam is made of.
    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    /// Rest length recorded when the beam was created.
    #[must_use]
    pub fn original_length(&self) -> f64 {
        self.original_length
    }

    /// Length measured on the last strain tick.
    #[must_use]
    pub fn current_length(&self) -> f64 {
        self.current_length
    }

    /// `(current - original) / original`; positive means tension.
    #[must_use]
    pub fn signed_strain(&self) -> f64 {
        self.signed_strain
    }

    /// Stress magnitude from the last strain tick.
    #[must_use]
    pub fn stress(&self) -> f64 {
        self.stress
    }

    /// Stress the beam tolerates before breaking.
    #[must_use]
    pub fn max_stress(&self) -> f64 {
        self.material.strength
    }

    /// Whether the beam failed during the current crossing.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub(crate) fn apply_reading(&mut self, reading: StrainReading) {
        self.current_length = reading.current_length;
        self.signed_strain = reading.signed_strain;
        self.stress = reading.stress;
    }

    pub(crate) fn mark_broken(&mut self) {
        self.broken = true;
    }

    /// Return to the unloaded state recorded at creation.
    pub(crate) fn reset(&mut self) {
        self.current_length = self.original_length;
        self.signed_strain = 0.0;
        self.stress = 0.0;
        self.broken = false;
    }
}

/// Container for the joints and beams spanning the gap.
///
/// The two anchors are created with the bridge and never removed. Everything
/// else is added by the player and only ever removed all at once by
/// [`Bridge::clear`].
#[derive(Clone, Debug)]
pub struct Bridge {
    /// Joints are nodes, beams are edges.
    graph: UnGraph<Joint, Beam>,
    /// Left and right anchor, in that order.
    anchors: [NodeIndex; 2],
    /// Pick radius for [`Bridge::joint_at`].
    pick_radius: f64,
    /// Material used for the next beam.
    material: Material,
    /// Load weight of the vehicle sent across.
    load_weight: f64,
    /// Working score, either the build-time preview or the last final score.
    score: u32,
    /// Set while a crossing runs; every edit is rejected.
    locked: bool,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(&WorldLayout::default())
    }
}

impl Bridge {
    /// Create a bridge holding only the two anchors of `layout`.
    ///
    /// # Examples
    /// ```
    /// use bridgesim::{Bridge, WorldLayout};
    ///
    /// let bridge = Bridge::new(&WorldLayout::default());
    /// assert_eq!(bridge.joint_count(), 2);
    /// assert_eq!(bridge.beam_count(), 0);
    /// ```
    #[must_use]
    pub fn new(layout: &WorldLayout) -> Self {
        let mut graph = UnGraph::default();
        let left = graph.add_node(Joint {
            position: layout.left_anchor(),
            fixed: true,
        });
        let right = graph.add_node(Joint {
            position: layout.right_anchor(),
            fixed: true,
        });
        Self {
            graph,
            anchors: [left, right],
            pick_radius: layout.pick_radius,
            material: Material::default(),
            load_weight: MIN_LOAD_WEIGHT,
            score: 0,
            locked: false,
        }
    }

    /// The left and right anchor joints.
    #[must_use]
    pub fn anchors(&self) -> (NodeIndex, NodeIndex) {
        (self.anchors[0], self.anchors[1])
    }

    /// Return the number of joints, anchors included.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of joints placed by the player.
    #[must_use]
    pub fn movable_joint_count(&self) -> usize {
        self.graph.node_weights().filter(|joint| !joint.fixed).count()
    }

    /// Return the number of beams, broken ones included.
    #[must_use]
    pub fn beam_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Return the number of beams broken during the current crossing.
    #[must_use]
    pub fn broken_beam_count(&self) -> usize {
        self.graph.edge_weights().filter(|beam| beam.broken).count()
    }

    /// Look up a joint.
    #[must_use]
    pub fn joint(&self, joint: NodeIndex) -> Option<&Joint> {
        self.graph.node_weight(joint)
    }

    /// Look up a beam.
    #[must_use]
    pub fn beam(&self, beam: EdgeIndex) -> Option<&Beam> {
        self.graph.edge_weight(beam)
    }

    /// The two joints a beam connects.
    #[must_use]
    pub fn beam_joints(&self, beam: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(beam)
    }

    /// Iterate over every joint.
    pub fn joints(&self) -> impl Iterator<Item = (NodeIndex, &Joint)> + '_ {
        self.graph
            .node_indices()
            .map(move |index| (index, &self.graph[index]))
    }

    /// Iterate over every beam together with the joints it connects.
    pub fn beams(&self) -> impl Iterator<Item = (EdgeIndex, (NodeIndex, NodeIndex), &Beam)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.id(), (edge.source(), edge.target()), edge.weight()))
    }

    /// Material used for the next beam.
    #[must_use]
    pub fn material(&self) -> Material {
        self.material
    }

    /// Load weight of the vehicle that will be sent across.
    #[must_use]
    pub fn load_weight(&self) -> f64 {
        self.load_weight
    }

    /// Working score shown to the player.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether a crossing currently holds the bridge.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Choose the material for subsequent beams and reprice the preview.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] while a crossing runs.
    pub fn select_material(&mut self, material: Material) -> Result<(), BuildError> {
        self.ensure_editable()?;
        self.material = material;
        self.refresh_preview();
        Ok(())
    }

    /// Set the vehicle load weight, clamped to the supported range.
    ///
    /// Returns the weight actually stored. The preview score follows it.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] while a crossing runs.
    pub fn set_load_weight(&mut self, weight: f64) -> Result<f64, BuildError> {
        self.ensure_editable()?;
        self.load_weight = clamp_load_weight(weight);
        self.refresh_preview();
        Ok(self.load_weight)
    }

    /// Place a new movable joint.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] while a crossing runs and
    /// [`BuildError::NonFinitePosition`] for a NaN or infinite coordinate.
    pub fn add_joint(&mut self, position: Point) -> Result<NodeIndex, BuildError> {
        self.ensure_editable()?;
        ensure_finite(position)?;
        let joint = self.graph.add_node(Joint {
            position,
            fixed: false,
        });
        debug!(joint = joint.index(), x = position.x, y = position.y, "joint placed");
        Ok(joint)
    }

    /// Connect two joints with a beam of the selected material.
    ///
    /// The beam starts unloaded with its rest length set to the current
    /// distance between the joints, and the preview score is recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] while a crossing runs,
    /// [`BuildError::UnknownJoint`], [`BuildError::SameJoint`] or
    /// [`BuildError::ZeroLengthBeam`] for bad endpoints and
    /// [`BuildError::BeamTooLong`] when the material cannot span the distance.
    pub fn add_beam(&mut self, start: NodeIndex, end: NodeIndex) -> Result<EdgeIndex, BuildError> {
        self.ensure_editable()?;
        let from = self.position_of(start)?;
        let to = self.position_of(end)?;
        if start == end {
            return Err(BuildError::SameJoint(start));
        }
        let length = from.distance_to(to);
        if length == 0.0 {
            return Err(BuildError::ZeroLengthBeam(start, end));
        }
        if length > self.material.max_length {
            debug!(length, max_length = self.material.max_length, "beam rejected");
            return Err(BuildError::BeamTooLong {
                length,
                max_length: self.material.max_length,
                material: self.material.name,
            });
        }
        let beam = self
            .graph
            .add_edge(start, end, Beam::new(self.material, length));
        debug!(
            beam = beam.index(),
            material = self.material.name,
            length,
            "beam built"
        );
        self.refresh_preview();
        Ok(beam)
    }

    /// Drag a movable joint to a new position.
    ///
    /// Beams keep the rest length recorded when they were built.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] while a crossing runs,
    /// [`BuildError::UnknownJoint`] for a joint not in this bridge,
    /// [`BuildError::FixedJoint`] for an anchor and
    /// [`BuildError::NonFinitePosition`] for a NaN or infinite coordinate.
    pub fn move_joint(&mut self, joint: NodeIndex, position: Point) -> Result<(), BuildError> {
        self.ensure_editable()?;
        ensure_finite(position)?;
        let node = self
            .graph
            .node_weight_mut(joint)
            .ok_or(BuildError::UnknownJoint(joint))?;
        if node.fixed {
            return Err(BuildError::FixedJoint(joint));
        }
        node.position = position;
        Ok(())
    }

    /// Remove every movable joint and every beam, reset the working score and
    /// the load weight.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] while a crossing runs.
    pub fn clear(&mut self) -> Result<(), BuildError> {
        self.ensure_editable()?;
        let mut graph = UnGraph::default();
        let left = graph.add_node(self.graph[self.anchors[0]].clone());
        let right = graph.add_node(self.graph[self.anchors[1]].clone());
        self.graph = graph;
        self.anchors = [left, right];
        self.score = 0;
        self.load_weight = MIN_LOAD_WEIGHT;
        debug!("bridge cleared");
        Ok(())
    }

    /// Find the joint under `position`, if any.
    ///
    /// When joints overlap the one placed first wins.
    #[must_use]
    pub fn joint_at(&self, position: Point) -> Option<NodeIndex> {
        self.graph.node_indices().find(|&index| {
            self.graph[index].position.distance_to(position) < self.pick_radius
        })
    }

    /// Recompute the build-time preview score.
    fn refresh_preview(&mut self) {
        self.score = preview_score(self.beam_count(), self.material.cost, self.load_weight);
    }

    /// Reject edits while a crossing runs.
    fn ensure_editable(&self) -> Result<(), BuildError> {
        if self.locked {
            Err(BuildError::Simulating)
        } else {
            Ok(())
        }
    }

    /// Position of a joint, or an error naming it.
    fn position_of(&self, joint: NodeIndex) -> Result<Point, BuildError> {
        self.graph
            .node_weight(joint)
            .map(|node| node.position)
            .ok_or(BuildError::UnknownJoint(joint))
    }

    pub(crate) fn graph(&self) -> &UnGraph<Joint, Beam> {
        &self.graph
    }

    pub(crate) fn beam_mut(&mut self, beam: EdgeIndex) -> Option<&mut Beam> {
        self.graph.edge_weight_mut(beam)
    }

    pub(crate) fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub(crate) fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    /// Put every beam back into its unloaded, intact state.
    pub(crate) fn reset_beams(&mut self) {
        for beam in self.graph.edge_weights_mut() {
            beam.reset();
        }
    }
}

/// Reject coordinates that would poison every length computed from them.
fn ensure_finite(position: Point) -> Result<(), BuildError> {
    if position.x.is_finite() && position.y.is_finite() {
        Ok(())
    } else {
        Err(BuildError::NonFinitePosition {
            x: position.x,
            y: position.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::material::{CABLE, STEEL, WOOD};

    #[test]
    fn new_bridge_holds_only_anchors() {
        let bridge = Bridge::default();
        let (left, right) = bridge.anchors();
        assert_eq!(bridge.joint_count(), 2);
        assert_eq!(bridge.movable_joint_count(), 0);
        assert!(bridge.joint(left).expect("left anchor").is_fixed());
        assert!(bridge.joint(right).expect("right anchor").is_fixed());
        assert_eq!(bridge.load_weight(), 20.0);
        assert_eq!(bridge.material(), STEEL);
    }

    #[test]
    fn beam_records_rest_length_and_material_strength() {
        let mut bridge = Bridge::default();
        let (left, _) = bridge.anchors();
        let joint = bridge.add_joint(point(320.0, 540.0)).expect("joint placed");
        bridge.select_material(CABLE).expect("idle bridge");
        let beam = bridge.add_beam(left, joint).expect("beam built");

        let beam = bridge.beam(beam).expect("beam stored");
        assert_relative_eq!(beam.original_length(), 150.0);
        assert_relative_eq!(beam.current_length(), 150.0);
        assert_eq!(beam.max_stress(), CABLE.strength);
        assert_eq!(beam.stress(), 0.0);
        assert_eq!(beam.signed_strain(), 0.0);
        assert!(!beam.is_broken());
    }

    #[test]
    fn too_long_beam_is_rejected_without_changes() {
        let mut bridge = Bridge::default();
        let a = bridge.add_joint(point(300.0, 400.0)).expect("joint placed");
        let b = bridge.add_joint(point(650.0, 400.0)).expect("joint placed");

        let error = bridge.add_beam(a, b).expect_err("350px exceeds steel span");
        assert_eq!(
            error,
            BuildError::BeamTooLong {
                length: 350.0,
                max_length: 300.0,
                material: "Steel",
            }
        );
        let message = error.to_string();
        assert!(message.contains("350"));
        assert!(message.contains("300"));
        assert_eq!(bridge.beam_count(), 0);
        assert_eq!(bridge.score(), 0);
    }

    #[test]
    fn beam_at_exact_max_length_is_accepted() {
        let mut bridge = Bridge::default();
        bridge.select_material(WOOD).expect("idle bridge");
        let a = bridge.add_joint(point(300.0, 400.0)).expect("joint placed");
        let b = bridge.add_joint(point(550.0, 400.0)).expect("joint placed");
        bridge.add_beam(a, b).expect("250px is within wood span");
    }

    #[test]
    fn degenerate_and_unknown_endpoints_are_rejected() {
        let mut bridge = Bridge::default();
        let a = bridge.add_joint(point(300.0, 400.0)).expect("joint placed");
        assert_eq!(bridge.add_beam(a, a), Err(BuildError::SameJoint(a)));

        let missing = NodeIndex::new(42);
        assert_eq!(
            bridge.add_beam(a, missing),
            Err(BuildError::UnknownJoint(missing))
        );
        assert_eq!(bridge.beam_count(), 0);
    }

    #[test]
    fn coincident_joints_cannot_be_connected() {
        let mut bridge = Bridge::default();
        let a = bridge.add_joint(point(450.0, 450.0)).expect("joint placed");
        let b = bridge.add_joint(point(450.0, 450.0)).expect("joint placed");
        assert_eq!(bridge.add_beam(a, b), Err(BuildError::ZeroLengthBeam(a, b)));
        assert_eq!(bridge.beam_count(), 0);
        assert_eq!(bridge.score(), 0);
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        let mut bridge = Bridge::default();
        let error = bridge
            .add_joint(point(f64::NAN, 450.0))
            .expect_err("NaN is not a position");
        assert!(matches!(error, BuildError::NonFinitePosition { .. }));
        assert_eq!(bridge.joint_count(), 2);

        let joint = bridge.add_joint(point(300.0, 450.0)).expect("joint placed");
        assert!(matches!(
            bridge.move_joint(joint, point(300.0, f64::INFINITY)),
            Err(BuildError::NonFinitePosition { .. })
        ));
        assert_eq!(
            bridge.joint(joint).expect("joint").position(),
            point(300.0, 450.0)
        );

        let (left, _) = bridge.anchors();
        let beam = bridge.add_beam(left, joint).expect("beam built");
        assert_relative_eq!(bridge.beam(beam).expect("beam").original_length(), 100.0);
    }

    #[test]
    fn preview_score_follows_beams_material_and_load() {
        let mut bridge = Bridge::default();
        let (left, _) = bridge.anchors();
        let a = bridge.add_joint(point(300.0, 450.0)).expect("joint placed");
        let b = bridge.add_joint(point(400.0, 450.0)).expect("joint placed");
        bridge.add_beam(left, a).expect("beam built");
        // 1000 - 1 * 10 + 20 * 5
        assert_eq!(bridge.score(), 1090);
        bridge.add_beam(a, b).expect("beam built");
        assert_eq!(bridge.score(), 1080);

        // 1000 - 2 * 5 + 60 * 5
        bridge.select_material(WOOD).expect("idle bridge");
        bridge.set_load_weight(60.0).expect("idle bridge");
        assert_eq!(bridge.score(), 1290);
    }

    #[test]
    fn locked_bridge_rejects_every_edit() {
        let mut bridge = Bridge::default();
        let (left, _) = bridge.anchors();
        let joint = bridge.add_joint(point(300.0, 450.0)).expect("joint placed");
        bridge.set_locked(true);

        assert_eq!(
            bridge.add_joint(point(10.0, 10.0)),
            Err(BuildError::Simulating)
        );
        assert_eq!(bridge.add_beam(left, joint), Err(BuildError::Simulating));
        assert_eq!(
            bridge.move_joint(joint, point(0.0, 0.0)),
            Err(BuildError::Simulating)
        );
        assert_eq!(bridge.clear(), Err(BuildError::Simulating));
        assert_eq!(bridge.select_material(WOOD), Err(BuildError::Simulating));
        assert_eq!(bridge.set_load_weight(60.0), Err(BuildError::Simulating));
        assert_eq!(bridge.joint_count(), 3);
        assert_eq!(bridge.beam_count(), 0);
    }

    #[test]
    fn anchors_cannot_be_dragged() {
        let mut bridge = Bridge::default();
        let (left, _) = bridge.anchors();
        assert_eq!(
            bridge.move_joint(left, point(0.0, 0.0)),
            Err(BuildError::FixedJoint(left))
        );

        let joint = bridge.add_joint(point(300.0, 450.0)).expect("joint placed");
        bridge
            .move_joint(joint, point(310.0, 460.0))
            .expect("movable joint dragged");
        assert_eq!(
            bridge.joint(joint).expect("joint").position(),
            point(310.0, 460.0)
        );
    }

    #[test]
    fn clear_keeps_only_anchors() {
        let mut bridge = Bridge::default();
        let (left, right) = bridge.anchors();
        let left_position = bridge.joint(left).expect("anchor").position();
        let a = bridge.add_joint(point(300.0, 450.0)).expect("joint placed");
        bridge.add_beam(left, a).expect("beam built");
        bridge.set_load_weight(80.0).expect("idle bridge");

        bridge.clear().expect("idle bridge");

        assert_eq!(bridge.joint_count(), 2);
        assert_eq!(bridge.beam_count(), 0);
        assert_eq!(bridge.score(), 0);
        assert_eq!(bridge.load_weight(), 20.0);
        let (new_left, new_right) = bridge.anchors();
        assert_eq!(
            bridge.joint(new_left).expect("anchor").position(),
            left_position
        );
        assert!(bridge.joint(new_right).expect("anchor").is_fixed());
        assert_eq!((new_left, new_right), (left, right));
    }

    #[test]
    fn joint_hit_test_uses_pick_radius() {
        let mut bridge = Bridge::default();
        let joint = bridge.add_joint(point(300.0, 300.0)).expect("joint placed");
        assert_eq!(bridge.joint_at(point(310.0, 305.0)), Some(joint));
        assert_eq!(bridge.joint_at(point(330.0, 300.0)), None);
    }

    #[test]
    fn load_weight_is_clamped() {
        let mut bridge = Bridge::default();
        assert_eq!(bridge.set_load_weight(5.0), Ok(20.0));
        assert_eq!(bridge.set_load_weight(250.0), Ok(100.0));
        assert_eq!(bridge.set_load_weight(60.0), Ok(60.0));
    }

    #[test]
    fn reset_restores_unloaded_beams() {
        let mut bridge = Bridge::default();
        let (left, _) = bridge.anchors();
        let joint = bridge.add_joint(point(300.0, 450.0)).expect("joint placed");
        let beam = bridge.add_beam(left, joint).expect("beam built");
        {
            let state = bridge.beam_mut(beam).expect("beam");
            state.apply_reading(StrainReading::measure(100.0, 110.0, 1000.0));
            state.mark_broken();
        }
        bridge.reset_beams();
        let state = bridge.beam(beam).expect("beam");
        assert!(!state.is_broken());
        assert_eq!(state.stress(), 0.0);
        assert_eq!(state.signed_strain(), 0.0);
        assert_eq!(state.current_length(), state.original_length());
    }
}
