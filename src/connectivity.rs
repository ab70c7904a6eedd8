//! Reachability between the anchors over intact beams.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::{Bfs, EdgeFiltered};

use crate::bridge::{Beam, Bridge, Joint};
use crate::errors::StartError;

/// Whether `goal` can be reached from `start` walking only unbroken beams.
///
/// Only reachability matters, so the visiting order is irrelevant.
#[must_use]
pub fn joints_connected(graph: &UnGraph<Joint, Beam>, start: NodeIndex, goal: NodeIndex) -> bool {
    if graph.node_weight(start).is_none() || graph.node_weight(goal).is_none() {
        return false;
    }
    let intact = EdgeFiltered::from_fn(graph, |edge| !edge.weight().is_broken());
    let mut bfs = Bfs::new(&intact, start);
    while let Some(joint) = bfs.next(&intact) {
        if joint == goal {
            return true;
        }
    }
    false
}

/// Whether a path of unbroken beams joins the two anchors.
#[must_use]
pub fn anchors_connected(bridge: &Bridge) -> bool {
    let (left, right) = bridge.anchors();
    joints_connected(bridge.graph(), left, right)
}

/// Validate that a crossing may start on `bridge`.
///
/// Nothing is mutated; the checks are re-run from scratch on every call.
///
/// # Errors
///
/// Returns [`StartError::NoJoints`] when the player has not placed any joint,
/// [`StartError::NoBeams`] when no beam exists and [`StartError::NotConnected`]
/// when the anchors are not joined.
pub fn check_ready(bridge: &Bridge) -> Result<(), StartError> {
    if bridge.movable_joint_count() == 0 {
        return Err(StartError::NoJoints);
    }
    if bridge.beam_count() == 0 {
        return Err(StartError::NoBeams);
    }
    if !anchors_connected(bridge) {
        return Err(StartError::NotConnected);
    }
    Ok(())
}
