//! Saved bridge designs.
//!
//! A design lists the player's joints and beams by slot: slots 0 and 1 are the
//! left and right anchors, movable joints follow in placement order.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::bridge::Bridge;
use crate::config::WorldLayout;
use crate::errors::DesignError;
use crate::geometry::Point;
use crate::material::Material;
use crate::vehicle::MIN_LOAD_WEIGHT;

/// A beam between two joint slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeamRecord {
    /// First joint slot.
    pub start: usize,
    /// Second joint slot.
    pub end: usize,
    /// Material name from the catalog.
    pub material: String,
}

/// Serializable snapshot of a bridge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Movable joints in placement order.
    pub joints: Vec<Point>,
    /// Beams by joint slot.
    pub beams: Vec<BeamRecord>,
    /// Selected vehicle load.
    #[serde(default = "default_load_weight")]
    pub load_weight: f64,
}

fn default_load_weight() -> f64 {
    MIN_LOAD_WEIGHT
}

impl Default for Design {
    fn default() -> Self {
        Self {
            joints: Vec::new(),
            beams: Vec::new(),
            load_weight: MIN_LOAD_WEIGHT,
        }
    }
}

impl Design {
    /// Snapshot the joints and beams of `bridge`.
    #[must_use]
    pub fn capture(bridge: &Bridge) -> Self {
        let (left, right) = bridge.anchors();
        let mut slots: HashMap<NodeIndex, usize> = HashMap::from([(left, 0), (right, 1)]);
        let mut joints = Vec::new();
        for (id, joint) in bridge.joints().filter(|(_, joint)| !joint.is_fixed()) {
            slots.insert(id, joints.len() + 2);
            joints.push(joint.position());
        }
        let beams = bridge
            .beams()
            .filter_map(|(_, (a, b), beam)| {
                Some(BeamRecord {
                    start: *slots.get(&a)?,
                    end: *slots.get(&b)?,
                    material: beam.material().name.to_string(),
                })
            })
            .collect();
        Self {
            joints,
            beams,
            load_weight: bridge.load_weight(),
        }
    }

    /// Rebuild the design on a fresh bridge.
    ///
    /// Beams are replayed through [`Bridge::add_beam`], so every creation rule
    /// applies again. The last beam's material stays selected.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError`] for unknown materials, dangling joint slots or
    /// beams the bridge rejects.
    pub fn build(&self, layout: &WorldLayout) -> Result<Bridge, DesignError> {
        let mut bridge = Bridge::new(layout);
        let (left, right) = bridge.anchors();
        let mut slots = vec![left, right];
        for &position in &self.joints {
            slots.push(bridge.add_joint(position)?);
        }
        bridge.set_load_weight(self.load_weight)?;
        for (index, record) in self.beams.iter().enumerate() {
            let material = Material::by_name(&record.material)
                .ok_or_else(|| DesignError::UnknownMaterial(record.material.clone()))?;
            let joint = |slot: usize| {
                slots.get(slot).copied().ok_or(DesignError::MissingJoint {
                    beam: index,
                    slot,
                    joints: slots.len(),
                })
            };
            let (start, end) = (joint(record.start)?, joint(record.end)?);
            bridge.select_material(material)?;
            bridge.add_beam(start, end)?;
        }
        Ok(bridge)
    }
}
