//! Player-facing facade tying the bridge, the crossing session and the engine
//! together.

use nalgebra::Vector2;
use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::warn;

use crate::bridge::Bridge;
use crate::config::SimulationConfig;
use crate::errors::{BuildError, ConfigError, StartError};
use crate::geometry::Point;
use crate::material::Material;
use crate::notice::Notice;
use crate::physics::PhysicsDelegate;
use crate::session::{SessionEvent, Simulation};

/// What a click did.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickAction {
    /// A joint became the selection.
    Selected(NodeIndex),
    /// The selected joint was clicked again.
    Deselected,
    /// The selected and the clicked joint were connected.
    Connected(EdgeIndex),
    /// Connecting failed; the selection is cleared either way.
    Rejected(BuildError),
    /// A new joint was placed in empty space.
    Placed(NodeIndex),
    /// Empty space was clicked during a crossing.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    joint: NodeIndex,
    offset: Vector2<f64>,
}

/// Bridge editor plus the crossing that tests it.
#[derive(Debug)]
pub struct BridgeBuilder<P> {
    bridge: Bridge,
    simulation: Simulation,
    physics: P,
    selected: Option<NodeIndex>,
    drag: Option<Drag>,
    notice: Option<Notice>,
}

impl<P: PhysicsDelegate> BridgeBuilder<P> {
    /// Start with an empty bridge laid out by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails validation.
    pub fn new(config: SimulationConfig, physics: P) -> Result<Self, ConfigError> {
        Self::with_bridge(Bridge::new(&config.layout), config, physics)
    }

    /// Start from an existing bridge.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails validation.
    pub fn with_bridge(
        bridge: Bridge,
        config: SimulationConfig,
        physics: P,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            bridge,
            simulation: Simulation::new(config)?,
            physics,
            selected: None,
            drag: None,
            notice: None,
        })
    }

    /// The bridge being edited or crossed.
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// The crossing session.
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// The engine.
    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable access to the engine, for hosts that drive it directly.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }

    /// The joint waiting for a second click.
    pub fn selected(&self) -> Option<NodeIndex> {
        self.selected
    }

    /// The notice on display.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Close the notice on display.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Handle a click at `position`.
    ///
    /// Clicking a joint selects it, clicking it again deselects it and
    /// clicking another joint connects the two. Clicking empty space places a
    /// joint unless a crossing runs.
    pub fn click(&mut self, position: Point) -> ClickAction {
        match (self.bridge.joint_at(position), self.selected) {
            (Some(joint), Some(selected)) if joint == selected => {
                self.selected = None;
                ClickAction::Deselected
            }
            (Some(joint), Some(selected)) => {
                self.selected = None;
                match self.bridge.add_beam(selected, joint) {
                    Ok(beam) => ClickAction::Connected(beam),
                    Err(error) => {
                        warn!(%error, "beam rejected");
                        self.notice = Some(Notice::from_build_error(&error));
                        ClickAction::Rejected(error)
                    }
                }
            }
            (Some(joint), None) => {
                self.selected = Some(joint);
                ClickAction::Selected(joint)
            }
            (None, _) if self.simulation.is_running() => ClickAction::Ignored,
            (None, _) => match self.bridge.add_joint(position) {
                Ok(joint) => ClickAction::Placed(joint),
                Err(error) => ClickAction::Rejected(error),
            },
        }
    }

    /// Pick up the movable joint under `position`.
    ///
    /// Returns the grabbed joint; anchors and clicks during a crossing grab
    /// nothing.
    pub fn grab(&mut self, position: Point) -> Option<NodeIndex> {
        if self.simulation.is_running() {
            return None;
        }
        let joint = self.bridge.joint_at(position)?;
        let node = self.bridge.joint(joint)?;
        if node.is_fixed() {
            return None;
        }
        self.drag = Some(Drag {
            joint,
            offset: position.to_vector() - node.position().to_vector(),
        });
        Some(joint)
    }

    /// Move the grabbed joint so it keeps its offset from the pointer.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] when the bridge refuses the move.
    pub fn drag_to(&mut self, position: Point) -> Result<(), BuildError> {
        let Some(drag) = self.drag else {
            return Ok(());
        };
        self.bridge
            .move_joint(drag.joint, Point::from(position.to_vector() - drag.offset))
    }

    /// Let go of the grabbed joint.
    pub fn release(&mut self) {
        self.drag = None;
    }

    /// Choose the material for subsequent beams.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] during a crossing.
    pub fn select_material(&mut self, material: Material) -> Result<(), BuildError> {
        self.bridge.select_material(material)
    }

    /// Set the vehicle load weight; returns the clamped weight.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] during a crossing.
    pub fn set_load_weight(&mut self, weight: f64) -> Result<f64, BuildError> {
        self.bridge.set_load_weight(weight)
    }

    /// Start a crossing; a refusal is also shown as a notice.
    ///
    /// # Errors
    ///
    /// Returns the [`StartError`] explaining why the bridge cannot be crossed.
    pub fn start(&mut self) -> Result<(), StartError> {
        self.selected = None;
        self.drag = None;
        self.simulation
            .start(&mut self.bridge, &mut self.physics)
            .map_err(|error| {
                warn!(%error, "crossing refused");
                self.notice = Some(Notice::from_start_error(error));
                error
            })
    }

    /// Abort the crossing, if any.
    pub fn stop(&mut self) {
        self.simulation.stop(&mut self.bridge, &mut self.physics);
    }

    /// Remove every movable joint and beam.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Simulating`] during a crossing.
    pub fn clear(&mut self) -> Result<(), BuildError> {
        self.bridge.clear()?;
        self.selected = None;
        self.drag = None;
        Ok(())
    }

    /// Advance the crossing by `elapsed_ms`; an outcome raises a notice.
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<SessionEvent> {
        let events = self
            .simulation
            .advance(&mut self.bridge, &mut self.physics, elapsed_ms);
        for event in &events {
            if let SessionEvent::Resolved {
                outcome, vehicle, ..
            } = event
            {
                self.notice = Some(Notice::crossing(*outcome, vehicle));
            }
        }
        events
    }

    /// Take the bridge back, ending any crossing first.
    pub fn into_bridge(mut self) -> Bridge {
        self.stop();
        self.bridge
    }
}
