#![warn(clippy::all)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod bridge;
pub mod builder;
pub mod config;
pub mod connectivity;
pub mod design;
pub mod effects;
mod errors;
pub mod geometry;
pub mod material;
pub mod notice;
pub mod physics;
pub mod render;
pub mod scoring;
pub mod session;
pub mod store;
pub mod strain;
pub mod timers;
pub mod vehicle;
pub mod verlet;

pub use bridge::{Beam, Bridge, Joint};
pub use builder::{BridgeBuilder, ClickAction};
pub use config::{SimulationConfig, WorldLayout};
pub use design::Design;
pub use errors::{BuildError, ConfigError, DesignError, StartError, StoreError};
pub use geometry::{point, Point};
pub use material::Material;
pub use physics::PhysicsDelegate;
pub use scoring::Outcome;
pub use session::{Phase, SessionEvent, Simulation};
pub use verlet::VerletWorld;
