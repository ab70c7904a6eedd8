//! Catalog of beam materials.

use serde::Serialize;

/// An immutable beam material.
///
/// `strength` is compared against the evaluated beam stress, `cost` feeds the
/// scoring model and `max_length` caps the span of a single beam in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Material {
    /// Display name, also used as the key in saved designs.
    pub name: &'static str,
    /// Stress above which a beam made of this material breaks.
    pub strength: f64,
    /// Cost charged per beam.
    pub cost: f64,
    /// Longest beam that can be built from this material.
    pub max_length: f64,
}

/// Strong and expensive.
pub const STEEL: Material = Material {
    name: "Steel",
    strength: 1000.0,
    cost: 10.0,
    max_length: 300.0,
};

/// Cheap, weak and short.
pub const WOOD: Material = Material {
    name: "Wood",
    strength: 500.0,
    cost: 5.0,
    max_length: 250.0,
};

/// Long spans with moderate strength.
pub const CABLE: Material = Material {
    name: "Cable",
    strength: 800.0,
    cost: 8.0,
    max_length: 400.0,
};

/// Every material offered to the player, in menu order.
pub const MATERIALS: [Material; 3] = [STEEL, WOOD, CABLE];

impl Material {
    /// Look a material up by name, ignoring ASCII case.
    ///
    /// # Examples
    /// ```
    /// use bridgesim::material::{Material, CABLE};
    ///
    /// assert_eq!(Material::by_name("cable"), Some(CABLE));
    /// assert_eq!(Material::by_name("granite"), None);
    /// ```
    #[must_use]
    pub fn by_name(name: &str) -> Option<Material> {
        MATERIALS
            .iter()
            .copied()
            .find(|material| material.name.eq_ignore_ascii_case(name))
    }
}

impl Default for Material {
    fn default() -> Self {
        STEEL
    }
}
