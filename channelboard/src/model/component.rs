//! Assembly components, placement constraints and their expanded instances.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::core::LayoutError;
use crate::geometry::Point;

/// Board region a component may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::Center, Zone::Top, Zone::Bottom, Zone::Left, Zone::Right];
}

/// Preferred board edge for connector-like components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePreference {
    Top,
    Bottom,
    Left,
    Right,
    /// Whichever edge is nearest to the component's natural position
    Any,
}

/// Discrete placement rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// Quarter turns swap the footprint's width and height.
    pub fn is_quarter_turn(&self) -> bool {
        matches!(self, Rotation::R90 | Rotation::R270)
    }

    /// Rotate a footprint-local offset (clockwise on screen, y down).
    pub fn apply(&self, offset: Point) -> Point {
        match self {
            Rotation::R0 => offset,
            Rotation::R90 => Point::new(-offset.y, offset.x),
            Rotation::R180 => Point::new(-offset.x, -offset.y),
            Rotation::R270 => Point::new(offset.y, -offset.x),
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value % 360 {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            other => Err(format!("rotation must be a multiple of 90 degrees, got {}", other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(r: Rotation) -> Self {
        r.degrees()
    }
}

/// Per-component placement constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementConstraint {
    #[serde(default)]
    pub zone: Option<Zone>,
    #[serde(default)]
    pub edge: Option<EdgePreference>,
    /// Locked instances keep their rotation (and position, when one is given)
    #[serde(default)]
    pub locked: bool,
    /// Keep-together group name
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub rotation: Rotation,
}

/// A selected component type with a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyComponent {
    #[serde(default = "new_component_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub constraint: Option<PlacementConstraint>,
}

fn new_component_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_quantity() -> u32 {
    1
}

impl AssemblyComponent {
    pub fn new(component_type: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: new_component_id(),
            component_type: component_type.into(),
            quantity,
            constraint: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_constraint(mut self, constraint: PlacementConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// Stable instance identifier: `"<component id>/<unit>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(component_id: &str, unit: u32) -> Self {
        Self(format!("{}/{}", component_id, unit))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One physical unit of an [`AssemblyComponent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentInstance {
    pub id: InstanceId,
    #[serde(rename = "type")]
    pub component_type: String,
    pub constraint: PlacementConstraint,
}

impl ComponentInstance {
    pub fn is_locked(&self) -> bool {
        self.constraint.locked
    }
}

/// Expand quantities into one instance per unit, in selection order.
pub fn expand_components(components: &[AssemblyComponent]) -> Vec<ComponentInstance> {
    let mut instances = Vec::new();
    for component in components {
        for unit in 0..component.quantity {
            instances.push(ComponentInstance {
                id: InstanceId::new(&component.id, unit),
                component_type: component.component_type.clone(),
                constraint: component.constraint.clone().unwrap_or_default(),
            });
        }
    }
    instances
}

/// Reject selections where two components share an id, since their
/// instance ids would collide.
pub fn validate_components(components: &[AssemblyComponent]) -> Result<(), LayoutError> {
    let mut seen = HashSet::new();
    for component in components {
        if !seen.insert(component.id.as_str()) {
            return Err(LayoutError::DuplicateComponent(component.id.clone()));
        }
    }
    Ok(())
}
