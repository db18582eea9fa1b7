//! Arrangement output types: placed instances, routed channels and metrics.
//!
//! Everything here derives serde so a caller can hand arrangements to a
//! preview renderer as-is.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point};
use crate::model::component::{InstanceId, Rotation};
use crate::model::connection::PadRef;

/// An instance with a concrete position and rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedInstance {
    pub id: InstanceId,
    #[serde(rename = "type")]
    pub component_type: String,
    pub position: Point,
    #[serde(default)]
    pub rotation: Rotation,
}

/// Board side a channel is cut into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    #[default]
    Top,
    Bottom,
}

/// Channel cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    U,
    V,
    Square,
}

impl Profile {
    /// Multiplier applied to the minimum bend radius for this cross-section.
    pub fn bend_allowance(&self) -> f64 {
        match self {
            Profile::U => 1.0,
            Profile::V => 1.5,
            Profile::Square => 0.75,
        }
    }
}

/// A routed conductive channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    #[serde(default)]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub from: Option<PadRef>,
    #[serde(default)]
    pub to: Option<PadRef>,
    pub net: String,
    #[serde(default)]
    pub layer: Layer,
    pub points: Vec<Point>,
    pub width: f64,
    #[serde(default)]
    pub profile: Profile,
    pub depth: f64,
}

impl Route {
    pub fn length(&self) -> f64 {
        geometry::polyline_length(&self.points)
    }

    /// Is `pad` one of the pads this channel was routed between?
    pub fn ends_at_pad(&self, pad: &PadRef) -> bool {
        self.from.as_ref() == Some(pad) || self.to.as_ref() == Some(pad)
    }

    pub fn start(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn end(&self) -> Option<&Point> {
        self.points.last()
    }
}

/// Placement/routing quality metrics reduced to a score by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArrangementMetrics {
    pub total_route_length: f64,
    pub route_crossings: usize,
    /// Σ footprint area / board area, clamped to [0, 1]
    pub board_utilization: f64,
    #[serde(default)]
    pub unrouted_connections: usize,
}

/// Closed set of placement strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Compact,
    ZonePriority,
    Symmetric,
    SignalFlow,
}

/// One complete candidate placement + routing solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrangement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub strategy: StrategyKind,
    pub components: Vec<PlacedInstance>,
    pub routes: Vec<Route>,
    /// Connection ids that could not be routed
    #[serde(default)]
    pub unrouted: Vec<String>,
    pub metrics: ArrangementMetrics,
    /// Set when placement could not remove every overlap
    #[serde(default)]
    pub best_effort: bool,
    pub score: f64,
}

impl Arrangement {
    pub fn component(&self, id: &InstanceId) -> Option<&PlacedInstance> {
        self.components.iter().find(|c| &c.id == id)
    }

    pub fn is_fully_routed(&self) -> bool {
        self.unrouted.is_empty()
    }
}
