//! Persistent design snapshot that accepted arrangements are merged into.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::LayoutError;
use crate::geometry::Point;
use crate::model::arrangement::{Arrangement, PlacedInstance, Route};
use crate::model::board::Board;
use crate::model::component::InstanceId;
use crate::model::connection::ConnectionDef;

/// Point feature joining channels across layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Via {
    #[serde(default = "new_via_id")]
    pub id: String,
    pub position: Point,
    #[serde(default = "default_via_diameter")]
    pub diameter: f64,
}

fn new_via_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_via_diameter() -> f64 {
    2.0
}

impl Via {
    pub fn new(position: Point) -> Self {
        Self {
            id: new_via_id(),
            position,
            diameter: default_via_diameter(),
        }
    }
}

/// Board, placed components, channels and vias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    pub board: Board,
    #[serde(default)]
    pub components: Vec<PlacedInstance>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub vias: Vec<Via>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

impl Design {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            components: Vec::new(),
            routes: Vec::new(),
            vias: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String, LayoutError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn component(&self, id: &InstanceId) -> Option<&PlacedInstance> {
        self.components.iter().find(|c| &c.id == id)
    }

    pub fn component_mut(&mut self, id: &InstanceId) -> Option<&mut PlacedInstance> {
        self.components.iter_mut().find(|c| &c.id == id)
    }

    pub fn route_mut(&mut self, id: &str) -> Option<&mut Route> {
        self.routes.iter_mut().find(|r| r.id == id)
    }

    /// Append an accepted arrangement's components and routes. The arrangement
    /// itself is not retained.
    pub fn merge_arrangement(&mut self, arrangement: &Arrangement, connections: &[ConnectionDef]) {
        self.components.extend(arrangement.components.iter().cloned());
        self.routes.extend(arrangement.routes.iter().cloned());
        for conn in connections {
            if !self.connections.iter().any(|c| c.id == conn.id) {
                self.connections.push(conn.clone());
            }
        }
        tracing::info!(
            "Merged arrangement '{}': {} components, {} routes",
            arrangement.name,
            arrangement.components.len(),
            arrangement.routes.len()
        );
    }
}
