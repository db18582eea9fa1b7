//! Electrical connections between instance pads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::core::LayoutError;
use crate::footprint::FootprintProvider;
use crate::model::component::{ComponentInstance, InstanceId};

/// Reference to one pad of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PadRef {
    pub instance: InstanceId,
    pub pad: String,
}

impl PadRef {
    pub fn new(instance: impl Into<InstanceId>, pad: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            pad: pad.into(),
        }
    }
}

impl fmt::Display for PadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.instance, self.pad)
    }
}

/// A point-to-point connection. The `auto_detected` flag marks provenance and
/// is the only thing that decides whether a detector pass may remove it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDef {
    #[serde(default = "new_connection_id")]
    pub id: String,
    pub from: PadRef,
    pub to: PadRef,
    #[serde(default)]
    pub net: Option<String>,
    #[serde(default)]
    pub is_power: bool,
    #[serde(default)]
    pub is_ground: bool,
    #[serde(default)]
    pub auto_detected: bool,
}

fn new_connection_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl ConnectionDef {
    /// Manually drawn connection.
    pub fn manual(from: PadRef, to: PadRef) -> Self {
        Self {
            id: new_connection_id(),
            from,
            to,
            net: None,
            is_power: false,
            is_ground: false,
            auto_detected: false,
        }
    }

    pub fn with_net(mut self, net: impl Into<String>) -> Self {
        self.net = Some(net.into());
        self
    }

    /// Same pad pair in either direction.
    pub fn joins(&self, a: &PadRef, b: &PadRef) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }

    pub fn touches(&self, pad: &PadRef) -> bool {
        &self.from == pad || &self.to == pad
    }
}

/// Reject connections whose endpoints do not resolve to distinct, existing
/// (instance, pad) pairs.
pub fn validate_connections(
    instances: &[ComponentInstance],
    connections: &[ConnectionDef],
    footprints: &dyn FootprintProvider,
) -> Result<(), LayoutError> {
    let by_id: HashMap<&InstanceId, &ComponentInstance> =
        instances.iter().map(|i| (&i.id, i)).collect();

    let check_endpoint = |conn: &ConnectionDef, end: &PadRef| -> Result<(), LayoutError> {
        let instance = by_id.get(&end.instance).ok_or_else(|| LayoutError::InvalidConnection {
            id: conn.id.clone(),
            reason: format!("instance '{}' does not exist", end.instance),
        })?;
        let footprint = footprints.resolve(&instance.component_type);
        if footprint.pad(&end.pad).is_none() {
            return Err(LayoutError::InvalidConnection {
                id: conn.id.clone(),
                reason: format!(
                    "pad '{}' does not exist on {} ({})",
                    end.pad, end.instance, instance.component_type
                ),
            });
        }
        Ok(())
    };

    for conn in connections {
        check_endpoint(conn, &conn.from)?;
        check_endpoint(conn, &conn.to)?;
        if conn.from == conn.to {
            return Err(LayoutError::InvalidConnection {
                id: conn.id.clone(),
                reason: format!("both endpoints are {}", conn.from),
            });
        }
    }
    Ok(())
}
