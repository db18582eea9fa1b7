//! Connection detector
//!
//! Infers power, ground and data connections from component roles and pad
//! labels. Every synthesized connection is flagged `auto_detected`; that flag
//! alone decides what [`clear_auto_detected`] removes.

use serde::{Deserialize, Serialize};

use crate::detect::classifier::{classify_role, label_pads, ComponentRole, PadLabel};
use crate::footprint::FootprintProvider;
use crate::model::{ComponentInstance, ConnectionDef, InstanceId, PadRef};

/// Counts of newly created connections per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub power_connections: usize,
    pub ground_connections: usize,
    pub other_connections: usize,
    /// Instance types no keyword matched, deduplicated in first-seen order
    pub unknown_types: Vec<String>,
}

impl DetectionStats {
    pub fn total(&self) -> usize {
        self.power_connections + self.ground_connections + self.other_connections
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    /// New connections only; existing ones are never repeated
    pub connections: Vec<ConnectionDef>,
    pub stats: DetectionStats,
}

struct LabelledPad {
    pad: PadRef,
    label: PadLabel,
    role: ComponentRole,
}

pub struct ConnectionDetector<'a> {
    footprints: &'a dyn FootprintProvider,
}

impl<'a> ConnectionDetector<'a> {
    pub fn new(footprints: &'a dyn FootprintProvider) -> Self {
        Self { footprints }
    }

    pub fn detect(
        &self,
        instances: &[ComponentInstance],
        existing: &[ConnectionDef],
    ) -> DetectionResult {
        let mut stats = DetectionStats::default();
        let mut pads = Vec::new();

        for instance in instances {
            let role = classify_role(&instance.component_type);
            if role == ComponentRole::Unknown
                && !stats.unknown_types.contains(&instance.component_type)
            {
                stats.unknown_types.push(instance.component_type.clone());
            }
            let footprint = self.footprints.resolve(&instance.component_type);
            for (pad, label) in footprint.pads.iter().zip(label_pads(role, &footprint)) {
                pads.push(LabelledPad {
                    pad: PadRef::new(instance.id.clone(), pad.id.clone()),
                    label,
                    role,
                });
            }
        }

        let mut created = Vec::new();
        let power = net_members(&pads, PadLabel::Vcc);
        let ground = net_members(&pads, PadLabel::Gnd);
        for (members, is_power) in [(power, true), (ground, false)] {
            let new = close_net(&members, existing);
            for (from, to) in new {
                let mut conn = auto_connection(from, to, if is_power { "VCC" } else { "GND" });
                if is_power {
                    conn.is_power = true;
                    stats.power_connections += 1;
                } else {
                    conn.is_ground = true;
                    stats.ground_connections += 1;
                }
                created.push(conn);
            }
        }

        let data = self.pair_data_pads(&pads, existing, &created);
        stats.other_connections = data.len();
        created.extend(data);

        tracing::debug!(
            "Detected {} power, {} ground, {} other connections ({} unknown types)",
            stats.power_connections,
            stats.ground_connections,
            stats.other_connections,
            stats.unknown_types.len()
        );

        DetectionResult {
            connections: created,
            stats,
        }
    }

    /// When exactly one connector and one IC expose DATA pads, pair them in pad
    /// order, skipping pads any connection already uses.
    fn pair_data_pads(
        &self,
        pads: &[LabelledPad],
        existing: &[ConnectionDef],
        created: &[ConnectionDef],
    ) -> Vec<ConnectionDef> {
        let data_owners = |role: ComponentRole| {
            let mut owners: Vec<&PadRef> = pads
                .iter()
                .filter(|p| p.role == role && p.label == PadLabel::Data)
                .map(|p| &p.pad)
                .collect();
            owners.dedup_by(|a, b| a.instance == b.instance);
            owners.into_iter().map(|p| p.instance.clone()).collect::<Vec<_>>()
        };
        let connectors = data_owners(ComponentRole::Connector);
        let ics = data_owners(ComponentRole::Ic);
        if connectors.len() != 1 || ics.len() != 1 {
            return Vec::new();
        }

        let used = |pad: &PadRef| {
            existing.iter().chain(created.iter()).any(|c| c.touches(pad))
        };
        let free_data = |owner: &InstanceId| {
            pads.iter()
                .filter(|p| p.label == PadLabel::Data && &p.pad.instance == owner && !used(&p.pad))
                .map(|p| p.pad.clone())
                .collect::<Vec<_>>()
        };

        let connector_pads = free_data(&connectors[0]);
        let ic_pads = free_data(&ics[0]);
        connector_pads
            .into_iter()
            .zip(ic_pads)
            .enumerate()
            .map(|(i, (from, to))| auto_connection(from, to, &format!("DATA{}", i + 1)))
            .collect()
    }
}

/// Pads carrying `label`: power-source pads first, then instance order.
fn net_members(pads: &[LabelledPad], label: PadLabel) -> Vec<PadRef> {
    let (sources, rest): (Vec<&LabelledPad>, Vec<&LabelledPad>) = pads
        .iter()
        .filter(|p| p.label == label)
        .partition(|p| p.role == ComponentRole::PowerSource);
    sources.into_iter().chain(rest).map(|p| p.pad.clone()).collect()
}

/// Every pad pair of the net not already joined by a connection, in member
/// order. A pair matches an existing connection in either direction.
fn close_net(members: &[PadRef], existing: &[ConnectionDef]) -> Vec<(PadRef, PadRef)> {
    let mut pairs = Vec::new();
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            if a == b || existing.iter().any(|c| c.joins(a, b)) {
                continue;
            }
            pairs.push((a.clone(), b.clone()));
        }
    }
    pairs
}

fn auto_connection(from: PadRef, to: PadRef, net: &str) -> ConnectionDef {
    let mut conn = ConnectionDef::manual(from, to).with_net(net);
    conn.auto_detected = true;
    conn
}

/// Drop auto-detected connections, keeping manual ones. Returns how many were removed.
pub fn clear_auto_detected(connections: &mut Vec<ConnectionDef>) -> usize {
    let before = connections.len();
    connections.retain(|c| !c.auto_detected);
    let removed = before - connections.len();
    tracing::debug!("Cleared {} auto-detected connections", removed);
    removed
}
