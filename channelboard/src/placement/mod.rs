//! Placement Engine
//!
//! Produces one deterministic placement per strategy. Locked instances with a
//! fixed position go down first; everything else is packed in strategy order,
//! keep-together groups as a unit. Placement never fails: when no clean
//! position exists the result is flagged best-effort and left for DRC.

pub mod packer;
pub mod strategy;
pub mod zones;

use serde::{Deserialize, Serialize};

use crate::footprint::FootprintProvider;
use crate::model::{Board, ComponentInstance, ConnectionDef, PlacedInstance, Rotation};
use packer::{Packer, Slot};

pub use strategy::{
    all_strategies, Compact, PlacementContext, PlacementStrategy, SignalFlow, Symmetric,
    ZonePriority,
};
pub use zones::ZoneMap;

/// Packing parameters (mm).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Gap kept between component bodies
    pub clearance: f64,
    /// Clearance is halved down to this before giving up
    pub min_clearance: f64,
    /// Candidate grid pitch
    pub candidate_step: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            clearance: 2.0,
            min_clearance: 0.5,
            candidate_step: 2.0,
        }
    }
}

/// Placed instances in selection order.
#[derive(Debug, Clone)]
pub struct PlacementOutcome {
    pub components: Vec<PlacedInstance>,
    /// Some instance sits closer than the configured clearance, or overlaps
    pub best_effort: bool,
}

pub struct PlacementEngine<'a> {
    footprints: &'a dyn FootprintProvider,
    config: &'a PlacementConfig,
}

impl<'a> PlacementEngine<'a> {
    pub fn new(footprints: &'a dyn FootprintProvider, config: &'a PlacementConfig) -> Self {
        Self { footprints, config }
    }

    pub fn place(
        &self,
        strategy: &dyn PlacementStrategy,
        instances: &[ComponentInstance],
        connections: &[ConnectionDef],
        board: &Board,
        optimize_orientation: bool,
    ) -> PlacementOutcome {
        let ctx = PlacementContext::new(
            instances,
            connections,
            self.footprints,
            board.bounds(),
            board.centroid(),
        );
        let packer = Packer {
            ctx: &ctx,
            board,
            config: self.config,
            connections,
        };

        let mut placed: Vec<Slot> = Vec::with_capacity(instances.len());
        let mut best_effort = false;

        for (index, instance) in instances.iter().enumerate() {
            if let (true, Some(position)) = (instance.is_locked(), instance.constraint.position) {
                let rotation = instance.constraint.rotation;
                let rect = packer.body(index, position, rotation);
                if placed.iter().any(|s| s.rect.intersects(&rect)) || !board.contains_rect(&rect) {
                    best_effort = true;
                }
                placed.push(Slot { index, position, rotation, rect });
            }
        }

        let order = unitize_groups(instances, strategy.order(&ctx));
        let mut rank = 0;
        for index in order {
            if placed.iter().any(|s| s.index == index) {
                continue;
            }
            let instance = &instances[index];
            let rotations: Vec<Rotation> = if optimize_orientation && !instance.is_locked() {
                Rotation::ALL.to_vec()
            } else {
                vec![instance.constraint.rotation]
            };
            let anchor = strategy.anchor(&ctx, index, rank);
            rank += 1;

            let packed = packer.pack(index, anchor, &rotations, &placed);
            if packed.relaxed || packed.overlapping {
                best_effort = true;
            }
            if packed.overlapping {
                tracing::warn!(
                    "{}: no overlap-free position for {}",
                    strategy.name(),
                    instance.id
                );
            }
            placed.push(Slot {
                index,
                position: packed.position,
                rotation: packed.rotation,
                rect: packer.body(index, packed.position, packed.rotation),
            });
        }

        placed.sort_by_key(|s| s.index);
        let components = placed
            .iter()
            .map(|s| PlacedInstance {
                id: instances[s.index].id.clone(),
                component_type: instances[s.index].component_type.clone(),
                position: s.position,
                rotation: s.rotation,
            })
            .collect();

        if best_effort {
            tracing::debug!("{}: best-effort placement", strategy.name());
        }
        PlacementOutcome { components, best_effort }
    }
}

/// Pull every keep-together group member forward to its first member.
fn unitize_groups(instances: &[ComponentInstance], order: Vec<usize>) -> Vec<usize> {
    let mut out = Vec::with_capacity(order.len());
    let mut seen = vec![false; instances.len()];
    for &index in &order {
        if seen[index] {
            continue;
        }
        seen[index] = true;
        out.push(index);
        if let Some(group) = instances[index].constraint.group.as_deref() {
            for &other in &order {
                if !seen[other] && instances[other].constraint.group.as_deref() == Some(group) {
                    seen[other] = true;
                    out.push(other);
                }
            }
        }
    }
    out
}
