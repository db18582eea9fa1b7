//! Placement strategies
//!
//! A closed set of named variants sharing one packer. A strategy only decides
//! the order instances are packed in and the anchor each one gravitates to
//! when wiring cost leaves a tie.

use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

use crate::detect::{classify_role, ComponentRole};
use crate::footprint::{Footprint, FootprintProvider};
use crate::geometry::{Point, Rect};
use crate::model::{
    ComponentInstance, ConnectionDef, EdgePreference, InstanceId, StrategyKind, Zone,
};
use crate::placement::zones::ZoneMap;

/// Read-only view of one placement problem.
pub struct PlacementContext<'a> {
    pub instances: &'a [ComponentInstance],
    pub footprints: Vec<Footprint>,
    pub roles: Vec<ComponentRole>,
    /// Instance connectivity; node `i` is instance `i`
    pub graph: UnGraph<usize, ()>,
    pub bounds: Rect,
    pub centroid: Point,
    pub zones: ZoneMap,
}

impl<'a> PlacementContext<'a> {
    pub fn new(
        instances: &'a [ComponentInstance],
        connections: &[ConnectionDef],
        footprints: &dyn FootprintProvider,
        bounds: Rect,
        centroid: Point,
    ) -> Self {
        let mut graph = UnGraph::<usize, ()>::with_capacity(instances.len(), connections.len());
        let by_id: HashMap<&InstanceId, NodeIndex> = instances
            .iter()
            .enumerate()
            .map(|(i, inst)| (&inst.id, graph.add_node(i)))
            .collect();
        for conn in connections {
            let ends = (by_id.get(&conn.from.instance), by_id.get(&conn.to.instance));
            if let (Some(&a), Some(&b)) = ends {
                if a != b && graph.find_edge(a, b).is_none() {
                    graph.add_edge(a, b, ());
                }
            }
        }

        Self {
            instances,
            footprints: instances.iter().map(|i| footprints.resolve(&i.component_type)).collect(),
            roles: instances.iter().map(|i| classify_role(&i.component_type)).collect(),
            graph,
            bounds,
            centroid,
            zones: ZoneMap::new(bounds),
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of distinct instances this one is wired to.
    pub fn degree(&self, index: usize) -> usize {
        self.graph.neighbors(NodeIndex::new(index)).count()
    }

    pub fn area(&self, index: usize) -> f64 {
        self.footprints[index].area()
    }

    /// Most connected first, then largest, then selection order.
    pub fn by_connectivity(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.degree(b)
                .cmp(&self.degree(a))
                .then(self.area(b).total_cmp(&self.area(a)))
                .then(a.cmp(&b))
        });
        order
    }
}

pub trait PlacementStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Packing order over instance indices.
    fn order(&self, ctx: &PlacementContext) -> Vec<usize>;

    /// Preferred position of the instance packed at `rank`.
    fn anchor(&self, ctx: &PlacementContext, index: usize, rank: usize) -> Point;
}

/// Hubs first, everything pulled toward the board centroid.
pub struct Compact;

impl PlacementStrategy for Compact {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Compact
    }

    fn name(&self) -> &'static str {
        "Compact"
    }

    fn description(&self) -> &'static str {
        "Most connected components first, packed tightly around the board center"
    }

    fn order(&self, ctx: &PlacementContext) -> Vec<usize> {
        ctx.by_connectivity()
    }

    fn anchor(&self, ctx: &PlacementContext, _index: usize, _rank: usize) -> Point {
        ctx.centroid
    }
}

/// Constrained components claim their zones and edges before anything else.
pub struct ZonePriority;

impl PlacementStrategy for ZonePriority {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ZonePriority
    }

    fn name(&self) -> &'static str {
        "Zone-Priority"
    }

    fn description(&self) -> &'static str {
        "Zone and edge constrained components placed first, the rest fill the center"
    }

    fn order(&self, ctx: &PlacementContext) -> Vec<usize> {
        let tier = |i: usize| {
            let c = &ctx.instances[i].constraint;
            if c.zone.is_some() {
                0
            } else if c.edge.is_some() {
                1
            } else {
                2
            }
        };
        let mut order = ctx.by_connectivity();
        order.sort_by_key(|&i| tier(i));
        order
    }

    fn anchor(&self, ctx: &PlacementContext, index: usize, _rank: usize) -> Point {
        let c = &ctx.instances[index].constraint;
        let zone = match (c.zone, c.edge) {
            (Some(zone), _) => zone,
            (None, Some(EdgePreference::Top)) => Zone::Top,
            (None, Some(EdgePreference::Bottom)) => Zone::Bottom,
            (None, Some(EdgePreference::Left)) => Zone::Left,
            (None, Some(EdgePreference::Right)) => Zone::Right,
            (None, Some(EdgePreference::Any)) | (None, None) => Zone::Center,
        };
        ctx.zones.center(zone)
    }
}

/// Mirror-balanced about the vertical center line.
pub struct Symmetric;

impl PlacementStrategy for Symmetric {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Symmetric
    }

    fn name(&self) -> &'static str {
        "Symmetric"
    }

    fn description(&self) -> &'static str {
        "Components alternate left and right of the vertical center line"
    }

    fn order(&self, ctx: &PlacementContext) -> Vec<usize> {
        ctx.by_connectivity()
    }

    fn anchor(&self, ctx: &PlacementContext, _index: usize, rank: usize) -> Point {
        if rank == 0 {
            return ctx.centroid;
        }
        let side = if rank % 2 == 1 { -1.0 } else { 1.0 };
        Point::new(ctx.centroid.x + side * ctx.bounds.width() / 4.0, ctx.centroid.y)
    }
}

/// Left-to-right flow: power in, connectors, logic, passives, ground out.
pub struct SignalFlow;

impl SignalFlow {
    fn stage(role: ComponentRole) -> u8 {
        match role {
            ComponentRole::PowerSource => 0,
            ComponentRole::Connector => 1,
            ComponentRole::Ic => 2,
            ComponentRole::Passive => 3,
            ComponentRole::Ground => 4,
            ComponentRole::Unknown => 5,
        }
    }
}

impl PlacementStrategy for SignalFlow {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SignalFlow
    }

    fn name(&self) -> &'static str {
        "Signal-Flow"
    }

    fn description(&self) -> &'static str {
        "Power on the left, then connectors, ICs and passives flowing to the right"
    }

    fn order(&self, ctx: &PlacementContext) -> Vec<usize> {
        let mut order = ctx.by_connectivity();
        order.sort_by_key(|&i| Self::stage(ctx.roles[i]));
        order
    }

    fn anchor(&self, ctx: &PlacementContext, _index: usize, rank: usize) -> Point {
        let n = ctx.len().max(1) as f64;
        let x = ctx.bounds.min_x + ctx.bounds.width() * (rank as f64 + 0.5) / n;
        Point::new(x, ctx.centroid.y)
    }
}

/// Every strategy, in the fixed order arrangements are generated in.
pub fn all_strategies() -> Vec<Box<dyn PlacementStrategy>> {
    vec![
        Box::new(Compact),
        Box::new(ZonePriority),
        Box::new(Symmetric),
        Box::new(SignalFlow),
    ]
}
