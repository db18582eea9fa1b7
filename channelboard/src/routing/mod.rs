//! Router
//!
//! Routes every connection of an arrangement as a channel polyline. Pad
//! positions are resolved from the placed instance and its rotated footprint,
//! a shared obstacle grid is built once per arrangement, and connections are
//! searched in parallel with results kept in connection order.
//!
//! Every body is blocked on the grid, endpoints included. A channel leaves its
//! pad through a straight escape stub to the nearest body edge that no other
//! pad obstructs, then joins the grid at the nearest cell reachable without
//! touching a foreign pad.
//!
//! Modes:
//! - `auto`: raw grid path with colinear points collapsed
//! - `manhattan`: 4-connected search, axis-aligned pad stubs
//! - `spline`: corners filleted with the minimum bend radius
//! - `manual`: a user-drawn polyline passed through untouched

pub mod astar;
pub mod grid;
pub mod metrics;
pub mod smoothing;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detect::NetMap;
use crate::footprint::{Footprint, FootprintProvider};
use crate::geometry::{self, Point, Rect, EPSILON};
use crate::model::{Board, ConnectionDef, Layer, PadRef, PlacedInstance, Profile, Route};
use astar::{find_path, SearchParams, ORTHO_COST};
use grid::{Cell, ObstacleGrid};

pub use metrics::{board_utilization, compute_metrics, count_crossings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    #[default]
    Auto,
    Manhattan,
    Spline,
    Manual,
}

/// Router settings (lengths in mm).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub cell_size: f64,
    /// Grows each instance body when blocking grid cells
    pub clearance: f64,
    /// Cost of a direction change, in orthogonal grid steps
    pub turn_penalty: f64,
    pub mode: RoutingMode,
    pub width: f64,
    pub profile: Profile,
    pub depth: f64,
    pub layer: Layer,
    pub min_bend_radius: f64,
    /// Connection id -> user-drawn polyline, used in manual mode
    pub manual_paths: BTreeMap<String, Vec<Point>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cell_size: 5.0,
            clearance: 1.0,
            turn_penalty: 0.5,
            mode: RoutingMode::Auto,
            width: 2.0,
            profile: Profile::U,
            depth: 1.5,
            layer: Layer::Top,
            min_bend_radius: 2.0,
            manual_paths: BTreeMap::new(),
        }
    }
}

/// Routed channels plus the ids of connections that could not be routed.
#[derive(Debug, Clone, Default)]
pub struct RoutingResult {
    pub routes: Vec<Route>,
    pub unrouted: Vec<String>,
}

struct ResolvedPad {
    pad: PadRef,
    instance: usize,
    position: Point,
}

/// Pad area a channel centerline must stay out of.
struct PadSite {
    pad: PadRef,
    keepout: Rect,
}

/// Shared, read-only routing state for one arrangement.
struct RoutingSite {
    grid: ObstacleGrid,
    bodies: Vec<Rect>,
    pads: Vec<PadSite>,
}

impl RoutingSite {
    /// No segment of `path` touches a pad other than the two endpoints.
    fn clear(&self, path: &[Point], from: &PadRef, to: &PadRef) -> bool {
        path.windows(2).all(|w| {
            self.pads
                .iter()
                .filter(|site| &site.pad != from && &site.pad != to)
                .all(|site| !geometry::segment_intersects_rect(&w[0], &w[1], &site.keepout))
        })
    }
}

pub struct Router<'a> {
    footprints: &'a dyn FootprintProvider,
    config: &'a RouterConfig,
}

impl<'a> Router<'a> {
    pub fn new(footprints: &'a dyn FootprintProvider, config: &'a RouterConfig) -> Self {
        Self { footprints, config }
    }

    pub fn route(
        &self,
        board: &Board,
        placed: &[PlacedInstance],
        connections: &[ConnectionDef],
        nets: &NetMap,
    ) -> RoutingResult {
        let footprints: Vec<Footprint> = placed
            .iter()
            .map(|p| self.footprints.resolve(&p.component_type))
            .collect();
        let bodies: Vec<Rect> = placed
            .iter()
            .zip(&footprints)
            .map(|(p, fp)| fp.bounds(p.position, p.rotation))
            .collect();
        let pads = placed
            .iter()
            .zip(&footprints)
            .flat_map(|(p, fp)| {
                fp.pads.iter().map(move |pad| PadSite {
                    pad: PadRef::new(p.id.clone(), pad.id.clone()),
                    keepout: fp
                        .pad_rect(pad, p.position, p.rotation)
                        .expand(self.config.width / 2.0),
                })
            })
            .collect();
        let grid = ObstacleGrid::build(board, &bodies, self.config.cell_size, self.margin());
        let site = RoutingSite { grid, bodies, pads };

        let outcomes: Vec<Option<Route>> = connections
            .par_iter()
            .map(|conn| self.route_one(conn, placed, &footprints, &site, nets))
            .collect();

        let mut result = RoutingResult::default();
        for (conn, outcome) in connections.iter().zip(outcomes) {
            match outcome {
                Some(route) => result.routes.push(route),
                None => {
                    tracing::warn!(
                        "Connection {} ({} -> {}) could not be routed",
                        conn.id,
                        conn.from,
                        conn.to
                    );
                    result.unrouted.push(conn.id.clone());
                }
            }
        }
        tracing::debug!(
            "Routed {} of {} connections",
            result.routes.len(),
            connections.len()
        );
        result
    }

    fn resolve_pad(
        &self,
        pad: &PadRef,
        placed: &[PlacedInstance],
        footprints: &[Footprint],
    ) -> Option<ResolvedPad> {
        let instance = placed.iter().position(|p| p.id == pad.instance)?;
        let footprint = &footprints[instance];
        let fp_pad = footprint.pad(&pad.pad)?;
        let p = &placed[instance];
        Some(ResolvedPad {
            pad: pad.clone(),
            instance,
            position: footprint.pad_position(fp_pad, p.position, p.rotation),
        })
    }

    fn route_one(
        &self,
        conn: &ConnectionDef,
        placed: &[PlacedInstance],
        footprints: &[Footprint],
        site: &RoutingSite,
        nets: &NetMap,
    ) -> Option<Route> {
        let points = if self.config.mode == RoutingMode::Manual {
            self.config
                .manual_paths
                .get(&conn.id)
                .filter(|path| path.len() >= 2)?
                .clone()
        } else {
            let from = self.resolve_pad(&conn.from, placed, footprints)?;
            let to = self.resolve_pad(&conn.to, placed, footprints)?;
            self.search(&from, &to, site)?
        };

        Some(Route {
            id: uuid::Uuid::new_v4().to_string(),
            connection_id: Some(conn.id.clone()),
            from: Some(conn.from.clone()),
            to: Some(conn.to.clone()),
            net: nets.net_for(conn),
            layer: self.config.layer,
            points,
            width: self.config.width,
            profile: self.config.profile,
            depth: self.config.depth,
        })
    }

    /// Body margin kept free on the grid: routing clearance plus half a channel.
    fn margin(&self) -> f64 {
        self.config.clearance + self.config.width / 2.0
    }

    fn search(
        &self,
        from: &ResolvedPad,
        to: &ResolvedPad,
        site: &RoutingSite,
    ) -> Option<Vec<Point>> {
        let exit = self.escape(from, to, site);
        let entry = self.escape(to, from, site);
        let start = self.landing(&exit, &entry, from, to, site)?;
        let goal = self.landing(&entry, &exit, from, to, site)?;
        let params = SearchParams {
            diagonal: self.config.mode != RoutingMode::Manhattan,
            turn_cost: (self.config.turn_penalty * ORTHO_COST as f64).round() as i64,
        };
        let cells = find_path(&site.grid, start, goal, params)?;
        let centers: Vec<Point> = cells.iter().map(|c| site.grid.center(*c)).collect();

        let points = match self.config.mode {
            RoutingMode::Manhattan => {
                let mut raw = vec![from.position];
                raw.extend(smoothing::manhattan(exit, &centers, entry));
                raw.push(to.position);
                geometry::collapse_colinear(&raw)
            }
            RoutingMode::Spline => {
                let raw = through(from.position, exit, &centers, entry, to.position);
                smoothing::fillet(&geometry::collapse_colinear(&raw), self.config.min_bend_radius)
            }
            RoutingMode::Auto | RoutingMode::Manual => {
                geometry::collapse_colinear(&through(from.position, exit, &centers, entry, to.position))
            }
        };
        (points.len() >= 2).then_some(points)
    }

    /// End of the straight stub that takes `pad` out of its body. Nearer edges
    /// first, then the one facing `other`; a stub crossing a foreign pad is
    /// skipped unless every edge is obstructed.
    fn escape(&self, pad: &ResolvedPad, other: &ResolvedPad, site: &RoutingSite) -> Point {
        let body = &site.bodies[pad.instance];
        let p = pad.position;
        let m = self.margin();
        let mut exits = [
            (body.max_x - p.x, Point::new(body.max_x + m, p.y)),
            (p.x - body.min_x, Point::new(body.min_x - m, p.y)),
            (body.max_y - p.y, Point::new(p.x, body.max_y + m)),
            (p.y - body.min_y, Point::new(p.x, body.min_y - m)),
        ];
        exits.sort_by(|a, b| {
            let key = |d: f64| (d / EPSILON).round() as i64;
            key(a.0)
                .cmp(&key(b.0))
                .then_with(|| {
                    a.1.distance(&other.position)
                        .total_cmp(&b.1.distance(&other.position))
                })
        });
        exits
            .iter()
            .map(|(_, e)| *e)
            .find(|e| site.clear(&[p, *e], &pad.pad, &other.pad))
            .unwrap_or(exits[0].1)
    }

    /// Grid cell a stub end joins, reached without touching a foreign pad.
    fn landing(
        &self,
        stub: &Point,
        toward: &Point,
        from: &ResolvedPad,
        to: &ResolvedPad,
        site: &RoutingSite,
    ) -> Option<Cell> {
        let manhattan = self.config.mode == RoutingMode::Manhattan;
        site.grid.nearest_passable(stub, toward, |cell| {
            let c = site.grid.center(cell);
            let joint = if manhattan {
                vec![*stub, Point::new(c.x, stub.y), c]
            } else {
                vec![*stub, c]
            };
            site.clear(&joint, &from.pad, &to.pad)
        })
    }
}

/// Pad, escape stub, grid path, escape stub, pad.
fn through(from: Point, exit: Point, centers: &[Point], entry: Point, to: Point) -> Vec<Point> {
    let mut points = Vec::with_capacity(centers.len() + 4);
    points.push(from);
    points.push(exit);
    points.extend_from_slice(centers);
    points.push(entry);
    points.push(to);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::FootprintLibrary;
    use crate::model::Rotation;

    fn two_leds() -> (Vec<PlacedInstance>, Vec<ConnectionDef>) {
        let placed = vec![
            PlacedInstance {
                id: "a/0".into(),
                component_type: "led".to_string(),
                position: Point::new(20.0, 30.0),
                rotation: Rotation::R0,
            },
            PlacedInstance {
                id: "b/0".into(),
                component_type: "led".to_string(),
                position: Point::new(70.0, 30.0),
                rotation: Rotation::R0,
            },
        ];
        let conns = vec![ConnectionDef::manual(PadRef::new("a/0", "K"), PadRef::new("b/0", "A"))];
        (placed, conns)
    }

    #[test]
    fn test_route_ends_at_pads() {
        let lib = FootprintLibrary::builtin();
        let config = RouterConfig::default();
        let (placed, conns) = two_leds();
        let nets = NetMap::build(&conns);
        let result = Router::new(&lib, &config).route(&Board::rectangle(100.0, 60.0), &placed, &conns, &nets);
        assert!(result.unrouted.is_empty());
        let route = &result.routes[0];
        assert_eq!(route.points[0], Point::new(21.5, 30.0));
        assert_eq!(*route.points.last().unwrap(), Point::new(68.5, 30.0));
        assert_eq!(route.net, "N1");
    }

    #[test]
    fn test_channel_leaves_ic_without_touching_other_pads() {
        let lib = FootprintLibrary::builtin();
        let config = RouterConfig::default();
        let placed = vec![
            PlacedInstance {
                id: "mcu/0".into(),
                component_type: "attiny85".to_string(),
                position: Point::new(30.0, 30.0),
                rotation: Rotation::R0,
            },
            PlacedInstance {
                id: "d/0".into(),
                component_type: "led".to_string(),
                position: Point::new(75.0, 30.0),
                rotation: Rotation::R0,
            },
        ];
        // pad 2 sits on the far side of the IC from the LED
        let conns = vec![ConnectionDef::manual(PadRef::new("mcu/0", "2"), PadRef::new("d/0", "A"))];
        let nets = NetMap::build(&conns);
        let result = Router::new(&lib, &config).route(&Board::rectangle(100.0, 60.0), &placed, &conns, &nets);
        let route = &result.routes[0];
        assert!(route.points[0].coincides(&Point::new(26.2, 28.73)));
        // straight out of the nearest (left) body edge
        assert!(route.points[1].coincides(&Point::new(23.0, 28.73)));

        let mcu = lib.resolve("attiny85");
        for pad in mcu.pads.iter().filter(|p| p.id != "2") {
            let keepout = mcu.pad_rect(pad, Point::new(30.0, 30.0), Rotation::R0).expand(config.width / 2.0);
            for w in route.points.windows(2) {
                assert!(
                    !geometry::segment_intersects_rect(&w[0], &w[1], &keepout),
                    "Channel touches pad {}",
                    pad.id
                );
            }
        }
    }

    #[test]
    fn test_manual_mode_passes_polyline_through() {
        let lib = FootprintLibrary::builtin();
        let (placed, conns) = two_leds();
        let drawn = vec![Point::new(21.5, 30.0), Point::new(40.0, 10.0), Point::new(68.5, 30.0)];
        let mut config = RouterConfig {
            mode: RoutingMode::Manual,
            ..Default::default()
        };
        config.manual_paths.insert(conns[0].id.clone(), drawn.clone());
        let nets = NetMap::build(&conns);
        let result = Router::new(&lib, &config).route(&Board::rectangle(100.0, 60.0), &placed, &conns, &nets);
        assert_eq!(result.routes[0].points, drawn);
    }

    #[test]
    fn test_manual_mode_without_polyline_is_unrouted() {
        let lib = FootprintLibrary::builtin();
        let (placed, conns) = two_leds();
        let config = RouterConfig {
            mode: RoutingMode::Manual,
            ..Default::default()
        };
        let nets = NetMap::build(&conns);
        let result = Router::new(&lib, &config).route(&Board::rectangle(100.0, 60.0), &placed, &conns, &nets);
        assert!(result.routes.is_empty());
        assert_eq!(result.unrouted, vec![conns[0].id.clone()]);
    }
}
