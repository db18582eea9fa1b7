//! Greedy candidate-grid packer.
//!
//! Places one instance at a time against everything placed before it. Cost is
//! compared lexicographically: keep-together spread, then pad-to-pad wiring
//! distance, then distance to the strategy anchor.

use std::cmp::Ordering;

use crate::detect::ComponentRole;
use crate::geometry::{Point, Rect, EPSILON};
use crate::model::{Board, ConnectionDef, EdgePreference, Rotation};
use crate::placement::strategy::PlacementContext;
use crate::placement::PlacementConfig;

/// An instance that already has a position.
#[derive(Debug, Clone, Copy)]
pub struct Slot {
    pub index: usize,
    pub position: Point,
    pub rotation: Rotation,
    pub rect: Rect,
}

/// Where the packer put an instance and how cleanly.
#[derive(Debug, Clone, Copy)]
pub struct Packed {
    pub position: Point,
    pub rotation: Rotation,
    /// Clearance had to drop below the configured value
    pub relaxed: bool,
    /// No overlap-free position was found
    pub overlapping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost {
    spread: f64,
    wiring: f64,
    anchor: f64,
}

impl Cost {
    fn compare(&self, other: &Cost) -> Ordering {
        fn fuzzy(a: f64, b: f64) -> Ordering {
            if (a - b).abs() <= EPSILON {
                Ordering::Equal
            } else {
                a.total_cmp(&b)
            }
        }
        fuzzy(self.spread, other.spread)
            .then(fuzzy(self.wiring, other.wiring))
            .then(fuzzy(self.anchor, other.anchor))
    }
}

/// Pad link from the instance being packed to another instance.
struct Link<'c> {
    own_pad: &'c str,
    other: usize,
    other_pad: &'c str,
}

pub struct Packer<'a, 'c> {
    pub ctx: &'a PlacementContext<'a>,
    pub board: &'a Board,
    pub config: &'a PlacementConfig,
    pub connections: &'c [ConnectionDef],
}

impl<'a, 'c> Packer<'a, 'c> {
    pub fn body(&self, index: usize, position: Point, rotation: Rotation) -> Rect {
        self.ctx.footprints[index].bounds(position, rotation)
    }

    fn links(&self, index: usize) -> Vec<Link<'c>> {
        let id = &self.ctx.instances[index].id;
        let position_of = |inst: &crate::model::InstanceId| {
            self.ctx.instances.iter().position(|i| &i.id == inst)
        };
        let mut links = Vec::new();
        for conn in self.connections {
            let (own, other) = if &conn.from.instance == id {
                (&conn.from, &conn.to)
            } else if &conn.to.instance == id {
                (&conn.to, &conn.from)
            } else {
                continue;
            };
            if let Some(other_index) = position_of(&other.instance) {
                if other_index != index {
                    links.push(Link {
                        own_pad: own.pad.as_str(),
                        other: other_index,
                        other_pad: other.pad.as_str(),
                    });
                }
            }
        }
        links
    }

    fn cost(
        &self,
        index: usize,
        position: Point,
        rotation: Rotation,
        anchor: Point,
        links: &[Link],
        placed: &[Slot],
    ) -> Cost {
        let footprint = &self.ctx.footprints[index];
        let mut wiring = 0.0;
        for link in links {
            let Some(other) = placed.iter().find(|s| s.index == link.other) else {
                continue;
            };
            let other_fp = &self.ctx.footprints[other.index];
            let pads = (footprint.pad(link.own_pad), other_fp.pad(link.other_pad));
            if let (Some(own_pad), Some(other_pad)) = pads {
                let a = footprint.pad_position(own_pad, position, rotation);
                let b = other_fp.pad_position(other_pad, other.position, other.rotation);
                wiring += a.distance(&b);
            }
        }

        let group = self.ctx.instances[index].constraint.group.as_deref();
        let spread = match group {
            Some(g) => placed
                .iter()
                .filter(|s| self.ctx.instances[s.index].constraint.group.as_deref() == Some(g))
                .map(|s| s.position.distance(&position))
                .sum(),
            None => 0.0,
        };

        Cost {
            spread,
            wiring,
            anchor: position.distance(&anchor),
        }
    }

    fn edge_candidates(
        &self,
        index: usize,
        rotation: Rotation,
        edge: EdgePreference,
    ) -> Vec<Point> {
        let b = self.ctx.bounds;
        let ext = self.ctx.footprints[index].extent(rotation);
        let (hw, hh) = (ext.width / 2.0, ext.height / 2.0);
        let step = self.config.candidate_step;
        let edges = match edge {
            EdgePreference::Any => vec![
                EdgePreference::Top,
                EdgePreference::Bottom,
                EdgePreference::Left,
                EdgePreference::Right,
            ],
            e => vec![e],
        };

        let mut out = Vec::new();
        for e in edges {
            match e {
                EdgePreference::Top | EdgePreference::Bottom => {
                    let y = if e == EdgePreference::Top { b.min_y + hh } else { b.max_y - hh };
                    let xs = axis(b.min_x + hw, b.max_x - hw, step);
                    out.extend(xs.into_iter().map(|x| Point::new(x, y)));
                }
                EdgePreference::Left | EdgePreference::Right => {
                    let x = if e == EdgePreference::Left { b.min_x + hw } else { b.max_x - hw };
                    let ys = axis(b.min_y + hh, b.max_y - hh, step);
                    out.extend(ys.into_iter().map(|y| Point::new(x, y)));
                }
                EdgePreference::Any => {}
            }
        }
        out
    }

    fn region_candidates(&self, index: usize, rotation: Rotation, region: Rect) -> Vec<Point> {
        let ext = self.ctx.footprints[index].extent(rotation);
        let (hw, hh) = (ext.width / 2.0, ext.height / 2.0);
        let step = self.config.candidate_step;
        let xs = axis(region.min_x + hw, region.max_x - hw, step);
        let ys = axis(region.min_y + hh, region.max_y - hh, step);
        let mut out = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                out.push(Point::new(x, y));
            }
        }
        out
    }

    /// Candidate centers inside the board for one rotation.
    fn candidates(&self, index: usize, rotation: Rotation) -> Vec<Point> {
        let constraint = &self.ctx.instances[index].constraint;
        let inside = |pts: Vec<Point>| -> Vec<Point> {
            pts.into_iter()
                .filter(|p| self.board.contains_rect(&self.body(index, *p, rotation)))
                .collect()
        };

        if self.ctx.roles[index] == ComponentRole::Connector {
            if let Some(edge) = constraint.edge {
                let on_edge = inside(self.edge_candidates(index, rotation, edge));
                if !on_edge.is_empty() {
                    return on_edge;
                }
            }
        }
        if let Some(zone) = constraint.zone {
            let region = self.ctx.zones.rect(zone);
            let in_zone = inside(self.region_candidates(index, rotation, region));
            if !in_zone.is_empty() {
                return in_zone;
            }
        }
        inside(self.region_candidates(index, rotation, self.ctx.bounds))
    }

    fn is_free(&self, rect: &Rect, placed: &[Slot], clearance: f64) -> bool {
        let grown = rect.expand(clearance);
        placed.iter().all(|s| !grown.intersects(&s.rect))
    }

    /// Push `position` off overlapping neighbours along the cheapest axis,
    /// staying on the board.
    fn nudge(
        &self,
        index: usize,
        position: Point,
        rotation: Rotation,
        placed: &[Slot],
        clearance: f64,
    ) -> Option<Point> {
        let mut p = position;
        for _ in 0..8 {
            let rect = self.body(index, p, rotation);
            let grown = rect.expand(clearance);
            let Some(hit) = placed.iter().find(|s| grown.intersects(&s.rect)) else {
                return Some(p);
            };
            let r = hit.rect;
            let mut moves = [
                (r.max_x + clearance - rect.min_x, 0.0),
                (r.min_x - clearance - rect.max_x, 0.0),
                (0.0, r.max_y + clearance - rect.min_y),
                (0.0, r.min_y - clearance - rect.max_y),
            ];
            moves.sort_by(|a, b| (a.0.abs() + a.1.abs()).total_cmp(&(b.0.abs() + b.1.abs())));
            let next = moves
                .iter()
                .map(|(dx, dy)| p.offset(*dx, *dy))
                .find(|q| self.board.contains_rect(&self.body(index, *q, rotation)))?;
            p = next;
        }
        let rect = self.body(index, p, rotation);
        self.is_free(&rect, placed, clearance).then_some(p)
    }

    /// Place instance `index` against `placed`.
    pub fn pack(
        &self,
        index: usize,
        anchor: Point,
        rotations: &[Rotation],
        placed: &[Slot],
    ) -> Packed {
        let links = self.links(index);
        let mut clearance = self.config.clearance;
        let mut fallback: Option<(Cost, Point, Rotation)> = None;

        loop {
            let mut best_free: Option<(Cost, Point, Rotation)> = None;
            let mut best_any: Option<(Cost, Point, Rotation)> = None;
            for &rotation in rotations {
                for p in self.candidates(index, rotation) {
                    let cost = self.cost(index, p, rotation, anchor, &links, placed);
                    let beats = |best: &Option<(Cost, Point, Rotation)>| {
                        best.as_ref().map_or(true, |(c, _, _)| cost.compare(c) == Ordering::Less)
                    };
                    if beats(&best_any) {
                        best_any = Some((cost, p, rotation));
                    }
                    let rect = self.body(index, p, rotation);
                    if self.is_free(&rect, placed, clearance) && beats(&best_free) {
                        best_free = Some((cost, p, rotation));
                    }
                }
            }

            let relaxed = clearance < self.config.clearance - EPSILON;
            if let Some((_, position, rotation)) = best_free {
                return Packed { position, rotation, relaxed, overlapping: false };
            }
            if let Some((_, p, rotation)) = best_any {
                if let Some(position) = self.nudge(index, p, rotation, placed, clearance) {
                    return Packed { position, rotation, relaxed, overlapping: false };
                }
            }
            fallback = best_any.or(fallback);

            if clearance <= self.config.min_clearance + EPSILON {
                break;
            }
            clearance = (clearance / 2.0).max(self.config.min_clearance);
        }

        let (position, rotation) = match fallback {
            Some((_, p, r)) => (p, r),
            None => (anchor, rotations.first().copied().unwrap_or_default()),
        };
        Packed { position, rotation, relaxed: true, overlapping: true }
    }
}

/// Evenly stepped coordinates from `lo` to `hi`; the midpoint when the range is empty.
fn axis(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    if hi < lo {
        return vec![(lo + hi) / 2.0];
    }
    let step = step.max(0.1);
    let n = ((hi - lo) / step + EPSILON).floor() as usize;
    (0..=n).map(|k| lo + k as f64 * step).collect()
}
