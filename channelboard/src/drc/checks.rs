use crate::detect::NetMap;
use crate::footprint::FootprintProvider;
use crate::geometry::{self, Point, Rect, EPSILON};
use crate::model::{Design, InstanceId, PadRef, Route};

use super::{AutoFix, DrcRules, DrcViolation, EntityRef, Severity, ViolationKind};

/// Bends gentler than this are treated as straight runs.
const BEND_THRESHOLD_DEG: f64 = 20.0;

/// One design rule. Checks see the violations already found by earlier checks
/// so they can avoid reporting the same defect twice.
pub trait DrcCheck: Send + Sync {
    fn kind(&self) -> ViolationKind;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn check(&self, ctx: &DrcContext, found: &[DrcViolation]) -> Vec<DrcViolation>;
}

pub struct PlacedPad {
    pub pad: PadRef,
    pub center: Point,
    pub rect: Rect,
}

pub struct PlacedBody {
    pub id: InstanceId,
    pub body: Rect,
    pub pads: Vec<PlacedPad>,
}

/// Design plus everything the checks derive from it once: absolute body and
/// pad rectangles, and the net of every connected pad.
pub struct DrcContext<'a> {
    pub design: &'a Design,
    pub rules: &'a DrcRules,
    pub bodies: Vec<PlacedBody>,
    pub nets: NetMap,
}

impl<'a> DrcContext<'a> {
    pub fn new(
        design: &'a Design,
        rules: &'a DrcRules,
        footprints: &dyn FootprintProvider,
    ) -> Self {
        let bodies = design
            .components
            .iter()
            .map(|placed| {
                let fp = footprints.resolve(&placed.component_type);
                let pads = fp
                    .pads
                    .iter()
                    .map(|pad| PlacedPad {
                        pad: PadRef::new(placed.id.clone(), pad.id.clone()),
                        center: fp.pad_position(pad, placed.position, placed.rotation),
                        rect: fp.pad_rect(pad, placed.position, placed.rotation),
                    })
                    .collect();
                PlacedBody {
                    id: placed.id.clone(),
                    body: fp.bounds(placed.position, placed.rotation),
                    pads,
                }
            })
            .collect();
        Self {
            design,
            rules,
            bodies,
            nets: NetMap::build(&design.connections),
        }
    }

    fn routes(&self) -> &[Route] {
        &self.design.routes
    }

    /// Route pairs that share a layer but belong to different nets.
    fn foreign_pairs(&self) -> impl Iterator<Item = (&Route, &Route)> {
        let routes = self.routes();
        routes.iter().enumerate().flat_map(move |(i, a)| {
            routes[i + 1..]
                .iter()
                .filter(move |b| a.layer == b.layer && a.net != b.net)
                .map(move |b| (a, b))
        })
    }
}

fn route_pair_reported(found: &[DrcViolation], kind: ViolationKind, a: &Route, b: &Route) -> bool {
    let ea = EntityRef::Route(a.id.clone());
    let eb = EntityRef::Route(b.id.clone());
    found
        .iter()
        .any(|v| v.kind == kind && v.references(&ea) && v.references(&eb))
}

/// Edge-to-edge gap between two channels and where it is narrowest.
fn channel_gap(a: &Route, b: &Route) -> Option<(f64, Point)> {
    let mut best: Option<(f64, Point)> = None;
    for sa in a.points.windows(2) {
        for sb in b.points.windows(2) {
            let (d, at) = geometry::segment_distance(&sa[0], &sa[1], &sb[0], &sb[1]);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, at));
            }
        }
    }
    best.map(|(d, at)| (d - (a.width + b.width) / 2.0, at))
}

/// Wall left between two parallel, overlapping segments, if they are.
fn parallel_wall(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<(f64, Point)> {
    let da = geometry::direction(a1, a2)?;
    let db = geometry::direction(b1, b2)?;
    if (da.0 * db.1 - da.1 * db.0).abs() > 1e-3 {
        return None;
    }
    let len = a1.distance(a2);
    let project = |p: &Point| (p.x - a1.x) * da.0 + (p.y - a1.y) * da.1;
    let (t1, t2) = (project(b1), project(b2));
    let lo = t1.min(t2).max(0.0);
    let hi = t1.max(t2).min(len);
    if hi - lo <= EPSILON {
        return None;
    }
    let separation = ((b1.x - a1.x) * da.1 - (b1.y - a1.y) * da.0).abs();
    let mid = (lo + hi) / 2.0;
    let on_a = a1.offset(da.0 * mid, da.1 * mid);
    Some((separation, on_a))
}

pub struct SpacingCheck;

impl DrcCheck for SpacingCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Spacing
    }

    fn name(&self) -> &str {
        "Channel Spacing"
    }

    fn description(&self) -> &str {
        "Channels of different nets on the same layer must keep a minimum edge gap"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let Some(min) = ctx.rules.min_spacing else {
            return Vec::new();
        };
        let mut violations = Vec::new();
        for (a, b) in ctx.foreign_pairs() {
            let Some((gap, at)) = channel_gap(a, b) else {
                continue;
            };
            if gap < min {
                violations.push(
                    DrcViolation::new(
                        ViolationKind::Spacing,
                        Severity::Error,
                        format!(
                            "Channels {} and {} are {:.2} mm apart (minimum {:.2} mm)",
                            a.net, b.net, gap.max(0.0), min
                        ),
                    )
                    .at(at)
                    .with_entity(EntityRef::Route(a.id.clone()))
                    .with_entity(EntityRef::Route(b.id.clone()))
                    .with_suggestion("Reroute one channel or reduce channel width"),
                );
            }
        }
        violations
    }
}

/// Walls between parallel channels and the floor under every channel.
pub struct WallCheck;

impl DrcCheck for WallCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Wall
    }

    fn name(&self) -> &str {
        "Wall Thickness"
    }

    fn description(&self) -> &str {
        "Material between parallel channels and below each channel must be printable"
    }

    fn check(&self, ctx: &DrcContext, found: &[DrcViolation]) -> Vec<DrcViolation> {
        let rules = ctx.rules;
        let mut violations = Vec::new();

        if let Some(min) = DrcRules::strictest(&[rules.min_wall, rules.nozzle_width]) {
            for (a, b) in ctx.foreign_pairs() {
                if route_pair_reported(found, ViolationKind::Spacing, a, b) {
                    continue;
                }
                let mut thinnest: Option<(f64, Point)> = None;
                for sa in a.points.windows(2) {
                    for sb in b.points.windows(2) {
                        if let Some((sep, at)) = parallel_wall(&sa[0], &sa[1], &sb[0], &sb[1]) {
                            let wall = sep - (a.width + b.width) / 2.0;
                            if thinnest.map_or(true, |(w, _)| wall < w) {
                                thinnest = Some((wall, at));
                            }
                        }
                    }
                }
                if let Some((wall, at)) = thinnest.filter(|(w, _)| *w < min) {
                    violations.push(
                        DrcViolation::new(
                            ViolationKind::Wall,
                            Severity::Error,
                            format!("Wall between parallel channels is {:.2} mm (minimum {:.2} mm)", wall.max(0.0), min),
                        )
                        .at(at)
                        .with_entity(EntityRef::Route(a.id.clone()))
                        .with_entity(EntityRef::Route(b.id.clone()))
                        .with_suggestion("Separate the parallel runs"),
                    );
                }
            }
        }

        let layer_floor = rules.layer_height.map(|h| 2.0 * h);
        if let Some(min) = DrcRules::strictest(&[rules.min_wall, layer_floor]) {
            let thickness = ctx.design.board.thickness;
            for route in ctx.routes() {
                let floor = thickness - route.depth;
                if floor < min {
                    let mut v = DrcViolation::new(
                        ViolationKind::Wall,
                        Severity::Error,
                        format!("Floor under channel {} is {:.2} mm (minimum {:.2} mm)", route.net, floor.max(0.0), min),
                    )
                    .with_entity(EntityRef::Route(route.id.clone()))
                    .with_suggestion("Use a shallower channel or a thicker board");
                    if let Some(p) = route.start() {
                        v = v.at(*p);
                    }
                    violations.push(v);
                }
            }
        }
        violations
    }
}

pub struct BendCheck;

impl DrcCheck for BendCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Bend
    }

    fn name(&self) -> &str {
        "Bend Radius"
    }

    fn description(&self) -> &str {
        "Sharp corners shorter than the profile's minimum bend radius are hard to fill"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let Some(min) = ctx.rules.min_bend_radius else {
            return Vec::new();
        };
        let threshold = BEND_THRESHOLD_DEG.to_radians();
        let mut violations = Vec::new();
        for route in ctx.routes() {
            let required = min * route.profile.bend_allowance();
            for w in route.points.windows(3) {
                let delta = geometry::deflection_angle(&w[0], &w[1], &w[2]);
                if delta <= threshold {
                    continue;
                }
                let leg = w[0].distance(&w[1]).min(w[1].distance(&w[2]));
                let radius = (leg / 2.0) / (delta / 2.0).tan();
                if radius < required {
                    violations.push(
                        DrcViolation::new(
                            ViolationKind::Bend,
                            Severity::Warning,
                            format!(
                                "Bend of {:.0}° in channel {} has radius {:.2} mm (minimum {:.2} mm)",
                                delta.to_degrees(),
                                route.net,
                                radius,
                                required
                            ),
                        )
                        .at(w[1])
                        .with_entity(EntityRef::Route(route.id.clone()))
                        .with_suggestion("Use spline routing or lengthen the legs around the corner"),
                    );
                }
            }
        }
        violations
    }
}

/// Channel points and pads must lie strictly inside the board outline.
pub struct OverhangCheck;

impl DrcCheck for OverhangCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Overhang
    }

    fn name(&self) -> &str {
        "Board Overhang"
    }

    fn description(&self) -> &str {
        "Channel points and pads on or outside the board edge"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let board = &ctx.design.board;
        let mut reported: Vec<Point> = Vec::new();
        let mut violations = Vec::new();

        for route in ctx.routes() {
            for (index, p) in route.points.iter().enumerate() {
                if board.contains(p) || reported.iter().any(|r| r.coincides(p)) {
                    continue;
                }
                reported.push(*p);
                violations.push(
                    DrcViolation::new(
                        ViolationKind::Overhang,
                        Severity::Error,
                        format!("Channel {} point ({:.2}, {:.2}) is outside the board", route.net, p.x, p.y),
                    )
                    .at(*p)
                    .with_entity(EntityRef::Route(route.id.clone()))
                    .with_suggestion("Move the point toward the board center")
                    .with_fix(AutoFix::NudgeRoutePoint {
                        route_id: route.id.clone(),
                        point_index: index,
                    }),
                );
            }
        }

        for body in &ctx.bodies {
            for pad in &body.pads {
                let p = &pad.center;
                if board.contains(p) || reported.iter().any(|r| r.coincides(p)) {
                    continue;
                }
                reported.push(*p);
                violations.push(
                    DrcViolation::new(
                        ViolationKind::Overhang,
                        Severity::Error,
                        format!("Pad {} is outside the board", pad.pad),
                    )
                    .at(*p)
                    .with_entity(EntityRef::Component(body.id.clone()))
                    .with_entity(EntityRef::Pad(pad.pad.clone()))
                    .with_suggestion("Move the component toward the board center")
                    .with_fix(AutoFix::NudgeComponent {
                        component_id: body.id.clone(),
                    }),
                );
            }
        }
        violations
    }
}

pub struct CollisionCheck;

impl DrcCheck for CollisionCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Collision
    }

    fn name(&self) -> &str {
        "Component Collision"
    }

    fn description(&self) -> &str {
        "Component bodies overlap or pads of different components sit too close"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let mut violations = Vec::new();
        for (i, a) in ctx.bodies.iter().enumerate() {
            for b in &ctx.bodies[i + 1..] {
                let message = if a.body.intersects(&b.body) {
                    Some(format!("Components {} and {} overlap", a.id, b.id))
                } else {
                    ctx.rules.min_pad_clearance.and_then(|min| {
                        let gap = a
                            .pads
                            .iter()
                            .flat_map(move |pa| b.pads.iter().map(move |pb| pa.rect.gap(&pb.rect)))
                            .fold(f64::INFINITY, f64::min);
                        (gap < min).then(|| {
                            format!(
                                "Pads of {} and {} are {:.2} mm apart (minimum {:.2} mm)",
                                a.id, b.id, gap, min
                            )
                        })
                    })
                };
                if let Some(message) = message {
                    violations.push(
                        DrcViolation::new(ViolationKind::Collision, Severity::Error, message)
                            .at(a.body.center().lerp(&b.body.center(), 0.5))
                            .with_entity(EntityRef::Component(a.id.clone()))
                            .with_entity(EntityRef::Component(b.id.clone()))
                            .with_suggestion("Move the components apart"),
                    );
                }
            }
        }
        violations
    }
}

/// Vias must sit on a channel end.
pub struct OverlapCheck;

impl DrcCheck for OverlapCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Overlap
    }

    fn name(&self) -> &str {
        "Via Placement"
    }

    fn description(&self) -> &str {
        "Vias that do not land on the end of any channel"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let mut violations = Vec::new();
        for via in &ctx.design.vias {
            let reach = via.diameter / 2.0;
            let landed = ctx.routes().iter().any(|r| {
                [r.start(), r.end()]
                    .into_iter()
                    .flatten()
                    .any(|p| p.distance(&via.position) <= reach)
            });
            if !landed {
                violations.push(
                    DrcViolation::new(
                        ViolationKind::Overlap,
                        Severity::Warning,
                        format!("Via at ({:.2}, {:.2}) is not on a channel end", via.position.x, via.position.y),
                    )
                    .at(via.position)
                    .with_entity(EntityRef::Via(via.id.clone()))
                    .with_suggestion("Move the via onto a channel end or remove it"),
                );
            }
        }
        violations
    }
}

/// Channels must not run over pads they are not connected to.
pub struct PadCheck;

impl DrcCheck for PadCheck {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Pad
    }

    fn name(&self) -> &str {
        "Pad Crossing"
    }

    fn description(&self) -> &str {
        "Channels passing over pads of another net"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let mut violations = Vec::new();
        for route in ctx.routes() {
            let (Some(start), Some(end)) = (route.start(), route.end()) else {
                continue;
            };
            for pad in ctx.bodies.iter().flat_map(|b| &b.pads) {
                if route.ends_at_pad(&pad.pad)
                    || ctx.nets.net_of(&pad.pad) == Some(route.net.as_str())
                    || pad.rect.contains(start)
                    || pad.rect.contains(end)
                {
                    continue;
                }
                let zone = pad.rect.expand(route.width / 2.0);
                let crosses = route
                    .points
                    .windows(2)
                    .any(|s| geometry::segment_intersects_rect(&s[0], &s[1], &zone));
                if crosses {
                    violations.push(
                        DrcViolation::new(
                            ViolationKind::Pad,
                            Severity::Error,
                            format!("Channel {} crosses pad {}", route.net, pad.pad),
                        )
                        .at(pad.center)
                        .with_entity(EntityRef::Route(route.id.clone()))
                        .with_entity(EntityRef::Pad(pad.pad.clone()))
                        .with_suggestion("Reroute the channel around the pad"),
                    );
                }
            }
        }
        violations
    }
}
