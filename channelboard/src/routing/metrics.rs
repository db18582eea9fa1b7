//! Arrangement metrics computed once all channels exist.

use crate::footprint::FootprintProvider;
use crate::geometry::{self, Point};
use crate::model::{ArrangementMetrics, Board, PlacedInstance, Route};

/// Contacts between channels of different nets on the same layer: proper
/// crossings, T-contacts, runs through a bend and collinear overlaps. A touch
/// where both channels end (a shared pad or via) is a junction, not a
/// crossing. Contacts found on adjacent segments count once.
pub fn count_crossings(routes: &[Route]) -> usize {
    let mut crossings = 0;
    for (i, a) in routes.iter().enumerate() {
        for b in &routes[i + 1..] {
            if a.layer == b.layer && a.net != b.net {
                crossings += contacts_between(a, b);
            }
        }
    }
    crossings
}

fn ends_at(route: &Route, p: &Point) -> bool {
    route.start().is_some_and(|s| s.coincides(p)) || route.end().is_some_and(|e| e.coincides(p))
}

fn contacts_between(a: &Route, b: &Route) -> usize {
    let mut contacts: Vec<(Point, Point)> = Vec::new();
    for sa in a.points.windows(2) {
        for sb in b.points.windows(2) {
            let Some((p, q)) = geometry::segment_contact(&sa[0], &sa[1], &sb[0], &sb[1]) else {
                continue;
            };
            if p.coincides(&q) && ends_at(a, &p) && ends_at(b, &p) {
                continue;
            }
            match contacts
                .iter_mut()
                .find(|(s, e)| geometry::segments_intersect(s, e, &p, &q))
            {
                Some(span) => *span = widest(*span, (p, q)),
                None => contacts.push((p, q)),
            }
        }
    }
    contacts.len()
}

/// Farthest-apart pair among the ends of two touching spans.
fn widest(a: (Point, Point), b: (Point, Point)) -> (Point, Point) {
    let ends = [a.0, a.1, b.0, b.1];
    let mut best = a;
    for i in 0..ends.len() {
        for j in i + 1..ends.len() {
            if ends[i].distance(&ends[j]) > best.0.distance(&best.1) {
                best = (ends[i], ends[j]);
            }
        }
    }
    best
}

/// Footprint area over board area, both layers combined, clamped to [0, 1].
pub fn board_utilization(
    board: &Board,
    placed: &[PlacedInstance],
    footprints: &dyn FootprintProvider,
) -> f64 {
    let board_area = board.area();
    if board_area <= geometry::EPSILON {
        return 1.0;
    }
    let used: f64 = placed
        .iter()
        .map(|p| footprints.resolve(&p.component_type).area())
        .sum();
    (used / board_area).clamp(0.0, 1.0)
}

pub fn compute_metrics(
    board: &Board,
    placed: &[PlacedInstance],
    routes: &[Route],
    unrouted: usize,
    footprints: &dyn FootprintProvider,
) -> ArrangementMetrics {
    ArrangementMetrics {
        total_route_length: routes.iter().map(Route::length).sum(),
        route_crossings: count_crossings(routes),
        board_utilization: board_utilization(board, placed, footprints),
        unrouted_connections: unrouted,
    }
}
