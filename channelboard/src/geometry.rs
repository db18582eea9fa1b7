//! Planar geometry shared by placement, routing and DRC.
//!
//! All coordinates are millimetres in board space. `y` grows downward, so the
//! "top" of a board is its minimum `y`.

use serde::{Deserialize, Serialize};

/// Tolerance for coincidence tests (mm).
pub const EPSILON: f64 = 1e-6;

/// 2D point in board space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn coincides(&self, other: &Point) -> bool {
        self.distance(other) <= EPSILON
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Move a fraction of the way toward `target`.
    pub fn lerp(&self, target: &Point, t: f64) -> Point {
        Point::new(
            self.x + (target.x - self.x) * t,
            self.y + (target.y - self.y) * t,
        )
    }
}

/// Width × height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    pub fn centered(center: Point, size: Size) -> Self {
        let hw = size.width / 2.0;
        let hh = size.height / 2.0;
        Self::new(center.x - hw, center.y - hh, center.x + hw, center.y + hh)
    }

    /// Bounding box of a point set; `None` when empty.
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            rect.min_x = rect.min_x.min(p.x);
            rect.min_y = rect.min_y.min(p.y);
            rect.max_x = rect.max_x.max(p.x);
            rect.max_y = rect.max_y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn expand(&self, margin: f64) -> Rect {
        Rect::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Strict interior intersection; rectangles that only touch do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x < other.max_x - EPSILON
            && other.min_x < self.max_x - EPSILON
            && self.min_y < other.max_y - EPSILON
            && other.min_y < self.max_y - EPSILON
    }

    /// Edge-to-edge gap between two rectangles (0 when they touch or overlap).
    pub fn gap(&self, other: &Rect) -> f64 {
        let dx = (other.min_x - self.max_x).max(self.min_x - other.max_x).max(0.0);
        let dy = (other.min_y - self.max_y).max(self.min_y - other.max_y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// Euclidean length of an open polyline.
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Signed polygon area (shoelace). Positive for counter-clockwise in y-up space.
pub fn polygon_signed_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub fn polygon_area(polygon: &[Point]) -> f64 {
    polygon_signed_area(polygon).abs()
}

/// Area centroid of a simple polygon; falls back to the vertex mean for
/// degenerate input.
pub fn polygon_centroid(polygon: &[Point]) -> Point {
    let area = polygon_signed_area(polygon);
    if area.abs() < EPSILON {
        let n = polygon.len().max(1) as f64;
        let (sx, sy) = polygon
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point::new(sx / n, sy / n);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    Point::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Distance from `p` to the closest polygon edge.
pub fn distance_to_polygon_edge(p: &Point, polygon: &[Point]) -> f64 {
    let mut best = f64::INFINITY;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        best = best.min(point_segment_distance(p, &a, &b).0);
    }
    best
}

/// Even-odd point-in-polygon test. Points on an edge count as outside.
pub fn point_strictly_inside(p: &Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 || distance_to_polygon_edge(p, polygon) <= EPSILON {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Closest distance from `p` to segment `ab`, with the closest point on the segment.
pub fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> (f64, Point) {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    if len2 < EPSILON * EPSILON {
        return (p.distance(a), *a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0);
    let closest = Point::new(a.x + t * abx, a.y + t * aby);
    (p.distance(&closest), closest)
}

/// Minimum distance between two segments and the midpoint of the closest pair.
pub fn segment_distance(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> (f64, Point) {
    if segments_intersect(a1, a2, b1, b2) {
        let at = intersection_point(a1, a2, b1, b2).unwrap_or(*a1);
        return (0.0, at);
    }
    let candidates = [
        (point_segment_distance(a1, b1, b2), *a1),
        (point_segment_distance(a2, b1, b2), *a2),
        (point_segment_distance(b1, a1, a2), *b1),
        (point_segment_distance(b2, a1, a2), *b2),
    ];
    let mut best = (f64::INFINITY, *a1);
    for ((d, closest), from) in candidates {
        if d < best.0 {
            best = (d, from.lerp(&closest, 0.5));
        }
    }
    best
}

fn orientation(a: &Point, b: &Point, c: &Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    p.x >= a.x.min(b.x) - EPSILON
        && p.x <= a.x.max(b.x) + EPSILON
        && p.y >= a.y.min(b.y) - EPSILON
        && p.y <= a.y.max(b.y) + EPSILON
}

/// Closed segment intersection test (touching counts).
pub fn segments_intersect(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
    {
        return true;
    }
    (d1.abs() <= EPSILON && on_segment(b1, b2, a1))
        || (d2.abs() <= EPSILON && on_segment(b1, b2, a2))
        || (d3.abs() <= EPSILON && on_segment(a1, a2, b1))
        || (d4.abs() <= EPSILON && on_segment(a1, a2, b2))
}

/// Where two closed segments touch: a single point (both ends equal) or the
/// shared span of a collinear overlap. `None` when they are apart.
pub fn segment_contact(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<(Point, Point)> {
    if !segments_intersect(a1, a2, b1, b2) {
        return None;
    }
    let collinear = [
        orientation(b1, b2, a1),
        orientation(b1, b2, a2),
        orientation(a1, a2, b1),
        orientation(a1, a2, b2),
    ]
    .iter()
    .all(|d| d.abs() <= EPSILON);

    if !collinear {
        let at = intersection_point(a1, a2, b1, b2).unwrap_or_else(|| {
            // a zero-length segment lying on the other one
            if point_segment_distance(a1, b1, b2).0 <= EPSILON {
                *a1
            } else {
                *b1
            }
        });
        return Some((at, at));
    }

    let (origin, far) = if a1.distance(a2) >= b1.distance(b2) { (a1, a2) } else { (b1, b2) };
    let dir = (far.x - origin.x, far.y - origin.y);
    let len2 = dir.0 * dir.0 + dir.1 * dir.1;
    if len2 < EPSILON * EPSILON {
        return Some((*a1, *a1));
    }
    let t = |p: &Point| ((p.x - origin.x) * dir.0 + (p.y - origin.y) * dir.1) / len2;
    let (ta1, ta2, tb1, tb2) = (t(a1), t(a2), t(b1), t(b2));
    let lo = ta1.min(ta2).max(tb1.min(tb2));
    let hi = ta1.max(ta2).min(tb1.max(tb2)).max(lo);
    let at = |k: f64| Point::new(origin.x + k * dir.0, origin.y + k * dir.1);
    Some((at(lo), at(hi)))
}

fn intersection_point(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<Point> {
    let r = (a2.x - a1.x, a2.y - a1.y);
    let s = (b2.x - b1.x, b2.y - b1.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < EPSILON {
        return None;
    }
    let t = ((b1.x - a1.x) * s.1 - (b1.y - a1.y) * s.0) / denom;
    Some(Point::new(a1.x + t * r.0, a1.y + t * r.1))
}

/// Does segment `ab` pass through (or touch) the rectangle?
pub fn segment_intersects_rect(a: &Point, b: &Point, rect: &Rect) -> bool {
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let c = rect.corners();
    (0..4).any(|i| segments_intersect(a, b, &c[i], &c[(i + 1) % 4]))
}

/// Unsigned deflection angle (radians) at `b` for the path `a → b → c`.
/// Zero for a straight continuation, π for a full reversal.
pub fn deflection_angle(a: &Point, b: &Point, c: &Point) -> f64 {
    let v1 = (b.x - a.x, b.y - a.y);
    let v2 = (c.x - b.x, c.y - b.y);
    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if n1 < EPSILON || n2 < EPSILON {
        return 0.0;
    }
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    cos.acos()
}

/// Unit direction of segment `ab`, `None` for degenerate segments.
pub fn direction(a: &Point, b: &Point) -> Option<(f64, f64)> {
    let len = a.distance(b);
    if len < EPSILON {
        return None;
    }
    Some(((b.x - a.x) / len, (b.y - a.y) / len))
}

/// Drop consecutive duplicates and interior points that lie on a straight run.
pub fn collapse_colinear(points: &[Point]) -> Vec<Point> {
    let mut deduped: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if deduped.last().map_or(true, |last| !last.coincides(p)) {
            deduped.push(*p);
        }
    }
    if deduped.len() < 3 {
        return deduped;
    }
    let mut out = vec![deduped[0]];
    for i in 1..deduped.len() - 1 {
        let prev = out[out.len() - 1];
        let next = deduped[i + 1];
        if orientation(&prev, &deduped[i], &next).abs() > EPSILON
            || deflection_angle(&prev, &deduped[i], &next) > std::f64::consts::FRAC_PI_2
        {
            out.push(deduped[i]);
        }
    }
    out.push(deduped[deduped.len() - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ]
    }

    #[test]
    fn test_point_on_edge_is_not_inside() {
        let poly = square(10.0);
        assert!(point_strictly_inside(&Point::new(5.0, 5.0), &poly));
        assert!(!point_strictly_inside(&Point::new(0.0, 5.0), &poly));
        assert!(!point_strictly_inside(&Point::new(12.0, 5.0), &poly));
    }

    #[test]
    fn test_centroid_and_area() {
        let poly = square(10.0);
        assert!((polygon_area(&poly) - 100.0).abs() < 1e-9);
        let c = polygon_centroid(&poly);
        assert!((c.x - 5.0).abs() < 1e-9 && (c.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_segment_contact_point() {
        let a1 = Point::new(0.0, 0.0);
        let a2 = Point::new(10.0, 0.0);
        let (p, q) = segment_contact(&Point::new(5.0, -5.0), &Point::new(5.0, 5.0), &a1, &a2).unwrap();
        assert!(p.coincides(&Point::new(5.0, 0.0)) && p.coincides(&q));

        // T-contact on the interior
        let (p, _) = segment_contact(&a1, &a2, &Point::new(4.0, 0.0), &Point::new(4.0, 8.0)).unwrap();
        assert!(p.coincides(&Point::new(4.0, 0.0)));

        assert!(segment_contact(&a1, &a2, &Point::new(0.0, 1.0), &Point::new(10.0, 1.0)).is_none());
    }

    #[test]
    fn test_segment_contact_overlap_span() {
        let (p, q) = segment_contact(
            &Point::new(0.0, 0.0),
            &Point::new(20.0, 0.0),
            &Point::new(15.0, 0.0),
            &Point::new(5.0, 0.0),
        )
        .unwrap();
        assert!(p.coincides(&Point::new(5.0, 0.0)));
        assert!(q.coincides(&Point::new(15.0, 0.0)));
    }

    #[test]
    fn test_parallel_segment_distance() {
        let (d, _) = segment_distance(
            &Point::new(0.0, 0.0),
            &Point::new(10.0, 0.0),
            &Point::new(0.0, 0.5),
            &Point::new(10.0, 0.5),
        );
        assert!((d - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_collapse_colinear() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(10.0, 5.0),
        ];
        let out = collapse_colinear(&pts);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Point::new(10.0, 0.0));
    }

    #[test]
    fn test_rect_gap() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 0.0, 5.0, 2.0);
        assert!((a.gap(&b) - 1.0).abs() < 1e-9);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&a.expand(0.1)));
    }
}
