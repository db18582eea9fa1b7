//! Path post-processing per routing mode.

use crate::geometry::{self, Point, EPSILON};

/// Largest angular step used when sampling a fillet arc.
const ARC_STEP: f64 = std::f64::consts::PI / 12.0;

/// Axis-aligned path: L-shaped stubs join each pad to its grid cell.
pub fn manhattan(from_pad: Point, centers: &[Point], to_pad: Point) -> Vec<Point> {
    let (Some(first), Some(last)) = (centers.first(), centers.last()) else {
        return vec![from_pad, Point::new(to_pad.x, from_pad.y), to_pad];
    };
    let mut points = Vec::with_capacity(centers.len() + 4);
    points.push(from_pad);
    points.push(Point::new(first.x, from_pad.y));
    points.extend_from_slice(centers);
    points.push(Point::new(last.x, to_pad.y));
    points.push(to_pad);
    geometry::collapse_colinear(&points)
}

/// Replace every corner with a circular arc of `radius` where both legs are
/// long enough to hold the tangent points; tighter corners are left sharp.
pub fn fillet(points: &[Point], radius: f64) -> Vec<Point> {
    if points.len() < 3 || radius <= EPSILON {
        return points.to_vec();
    }
    let mut out = vec![points[0]];
    for i in 1..points.len() - 1 {
        let (prev, corner, next) = (points[i - 1], points[i], points[i + 1]);
        let delta = geometry::deflection_angle(&prev, &corner, &next);
        let (Some(d1), Some(d2)) = (
            geometry::direction(&prev, &corner),
            geometry::direction(&corner, &next),
        ) else {
            out.push(corner);
            continue;
        };
        // Near-straight or full reversal: nothing sensible to round
        if delta < 1e-3 || delta > std::f64::consts::PI - 1e-3 {
            out.push(corner);
            continue;
        }

        let tangent = radius * (delta / 2.0).tan();
        let len_in = prev.distance(&corner);
        let len_out = corner.distance(&next);
        if tangent > len_in / 2.0 + EPSILON || tangent > len_out / 2.0 + EPSILON {
            out.push(corner);
            continue;
        }

        let a = corner.offset(-d1.0 * tangent, -d1.1 * tangent);
        let cross = d1.0 * d2.1 - d1.1 * d2.0;
        let normal = if cross > 0.0 { (-d1.1, d1.0) } else { (d1.1, -d1.0) };
        let center = a.offset(normal.0 * radius, normal.1 * radius);
        let start = (a.y - center.y).atan2(a.x - center.x);
        let sweep = if cross > 0.0 { delta } else { -delta };
        let steps = (delta / ARC_STEP).ceil().max(1.0) as usize;
        for k in 0..=steps {
            let angle = start + sweep * k as f64 / steps as f64;
            out.push(Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            ));
        }
    }
    out.push(points[points.len() - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_is_axis_aligned() {
        let path = manhattan(
            Point::new(1.0, 1.0),
            &[Point::new(2.5, 2.5), Point::new(7.5, 2.5)],
            Point::new(9.0, 4.0),
        );
        for w in path.windows(2) {
            assert!((w[0].x - w[1].x).abs() < 1e-9 || (w[0].y - w[1].y).abs() < 1e-9);
        }
        assert_eq!(path[0], Point::new(1.0, 1.0));
        assert_eq!(*path.last().unwrap(), Point::new(9.0, 4.0));
    }

    #[test]
    fn test_fillet_rounds_right_angle() {
        let corner = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        let rounded = fillet(&corner, 2.0);
        assert!(rounded.len() > 3);
        // arc starts 2 mm before the corner and ends 2 mm after it
        assert!(rounded[1].distance(&Point::new(8.0, 0.0)) < 1e-9);
        assert!(rounded[rounded.len() - 2].distance(&Point::new(10.0, 2.0)) < 1e-9);
        for w in rounded.windows(3) {
            assert!(geometry::deflection_angle(&w[0], &w[1], &w[2]) <= ARC_STEP + 1e-9);
        }
    }

    #[test]
    fn test_short_legs_stay_sharp() {
        let corner = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        assert_eq!(fillet(&corner, 2.0), corner);
    }
}
