//! Automatic remediation for fixable violations.

use crate::core::LayoutError;
use crate::model::Design;

use super::{AutoFix, DrcViolation};

/// Fraction of the distance to the board centroid covered by one nudge.
pub const NUDGE_FRACTION: f64 = 0.1;

/// Apply a violation's fix to the design. The caller re-runs DRC afterwards.
pub fn apply_fix(design: &mut Design, violation: &DrcViolation) -> Result<(), LayoutError> {
    let Some(fix) = &violation.auto_fix else {
        return Err(LayoutError::NotFixable(format!(
            "{} violation has no automatic fix",
            violation.kind
        )));
    };
    let centroid = design.board.centroid();

    match fix {
        AutoFix::NudgeRoutePoint { route_id, point_index } => {
            let route = design
                .route_mut(route_id)
                .ok_or_else(|| LayoutError::NotFixable(format!("route {} not found", route_id)))?;
            let point = route.points.get_mut(*point_index).ok_or_else(|| {
                LayoutError::NotFixable(format!("route {} has no point {}", route_id, point_index))
            })?;
            *point = point.lerp(&centroid, NUDGE_FRACTION);
            tracing::debug!("Nudged point {} of route {}", point_index, route_id);
        }
        AutoFix::NudgeComponent { component_id } => {
            let component = design
                .component_mut(component_id)
                .ok_or_else(|| {
                    LayoutError::NotFixable(format!("component {} not found", component_id))
                })?;
            component.position = component.position.lerp(&centroid, NUDGE_FRACTION);
            tracing::debug!("Nudged component {}", component_id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::{Severity, ViolationKind};
    use crate::geometry::Point;
    use crate::model::{Board, Layer, Profile, Route};

    #[test]
    fn test_nudge_route_point_toward_centroid() {
        let mut design = Design::new(Board::rectangle(100.0, 60.0));
        design.routes.push(Route {
            id: "r".to_string(),
            connection_id: None,
            from: None,
            to: None,
            net: "N1".to_string(),
            layer: Layer::Top,
            points: vec![Point::new(0.0, 30.0), Point::new(50.0, 30.0)],
            width: 2.0,
            profile: Profile::U,
            depth: 1.5,
        });
        let violation = DrcViolation::new(ViolationKind::Overhang, Severity::Error, "out").with_fix(
            AutoFix::NudgeRoutePoint {
                route_id: "r".to_string(),
                point_index: 0,
            },
        );
        apply_fix(&mut design, &violation).unwrap();
        assert!(design.routes[0].points[0].distance(&Point::new(5.0, 30.0)) < 1e-9);
    }

    #[test]
    fn test_unfixable_violation() {
        let mut design = Design::new(Board::rectangle(100.0, 60.0));
        let violation = DrcViolation::new(ViolationKind::Spacing, Severity::Error, "close");
        assert!(matches!(apply_fix(&mut design, &violation), Err(LayoutError::NotFixable(_))));
    }

    #[test]
    fn test_missing_target() {
        let mut design = Design::new(Board::rectangle(100.0, 60.0));
        let violation = DrcViolation::new(ViolationKind::Overhang, Severity::Error, "out")
            .with_fix(AutoFix::NudgeComponent {
                component_id: "ghost/0".into(),
            });
        assert!(apply_fix(&mut design, &violation).is_err());
    }
}
