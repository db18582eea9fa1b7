//! Board outline definition.

use serde::{Deserialize, Serialize};

use crate::core::LayoutError;
use crate::geometry::{self, Point, Rect};

/// Informational shape tag for a board outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoardShape {
    #[default]
    Rectangle,
    Circle,
    Custom,
}

/// Printed board: a simple boundary polygon plus its thickness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Ordered boundary vertices (not closed; the last vertex joins the first).
    pub outline: Vec<Point>,
    /// Board thickness (mm)
    #[serde(default = "default_thickness")]
    pub thickness: f64,
    #[serde(default)]
    pub shape: BoardShape,
}

fn default_thickness() -> f64 {
    3.0
}

impl Board {
    /// Axis-aligned rectangular board with its top-left corner at the origin.
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self {
            outline: vec![
                Point::new(0.0, 0.0),
                Point::new(width, 0.0),
                Point::new(width, height),
                Point::new(0.0, height),
            ],
            thickness: default_thickness(),
            shape: BoardShape::Rectangle,
        }
    }

    /// Circular board approximated by a regular polygon.
    pub fn circle(diameter: f64, segments: usize) -> Self {
        let r = diameter / 2.0;
        let n = segments.max(8);
        let outline = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                Point::new(r + r * a.cos(), r + r * a.sin())
            })
            .collect();
        Self {
            outline,
            thickness: default_thickness(),
            shape: BoardShape::Circle,
        }
    }

    pub fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    /// Reject outlines no algorithm can work with.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.outline.len() < 3 {
            return Err(LayoutError::InvalidBoard(format!(
                "outline has {} vertices, at least 3 required",
                self.outline.len()
            )));
        }
        if self.area() <= geometry::EPSILON {
            return Err(LayoutError::InvalidBoard("outline encloses no area".to_string()));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Rect {
        Rect::bounding(&self.outline).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
    }

    pub fn area(&self) -> f64 {
        geometry::polygon_area(&self.outline)
    }

    pub fn centroid(&self) -> Point {
        geometry::polygon_centroid(&self.outline)
    }

    /// Strict containment: points on the boundary are not inside.
    pub fn contains(&self, p: &Point) -> bool {
        geometry::point_strictly_inside(p, &self.outline)
    }

    /// A rectangle fits when every corner is inside or on the outline.
    pub fn contains_rect(&self, rect: &Rect) -> bool {
        rect.corners().iter().all(|c| {
            geometry::point_strictly_inside(c, &self.outline)
                || geometry::distance_to_polygon_edge(c, &self.outline) <= geometry::EPSILON
        })
    }
}
