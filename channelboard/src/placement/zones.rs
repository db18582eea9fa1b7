//! Zone bands over the board's bounding box.
//!
//! Each edge band is a quarter of the box depth on that side. Top and bottom
//! span the full width; left and right fill the height between them; center
//! is what remains.

use crate::geometry::{Point, Rect};
use crate::model::Zone;

#[derive(Debug, Clone, Copy)]
pub struct ZoneMap {
    bounds: Rect,
}

impl ZoneMap {
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn rect(&self, zone: Zone) -> Rect {
        let b = self.bounds;
        let qw = b.width() / 4.0;
        let qh = b.height() / 4.0;
        match zone {
            Zone::Top => Rect::new(b.min_x, b.min_y, b.max_x, b.min_y + qh),
            Zone::Bottom => Rect::new(b.min_x, b.max_y - qh, b.max_x, b.max_y),
            Zone::Left => Rect::new(b.min_x, b.min_y + qh, b.min_x + qw, b.max_y - qh),
            Zone::Right => Rect::new(b.max_x - qw, b.min_y + qh, b.max_x, b.max_y - qh),
            Zone::Center => Rect::new(b.min_x + qw, b.min_y + qh, b.max_x - qw, b.max_y - qh),
        }
    }

    pub fn center(&self, zone: Zone) -> Point {
        self.rect(zone).center()
    }

    /// Band containing `p`; points outside the box map to the nearest band.
    pub fn zone_of(&self, p: &Point) -> Zone {
        let b = self.bounds;
        let qw = b.width() / 4.0;
        let qh = b.height() / 4.0;
        if p.y <= b.min_y + qh {
            Zone::Top
        } else if p.y >= b.max_y - qh {
            Zone::Bottom
        } else if p.x <= b.min_x + qw {
            Zone::Left
        } else if p.x >= b.max_x - qw {
            Zone::Right
        } else {
            Zone::Center
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_partition_the_box() {
        let zones = ZoneMap::new(Rect::new(0.0, 0.0, 100.0, 60.0));
        let total: f64 = Zone::ALL.iter().map(|z| zones.rect(*z).area()).sum();
        assert!((total - 6000.0).abs() < 1e-9);
        assert_eq!(zones.rect(Zone::Top), Rect::new(0.0, 0.0, 100.0, 15.0));
        assert_eq!(zones.rect(Zone::Left), Rect::new(0.0, 15.0, 25.0, 45.0));
    }

    #[test]
    fn test_zone_of_matches_rect() {
        let zones = ZoneMap::new(Rect::new(0.0, 0.0, 100.0, 60.0));
        for zone in Zone::ALL {
            assert_eq!(zones.zone_of(&zones.center(zone)), zone);
        }
    }
}
