//! Footprints
//!
//! Pad layouts and outlines per component type. The catalog is a read-only
//! data provider: embedded JSON files compiled into the binary, optionally
//! extended with user JSON files from a directory.

pub mod builtin;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geometry::{Point, Rect, Size};
use crate::model::component::Rotation;

pub use builtin::{load_footprints_from_directory, load_footprints_from_file};

/// Electrical role of a pad as declared by the footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadRole {
    Vcc,
    Gnd,
    Signal,
    Data,
    #[default]
    Unknown,
}

/// A named connection point on a footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pad {
    pub id: String,
    /// Offset from the footprint origin (body center)
    pub offset: Point,
    pub size: Size,
    #[serde(default)]
    pub role: PadRole,
}

/// Pad layout and body extent for one component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Body extent at rotation 0
    pub size: Size,
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub outline: Option<Vec<Point>>,
}

/// Minimal body used for types the catalog does not know.
pub const FALLBACK_SIZE: Size = Size::new(6.0, 6.0);

impl Footprint {
    /// Default two-pad footprint for an unknown type.
    pub fn fallback(component_type: &str) -> Self {
        Self {
            component_type: component_type.to_string(),
            aliases: Vec::new(),
            size: FALLBACK_SIZE,
            pads: vec![
                Pad {
                    id: "1".to_string(),
                    offset: Point::new(-2.0, 0.0),
                    size: Size::new(1.5, 1.5),
                    role: PadRole::Unknown,
                },
                Pad {
                    id: "2".to_string(),
                    offset: Point::new(2.0, 0.0),
                    size: Size::new(1.5, 1.5),
                    role: PadRole::Unknown,
                },
            ],
            outline: None,
        }
    }

    pub fn pad(&self, id: &str) -> Option<&Pad> {
        self.pads.iter().find(|p| p.id == id)
    }

    /// Body extent after rotation.
    pub fn extent(&self, rotation: Rotation) -> Size {
        if rotation.is_quarter_turn() {
            Size::new(self.size.height, self.size.width)
        } else {
            self.size
        }
    }

    pub fn area(&self) -> f64 {
        self.size.area()
    }

    /// Body rectangle for an instance placed at `position`.
    pub fn bounds(&self, position: Point, rotation: Rotation) -> Rect {
        Rect::centered(position, self.extent(rotation))
    }

    /// Absolute pad center for an instance placed at `position`.
    pub fn pad_position(&self, pad: &Pad, position: Point, rotation: Rotation) -> Point {
        let off = rotation.apply(pad.offset);
        position.offset(off.x, off.y)
    }

    /// Absolute pad rectangle for an instance placed at `position`.
    pub fn pad_rect(&self, pad: &Pad, position: Point, rotation: Rotation) -> Rect {
        let size = if rotation.is_quarter_turn() {
            Size::new(pad.size.height, pad.size.width)
        } else {
            pad.size
        };
        Rect::centered(self.pad_position(pad, position, rotation), size)
    }
}

/// Read-only footprint source.
pub trait FootprintProvider: Send + Sync {
    fn lookup(&self, component_type: &str) -> Option<Footprint>;

    /// Lookup with the default fallback footprint for unknown types.
    fn resolve(&self, component_type: &str) -> Footprint {
        self.lookup(component_type)
            .unwrap_or_else(|| Footprint::fallback(component_type))
    }
}

/// In-memory footprint catalog.
#[derive(Debug, Clone, Default)]
pub struct FootprintLibrary {
    footprints: Vec<Footprint>,
    index: HashMap<String, usize>,
}

impl FootprintLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the embedded footprints.
    pub fn builtin() -> Self {
        let mut library = Self::new();
        for footprint in builtin::get_all_footprints() {
            library.insert(footprint);
        }
        library
    }

    /// Add or replace a footprint (later entries win).
    pub fn insert(&mut self, footprint: Footprint) {
        let mut keys = vec![footprint.component_type.to_lowercase()];
        keys.extend(footprint.aliases.iter().map(|a| a.to_lowercase()));
        let slot = self.footprints.len();
        self.footprints.push(footprint);
        for key in keys {
            self.index.insert(key, slot);
        }
    }

    pub fn with_footprint(mut self, footprint: Footprint) -> Self {
        self.insert(footprint);
        self
    }

    pub fn len(&self) -> usize {
        self.types().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .footprints
            .iter()
            .enumerate()
            .filter(|(slot, fp)| self.index.get(&fp.component_type.to_lowercase()) == Some(slot))
            .map(|(_, fp)| fp.component_type.as_str())
            .collect();
        types.sort_unstable();
        types
    }
}

impl FootprintProvider for FootprintLibrary {
    fn lookup(&self, component_type: &str) -> Option<Footprint> {
        let slot = *self.index.get(&component_type.to_lowercase())?;
        self.footprints.get(slot).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_loads() {
        let lib = FootprintLibrary::builtin();
        assert!(!lib.is_empty());
        assert!(lib.lookup("resistor").is_some());
        assert!(lib.lookup("LED").is_some());
        assert!(lib.lookup("cr2032-holder").is_some());
    }

    #[test]
    fn test_unknown_type_gets_fallback() {
        let lib = FootprintLibrary::builtin();
        assert!(lib.lookup("flux-capacitor").is_none());
        let fp = lib.resolve("flux-capacitor");
        assert_eq!(fp.size, FALLBACK_SIZE);
        assert!(fp.pads.iter().all(|p| p.role == PadRole::Unknown));
    }

    #[test]
    fn test_rotated_pad_position() {
        let fp = Footprint::fallback("x");
        let pad = fp.pad("2").unwrap();
        let p = fp.pad_position(pad, Point::new(10.0, 10.0), Rotation::R90);
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_insert_overrides_builtin() {
        let mut lib = FootprintLibrary::builtin();
        let mut custom = Footprint::fallback("resistor");
        custom.size = Size::new(1.0, 1.0);
        lib.insert(custom);
        assert_eq!(lib.resolve("resistor").size, Size::new(1.0, 1.0));
    }
}
