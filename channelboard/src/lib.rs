//! ChannelBoard - automated layout for printed boards with conductive channels
//!
//! This library places discrete components on a small printed board, routes
//! conductive channels between their pads, ranks the candidate layouts and
//! validates finished designs against manufacturability rules.
//!
//! # Quick Start
//!
//! ```no_run
//! use channelboard::prelude::*;
//!
//! let core = LayoutCore::default();
//! let request = LayoutRequest::new(
//!     Board::rectangle(100.0, 60.0),
//!     vec![
//!         AssemblyComponent::new("battery", 1).with_id("bat"),
//!         AssemblyComponent::new("led", 2).with_id("leds"),
//!     ],
//! );
//!
//! let arrangements = core.generate_arrangements(&request).unwrap();
//! for arrangement in &arrangements {
//!     println!("{}: {:.1}", arrangement.name, arrangement.score);
//! }
//! ```
//!
//! # Pipeline
//!
//! - **Connection detection**: power/ground/data nets inferred from component roles
//! - **Placement**: four deterministic strategies honoring zones, edges, locks and groups
//! - **Routing**: grid A* with turn penalty; auto, manhattan, spline and manual modes
//! - **Scoring**: 0-100 from length, crossings, utilization and unrouted count
//! - **DRC**: spacing, wall, bend, overhang, collision, overlap and pad checks

pub mod core;
pub mod detect;
pub mod drc;
pub mod footprint;
pub mod geometry;
pub mod model;
pub mod placement;
pub mod routing;
pub mod scoring;

// Re-export main types
pub use core::{LayoutCore, LayoutError, LayoutOptions, LayoutRequest};
pub use detect::{ConnectionDetector, DetectionResult, DetectionStats, NetMap};
pub use drc::{DesignRuleChecker, DrcReport, DrcRules, DrcViolation, Severity, ViolationKind};
pub use footprint::{Footprint, FootprintLibrary, FootprintProvider};
pub use geometry::{Point, Rect, Size};
pub use model::{
    Arrangement, ArrangementMetrics, AssemblyComponent, Board, ConnectionDef, Design, PadRef,
    PlacementConstraint, Route, Rotation,
};
pub use placement::PlacementConfig;
pub use routing::{RouterConfig, RoutingMode};
pub use scoring::ScoringConfig;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Arrangement, AssemblyComponent, Board, ConnectionDef, Design, DrcReport, DrcRules,
        DrcViolation, LayoutCore, LayoutError, LayoutOptions, LayoutRequest, PadRef, Point,
        Severity, ViolationKind,
    };
}
