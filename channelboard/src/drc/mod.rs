//! Design Rule Checker
//!
//! Validates a design snapshot against manufacturability rules. Checks run in
//! a fixed order and each appends zero or more violations, so the report is
//! ordered by check type, then discovery order. Only `overhang` violations
//! carry an automatic fix.

pub mod checks;
pub mod fix;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::core::LayoutError;
use crate::footprint::FootprintProvider;
use crate::geometry::Point;
use crate::model::{Design, InstanceId, PadRef};

pub use checks::{
    BendCheck, CollisionCheck, DrcCheck, DrcContext, OverhangCheck, OverlapCheck, PadCheck,
    SpacingCheck, WallCheck,
};
pub use fix::{apply_fix, NUDGE_FRACTION};

/// Numeric manufacturing rules (mm). A rule left out imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrcRules {
    #[serde(default)]
    pub min_spacing: Option<f64>,
    #[serde(default)]
    pub min_wall: Option<f64>,
    #[serde(default)]
    pub min_bend_radius: Option<f64>,
    #[serde(default)]
    pub min_pad_clearance: Option<f64>,
    #[serde(default)]
    pub nozzle_width: Option<f64>,
    #[serde(default)]
    pub layer_height: Option<f64>,
}

impl DrcRules {
    /// Typical values for a 0.4 mm nozzle FDM print.
    pub fn recommended() -> Self {
        Self {
            min_spacing: Some(1.0),
            min_wall: Some(0.8),
            min_bend_radius: Some(2.0),
            min_pad_clearance: Some(0.5),
            nozzle_width: Some(0.4),
            layer_height: Some(0.2),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Largest of the given optional limits, `None` when all are absent.
    pub(crate) fn strictest(limits: &[Option<f64>]) -> Option<f64> {
        limits.iter().flatten().copied().reduce(f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Spacing,
    Wall,
    Bend,
    Overhang,
    Collision,
    Overlap,
    Pad,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::Spacing => "spacing",
            ViolationKind::Wall => "wall",
            ViolationKind::Bend => "bend",
            ViolationKind::Overhang => "overhang",
            ViolationKind::Collision => "collision",
            ViolationKind::Overlap => "overlap",
            ViolationKind::Pad => "pad",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Entity a violation points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Route(String),
    Component(InstanceId),
    Pad(PadRef),
    Via(String),
}

/// Automatic remediation attached to a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AutoFix {
    /// Move one channel point toward the board centroid
    NudgeRoutePoint { route_id: String, point_index: usize },
    /// Move a whole component toward the board centroid
    NudgeComponent { component_id: InstanceId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrcViolation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub severity: Severity,
    pub message: String,
    pub position: Option<Point>,
    pub entities: Vec<EntityRef>,
    pub suggestion: Option<String>,
    pub auto_fix: Option<AutoFix>,
}

impl DrcViolation {
    pub fn new(kind: ViolationKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            position: None,
            entities: Vec::new(),
            suggestion: None,
            auto_fix: None,
        }
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_fix(mut self, fix: AutoFix) -> Self {
        self.auto_fix = Some(fix);
        self
    }

    pub fn references(&self, entity: &EntityRef) -> bool {
        self.entities.contains(entity)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrcStats {
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrcReport {
    pub violations: Vec<DrcViolation>,
    pub stats: DrcStats,
}

impl DrcReport {
    pub fn new(violations: Vec<DrcViolation>) -> Self {
        let errors = violations.iter().filter(|v| v.is_error()).count();
        let stats = DrcStats {
            errors,
            warnings: violations.len() - errors,
        };
        Self { violations, stats }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &DrcViolation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }
}

/// Ordered set of checks.
pub struct DesignRuleChecker {
    checks: Vec<Arc<dyn DrcCheck>>,
}

impl Default for DesignRuleChecker {
    fn default() -> Self {
        Self::with_default_checks()
    }
}

impl DesignRuleChecker {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn with_default_checks() -> Self {
        let mut checker = Self::new();
        checker.add_check(Arc::new(SpacingCheck));
        checker.add_check(Arc::new(WallCheck));
        checker.add_check(Arc::new(BendCheck));
        checker.add_check(Arc::new(OverhangCheck));
        checker.add_check(Arc::new(CollisionCheck));
        checker.add_check(Arc::new(OverlapCheck));
        checker.add_check(Arc::new(PadCheck));
        checker
    }

    pub fn add_check(&mut self, check: Arc<dyn DrcCheck>) {
        self.checks.push(check);
    }

    pub fn checks(&self) -> &[Arc<dyn DrcCheck>] {
        &self.checks
    }

    pub fn check(
        &self,
        design: &Design,
        rules: &DrcRules,
        footprints: &dyn FootprintProvider,
    ) -> DrcReport {
        let ctx = DrcContext::new(design, rules, footprints);
        let mut violations = Vec::new();
        for check in &self.checks {
            let found = check.check(&ctx, &violations);
            if !found.is_empty() {
                tracing::debug!("{} check: {} violations", check.kind(), found.len());
            }
            violations.extend(found);
        }
        let report = DrcReport::new(violations);
        tracing::info!(
            "DRC finished: {} errors, {} warnings",
            report.stats.errors,
            report.stats.warnings
        );
        report
    }
}
