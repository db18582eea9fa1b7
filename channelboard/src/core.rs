//! Core layout pipeline shared by library users and the CLI.
//! No I/O besides the explicit file-loading helpers.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::detect::{ConnectionDetector, DetectionResult, NetMap};
use crate::drc::{apply_fix, DesignRuleChecker, DrcReport, DrcRules, DrcViolation};
use crate::footprint::{FootprintLibrary, FootprintProvider};
use crate::model::{
    expand_components, validate_components, validate_connections, Arrangement,
    AssemblyComponent, Board, ComponentInstance, ConnectionDef, Design,
};
use crate::placement::{all_strategies, PlacementConfig, PlacementEngine, PlacementStrategy};
use crate::routing::{compute_metrics, Router, RouterConfig};
use crate::scoring::{score_arrangement, ScoringConfig};

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Invalid connection {id}: {reason}")]
    InvalidConnection { id: String, reason: String },
    #[error("Duplicate component id: {0}")]
    DuplicateComponent(String),
    #[error("Invalid board: {0}")]
    InvalidBoard(String),
    #[error("Not fixable: {0}")]
    NotFixable(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LayoutError {
    fn from(e: serde_json::Error) -> Self {
        LayoutError::Parse(e.to_string())
    }
}

/// Options for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    /// Try all four rotations for non-locked instances
    pub optimize_orientation: bool,
    /// Run the connection detector before placement
    pub auto_detect: bool,
    pub placement: PlacementConfig,
    pub router: RouterConfig,
    pub scoring: ScoringConfig,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            optimize_orientation: true,
            auto_detect: false,
            placement: PlacementConfig::default(),
            router: RouterConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// Everything a generation run needs, as loaded from a request file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub board: Board,
    pub components: Vec<AssemblyComponent>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
    #[serde(default)]
    pub options: LayoutOptions,
}

impl LayoutRequest {
    pub fn new(board: Board, components: Vec<AssemblyComponent>) -> Self {
        Self {
            board,
            components,
            connections: Vec::new(),
            options: LayoutOptions::default(),
        }
    }

    pub fn with_connections(mut self, connections: Vec<ConnectionDef>) -> Self {
        self.connections = connections;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, LayoutError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// Layout pipeline entry point: detection, generation, acceptance and DRC.
#[derive(Clone)]
pub struct LayoutCore {
    footprints: Arc<dyn FootprintProvider>,
}

impl Default for LayoutCore {
    fn default() -> Self {
        Self::new(FootprintLibrary::builtin())
    }
}

impl LayoutCore {
    pub fn new(footprints: impl FootprintProvider + 'static) -> Self {
        Self {
            footprints: Arc::new(footprints),
        }
    }

    pub fn footprints(&self) -> &dyn FootprintProvider {
        self.footprints.as_ref()
    }

    /// One instance per unit of quantity.
    pub fn expand(&self, components: &[AssemblyComponent]) -> Vec<ComponentInstance> {
        expand_components(components)
    }

    /// Infer power/ground/data connections the existing list does not cover yet.
    pub fn detect_connections(
        &self,
        components: &[AssemblyComponent],
        existing: &[ConnectionDef],
    ) -> DetectionResult {
        let instances = self.expand(components);
        ConnectionDetector::new(self.footprints()).detect(&instances, existing)
    }

    /// The request's connections plus, when `auto_detect` is set, the ones the
    /// detector adds. This is the list arrangements are routed against and the
    /// one to hand to [`LayoutCore::accept`].
    pub fn request_connections(&self, request: &LayoutRequest) -> Vec<ConnectionDef> {
        let mut connections = request.connections.clone();
        if request.options.auto_detect {
            let detected = self.detect_connections(&request.components, &connections);
            connections.extend(detected.connections);
        }
        connections
    }

    /// Produce one arrangement per placement strategy, ranked by score
    /// (highest first, strategy order on ties).
    pub fn generate_arrangements(
        &self,
        request: &LayoutRequest,
    ) -> Result<Vec<Arrangement>, LayoutError> {
        request.board.validate()?;
        validate_components(&request.components)?;
        let instances = self.expand(&request.components);
        let connections = self.request_connections(request);
        validate_connections(&instances, &connections, self.footprints())?;

        if instances.is_empty() {
            tracing::debug!("No component instances; nothing to arrange");
            return Ok(Vec::new());
        }

        let nets = NetMap::build(&connections);
        let strategies = all_strategies();
        let mut arrangements: Vec<Arrangement> = strategies
            .par_iter()
            .map(|strategy| {
                self.build_arrangement(
                    strategy.as_ref(),
                    request,
                    &instances,
                    &connections,
                    &nets,
                )
            })
            .collect();

        arrangements.sort_by(|a, b| b.score.total_cmp(&a.score));
        tracing::info!(
            "Generated {} arrangements for {} instances and {} connections",
            arrangements.len(),
            instances.len(),
            connections.len()
        );
        Ok(arrangements)
    }

    fn build_arrangement(
        &self,
        strategy: &dyn PlacementStrategy,
        request: &LayoutRequest,
        instances: &[ComponentInstance],
        connections: &[ConnectionDef],
        nets: &NetMap,
    ) -> Arrangement {
        let options = &request.options;
        let placement = PlacementEngine::new(self.footprints(), &options.placement).place(
            strategy,
            instances,
            connections,
            &request.board,
            options.optimize_orientation,
        );

        let router = Router::new(self.footprints(), &options.router);
        let routed = router.route(&request.board, &placement.components, connections, nets);
        let metrics = compute_metrics(
            &request.board,
            &placement.components,
            &routed.routes,
            routed.unrouted.len(),
            self.footprints(),
        );
        let score = score_arrangement(&metrics, connections.len(), &options.scoring);

        tracing::debug!(
            "{}: length {:.1} mm, {} crossings, utilization {:.2}, score {:.1}",
            strategy.name(),
            metrics.total_route_length,
            metrics.route_crossings,
            metrics.board_utilization,
            score
        );

        Arrangement {
            id: uuid::Uuid::new_v4().to_string(),
            name: strategy.name().to_string(),
            description: strategy.description().to_string(),
            strategy: strategy.kind(),
            components: placement.components,
            routes: routed.routes,
            unrouted: routed.unrouted,
            metrics,
            best_effort: placement.best_effort,
            score,
        }
    }

    /// Append an accepted arrangement to the design.
    pub fn accept(
        &self,
        design: &mut Design,
        arrangement: &Arrangement,
        connections: &[ConnectionDef],
    ) {
        design.merge_arrangement(arrangement, connections);
    }

    /// Run every design rule check in fixed order.
    pub fn check_design(&self, design: &Design, rules: &DrcRules) -> DrcReport {
        DesignRuleChecker::with_default_checks().check(design, rules, self.footprints())
    }

    /// Apply a violation's automatic remediation and re-run DRC.
    pub fn auto_fix(
        &self,
        design: &mut Design,
        violation: &DrcViolation,
        rules: &DrcRules,
    ) -> Result<DrcReport, LayoutError> {
        apply_fix(design, violation)?;
        Ok(self.check_design(design, rules))
    }

    /// Fix every auto-fixable violation once, then re-run DRC.
    pub fn auto_fix_all(&self, design: &mut Design, rules: &DrcRules) -> DrcReport {
        let report = self.check_design(design, rules);
        let mut applied = 0;
        for violation in report.violations.iter().filter(|v| v.auto_fix.is_some()) {
            match apply_fix(design, violation) {
                Ok(()) => applied += 1,
                Err(e) => tracing::warn!("Skipping fix: {}", e),
            }
        }
        tracing::info!("Applied {} automatic fixes", applied);
        self.check_design(design, rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults_from_json() {
        let json = r#"{
            "board": {"outline": [{"x":0,"y":0},{"x":80,"y":0},{"x":80,"y":50},{"x":0,"y":50}]},
            "components": [{"id": "r", "type": "resistor"}]
        }"#;
        let req = LayoutRequest::from_json_str(json).unwrap();
        assert_eq!(req.components[0].quantity, 1);
        assert!(req.connections.is_empty());
        assert!(req.options.optimize_orientation);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = LayoutRequest::from_json_str("{").unwrap_err();
        assert!(matches!(err, LayoutError::Parse(_)));
    }

    #[test]
    fn test_empty_selection_yields_no_arrangements() {
        let core = LayoutCore::default();
        let req = LayoutRequest::new(Board::rectangle(50.0, 50.0), vec![]);
        assert!(core.generate_arrangements(&req).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_board_rejected() {
        let core = LayoutCore::default();
        let mut board = Board::rectangle(50.0, 50.0);
        board.outline.truncate(2);
        let req = LayoutRequest::new(board, vec![AssemblyComponent::new("led", 1)]);
        assert!(matches!(
            core.generate_arrangements(&req),
            Err(LayoutError::InvalidBoard(_))
        ));
    }
}
