//! End-to-end tests for the layout pipeline

use channelboard::prelude::*;
use channelboard::model::StrategyKind;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn blinky() -> LayoutRequest {
    LayoutRequest::load_file(&fixture_path("blinky_request.json")).expect("Should load request")
}

#[test]
fn test_generate_one_arrangement_per_strategy() {
    let core = LayoutCore::default();
    let arrangements = core.generate_arrangements(&blinky()).expect("Should generate");

    assert_eq!(arrangements.len(), 4, "One arrangement per strategy");
    for kind in [
        StrategyKind::Compact,
        StrategyKind::ZonePriority,
        StrategyKind::Symmetric,
        StrategyKind::SignalFlow,
    ] {
        assert!(
            arrangements.iter().any(|a| a.strategy == kind),
            "Missing {:?} arrangement",
            kind
        );
    }

    for pair in arrangements.windows(2) {
        assert!(pair[0].score >= pair[1].score, "Arrangements should be ranked by score");
    }
}

#[test]
fn test_every_instance_is_placed_on_the_board() {
    let core = LayoutCore::default();
    let request = blinky();
    let arrangements = core.generate_arrangements(&request).expect("Should generate");

    for arrangement in &arrangements {
        assert_eq!(arrangement.components.len(), 4, "{} should place 4 instances", arrangement.name);
        for placed in &arrangement.components {
            assert!(
                request.board.bounds().contains(&placed.position),
                "{} places {} off the board",
                arrangement.name,
                placed.id
            );
        }
        assert!((0.0..=100.0).contains(&arrangement.score));
        // 2 manual + 1 power + 6 ground
        assert_eq!(arrangement.routes.len() + arrangement.unrouted.len(), 9);
        assert_eq!(arrangement.metrics.unrouted_connections, arrangement.unrouted.len());
    }
}

#[test]
fn test_auto_detect_adds_power_and_ground() {
    let core = LayoutCore::default();
    let request = blinky();
    let detected = core.detect_connections(&request.components, &request.connections);

    assert_eq!(detected.stats.power_connections, 1, "Battery + feeds the MCU");
    assert_eq!(detected.stats.ground_connections, 6, "Every pair of the 4 GND pads");
    assert!(detected.connections.iter().all(|c| c.auto_detected));
}

#[test]
fn test_invalid_connection_rejected() {
    let core = LayoutCore::default();
    let request = LayoutRequest::load_file(&fixture_path("bad_connection_request.json")).expect("Should parse");
    let err = core.generate_arrangements(&request).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidConnection { ref id, .. } if id == "dangling"));
}

#[test]
fn test_duplicate_component_ids_rejected() {
    let core = LayoutCore::default();
    let mut request = blinky();
    let twin = request.components[0].clone();
    request.components.push(twin);
    assert!(matches!(
        core.generate_arrangements(&request),
        Err(LayoutError::DuplicateComponent(_))
    ));
}

#[test]
fn test_degenerate_board_rejected() {
    let core = LayoutCore::default();
    let mut request = blinky();
    request.board.outline.truncate(2);
    assert!(matches!(
        core.generate_arrangements(&request),
        Err(LayoutError::InvalidBoard(_))
    ));
}

#[test]
fn test_accept_then_check() {
    let core = LayoutCore::default();
    let request = blinky();
    let arrangements = core.generate_arrangements(&request).expect("Should generate");
    let best = &arrangements[0];

    let mut design = Design::new(request.board.clone());
    core.accept(&mut design, best, &core.request_connections(&request));
    assert_eq!(design.components.len(), best.components.len());
    assert_eq!(design.routes.len(), best.routes.len());
    assert_eq!(design.connections.len(), 9, "Detected connections are kept with the design");

    let report = core.check_design(&design, &DrcRules::recommended());
    let again = core.check_design(&design, &DrcRules::recommended());
    assert_eq!(report.violations, again.violations, "DRC should be deterministic");
    assert_eq!(
        report.stats.errors + report.stats.warnings,
        report.violations.len()
    );
}

#[test]
fn test_generated_channels_keep_off_foreign_pads() {
    let core = LayoutCore::default();
    let request = blinky();
    let connections = core.request_connections(&request);
    let arrangements = core.generate_arrangements(&request).expect("Should generate");

    for arrangement in &arrangements {
        let mut design = Design::new(request.board.clone());
        core.accept(&mut design, arrangement, &connections);
        let report = core.check_design(&design, &DrcRules::recommended());
        let crossed: Vec<_> = report.of_kind(ViolationKind::Pad).map(|v| &v.message).collect();
        assert!(crossed.is_empty(), "{} routes over pads: {:?}", arrangement.name, crossed);
        assert_eq!(
            arrangement.metrics.route_crossings,
            channelboard::routing::count_crossings(&arrangement.routes)
        );
    }
}

#[test]
fn test_fix_all_clears_overhang() {
    let core = LayoutCore::default();
    let mut design = Design::load_file(&fixture_path("overhang_design.json")).expect("Should load design");

    let report = core.auto_fix_all(&mut design, &DrcRules::recommended());
    assert_eq!(report.of_kind(ViolationKind::Overhang).count(), 0);
}
