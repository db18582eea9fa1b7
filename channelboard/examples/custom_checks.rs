//! Example: running DesignRuleChecker directly with an extra user-defined check.
//! Run with: cargo run --example custom_checks [path/to/design.json]

use channelboard::drc::{DesignRuleChecker, DrcCheck, DrcContext, EntityRef};
use channelboard::footprint::FootprintLibrary;
use channelboard::{Design, DrcRules, DrcViolation, Severity, ViolationKind};
use std::path::Path;
use std::sync::Arc;

/// Channels must be at least `passes` nozzle widths wide.
struct MinChannelWidth {
    passes: f64,
}

impl DrcCheck for MinChannelWidth {
    fn kind(&self) -> ViolationKind {
        ViolationKind::Wall
    }

    fn name(&self) -> &str {
        "Minimum Channel Width"
    }

    fn description(&self) -> &str {
        "Channels narrower than a whole number of nozzle passes"
    }

    fn check(&self, ctx: &DrcContext, _found: &[DrcViolation]) -> Vec<DrcViolation> {
        let Some(nozzle) = ctx.rules.nozzle_width else {
            return Vec::new();
        };
        let min = nozzle * self.passes;
        ctx.design
            .routes
            .iter()
            .filter(|r| r.width < min)
            .map(|r| {
                DrcViolation::new(
                    ViolationKind::Wall,
                    Severity::Error,
                    format!("Channel {} is {:.2} mm wide (minimum {:.2} mm)", r.net, r.width, min),
                )
                .with_entity(EntityRef::Route(r.id.clone()))
            })
            .collect()
    }
}

fn main() -> Result<(), channelboard::LayoutError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/spacing_design.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_checks [path/to/design.json]");
        std::process::exit(1);
    }

    let design = Design::load_file(path)?;
    let mut checker = DesignRuleChecker::with_default_checks();
    checker.add_check(Arc::new(MinChannelWidth { passes: 2.0 }));

    let report = checker.check(&design, &DrcRules::recommended(), &FootprintLibrary::builtin());

    println!("Custom checks found {} violations for {}", report.violations.len(), path.display());
    for v in &report.violations {
        println!("  [{:?}] {}", v.severity, v.message);
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
