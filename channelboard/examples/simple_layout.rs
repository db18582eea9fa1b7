//! Simple layout example: generate arrangements for a request file, accept the
//! best one and run the design rule checks on it.

use channelboard::prelude::*;
use std::path::Path;

fn main() -> Result<(), LayoutError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/blinky_request.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_layout [path/to/request.json]");
        std::process::exit(1);
    }

    let core = LayoutCore::default();
    let request = LayoutRequest::load_file(path)?;
    let arrangements = core.generate_arrangements(&request)?;

    println!("Arrangements for: {}", path.display());
    for (rank, arrangement) in arrangements.iter().enumerate() {
        println!(
            "  {}. {:<14} score {:>5.1}  length {:>6.1} mm  crossings {}  unrouted {}{}",
            rank + 1,
            arrangement.name,
            arrangement.score,
            arrangement.metrics.total_route_length,
            arrangement.metrics.route_crossings,
            arrangement.metrics.unrouted_connections,
            if arrangement.best_effort { "  (best effort)" } else { "" }
        );
    }

    let Some(best) = arrangements.first() else {
        println!("\nNothing to place.");
        return Ok(());
    };

    let mut design = Design::new(request.board.clone());
    core.accept(&mut design, best, &core.request_connections(&request));
    let report = core.check_design(&design, &DrcRules::recommended());

    println!();
    if report.is_clean() {
        println!("'{}' passes all design rule checks.", best.name);
        return Ok(());
    }
    println!(
        "'{}': {} errors, {} warnings",
        best.name, report.stats.errors, report.stats.warnings
    );
    for v in &report.violations {
        println!("  [{}] {}", v.kind, v.message);
        if let Some(ref suggestion) = v.suggestion {
            println!("    Suggestion: {}", suggestion);
        }
    }
    Ok(())
}
