//! ChannelBoard CLI - component placement, channel routing and design rule
//! checks from the command line.

use channelboard::drc::DesignRuleChecker;
use channelboard::footprint::load_footprints_from_directory;
use channelboard::{
    Arrangement, Design, DrcReport, DrcRules, DrcViolation, FootprintLibrary, LayoutCore,
    LayoutRequest, Severity,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "channelboard")]
#[command(
    about = "Placement, channel routing and DRC for printed channel boards",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Log pipeline detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory of footprint JSON files added to the built-in catalog
    #[arg(long, global = true, value_name = "DIR")]
    footprints: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate ranked arrangements for a layout request
    Generate {
        /// Path to a request JSON file
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: ReportFormat,

        /// Only show the best N arrangements
        #[arg(long, value_name = "N")]
        top: Option<usize>,

        /// Accept the best arrangement and write the resulting design here
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },

    /// List the power, ground and data connections the detector would add
    Detect {
        /// Path to a request JSON file
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: ReportFormat,
    },

    /// Run design rule checks on a design
    Check {
        /// Path to a design JSON file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        /// Rules JSON file (recommended rules when omitted)
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Apply every automatic fix, then report what remains
        #[arg(long)]
        fix: bool,

        /// Write the fixed design here (with --fix)
        #[arg(short, long, value_name = "FILE", requires = "fix")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if violations found at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// List design rule checks
    Rules {
        /// Show detailed check descriptions
        #[arg(long)]
        detail: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let core = match layout_core(cli.footprints.as_deref()) {
        Ok(core) => core,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Generate {
            request,
            format,
            top,
            save,
        } => handle_generate(&core, &request, format, top, save.as_deref()),
        Commands::Detect { request, format } => handle_detect(&core, &request, format),
        Commands::Check {
            design,
            rules,
            fix,
            output,
            format,
            fail_on,
        } => handle_check(
            &core,
            &design,
            rules.as_deref(),
            fix,
            output.as_deref(),
            format,
            fail_on,
        ),
        Commands::Rules { detail } => {
            handle_rules(detail);
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Built-in footprints, extended (and overridden) by every JSON file in `dir`.
fn layout_core(dir: Option<&Path>) -> Result<LayoutCore, String> {
    let mut library = FootprintLibrary::builtin();
    if let Some(dir) = dir {
        if !dir.is_dir() {
            return Err(format!("footprint directory {} not found", dir.display()));
        }
        let (footprints, errors) = load_footprints_from_directory(dir);
        for error in &errors {
            tracing::warn!("{}", error);
        }
        tracing::info!("Loaded {} footprints from {}", footprints.len(), dir.display());
        for footprint in footprints {
            library.insert(footprint);
        }
    }
    Ok(LayoutCore::new(library))
}

fn handle_generate(
    core: &LayoutCore,
    path: &Path,
    format: ReportFormat,
    top: Option<usize>,
    save: Option<&Path>,
) -> i32 {
    let request = match LayoutRequest::load_file(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let arrangements = match core.generate_arrangements(&request) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let shown = &arrangements[..top.unwrap_or(arrangements.len()).min(arrangements.len())];
    match format {
        ReportFormat::Human => output_arrangements_human(path, shown),
        ReportFormat::Json => print_json(&serde_json::json!({ "arrangements": shown })),
    }

    if let Some(save) = save {
        let Some(best) = arrangements.first() else {
            eprintln!("Error: nothing to save, the request has no components");
            return 1;
        };
        let mut design = Design::new(request.board.clone());
        core.accept(&mut design, best, &core.request_connections(&request));
        if let Err(e) = write_design(&design, save) {
            eprintln!("Error: {}", e);
            return 1;
        }
        eprintln!("Saved '{}' to {}", best.name, save.display());
    }
    0
}

fn output_arrangements_human(path: &Path, arrangements: &[Arrangement]) {
    println!("\nRequest: {}", path.display());
    println!("{}", "─".repeat(60));

    if arrangements.is_empty() {
        println!("  No components to arrange");
        return;
    }

    for (rank, a) in arrangements.iter().enumerate() {
        println!("\n  {}. {} (score {:.1})", rank + 1, a.name, a.score);
        println!("     {}", a.description);
        println!("     Channel length: {:.1} mm", a.metrics.total_route_length);
        println!("     Crossings:      {}", a.metrics.route_crossings);
        println!("     Utilization:    {:.0}%", a.metrics.board_utilization * 100.0);
        if !a.unrouted.is_empty() {
            println!("     Unrouted:       {}", a.unrouted.join(", "));
        }
        if a.best_effort {
            println!("     Best effort: some components could not keep clearance");
        }
    }
}

fn handle_detect(core: &LayoutCore, path: &Path, format: ReportFormat) -> i32 {
    let request = match LayoutRequest::load_file(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let result = core.detect_connections(&request.components, &request.connections);
    match format {
        ReportFormat::Human => {
            println!("\nRequest: {}", path.display());
            println!("{}", "─".repeat(60));
            if result.connections.is_empty() {
                println!("  No new connections");
            }
            for conn in &result.connections {
                println!(
                    "  {:<6} {} -> {}",
                    conn.net.as_deref().unwrap_or("-"),
                    conn.from,
                    conn.to
                );
            }
            println!("\n  Summary:");
            println!("    Power:  {}", result.stats.power_connections);
            println!("    Ground: {}", result.stats.ground_connections);
            println!("    Other:  {}", result.stats.other_connections);
            if !result.stats.unknown_types.is_empty() {
                println!("    Unknown types: {}", result.stats.unknown_types.join(", "));
            }
        }
        ReportFormat::Json => print_json(&serde_json::json!(result)),
    }
    0
}

fn handle_check(
    core: &LayoutCore,
    path: &Path,
    rules_path: Option<&Path>,
    fix: bool,
    output: Option<&Path>,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
) -> i32 {
    let rules = match rules_path {
        Some(p) => match DrcRules::load_file(p) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => DrcRules::recommended(),
    };
    let mut design = match Design::load_file(path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let report = if fix {
        core.auto_fix_all(&mut design, &rules)
    } else {
        core.check_design(&design, &rules)
    };

    if let Some(output) = output {
        if let Err(e) = write_design(&design, output) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }

    output_report(path, &report, &format);
    match fail_on {
        Some(severity) if should_fail(&report, &severity) => 1,
        _ => 0,
    }
}

fn write_design(design: &Design, path: &Path) -> Result<(), channelboard::LayoutError> {
    let json = design.to_json_pretty()?;
    std::fs::write(path, json)?;
    Ok(())
}

fn should_fail(report: &DrcReport, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => report.stats.errors > 0,
        FailOnSeverity::Warning => !report.violations.is_empty(),
    }
}

fn output_report(path: &Path, report: &DrcReport, format: &OutputFormat) {
    match format {
        OutputFormat::Human => output_human(path, report),
        OutputFormat::Json => output_json(path, report),
        OutputFormat::Github => output_github(path, report),
    }
}

fn print_violation(v: &DrcViolation) {
    println!("    - [{}] {}", v.kind, v.message);
    if let Some(p) = v.position {
        println!("      At: ({:.2}, {:.2})", p.x, p.y);
    }
    if let Some(ref suggestion) = v.suggestion {
        println!("      Suggestion: {}", suggestion);
    }
}

fn output_human(path: &Path, report: &DrcReport) {
    println!("\nDesign: {}", path.display());
    println!("{}", "─".repeat(60));

    if report.is_clean() {
        println!("  No violations found");
        return;
    }

    let (errors, warnings): (Vec<&DrcViolation>, Vec<&DrcViolation>) =
        report.violations.iter().partition(|v| v.is_error());

    if !errors.is_empty() {
        println!("\n  ERRORS:");
        errors.into_iter().for_each(print_violation);
    }
    if !warnings.is_empty() {
        println!("\n  WARNINGS:");
        warnings.into_iter().for_each(print_violation);
    }

    println!("\n  Summary:");
    println!("    Errors:   {}", report.stats.errors);
    println!("    Warnings: {}", report.stats.warnings);
}

fn output_json(path: &Path, report: &DrcReport) {
    let output = serde_json::json!({
        "design": path.display().to_string(),
        "violations": report.violations,
        "stats": report.stats,
    });
    print_json(&output);
}

fn severity_to_github(v: &DrcViolation) -> &'static str {
    match v.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

fn output_github(path: &Path, report: &DrcReport) {
    for v in &report.violations {
        println!(
            "::{} file={},title={}::{}",
            severity_to_github(v),
            path.display(),
            v.kind,
            v.message.replace('\n', " ")
        );
    }
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_rules(detail: bool) {
    println!("Design rule checks (run in this order):\n");

    for check in DesignRuleChecker::with_default_checks().checks() {
        println!("  {}", check.kind());
        println!("    {}", check.name());
        if detail {
            println!("    {}", check.description());
        }
        println!();
    }
}
