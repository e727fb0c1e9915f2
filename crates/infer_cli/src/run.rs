//! `infer-test run`: synthesize every configuration and judge its resources.
//!
//! Loads the specification, queries the backend version, then runs each configuration
//! of each non-excluded entity through the runner. Prints one status line per
//! configuration as it finishes and a summary, or the full report as JSON.

use infer_config::TestSpecification;
use infer_runner::{ConfigOutcome, NamedToolFactory, RunOptions, RunReport, Runner, Tolerance};

use crate::{GlobalArgs, ReportFormat, RunArgs};

const GREEN: &str = "32";
const RED: &str = "31";
const YELLOW: &str = "33";

/// Runs the `infer-test run` command.
///
/// Returns exit code 0 if every configuration passes, 1 if any fails.
/// Specification errors and an unusable backend are returned as errors.
pub fn run(args: &RunArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let valid = |t: f64| t.is_finite() && t >= 0.0;
    if !valid(args.tolerance) || !valid(args.relative_tolerance) {
        return Err("tolerances must be finite and not negative".into());
    }

    let spec = TestSpecification::load(&args.spec)?;
    let text = args.format == ReportFormat::Text;

    if !global.quiet && text {
        eprintln!(
            "   Testing {} ({} entit{}) with {}",
            args.spec.display(),
            spec.top_levels().len(),
            if spec.top_levels().len() == 1 { "y" } else { "ies" },
            args.tool
        );
    }

    let runner = Runner::new(RunOptions {
        output_dir: args.output_dir.clone(),
        tolerance: Tolerance {
            absolute: args.tolerance,
            relative: args.relative_tolerance,
        },
        entity_filter: args.entity.clone(),
    });
    let factory = NamedToolFactory::new(args.tool.as_str());

    let report = runner.run_with(&spec, &factory, &mut |outcome| {
        if !global.quiet && text {
            eprintln!("{}", outcome_line(outcome, global.color));
        }
    })?;

    match args.format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_summary(&report, global),
    }

    if report.success() {
        Ok(0)
    } else {
        Ok(1)
    }
}

fn print_summary(report: &RunReport, global: &GlobalArgs) {
    if global.quiet {
        // Failures are still reported when everything else is suppressed.
        for outcome in report.failures() {
            eprintln!("{}", outcome_line(outcome, global.color));
        }
        return;
    }

    for entity in &report.skipped_entities {
        eprintln!(
            "   {}  {entity} (excluded)",
            paint("SKIP", YELLOW, global.color)
        );
    }
    eprintln!();
    eprintln!("{}", summary_line(report));
}

/// One status line for a finished configuration.
fn outcome_line(outcome: &ConfigOutcome, color: bool) -> String {
    match (&outcome.failure, &outcome.check) {
        (None, Some(check)) => format!(
            "   {}  {} ({})",
            paint("PASS", GREEN, color),
            outcome.label(),
            check.residual
        ),
        (None, None) => format!("   {}  {}", paint("PASS", GREEN, color), outcome.label()),
        (Some(failure), _) => format!(
            "   {}  {}: {}: {}",
            paint("FAIL", RED, color),
            outcome.label(),
            failure.kind,
            failure.message
        ),
    }
}

fn summary_line(report: &RunReport) -> String {
    format!(
        "   Result: {} passed, {} failed out of {} configuration(s) [{} {}]",
        report.passed_count(),
        report.failed_count(),
        report.outcomes.len(),
        report.tool,
        report.tool_version
    )
}

fn paint(label: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[1;{code}m{label}\x1b[0m")
    } else {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infer_config::Generics;
    use infer_runner::{check_resources, Failure, FailureKind};
    use infer_tools::ResourceReport;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn outcome(failure: Option<Failure>) -> ConfigOutcome {
        let actual = ResourceReport::new().with("CPE LT", 12.0);
        ConfigOutcome {
            entity: "olo_base_fifo_sync".into(),
            config: "Default".into(),
            project_dir: PathBuf::from("build"),
            generics: Generics::new(),
            omitted_ports: Vec::new(),
            check: Some(check_resources(
                actual,
                ResourceReport::new(),
                None,
                Tolerance::EXACT,
            )),
            failure,
        }
    }

    fn args(spec: PathBuf, tool: &str) -> RunArgs {
        RunArgs {
            spec,
            tool: tool.to_string(),
            output_dir: PathBuf::from("build/inference"),
            tolerance: 0.0,
            relative_tolerance: 0.0,
            entity: None,
            format: ReportFormat::Text,
        }
    }

    fn quiet() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
        }
    }

    #[test]
    fn pass_line_shows_residual() {
        assert_eq!(
            outcome_line(&outcome(None), false),
            "   PASS  olo_base_fifo_sync/Default (CPE LT=12)"
        );
    }

    #[test]
    fn fail_line_names_config_and_reason() {
        let line = outcome_line(
            &outcome(Some(Failure {
                kind: FailureKind::Timeout,
                message: "killed after 1800s".into(),
            })),
            false,
        );
        assert_eq!(
            line,
            "   FAIL  olo_base_fifo_sync/Default: timed out: killed after 1800s"
        );
    }

    #[test]
    fn colored_labels() {
        assert_eq!(paint("PASS", GREEN, true), "\x1b[1;32mPASS\x1b[0m");
        assert_eq!(paint("PASS", GREEN, false), "PASS");
    }

    #[test]
    fn summary_counts() {
        let mut report = RunReport::new("cologne", "Yosys 0.45");
        report.outcomes.push(outcome(None));
        report.outcomes.push(outcome(Some(Failure {
            kind: FailureKind::Synthesis,
            message: "exit code 1".into(),
        })));
        assert_eq!(
            summary_line(&report),
            "   Result: 1 passed, 1 failed out of 2 configuration(s) [cologne Yosys 0.45]"
        );
    }

    #[test]
    fn missing_spec_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = run(&args(tmp.path().join("missing.yml"), "cologne"), &quiet());
        assert!(result.is_err());
    }

    #[test]
    fn unknown_tool_is_error() {
        let tmp = TempDir::new().unwrap();
        let spec = tmp.path().join("infer.yml");
        std::fs::write(&spec, "entities:\n  - entity_name: olo_base_cc_bits\n").unwrap();
        let mut args = args(spec, "vivado");
        args.output_dir = tmp.path().join("build");

        let err = run(&args, &quiet()).unwrap_err();
        assert_eq!(err.to_string(), "unknown synthesis tool 'vivado'");
    }

    #[test]
    fn negative_tolerance_is_error() {
        let mut args = args(PathBuf::from("infer.yml"), "cologne");
        args.tolerance = -1.0;
        assert!(run(&args, &quiet()).is_err());
    }

    #[test]
    fn non_finite_tolerance_is_error() {
        for bad in [f64::NAN, f64::INFINITY] {
            let mut absolute = args(PathBuf::from("infer.yml"), "cologne");
            absolute.tolerance = bad;
            let err = run(&absolute, &quiet()).unwrap_err();
            assert_eq!(err.to_string(), "tolerances must be finite and not negative");

            let mut relative = args(PathBuf::from("infer.yml"), "cologne");
            relative.relative_tolerance = bad;
            assert!(run(&relative, &quiet()).is_err());
        }
    }
}
