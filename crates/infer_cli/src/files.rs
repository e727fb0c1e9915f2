//! `infer-test files`: print the resolved source files.

use infer_config::TestSpecification;

use crate::{GlobalArgs, SpecArgs};

/// Runs the `infer-test files` command.
///
/// Prints every resolved file, one per line, in synthesis order.
pub fn run(args: &SpecArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let spec = TestSpecification::load(&args.spec)?;

    for file in spec.resolved_files() {
        println!("{}", file.display());
    }

    if !global.quiet {
        eprintln!("   Resolved {} file(s)", spec.resolved_files().len());
    }
    Ok(0)
}
