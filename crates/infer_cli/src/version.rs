//! `infer-test version`: query a backend's toolchain version.

use infer_tools::load_tool;

use crate::GlobalArgs;

/// Runs the `infer-test version` command.
pub fn run(tool: &str, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let tool = load_tool(tool, &std::env::temp_dir())?;
    println!("{}: {}", tool.name(), tool.version()?);
    Ok(0)
}
