//! `infer-test matrix`: show what a run would synthesize.
//!
//! Lists every entity with its configurations and the effective generics the
//! selected backend would receive. Nothing is synthesized.

use infer_config::{Generics, TestSpecification};
use infer_tools::load_tool;

use crate::{GlobalArgs, MatrixArgs};

/// Runs the `infer-test matrix` command.
pub fn run(args: &MatrixArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let spec = TestSpecification::load(&args.spec)?;
    // Resolves aliases to the name tool generics are keyed by.
    let tool = load_tool(&args.tool, &std::env::temp_dir())?;

    print!("{}", format_matrix(&spec, tool.name()));

    if !global.quiet {
        let configs: usize = spec
            .top_levels()
            .iter()
            .filter(|t| !spec.is_excluded(t.entity_name()))
            .map(|t| t.configs().len())
            .sum();
        eprintln!("   {configs} configuration(s) would run");
    }
    Ok(0)
}

/// Renders the entity/configuration matrix as seen by `tool`.
pub fn format_matrix(spec: &TestSpecification, tool: &str) -> String {
    let mut out = String::new();
    for top in spec.top_levels() {
        let entity = top.entity_name();
        if spec.is_excluded(entity) {
            out.push_str(&format!("{entity} (excluded)\n"));
            continue;
        }
        out.push_str(&format!("{entity}\n"));

        for config in top.configs() {
            out.push_str(&format!("  {}\n", config.name));
            let generics = top.generics_for(tool, config);
            if !generics.is_empty() {
                out.push_str(&format!("    generics: {}\n", join_generics(&generics)));
            }
            if !config.omitted_ports.is_empty() {
                let ports: Vec<&str> = config.omitted_ports.iter().map(String::as_str).collect();
                out.push_str(&format!("    omitted: {}\n", ports.join(", ")));
            }
            if !config.in_reduce.is_empty() {
                out.push_str(&format!("    in_reduce: {}\n", join_map(&config.in_reduce)));
            }
            if !config.out_reduce.is_empty() {
                out.push_str(&format!("    out_reduce: {}\n", join_map(&config.out_reduce)));
            }
            if let Some(expected) = &config.expected {
                out.push_str(&format!("    expected: {}\n", join_map(expected)));
            }
        }
    }
    out
}

fn join_generics(generics: &Generics) -> String {
    generics
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_map<V: std::fmt::Display>(map: &std::collections::BTreeMap<String, V>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
