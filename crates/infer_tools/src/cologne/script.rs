//! Rendering of the oss-cad-suite synthesis script for GateMate devices.

use super::CologneSettings;
use crate::error::ToolError;
use infer_config::Generics;
use std::path::PathBuf;

/// Rejects a value yosys would split inside its `-p` command string.
///
/// yosys separates commands on `;` and arguments on whitespace regardless of
/// shell quoting.
fn yosys_word(what: &str, value: &str) -> Result<String, ToolError> {
    if value.chars().any(|c| c.is_whitespace() || c == ';') {
        return Err(ToolError::UnsupportedInput(format!(
            "{what} '{value}' contains whitespace or ';' and cannot be passed to yosys"
        )));
    }
    Ok(escape_double_quoted(value))
}

/// Escapes a value for use inside a double-quoted shell string.
fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '$' | '`' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Quotes a value as a single shell word.
fn shell_word(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Renders the script that synthesizes `top_entity` from `files`.
///
/// The script analyzes the sources with the GHDL yosys plugin into the
/// configured VHDL library, elaborates `top_entity` with `generics` applied
/// as `-g` overrides, maps it with `synth_gatemate` and places and routes it
/// with nextpnr, whose log is written to [`super::PNR_LOG`] in the working
/// directory.
///
/// # Errors
///
/// Returns [`ToolError::UnsupportedInput`] if a source path, the entity, the
/// library or a generic contains whitespace or `;`.
pub fn render_script(
    settings: &CologneSettings,
    files: &[PathBuf],
    top_entity: &str,
    generics: &Generics,
) -> Result<String, ToolError> {
    let sources = files
        .iter()
        .map(|f| yosys_word("source path", &f.to_string_lossy()))
        .collect::<Result<Vec<_>, _>>()?;
    let overrides = generics
        .iter()
        .map(|(name, value)| yosys_word("generic", &format!("-g{name}={value}")))
        .collect::<Result<Vec<_>, _>>()?;
    let top = yosys_word("entity", top_entity)?;
    let library = yosys_word("library", &settings.library)?;
    let netlist = format!("{top_entity}_synth.json");

    let mut ghdl = vec![
        "ghdl".to_string(),
        "--std=08".to_string(),
        "-frelaxed-rules".to_string(),
        "-Wno-hide".to_string(),
        "-Wno-shared".to_string(),
        format!("--work={library}"),
    ];
    ghdl.extend(overrides);
    ghdl.extend(sources);
    ghdl.push("-e".to_string());
    ghdl.push(top.clone());

    let yosys_commands = format!(
        "{}; synth_gatemate -top {top} -nomx8 -json {}",
        ghdl.join(" "),
        escape_double_quoted(&netlist),
    );

    Ok(format!(
        "#!/usr/bin/env bash\n\
         # Synthesis of {top_entity} for {device}\n\
         set -eu\n\
         pwd\n\
         {yosys} -m ghdl -l yosys.log -p \"{yosys_commands}\"\n\
         {nextpnr} --device {device} --json {netlist_word} -o out={impl_word} --log {log}\n",
        device = settings.device,
        yosys = shell_word(&settings.yosys),
        nextpnr = shell_word(&settings.nextpnr),
        netlist_word = shell_word(&netlist),
        impl_word = shell_word(&format!("{top_entity}_impl.txt")),
        log = super::PNR_LOG,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use infer_config::GenericValue;

    #[test]
    fn script_lists_sources_in_order() {
        let files = vec![
            PathBuf::from("/lib/olo_base_pkg_math.vhd"),
            PathBuf::from("/lib/olo_base_fifo_sync.vhd"),
        ];
        let script = render_script(
            &CologneSettings::default(),
            &files,
            "olo_base_fifo_sync",
            &Generics::new(),
        )
        .unwrap();
        let pkg = script.find("olo_base_pkg_math.vhd").unwrap();
        let fifo = script.find("/lib/olo_base_fifo_sync.vhd").unwrap();
        assert!(pkg < fifo);
        assert!(script.contains("-e olo_base_fifo_sync; synth_gatemate -top olo_base_fifo_sync"));
        assert!(script.contains("--log nexpnr.log"));
        assert!(script.contains("--device CCGM1A1"));
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
    }

    #[test]
    fn generics_become_overrides() {
        let mut generics = Generics::new();
        generics.insert("Width_g".into(), GenericValue::Integer(16));
        generics.insert("UseRam_g".into(), GenericValue::Bool(true));
        let script = render_script(&CologneSettings::default(), &[], "e", &generics).unwrap();
        assert!(script.contains("-gUseRam_g=true -gWidth_g=16"));
    }

    #[test]
    fn double_quotes_are_escaped() {
        let mut generics = Generics::new();
        generics.insert("Name_g".into(), GenericValue::String("a\"b$c".into()));
        let script = render_script(&CologneSettings::default(), &[], "e", &generics).unwrap();
        assert!(script.contains(r#"-gName_g=a\"b\$c"#));
    }

    #[test]
    fn tool_paths_are_quoted() {
        let settings = CologneSettings {
            yosys: "/opt/oss cad/bin/yosys".into(),
            ..CologneSettings::default()
        };
        let script = render_script(&settings, &[], "e", &Generics::new()).unwrap();
        assert!(script.contains("'/opt/oss cad/bin/yosys' -m ghdl"));
    }

    #[test]
    fn spaced_source_path_is_rejected() {
        let files = vec![PathBuf::from("/my sources/fifo.vhd")];
        let err = render_script(&CologneSettings::default(), &files, "e", &Generics::new())
            .unwrap_err();
        match err {
            ToolError::UnsupportedInput(message) => {
                assert!(message.contains("/my sources/fifo.vhd"))
            }
            other => panic!("expected UnsupportedInput, got {other:?}"),
        }
    }

    #[test]
    fn semicolon_in_generic_is_rejected() {
        let mut generics = Generics::new();
        generics.insert("Name_g".into(), GenericValue::String("a;shell".into()));
        let err = render_script(&CologneSettings::default(), &[], "e", &generics).unwrap_err();
        assert!(matches!(err, ToolError::UnsupportedInput(_)));
    }
}
