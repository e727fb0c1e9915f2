//! Cologne Chip GateMate backend driven through the oss-cad-suite toolchain.
//!
//! Synthesis runs GHDL + yosys (`synth_gatemate`) followed by nextpnr.
//! Resource usage is read from the nextpnr utilization summary, which reports
//! half RAM blocks (`RAM_HALF`) and the look-up and flip-flop halves of the
//! Cologne Programmable Elements (`CPE_LT`, `CPE_FF`).
//!
//! The toolchain fails the build on inferred latches, so no separate
//! design-rule check is needed.

pub mod script;

use crate::error::ToolError;
use crate::job::JobState;
use crate::parse::{parse_resource_log, ResourceKeyword};
use crate::process::{run_captured, run_logged};
use crate::project::find_file_in_project;
use crate::report::ResourceReport;
use crate::SynthesisTool;
use infer_config::Generics;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

/// Script written to the project directory and executed by the shell.
pub const SCRIPT_NAME: &str = "synthesize.sh";

/// Log capturing the full output of the synthesis script.
pub const TOOL_LOG: &str = "cologne.log";

/// Place-and-route log containing the utilization summary.
pub const PNR_LOG: &str = "nexpnr.log";

/// Half RAM blocks.
pub const RAM_HALF: &str = "RAM_HALF";
/// CPE look-up table halves.
pub const CPE_LT: &str = "CPE LT";
/// CPE flip-flop halves.
pub const CPE_FF: &str = "CPE FF";

/// Utilization keywords of the nextpnr GateMate summary, in match priority.
const KEYWORDS: &[ResourceKeyword] = &[
    ResourceKeyword {
        keyword: "RAM_HALF",
        kind: RAM_HALF,
    },
    ResourceKeyword {
        keyword: "CPE_LT",
        kind: CPE_LT,
    },
    ResourceKeyword {
        keyword: "CPE_FF",
        kind: CPE_FF,
    },
];

/// Toolchain locations and limits for the Cologne backend.
#[derive(Debug, Clone)]
pub struct CologneSettings {
    /// yosys executable (with the GHDL plugin available).
    pub yosys: String,
    /// nextpnr executable with GateMate support.
    pub nextpnr: String,
    /// Shell used to execute the rendered script.
    pub shell: String,
    /// GateMate device passed to nextpnr.
    pub device: String,
    /// VHDL library the sources are analyzed into.
    pub library: String,
    /// Hard bound on one synthesis run.
    pub synthesis_timeout: Duration,
    /// Hard bound on the version query.
    pub version_timeout: Duration,
}

impl Default for CologneSettings {
    fn default() -> Self {
        Self {
            yosys: "yosys".to_string(),
            nextpnr: "nextpnr-himbaechel".to_string(),
            shell: "bash".to_string(),
            device: "CCGM1A1".to_string(),
            library: "olo".to_string(),
            synthesis_timeout: Duration::from_secs(30 * 60),
            version_timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// The GateMate backend. One instance synthesizes one job.
#[derive(Debug)]
pub struct CologneTool {
    project_dir: PathBuf,
    settings: CologneSettings,
    state: JobState,
}

impl CologneTool {
    /// Canonical backend name, also the key of its `tool_generics`.
    pub const NAME: &'static str = "cologne";

    /// Creates a backend with default settings rooted at `project_dir`.
    pub fn new(project_dir: &Path) -> Self {
        Self::with_settings(project_dir, CologneSettings::default())
    }

    /// Creates a backend with explicit toolchain settings.
    pub fn with_settings(project_dir: &Path, settings: CologneSettings) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            settings,
            state: JobState::NotStarted,
        }
    }

    /// The toolchain settings in use.
    pub fn settings(&self) -> &CologneSettings {
        &self.settings
    }
}

impl SynthesisTool for CologneTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    fn state(&self) -> JobState {
        self.state
    }

    fn synthesize(
        &mut self,
        files: &[PathBuf],
        top_entity: &str,
        generics: &Generics,
    ) -> Result<(), ToolError> {
        if self.state != JobState::NotStarted {
            return Err(ToolError::InvalidState {
                operation: "synthesize",
                state: self.state,
            });
        }

        std::fs::create_dir_all(&self.project_dir)?;
        let script = match script::render_script(&self.settings, files, top_entity, generics) {
            Ok(script) => script,
            Err(e) => {
                self.state = JobState::Failed { status: None };
                return Err(e);
            }
        };
        std::fs::write(self.project_dir.join(SCRIPT_NAME), script)?;

        let log = self.project_dir.join(TOOL_LOG);
        let mut command = Command::new(&self.settings.shell);
        command.arg(SCRIPT_NAME).current_dir(&self.project_dir);

        info!(
            entity = top_entity,
            files = files.len(),
            dir = %self.project_dir.display(),
            "starting GateMate synthesis"
        );
        self.state = JobState::Running;

        let outcome = match run_logged(command, &log, self.settings.synthesis_timeout) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(error = %e, "failed to start synthesis script");
                self.state = JobState::Failed { status: None };
                return Err(ToolError::Synthesis {
                    tool: Self::NAME.to_string(),
                    top_entity: top_entity.to_string(),
                    status: None,
                    log,
                });
            }
        };

        if outcome.timed_out {
            self.state = JobState::TimedOut;
            return Err(ToolError::Timeout {
                tool: Self::NAME.to_string(),
                top_entity: top_entity.to_string(),
                timeout: self.settings.synthesis_timeout,
                log,
            });
        }

        if !outcome.success() {
            self.state = JobState::Failed {
                status: outcome.status,
            };
            return Err(ToolError::Synthesis {
                tool: Self::NAME.to_string(),
                top_entity: top_entity.to_string(),
                status: outcome.status,
                log,
            });
        }

        self.state = JobState::Succeeded;
        info!(entity = top_entity, "GateMate synthesis finished");
        Ok(())
    }

    fn version(&self) -> Result<String, ToolError> {
        let mut command = Command::new(&self.settings.yosys);
        command.arg("--version");

        let unavailable = |message: String| ToolError::ToolUnavailable {
            tool: Self::NAME.to_string(),
            message,
        };

        let (outcome, output) = run_captured(command, self.settings.version_timeout)
            .map_err(|e| unavailable(format!("cannot run {}: {e}", self.settings.yosys)))?;

        if !outcome.success() {
            return Err(unavailable(format!(
                "{} --version did not exit cleanly ({:?})",
                self.settings.yosys, outcome.status
            )));
        }
        Ok(output)
    }

    fn resource_usage(&self) -> Result<ResourceReport, ToolError> {
        self.ensure_succeeded("read resource usage")?;

        let summary = find_file_in_project(&self.project_dir, PNR_LOG).ok_or_else(|| {
            ToolError::ReportNotFound {
                file: PNR_LOG.to_string(),
                project_dir: self.project_dir.clone(),
            }
        })?;
        debug!(log = %summary.display(), "parsing utilization");

        let bytes = std::fs::read(&summary)?;
        Ok(parse_resource_log(&String::from_utf8_lossy(&bytes), KEYWORDS))
    }

    fn in_reduce_resources(&self, size: u32) -> ResourceReport {
        let size = f64::from(size);
        ResourceReport::new()
            .with(RAM_HALF, 0.0)
            .with(CPE_LT, 3.0 * size + 4.0)
            .with(CPE_FF, 2.0 * size + 1.0)
    }

    fn out_reduce_resources(&self, size: u32) -> ResourceReport {
        let size = f64::from(size);
        ResourceReport::new()
            .with(RAM_HALF, 0.0)
            .with(CPE_LT, size + 1.0)
            .with(CPE_FF, size)
    }

    fn check_drc(&self) -> Result<(), ToolError> {
        self.ensure_succeeded("check design rules")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_reduce_model() {
        let tool = CologneTool::new(Path::new("job"));
        let cost = tool.in_reduce_resources(8);
        assert_eq!(cost.get(RAM_HALF), 0.0);
        assert_eq!(cost.get(CPE_LT), 28.0);
        assert_eq!(cost.get(CPE_FF), 17.0);
    }

    #[test]
    fn out_reduce_model() {
        let tool = CologneTool::new(Path::new("job"));
        let cost = tool.out_reduce_resources(16);
        assert_eq!(cost.get(RAM_HALF), 0.0);
        assert_eq!(cost.get(CPE_LT), 17.0);
        assert_eq!(cost.get(CPE_FF), 16.0);
    }

    #[test]
    fn reduce_models_are_pure_and_monotonic() {
        let tool = CologneTool::new(Path::new("job"));
        for size in 0..256u32 {
            assert_eq!(tool.in_reduce_resources(size), tool.in_reduce_resources(size));
            assert_eq!(tool.out_reduce_resources(size), tool.out_reduce_resources(size));
            for kind in [RAM_HALF, CPE_LT, CPE_FF] {
                assert!(
                    tool.in_reduce_resources(size + 1).get(kind)
                        >= tool.in_reduce_resources(size).get(kind)
                );
                assert!(
                    tool.out_reduce_resources(size + 1).get(kind)
                        >= tool.out_reduce_resources(size).get(kind)
                );
            }
        }
    }

    #[test]
    fn default_settings() {
        let settings = CologneSettings::default();
        assert_eq!(settings.synthesis_timeout, Duration::from_secs(1800));
        assert_eq!(settings.version_timeout, Duration::from_secs(300));
        assert_eq!(settings.device, "CCGM1A1");
    }

    #[test]
    fn version_of_missing_binary_is_unavailable() {
        let settings = CologneSettings {
            yosys: "/nonexistent/oss-cad-suite/bin/yosys".into(),
            ..CologneSettings::default()
        };
        let tool = CologneTool::with_settings(Path::new("job"), settings);
        assert!(matches!(
            tool.version(),
            Err(ToolError::ToolUnavailable { .. })
        ));
    }
}
