//! The inference run loop.
//!
//! Every configuration of every non-excluded top level gets its own job
//! directory and a fresh backend instance. A configuration that fails is
//! recorded and the run moves on; only an unusable backend stops the run.

use crate::compare::{check_resources, predicted_scaffold_cost, Tolerance};
use crate::error::RunError;
use crate::outcome::{ConfigOutcome, Failure, FailureKind, RunReport};
use infer_config::{Configuration, Generics, TestSpecification, TopLevel};
use infer_tools::{load_tool, ResourceReport, SynthesisTool, ToolError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Creates one backend instance per job.
pub trait ToolFactory {
    /// Creates a backend rooted at `project_dir`.
    fn create(&self, project_dir: &Path) -> Result<Box<dyn SynthesisTool>, ToolError>;
}

impl<F> ToolFactory for F
where
    F: Fn(&Path) -> Result<Box<dyn SynthesisTool>, ToolError>,
{
    fn create(&self, project_dir: &Path) -> Result<Box<dyn SynthesisTool>, ToolError> {
        self(project_dir)
    }
}

/// Creates backends by name through [`load_tool`].
#[derive(Debug, Clone)]
pub struct NamedToolFactory {
    name: String,
}

impl NamedToolFactory {
    /// A factory for the backend called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ToolFactory for NamedToolFactory {
    fn create(&self, project_dir: &Path) -> Result<Box<dyn SynthesisTool>, ToolError> {
        load_tool(&self.name, project_dir)
    }
}

/// Settings of one inference run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root of the per-job directories.
    pub output_dir: PathBuf,
    /// Allowed deviation of residual usage.
    pub tolerance: Tolerance,
    /// Only entities whose name contains this substring are run.
    pub entity_filter: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("build/inference"),
            tolerance: Tolerance::default(),
            entity_filter: None,
        }
    }
}

/// Drives a [`TestSpecification`] through a synthesis backend.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    options: RunOptions,
}

impl Runner {
    /// Creates a runner with `options`.
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs every configuration of `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if the backend is unknown or unavailable, or the
    /// output directory cannot be created. Failures of single configurations
    /// are reported in the returned [`RunReport`].
    pub fn run(
        &self,
        spec: &TestSpecification,
        factory: &dyn ToolFactory,
    ) -> Result<RunReport, RunError> {
        self.run_with(spec, factory, &mut |_| {})
    }

    /// Like [`Runner::run`], calling `on_outcome` as each configuration finishes.
    pub fn run_with(
        &self,
        spec: &TestSpecification,
        factory: &dyn ToolFactory,
        on_outcome: &mut dyn FnMut(&ConfigOutcome),
    ) -> Result<RunReport, RunError> {
        std::fs::create_dir_all(&self.options.output_dir)?;

        let tool = factory.create(&self.options.output_dir)?;
        let tool_version = tool.version()?;
        info!(tool = tool.name(), version = %tool_version, "using synthesis tool");
        let mut report = RunReport::new(tool.name(), tool_version);
        let mut taken = HashSet::new();

        for top in spec.top_levels() {
            let entity = top.entity_name();
            if spec.is_excluded(entity) {
                info!(entity, "skipping excluded entity");
                report.skipped_entities.push(entity.to_string());
                continue;
            }
            if let Some(filter) = &self.options.entity_filter {
                if !entity.contains(filter.as_str()) {
                    debug!(entity, filter = filter.as_str(), "entity does not match filter");
                    continue;
                }
            }

            for config in top.configs() {
                let outcome = self.run_config(spec, top, config, factory, &mut taken)?;
                on_outcome(&outcome);
                report.outcomes.push(outcome);
            }
        }

        info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            skipped = report.skipped_entities.len(),
            "inference run finished"
        );
        Ok(report)
    }

    /// Runs one configuration. Only errors that abort the run are returned.
    fn run_config(
        &self,
        spec: &TestSpecification,
        top: &TopLevel,
        config: &Configuration,
        factory: &dyn ToolFactory,
        taken: &mut HashSet<PathBuf>,
    ) -> Result<ConfigOutcome, RunError> {
        let entity = top.entity_name();
        let project_dir = self.job_dir(entity, &config.name, taken);

        let mut outcome = ConfigOutcome {
            entity: entity.to_string(),
            config: config.name.clone(),
            project_dir: project_dir.clone(),
            generics: Generics::new(),
            omitted_ports: config.omitted_ports.iter().cloned().collect(),
            check: None,
            failure: None,
        };

        if let Err(e) = prepare_job_dir(&project_dir) {
            warn!(entity, config = config.name.as_str(), error = %e, "cannot prepare job directory");
            outcome.failure = Some(Failure {
                kind: FailureKind::Io,
                message: format!("cannot prepare {}: {e}", project_dir.display()),
            });
            return Ok(outcome);
        }

        let mut tool = match factory.create(&project_dir) {
            Ok(tool) => tool,
            Err(e) if e.aborts_run() => return Err(e.into()),
            Err(e) => {
                outcome.failure = Some(Failure {
                    kind: FailureKind::from_tool_error(&e),
                    message: e.to_string(),
                });
                return Ok(outcome);
            }
        };
        outcome.generics = top.generics_for(tool.name(), config);
        if !outcome.omitted_ports.is_empty() {
            debug!(ports = ?outcome.omitted_ports, "ports left unconnected");
        }
        if config.has_scaffold() {
            // Only the cost is modeled; the sources must already wrap the entity.
            debug!(
                in_reduce = ?config.in_reduce,
                out_reduce = ?config.out_reduce,
                "expecting reduction scaffold in the sources"
            );
        }
        info!(entity, config = config.name.as_str(), "synthesizing");

        let actual = match execute(&mut *tool, spec.resolved_files(), entity, &outcome.generics) {
            Ok(actual) => actual,
            Err(e) if e.aborts_run() => return Err(e.into()),
            Err(e) => {
                warn!(entity, config = config.name.as_str(), error = %e, "configuration failed");
                outcome.failure = Some(Failure {
                    kind: FailureKind::from_tool_error(&e),
                    message: e.to_string(),
                });
                return Ok(outcome);
            }
        };

        let predicted = predicted_scaffold_cost(&*tool, config);
        let check = check_resources(
            actual,
            predicted,
            config.expected.as_ref(),
            self.options.tolerance,
        );
        debug!(actual = %check.actual, residual = %check.residual, "resource usage");

        if !check.passed() {
            let message = check
                .mismatches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            warn!(entity, config = config.name.as_str(), %message, "resource mismatch");
            outcome.failure = Some(Failure {
                kind: FailureKind::ResourceMismatch,
                message,
            });
        }
        outcome.check = Some(check);
        Ok(outcome)
    }

    /// `<output>/<entity>/<config>` with path-hostile characters replaced.
    ///
    /// Names that sanitize to a directory already in `taken` get a `_2`,
    /// `_3`, ... suffix, so every job owns its directory.
    fn job_dir(&self, entity: &str, config: &str, taken: &mut HashSet<PathBuf>) -> PathBuf {
        let entity_dir = self.options.output_dir.join(sanitize_component(entity));
        let name = sanitize_component(config);

        let mut dir = entity_dir.join(&name);
        let mut suffix = 2;
        while !taken.insert(dir.clone()) {
            dir = entity_dir.join(format!("{name}_{suffix}"));
            suffix += 1;
        }
        dir
    }
}

/// Synthesizes, checks and measures one job.
fn execute(
    tool: &mut dyn SynthesisTool,
    files: &[PathBuf],
    entity: &str,
    generics: &Generics,
) -> Result<ResourceReport, ToolError> {
    tool.synthesize(files, entity, generics)?;
    tool.check_drc()?;
    tool.resource_usage()
}

/// Recreates `dir` empty so no artifact of a previous run is parsed.
fn prepare_job_dir(dir: &Path) -> std::io::Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)
}

fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
