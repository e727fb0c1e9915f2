//! Specification loading, validation and normalization.

use crate::error::ConfigError;
use crate::files::resolve_files;
use crate::top_level::TopLevel;
use crate::types::{EntityUnderTest, SpecDocument};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A loaded and validated inference-test specification.
///
/// Built once from one YAML document and immutable afterwards. The source
/// files are resolved and the entities are expanded into [`TopLevel`]s at load
/// time, so every specification error surfaces before any synthesis starts.
#[derive(Debug)]
pub struct TestSpecification {
    base_dir: PathBuf,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    exclude_entities: BTreeSet<String>,
    entities: Vec<EntityUnderTest>,
    resolved_files: Vec<PathBuf>,
    top_levels: Vec<TopLevel>,
}

impl TestSpecification {
    /// Loads a specification from a YAML file.
    ///
    /// File patterns are resolved relative to the directory containing `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        info!(spec = %path.display(), "loading test specification");
        Self::from_yaml(&content, &base_dir)
    }

    /// Parses a specification from YAML text, resolving files against `base_dir`.
    pub fn from_yaml(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let doc = parse_document(content)?;
        validate_document(&doc)?;

        let base_dir = std::fs::canonicalize(base_dir)?;
        debug!(base = %base_dir.display(), "resolving source files");
        let resolved_files = resolve_files(&base_dir, &doc.files.include, &doc.files.exclude)?;

        let top_levels = doc
            .entities
            .iter()
            .map(TopLevel::from_entity)
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            files = resolved_files.len(),
            entities = doc.entities.len(),
            "specification loaded"
        );

        Ok(Self {
            base_dir,
            include_patterns: doc.files.include,
            exclude_patterns: doc.files.exclude,
            exclude_entities: doc.exclude_entities.into_iter().collect(),
            entities: doc.entities,
            resolved_files,
            top_levels,
        })
    }

    /// The absolute directory patterns are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Include patterns in declaration order.
    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    /// Exclude patterns in declaration order.
    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    /// The resolved, de-duplicated absolute source files.
    pub fn resolved_files(&self) -> &[PathBuf] {
        &self.resolved_files
    }

    /// Names of entities the driver skips. Not filtered out of [`top_levels`](Self::top_levels).
    pub fn excluded_entities(&self) -> &BTreeSet<String> {
        &self.exclude_entities
    }

    /// Returns true if `entity_name` is listed in `exclude_entities`.
    pub fn is_excluded(&self, entity_name: &str) -> bool {
        self.exclude_entities.contains(entity_name)
    }

    /// The entities as declared in the document.
    pub fn entities(&self) -> &[EntityUnderTest] {
        &self.entities
    }

    /// One [`TopLevel`] per declared entity, in declaration order.
    pub fn top_levels(&self) -> &[TopLevel] {
        &self.top_levels
    }
}

/// Parses YAML text into the raw document without validating it.
///
/// An empty document is treated as a specification with no files and no
/// entities.
pub fn parse_document(content: &str) -> Result<SpecDocument, ConfigError> {
    if content.trim().is_empty() {
        return Ok(SpecDocument::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Checks required fields and name uniqueness.
fn validate_document(doc: &SpecDocument) -> Result<(), ConfigError> {
    let mut entity_names = HashSet::new();
    for (i, entity) in doc.entities.iter().enumerate() {
        if entity.entity_name.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "entities[{i}].entity_name"
            )));
        }
        if !entity_names.insert(entity.entity_name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "entity '{}' is declared more than once",
                entity.entity_name
            )));
        }
        for (j, config) in entity.configurations.iter().enumerate() {
            if config.name.is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "entities[{i}].configurations[{j}].name"
                )));
            }
        }
    }
    Ok(())
}
