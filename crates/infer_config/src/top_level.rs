//! Runtime representation of one entity under test.
//!
//! A [`TopLevel`] is assembled incrementally: fixed generics, per-tool
//! generics and configurations are added one at a time, and the effective
//! generics of a synthesis job are resolved by layering them.

use crate::error::ConfigError;
use crate::types::{Configuration, EntityUnderTest, Generics};
use std::collections::BTreeMap;

/// Name of the configuration substituted when an entity declares none.
pub const DEFAULT_CONFIG_NAME: &str = "Default";

/// One entity under test with its generics and configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct TopLevel {
    entity_name: String,
    fixed_generics: Generics,
    tool_generics: BTreeMap<String, Generics>,
    configs: Vec<Configuration>,
}

impl TopLevel {
    /// Creates a top level for `entity_name` with no generics and no configurations.
    pub fn new(entity_name: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            fixed_generics: Generics::new(),
            tool_generics: BTreeMap::new(),
            configs: Vec::new(),
        }
    }

    /// Builds a top level from a parsed entity.
    ///
    /// Fixed generics are copied verbatim and tool generics registered per
    /// tool. An entity without configurations gets exactly one configuration
    /// named [`DEFAULT_CONFIG_NAME`] with no generics, omissions or reductions.
    pub fn from_entity(entity: &EntityUnderTest) -> Result<Self, ConfigError> {
        let mut top = TopLevel::new(&entity.entity_name);
        top.add_fixed_generics(&entity.fixed_generics);
        for (tool, generics) in &entity.tool_generics {
            top.add_tool_generics(tool, generics);
        }
        if entity.configurations.is_empty() {
            top.add_config(Configuration::named(DEFAULT_CONFIG_NAME))?;
        } else {
            for config in &entity.configurations {
                top.add_config(config.clone())?;
            }
        }
        Ok(top)
    }

    /// The entity name used as synthesis top level.
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Adds generics applied to every configuration. Later values overwrite earlier ones.
    pub fn add_fixed_generics(&mut self, generics: &Generics) {
        self.fixed_generics
            .extend(generics.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Adds generics applied only when synthesizing with `tool`.
    pub fn add_tool_generics(&mut self, tool: &str, generics: &Generics) {
        self.tool_generics
            .entry(tool.to_string())
            .or_default()
            .extend(generics.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Adds a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if a configuration with the
    /// same name already exists.
    pub fn add_config(&mut self, config: Configuration) -> Result<(), ConfigError> {
        if self.config(&config.name).is_some() {
            return Err(ConfigError::ValidationError(format!(
                "configuration '{}' of entity '{}' is declared more than once",
                config.name, self.entity_name
            )));
        }
        self.configs.push(config);
        Ok(())
    }

    /// The configurations in declaration order.
    pub fn configs(&self) -> &[Configuration] {
        &self.configs
    }

    /// Looks up a configuration by name.
    pub fn config(&self, name: &str) -> Option<&Configuration> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// Generics applied to every configuration.
    pub fn fixed_generics(&self) -> &Generics {
        &self.fixed_generics
    }

    /// Generics registered for `tool`, if any.
    pub fn tool_generics(&self, tool: &str) -> Option<&Generics> {
        self.tool_generics.get(tool)
    }

    /// Resolves the generics of one synthesis job.
    ///
    /// Layers, lowest priority first: fixed generics, the generics of `tool`,
    /// the generics of `config`.
    pub fn generics_for(&self, tool: &str, config: &Configuration) -> Generics {
        let mut generics = self.fixed_generics.clone();
        if let Some(tool_generics) = self.tool_generics.get(tool) {
            generics.extend(tool_generics.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        generics.extend(config.generics.iter().map(|(k, v)| (k.clone(), v.clone())));
        generics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenericValue;

    fn generics(pairs: &[(&str, i64)]) -> Generics {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), GenericValue::Integer(*v)))
            .collect()
    }

    #[test]
    fn default_config_substituted() {
        let entity = EntityUnderTest {
            entity_name: "olo_base_pl_stage".into(),
            ..EntityUnderTest::default()
        };
        let top = TopLevel::from_entity(&entity).unwrap();
        assert_eq!(top.configs().len(), 1);
        assert_eq!(top.configs()[0].name, DEFAULT_CONFIG_NAME);
        assert!(top.configs()[0].generics.is_empty());
        assert!(top.configs()[0].in_reduce.is_empty());
        assert!(top.configs()[0].out_reduce.is_empty());
    }

    #[test]
    fn explicit_configs_keep_order() {
        let entity = EntityUnderTest {
            entity_name: "e".into(),
            configurations: vec![Configuration::named("B"), Configuration::named("A")],
            ..EntityUnderTest::default()
        };
        let top = TopLevel::from_entity(&entity).unwrap();
        let names: Vec<_> = top.configs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(top.config(DEFAULT_CONFIG_NAME).is_none());
    }

    #[test]
    fn duplicate_config_rejected() {
        let mut top = TopLevel::new("e");
        top.add_config(Configuration::named("A")).unwrap();
        let err = top.add_config(Configuration::named("A")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert_eq!(top.configs().len(), 1);
    }

    #[test]
    fn generics_layering() {
        let mut top = TopLevel::new("e");
        top.add_fixed_generics(&generics(&[("Width_g", 8), ("Depth_g", 4)]));
        top.add_tool_generics("cologne", &generics(&[("Depth_g", 16), ("Ram_g", 1)]));
        top.add_tool_generics("vivado", &generics(&[("Ram_g", 2)]));
        let config = Configuration::named("Wide").with_generics(generics(&[("Width_g", 32)]));

        let effective = top.generics_for("cologne", &config);
        assert_eq!(effective, generics(&[("Width_g", 32), ("Depth_g", 16), ("Ram_g", 1)]));

        let other_tool = top.generics_for("gowin", &config);
        assert_eq!(other_tool, generics(&[("Width_g", 32), ("Depth_g", 4)]));
    }

    #[test]
    fn tool_generics_accumulate() {
        let mut top = TopLevel::new("e");
        top.add_tool_generics("cologne", &generics(&[("A_g", 1)]));
        top.add_tool_generics("cologne", &generics(&[("B_g", 2)]));
        assert_eq!(
            top.tool_generics("cologne").unwrap(),
            &generics(&[("A_g", 1), ("B_g", 2)])
        );
        assert!(top.tool_generics("vivado").is_none());
    }
}
