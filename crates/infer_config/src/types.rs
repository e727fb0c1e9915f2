//! Specification records deserialized from the YAML document.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Generic overrides keyed by generic name.
pub type Generics = BTreeMap<String, GenericValue>;

/// Expected or measured resource counts keyed by resource kind.
pub type ResourceCounts = BTreeMap<String, f64>;

/// The raw specification document as written in YAML.
///
/// Every key is optional; missing or `null` sections default to empty.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SpecDocument {
    /// Source file patterns.
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: FilePatterns,
    /// Entities to synthesize.
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Vec<EntityUnderTest>,
    /// Names of entities the driver must skip.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude_entities: Vec<String>,
}

/// Include and exclude glob patterns for the library's source files.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilePatterns {
    /// Patterns globbed relative to the specification's directory.
    #[serde(default, deserialize_with = "null_as_default")]
    pub include: Vec<String>,
    /// Patterns matched against the absolute path of every include match.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclude: Vec<String>,
}

/// One HDL entity and the configurations it is synthesized in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EntityUnderTest {
    /// Name of the entity used as synthesis top level.
    #[serde(default)]
    pub entity_name: String,
    /// Generics applied to every configuration.
    #[serde(default, deserialize_with = "null_as_default")]
    pub fixed_generics: Generics,
    /// Generics applied only when synthesizing with the named tool.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tool_generics: BTreeMap<String, Generics>,
    /// Named variants of the entity. May be empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub configurations: Vec<Configuration>,
}

/// One named generic/port variant of an entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Configuration {
    /// Name, unique within its entity.
    #[serde(default)]
    pub name: String,
    /// Generic overrides for this variant.
    #[serde(default, deserialize_with = "null_as_default")]
    pub generics: Generics,
    /// Ports left unconnected in this variant.
    #[serde(default, deserialize_with = "null_as_default")]
    pub omitted_ports: BTreeSet<String>,
    /// Input ports driven through a reduction scaffold, with their width in bits.
    #[serde(default, deserialize_with = "null_as_default")]
    pub in_reduce: BTreeMap<String, u32>,
    /// Output ports observed through a reduction scaffold, with their width in bits.
    #[serde(default, deserialize_with = "null_as_default")]
    pub out_reduce: BTreeMap<String, u32>,
    /// Expected resource usage of the entity itself, after scaffold cost is removed.
    #[serde(default)]
    pub expected: Option<ResourceCounts>,
}

impl Configuration {
    /// Creates a configuration with the given name and no overrides.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns this configuration with the given generics.
    pub fn with_generics(mut self, generics: Generics) -> Self {
        self.generics = generics;
        self
    }

    /// Returns true if the configuration adds reduction scaffolding around any port.
    pub fn has_scaffold(&self) -> bool {
        !self.in_reduce.is_empty() || !self.out_reduce.is_empty()
    }
}

/// A single generic value.
///
/// YAML scalars map onto the variants in declaration order, so `true` is a
/// boolean, `8` an integer, `0.5` a float and anything else a string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GenericValue {
    /// A VHDL `boolean`.
    Bool(bool),
    /// An `integer`/`natural`/`positive` value.
    Integer(i64),
    /// A `real` value.
    Float(f64),
    /// Any other value, passed through verbatim (e.g. `"FIRST"` enumerations).
    String(String),
}

impl fmt::Display for GenericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenericValue::Bool(b) => write!(f, "{b}"),
            GenericValue::Integer(i) => write!(f, "{i}"),
            // Debug keeps the fractional part, which VHDL reals require.
            GenericValue::Float(x) => write!(f, "{x:?}"),
            GenericValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for GenericValue {
    fn from(value: bool) -> Self {
        GenericValue::Bool(value)
    }
}

impl From<i64> for GenericValue {
    fn from(value: i64) -> Self {
        GenericValue::Integer(value)
    }
}

impl From<f64> for GenericValue {
    fn from(value: f64) -> Self {
        GenericValue::Float(value)
    }
}

impl From<&str> for GenericValue {
    fn from(value: &str) -> Self {
        GenericValue::String(value.to_string())
    }
}

/// Deserializes an optional section, mapping an explicit `null` to the default.
///
/// Lets `files:` with no value behave the same as a missing `files` key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_document;

    #[test]
    fn generic_value_variants() {
        let yaml = r#"
entities:
  - entity_name: e
    fixed_generics:
      UseRam_g: true
      Width_g: 8
      Ratio_g: 0.5
      Mode_g: FIRST
      Quoted_g: "32"
"#;
        let doc = parse_document(yaml).unwrap();
        let generics = &doc.entities[0].fixed_generics;
        assert_eq!(generics["UseRam_g"], GenericValue::Bool(true));
        assert_eq!(generics["Width_g"], GenericValue::Integer(8));
        assert_eq!(generics["Ratio_g"], GenericValue::Float(0.5));
        assert_eq!(generics["Mode_g"], GenericValue::String("FIRST".into()));
        assert_eq!(generics["Quoted_g"], GenericValue::String("32".into()));
    }

    #[test]
    fn generic_value_display() {
        assert_eq!(GenericValue::Bool(false).to_string(), "false");
        assert_eq!(GenericValue::Integer(-3).to_string(), "-3");
        assert_eq!(GenericValue::Float(2.0).to_string(), "2.0");
        assert_eq!(GenericValue::Float(0.25).to_string(), "0.25");
        assert_eq!(GenericValue::String("FIRST".into()).to_string(), "FIRST");
    }

    #[test]
    fn configuration_fields() {
        let yaml = r#"
entities:
  - entity_name: olo_base_fifo_sync
    configurations:
      - name: NoLevel
        generics: {Depth_g: 32}
        omitted_ports: [In_Level, Out_Level]
        in_reduce: {In_Data: 8}
        out_reduce: {Out_Data: 16}
        expected: {"CPE LT": 10, RAM_HALF: 1}
"#;
        let doc = parse_document(yaml).unwrap();
        let config = &doc.entities[0].configurations[0];
        assert_eq!(config.name, "NoLevel");
        assert_eq!(config.generics["Depth_g"], GenericValue::Integer(32));
        assert!(config.omitted_ports.contains("In_Level"));
        assert_eq!(config.omitted_ports.len(), 2);
        assert_eq!(config.in_reduce["In_Data"], 8);
        assert_eq!(config.out_reduce["Out_Data"], 16);
        let expected = config.expected.as_ref().unwrap();
        assert_eq!(expected["CPE LT"], 10.0);
        assert_eq!(expected["RAM_HALF"], 1.0);
        assert!(config.has_scaffold());
    }

    #[test]
    fn null_sections_default_to_empty() {
        let yaml = r#"
files:
entities:
  - entity_name: e
    fixed_generics:
    configurations:
"#;
        let doc = parse_document(yaml).unwrap();
        assert!(doc.files.include.is_empty());
        assert!(doc.files.exclude.is_empty());
        assert!(doc.entities[0].fixed_generics.is_empty());
        assert!(doc.entities[0].configurations.is_empty());
        assert!(doc.exclude_entities.is_empty());
    }

    #[test]
    fn configuration_builder() {
        let mut generics = Generics::new();
        generics.insert("Width_g".into(), 4i64.into());
        let config = Configuration::named("Narrow").with_generics(generics);
        assert_eq!(config.name, "Narrow");
        assert_eq!(config.generics["Width_g"], GenericValue::Integer(4));
        assert!(!config.has_scaffold());
        assert!(config.expected.is_none());
    }
}
