use crate::error::{Result, SeastersError};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const GHCND_VARIABLES_YAML: &str = include_str!("../../data/ghcnd_variables.yaml");
const GHCNH_VARIABLES_YAML: &str = include_str!("../../data/ghcnh_variables.yaml");

static GHCND_VARIABLES: OnceLock<VariableRegistry> = OnceLock::new();
static GHCNH_VARIABLES: OnceLock<VariableRegistry> = OnceLock::new();

/// Display metadata and default unit of a variable code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    pub code: String,
    pub name: String,
    pub long_name: String,
    pub units: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VariableTable {
    variables: Vec<VariableDescriptor>,
}

/// Read-only lookup table from variable code to [`VariableDescriptor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRegistry {
    variables: Vec<VariableDescriptor>,
}

impl VariableRegistry {
    /// Parse a YAML table of the form `variables: [{code, name, long_name, units, note?}]`
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let table: VariableTable = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        let mut seen = std::collections::HashSet::new();
        for var in &table.variables {
            if !seen.insert(var.code.as_str()) {
                return Err(SeastersError::Config(format!(
                    "Duplicate variable code '{}' in variable table",
                    var.code
                )));
            }
        }

        Ok(Self {
            variables: table.variables,
        })
    }

    pub fn get(&self, code: &str) -> Result<&VariableDescriptor> {
        self.variables
            .iter()
            .find(|v| v.code == code)
            .ok_or_else(|| SeastersError::InvalidVariable {
                var: code.to_string(),
                valid: self.codes().iter().map(|c| c.to_string()).collect(),
            })
    }

    pub fn contains(&self, code: &str) -> bool {
        self.variables.iter().any(|v| v.code == code)
    }

    pub fn codes(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.code.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

fn cached(cell: &'static OnceLock<VariableRegistry>, yaml: &str) -> Result<&'static VariableRegistry> {
    if let Some(registry) = cell.get() {
        return Ok(registry);
    }
    let registry = VariableRegistry::from_yaml_str(yaml)?;
    Ok(cell.get_or_init(|| registry))
}

/// Variable table of the daily GHCNd dataset
pub fn ghcnd_variables() -> Result<&'static VariableRegistry> {
    cached(&GHCND_VARIABLES, GHCND_VARIABLES_YAML)
}

/// Variable table of the hourly GHCNh dataset
pub fn ghcnh_variables() -> Result<&'static VariableRegistry> {
    cached(&GHCNH_VARIABLES, GHCNH_VARIABLES_YAML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_ghcnd_table() {
        let registry = ghcnd_variables().unwrap();
        let prcp = registry.get("PRCP").unwrap();
        assert_eq!(prcp.name, "Precipitation");
        assert_eq!(prcp.units, "mm");
        assert!(registry.contains("TMAX"));
        assert!(registry.get("TAVG").unwrap().note.is_some());
    }

    #[test]
    fn test_embedded_ghcnh_table() {
        let registry = ghcnh_variables().unwrap();
        assert!(registry.contains("precipitation"));
        assert!(registry.contains("precipitation_24_hour"));
        assert_eq!(registry.get("sea_level_pressure").unwrap().units, "hPa");
    }

    #[test]
    fn test_unknown_code_lists_choices() {
        let registry = ghcnd_variables().unwrap();
        match registry.get("XXXX") {
            Err(SeastersError::InvalidVariable { var, valid }) => {
                assert_eq!(var, "XXXX");
                assert!(valid.contains(&"PRCP".to_string()));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_codes_rejected() {
        let yaml = "variables:\n  - {code: A, name: a, long_name: a, units: mm}\n  - {code: A, name: b, long_name: b, units: mm}\n";
        assert!(VariableRegistry::from_yaml_str(yaml).is_err());
    }
}
