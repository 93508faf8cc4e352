use anyhow::{anyhow, Context, Result};
use persona_graph::{EdgeBuilder, EdgeRules};
use persona_layout::{ForceConfig, LayoutEngines, RadialConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout section of `persona.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSection {
    pub radial: RadialConfig,
    pub force: ForceConfig,
}

/// Contents of `persona.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    pub edges: EdgeRules,
    pub layout: LayoutSection,
}

impl PersonaConfig {
    /// Read and validate a config file; `None` gives the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.edges
            .validate()
            .map_err(|e| anyhow!("[edges] {e}"))?;
        self.layout
            .radial
            .validate()
            .map_err(|e| anyhow!("[layout.radial] {e}"))?;
        self.layout
            .force
            .validate()
            .map_err(|e| anyhow!("[layout.force] {e}"))?;
        Ok(())
    }

    pub fn edge_builder(&self) -> EdgeBuilder {
        EdgeBuilder::new(self.edges.clone())
    }

    pub fn layouts(&self) -> LayoutEngines {
        LayoutEngines::new(self.layout.radial.clone(), self.layout.force.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_graph::TensionPairing;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_path_gives_defaults() {
        assert_eq!(PersonaConfig::load(None).unwrap(), PersonaConfig::default());
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let file = write_config(
            r#"
            [edges]
            angle_story_min_shared = 1

            [layout.force]
            iterations = 50
            "#,
        );
        let config = PersonaConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.edges.angle_story_min_shared, 1);
        assert_eq!(config.edges.profile_strength, EdgeRules::default().profile_strength);
        assert_eq!(config.layout.force.iterations, 50);
        assert_eq!(config.layout.radial, RadialConfig::default());
    }

    #[test]
    fn tension_pairing_is_configurable() {
        let file = write_config(
            r#"
            [[edges.tensions]]
            name = "failure_vs_achievement"
            angle_archetypes = ["achiever"]
            story_tags = ["failure"]
            pairing = { mode = "all_pairs", max = 3 }
            "#,
        );
        let config = PersonaConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.edges.tensions.len(), 1);
        assert_eq!(
            config.edges.tensions[0].pairing,
            TensionPairing::AllPairs { max: 3 }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = write_config(
            r#"
            [layout.radial]
            angle_ring_radius = 300.0
            story_ring_radius = 200.0
            "#,
        );
        let err = PersonaConfig::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("[layout.radial]"));
    }
}
