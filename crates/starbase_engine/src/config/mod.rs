//! Configuration system

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;
        
        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }
    
    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            self.to_toml_string()?
        } else if path.ends_with(".ron") {
            self.to_ron_string()?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };
        
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration as TOML
    fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Serialize configuration as RON
    fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    
    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
    
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
    
    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Order in which [`crate::ecs::EntityManager::refresh`] visits entities flagged for removal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullOrder {
    /// Dense-array order; depends on the slot reuse history
    #[default]
    Slot,
    /// Ascending entity id, reproducible regardless of slot reuse
    Id,
}

/// Entity manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityManagerConfig {
    /// Number of entity slots reserved up front
    pub initial_capacity: usize,
    /// Cull pass ordering
    pub cull_order: CullOrder,
    /// Whether staged-entity access is logged (it is always counted)
    pub log_staged_access: bool,
}

impl Default for EntityManagerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            cull_order: CullOrder::Slot,
            log_staged_access: true,
        }
    }
}

impl Config for EntityManagerConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_round_trip() {
        let config = EntityManagerConfig {
            initial_capacity: 64,
            cull_order: CullOrder::Id,
            log_staged_access: false,
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("cull_order = \"id\""));
        assert_eq!(EntityManagerConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = EntityManagerConfig::from_ron_str("(cull_order: id)").unwrap();
        assert_eq!(config.cull_order, CullOrder::Id);
        assert_eq!(config.initial_capacity, 256);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = EntityManagerConfig::load_from_file("settings.ini").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_) | ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_save_rejects_unknown_extension() {
        let err = EntityManagerConfig::default().save_to_file("settings.ini").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }
}
