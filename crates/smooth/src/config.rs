use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::net::{NETWORK_TIME_PRECISION, RoutingMode};
use crate::pose::{BroadcastVariant, SMOOTH_NODE_EPSILON};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[source] ron::error::SpannedError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothConfig {
    pub epsilon: f32,
    pub network_time_precision: f64,
    pub broadcast_rate: u32,
    pub variant: BroadcastVariant,
    pub first_field_number: u16,
    pub routing: RoutingMode,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            epsilon: SMOOTH_NODE_EPSILON,
            network_time_precision: NETWORK_TIME_PRECISION,
            broadcast_rate: 5,
            variant: BroadcastVariant::Full,
            first_field_number: 0,
            routing: RoutingMode::Client,
        }
    }
}

impl SmoothConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config = ron::from_str(&contents).map_err(ConfigError::Parse)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, writing the defaults there first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        config.save(path)?;
        log::info!("Created default config at {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(ConfigError::Write)?;
        }
        let pretty = ron::ser::PrettyConfig::new().depth_limit(2);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;
        std::fs::write(path, serialized).map_err(ConfigError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let config = SmoothConfig {
            epsilon: 0.05,
            broadcast_rate: 10,
            variant: BroadcastVariant::Xyh,
            first_field_number: 120,
            routing: RoutingMode::Authoritative { sender_channel: 4000 },
            ..Default::default()
        };
        let ron_str = ron::to_string(&config).unwrap();
        let parsed: SmoothConfig = ron::from_str(&ron_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config: SmoothConfig = ron::from_str("(broadcast_rate: 20, variant: Xy)").unwrap();
        assert_eq!(config.broadcast_rate, 20);
        assert_eq!(config.variant, BroadcastVariant::Xy);
        assert_eq!(config.epsilon, SMOOTH_NODE_EPSILON);
        assert_eq!(config.routing, RoutingMode::Client);
    }

    #[test]
    fn routing_reads_as_struct_variant() {
        let config: SmoothConfig =
            ron::from_str("(routing: Authoritative(sender_channel: 77))").unwrap();
        assert_eq!(config.routing, RoutingMode::Authoritative { sender_channel: 77 });
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("smooth.ron");

        let created = SmoothConfig::load_or_create(&path).unwrap();
        assert_eq!(created, SmoothConfig::default());
        assert!(path.exists());

        let config = SmoothConfig {
            broadcast_rate: 30,
            ..created
        };
        config.save(&path).unwrap();
        assert_eq!(SmoothConfig::load_or_create(&path).unwrap(), config);
    }

    #[test]
    fn invalid_ron_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smooth.ron");
        std::fs::write(&path, "{{not valid}}").unwrap();

        assert!(matches!(SmoothConfig::load(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(
            SmoothConfig::load(&dir.path().join("missing.ron")),
            Err(ConfigError::Read(_))
        ));
    }
}
