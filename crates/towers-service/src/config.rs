//! Service configuration.

use serde::{Deserialize, Serialize};
use towers_engine::EngineConfig;

use crate::ServiceError;

/// Default buffer size of the notification channel.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Settings for a [`GameService`](crate::GameService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Rules used for every game this service starts.
    pub engine: EngineConfig,

    /// How many notifications a slow subscriber may fall behind before
    /// it starts missing them. Must be non-zero.
    pub event_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ServiceConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    ///
    /// ```
    /// use towers_service::ServiceConfig;
    ///
    /// let config = ServiceConfig::from_json(r#"{"engine": {"max_players": 4}}"#).unwrap();
    /// assert_eq!(config.engine.max_players, 4);
    /// assert_eq!(config.event_capacity, 256);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ServiceError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the service settings and the embedded engine rules.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.event_capacity == 0 {
            return Err(ServiceError::InvalidConfig(
                "event_capacity must be at least 1".into(),
            ));
        }
        self.engine.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use towers_engine::{EngineError, HpCardRule};

    #[test]
    fn test_empty_json_gives_defaults() {
        assert_eq!(ServiceConfig::from_json("{}").unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_from_json_reads_engine_rules() {
        let config = ServiceConfig::from_json(
            r#"{"engine": {"hp_cards": {"exactly": 3}}, "event_capacity": 8}"#,
        )
        .unwrap();
        assert_eq!(config.engine.hp_cards, HpCardRule::Exactly(3));
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let err = ServiceConfig::from_json(r#"{"event_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfig(_)));
    }

    #[test]
    fn test_bad_engine_rules_are_rejected() {
        let err = ServiceConfig::from_json(r#"{"engine": {"min_players": 1}}"#).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Engine(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_invalid_config() {
        let err = ServiceConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidConfig(_)));
    }
}
