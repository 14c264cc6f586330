use crate::model::config::{Config, ConfigTable};
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::platform::constants::CONFIG_PATH;
use std::fs;
use std::ops::Deref;
use std::path::Path;

pub struct AppConfig {
    config: Config,
}

impl AppConfig {
    pub fn new() -> Result<Self, Error> {
        Self::from_path(CONFIG_PATH)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let toml_string = fs::read_to_string(path).map_err(SystemError::config_not_found)?;
        Self::from_toml(&toml_string)
    }

    pub fn from_toml(toml_string: &str) -> Result<Self, Error> {
        let config = toml::from_str::<ConfigTable>(toml_string)
            .map_err(SystemError::invalid_config)?
            .config;
        Self::validate(&config)?;
        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Result<Self, Error> {
        Self::validate(&config)?;
        Ok(Self { config })
    }

    fn validate(config: &Config) -> Result<(), Error> {
        if !(1..=3600).contains(&config.tick_interval) {
            Err(SystemError::invalid_config_value("tick_interval"))?
        }
        if config.max_file_operations == 0 {
            Err(SystemError::invalid_config_value("max_file_operations"))?
        }
        if config.channel_capacity == 0 {
            Err(SystemError::invalid_config_value("channel_capacity"))?
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: Config::default(),
        }
    }
}

impl Deref for AppConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::error::Error;

    #[test]
    fn parses_config_table_with_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [Config]
            tick_interval = 30
            database_path = "/var/lib/backup/backup.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_interval, 30);
        assert_eq!(config.database_path, Path::new("/var/lib/backup/backup.db"));
        assert_eq!(config.max_file_operations, 32);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn rejects_out_of_range_tick_interval() {
        let result = AppConfig::from_toml("[Config]\ntick_interval = 0\n");
        assert!(matches!(
            result,
            Err(Error::System(SystemError::InvalidConfigValue { .. }))
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        let result = AppConfig::from_toml("[Config\n");
        assert!(matches!(
            result,
            Err(Error::System(SystemError::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = AppConfig::from_path("/nonexistent/backup-sphere/config.toml");
        assert!(matches!(
            result,
            Err(Error::System(SystemError::ConfigNotFound { .. }))
        ));
    }
}
