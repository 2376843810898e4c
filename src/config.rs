// src/config.rs
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read once at startup after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub run_migrations: bool,
    /// Hours east of UTC used to decide which calendar day an audit belongs to.
    pub business_utc_offset_hours: i32,
    pub feasibility_max_distance_m: f64,
    pub installation_restrictions_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let config = Self {
            database_url,
            host: parse_var("HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_var("PORT", 3000)?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_var("RUN_MIGRATIONS", false)?,
            business_utc_offset_hours: parse_var("BUSINESS_UTC_OFFSET_HOURS", -4)?,
            feasibility_max_distance_m: parse_var("FEASIBILITY_MAX_DISTANCE_M", 400.0)?,
            installation_restrictions_enabled: parse_var("INSTALLATION_RESTRICTIONS_ENABLED", false)?,
        };

        config.business_offset()?;
        Ok(config)
    }

    pub fn business_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.business_utc_offset_hours * 3600).ok_or(ConfigError::Invalid {
            name: "BUSINESS_UTC_OFFSET_HOURS",
            value: self.business_utc_offset_hours.to_string(),
        })
    }

    /// Offset used by handlers; falls back to UTC when the configured value was never validated.
    pub fn offset(&self) -> FixedOffset {
        self.business_offset().unwrap_or_else(|_| Utc.fix())
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        _ => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/fieldops_test".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            db_max_connections: 1,
            run_migrations: false,
            business_utc_offset_hours: -4,
            feasibility_max_distance_m: 400.0,
            installation_restrictions_enabled: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_use_defaults() {
        let port: u16 = parse_var("FIELDOPS_TEST_UNSET_PORT", 3000).unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn invalid_values_are_reported() {
        std::env::set_var("FIELDOPS_TEST_BAD_PORT", "not-a-port");
        let err = parse_var::<u16>("FIELDOPS_TEST_BAD_PORT", 3000).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "FIELDOPS_TEST_BAD_PORT", .. }));
    }

    #[test]
    fn business_offset_is_hours_east_of_utc() {
        let config = Config::for_tests();
        assert_eq!(config.offset().local_minus_utc(), -4 * 3600);
    }
}
