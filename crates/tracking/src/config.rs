//! Tracking configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `TRACKING_STORE_TIMEOUT_MS` - Deadline for a single store call (default: 2000)
//! - `TRACKING_MAX_CREATE_RETRIES` - Create-or-update attempts on a uniqueness
//!   race, 1-10 (default: 3)
//! - `TRACKING_DEFAULT_COUNTRY_CODE` - Calling code for national-format phone
//!   numbers (default: 33)
//! - `DEFAULT_RESTAURANT_CODE` - Restaurant used when a caller supplies none
//!   (default: CASANOVA2024)

use std::time::Duration;

use thiserror::Error;

use casanova_core::{CountryCode, RestaurantCode};

const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_MAX_CREATE_RETRIES: u32 = 3;
const MAX_CREATE_RETRIES_LIMIT: u32 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Knobs shared by all tracking components.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Deadline for a single store call; expiry is treated as unavailability.
    pub store_timeout: Duration,
    /// Attempts made by the ledger before giving up on a uniqueness race.
    pub max_create_retries: u32,
    /// Calling code prepended to national-format phone numbers.
    pub default_country: CountryCode,
    /// Restaurant used when a caller supplies none.
    pub default_restaurant: RestaurantCode,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            max_create_retries: DEFAULT_MAX_CREATE_RETRIES,
            default_country: CountryCode::FRANCE,
            default_restaurant: RestaurantCode::default(),
        }
    }
}

impl TrackingConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a value is set but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_timeout = match lookup("TRACKING_STORE_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_var("TRACKING_STORE_TIMEOUT_MS", &raw)?),
            None => defaults.store_timeout,
        };

        let max_create_retries = match lookup("TRACKING_MAX_CREATE_RETRIES") {
            Some(raw) => {
                let n: u32 = parse_var("TRACKING_MAX_CREATE_RETRIES", &raw)?;
                if !(1..=MAX_CREATE_RETRIES_LIMIT).contains(&n) {
                    return Err(ConfigError::InvalidEnvVar(
                        "TRACKING_MAX_CREATE_RETRIES".to_string(),
                        format!("must be between 1 and {MAX_CREATE_RETRIES_LIMIT} (got {n})"),
                    ));
                }
                n
            }
            None => defaults.max_create_retries,
        };

        let default_country = match lookup("TRACKING_DEFAULT_COUNTRY_CODE") {
            Some(raw) => CountryCode::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("TRACKING_DEFAULT_COUNTRY_CODE".to_string(), e.to_string())
            })?,
            None => defaults.default_country,
        };

        let default_restaurant = lookup("DEFAULT_RESTAURANT_CODE")
            .and_then(|raw| RestaurantCode::new(&raw))
            .unwrap_or(defaults.default_restaurant);

        Ok(Self {
            store_timeout,
            max_create_retries,
            default_country,
            default_restaurant,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = TrackingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.store_timeout, Duration::from_millis(2000));
        assert_eq!(config.max_create_retries, 3);
        assert_eq!(config.default_country, CountryCode::FRANCE);
        assert_eq!(config.default_restaurant.as_str(), "CASANOVA2024");
    }

    #[test]
    fn test_overrides() {
        let config = TrackingConfig::from_lookup(lookup(&[
            ("TRACKING_STORE_TIMEOUT_MS", "250"),
            ("TRACKING_MAX_CREATE_RETRIES", "5"),
            ("TRACKING_DEFAULT_COUNTRY_CODE", "+44"),
            ("DEFAULT_RESTAURANT_CODE", "bistro"),
        ]))
        .unwrap();
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.max_create_retries, 5);
        assert_eq!(config.default_country.get(), 44);
        assert_eq!(config.default_restaurant.as_str(), "BISTRO");
    }

    #[test]
    fn test_retry_bounds() {
        for bad in ["0", "11", "-1", "many"] {
            let result =
                TrackingConfig::from_lookup(lookup(&[("TRACKING_MAX_CREATE_RETRIES", bad)]));
            assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))), "{bad}");
        }
    }

    #[test]
    fn test_blank_restaurant_falls_back() {
        let config =
            TrackingConfig::from_lookup(lookup(&[("DEFAULT_RESTAURANT_CODE", "  ")])).unwrap();
        assert_eq!(config.default_restaurant, RestaurantCode::default());
    }
}
