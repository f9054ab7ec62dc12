// src/config.rs
//! Environment-driven configuration, loaded once at startup.

use std::collections::HashMap;
use thiserror::Error;

use crate::upload::{OverflowPolicy, UploadPolicy};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_IMAGES: usize = 3;
pub const DEFAULT_STORAGE_BUCKET: &str = "images";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub base_url: String,
    pub api_key: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    /// Uploads are refused when object storage isn't configured.
    pub storage: Option<StorageConfig>,
    pub upload_policy: UploadPolicy,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or(ConfigError::Missing("DATABASE_URL"))?
            .to_string();
        let bind_addr = get("BIND_ADDR").unwrap_or(DEFAULT_BIND_ADDR).to_string();
        let db_max_connections =
            parse_number("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS)?;

        let storage = match (get("STORAGE_URL"), get("STORAGE_KEY")) {
            (Some(base_url), Some(api_key)) => Some(StorageConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
                bucket: get("STORAGE_BUCKET").unwrap_or(DEFAULT_STORAGE_BUCKET).to_string(),
            }),
            _ => None,
        };

        let max_images = parse_number("MAX_IMAGES", get("MAX_IMAGES"), DEFAULT_MAX_IMAGES)?;
        if max_images == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_IMAGES",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let overflow = match get("IMAGE_OVERFLOW_POLICY") {
            None => OverflowPolicy::default(),
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                key: "IMAGE_OVERFLOW_POLICY",
                value: raw.to_string(),
                reason,
            })?,
        };

        let max_upload_bytes =
            parse_number("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            storage,
            upload_policy: UploadPolicy { max_images, overflow },
            max_upload_bytes,
        })
    }
}

fn parse_number<T>(key: &'static str, raw: Option<&str>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = AppConfig::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/desk")])).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.upload_policy.max_images, 3);
        assert_eq!(config.upload_policy.overflow, OverflowPolicy::Reject);
        assert!(config.storage.is_none());
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        assert_eq!(AppConfig::from_vars(vars(&[])), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_storage_and_upload_policy_are_parsed() {
        let config = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/desk"),
            ("STORAGE_URL", "https://project.supabase.co/"),
            ("STORAGE_KEY", "service-key"),
            ("MAX_IMAGES", "1"),
            ("IMAGE_OVERFLOW_POLICY", "truncate"),
        ]))
        .unwrap();

        let storage = config.storage.unwrap();
        assert_eq!(storage.base_url, "https://project.supabase.co");
        assert_eq!(storage.bucket, "images");
        assert_eq!(config.upload_policy.max_images, 1);
        assert_eq!(config.upload_policy.overflow, OverflowPolicy::Truncate);
    }

    #[test]
    fn test_zero_max_images_is_rejected() {
        let result = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/desk"),
            ("MAX_IMAGES", "0"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "MAX_IMAGES", .. })));
    }

    #[test]
    fn test_unknown_overflow_policy_is_rejected() {
        let result = AppConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/desk"),
            ("IMAGE_OVERFLOW_POLICY", "drop-oldest"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { key: "IMAGE_OVERFLOW_POLICY", .. })));
    }
}
