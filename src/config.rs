//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Which backend holds the documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-process store, lost on restart
    Memory,
    /// External Redis server
    Redis,
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageType::Memory),
            "redis" => Ok(StorageType::Redis),
            other => Err(format!("unknown storage type '{}'", other)),
        }
    }
}

/// Which key generator hands out document keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyGeneratorType {
    Random,
    Phonetic,
}

impl FromStr for KeyGeneratorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(KeyGeneratorType::Random),
            "phonetic" => Ok(KeyGeneratorType::Phonetic),
            other => Err(format!("unknown key generator '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server to
    pub host: String,
    /// HTTP server port
    pub server_port: u16,
    /// Length of generated document keys
    pub key_length: usize,
    /// Maximum document size after gzip+base64, None = unlimited
    pub max_length: Option<usize>,
    /// Document TTL in seconds, None = documents never expire
    pub expire: Option<u64>,
    /// Backend holding the documents
    pub storage: StorageType,
    /// Redis connection URL (used when storage is Redis)
    pub redis_url: String,
    /// Key generator flavour
    pub key_generator: KeyGeneratorType,
    /// Memory backend expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Documents seeded at startup as (name, file path)
    pub documents: Vec<(String, String)>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HOST` - Bind address (default: 0.0.0.0)
    /// - `PORT` - HTTP server port (default: 7777)
    /// - `KEY_LENGTH` - Generated key length (default: 10)
    /// - `MAX_LENGTH` - Max encoded document size, 0 disables (default: 400000)
    /// - `EXPIRE` - Document TTL in seconds, 0 disables (default: 30 days)
    /// - `STORAGE_TYPE` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - Redis URL (default: redis://127.0.0.1:6379)
    /// - `KEY_GENERATOR` - `random` or `phonetic` (default: random)
    /// - `CLEANUP_INTERVAL` - Memory sweep frequency in seconds (default: 60)
    /// - `STATIC_DOCUMENTS` - `name=path` pairs separated by commas (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            server_port: parse_var("PORT").unwrap_or(defaults.server_port),
            key_length: parse_var("KEY_LENGTH")
                .filter(|len| *len > 0)
                .unwrap_or(defaults.key_length),
            max_length: match parse_var::<usize>("MAX_LENGTH") {
                Some(0) => None,
                Some(len) => Some(len),
                None => defaults.max_length,
            },
            expire: match parse_var::<u64>("EXPIRE") {
                Some(0) => None,
                Some(secs) => Some(secs),
                None => defaults.expire,
            },
            storage: parse_var("STORAGE_TYPE").unwrap_or(defaults.storage),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_generator: parse_var("KEY_GENERATOR").unwrap_or(defaults.key_generator),
            cleanup_interval: parse_var("CLEANUP_INTERVAL")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.cleanup_interval),
            documents: env::var("STATIC_DOCUMENTS")
                .map(|v| parse_documents(&v))
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            server_port: 7777,
            key_length: 10,
            max_length: Some(400_000),
            expire: Some(60 * 60 * 24 * 30),
            storage: StorageType::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_generator: KeyGeneratorType::Random,
            cleanup_interval: 60,
            documents: Vec::new(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Parses `about=docs/about.md,help=docs/help.txt` into name/path pairs.
fn parse_documents(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, path) = pair.split_once('=')?;
            let (name, path) = (name.trim(), path.trim());
            if name.is_empty() || path.is_empty() {
                None
            } else {
                Some((name.to_string(), path.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 7777);
        assert_eq!(config.key_length, 10);
        assert_eq!(config.max_length, Some(400_000));
        assert_eq!(config.expire, Some(2_592_000));
        assert_eq!(config.storage, StorageType::Memory);
        assert_eq!(config.key_generator, KeyGeneratorType::Random);
        assert!(config.documents.is_empty());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for var in [
            "PORT",
            "KEY_LENGTH",
            "MAX_LENGTH",
            "EXPIRE",
            "STORAGE_TYPE",
            "KEY_GENERATOR",
            "STATIC_DOCUMENTS",
        ] {
            env::remove_var(var);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 7777);
        assert_eq!(config.key_length, 10);
        assert_eq!(config.expire, Some(2_592_000));
        assert_eq!(config.storage, StorageType::Memory);
    }

    #[test]
    fn test_parse_documents() {
        let docs = parse_documents("about=about.md, help = docs/help.txt,broken,=x");
        assert_eq!(
            docs,
            vec![
                ("about".to_string(), "about.md".to_string()),
                ("help".to_string(), "docs/help.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!("Redis".parse::<StorageType>(), Ok(StorageType::Redis));
        assert_eq!("memory".parse::<StorageType>(), Ok(StorageType::Memory));
        assert!("postgres".parse::<StorageType>().is_err());
    }
}
