use std::path::PathBuf;

use byte_unit::n_mib_bytes;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// Database configuration.
#[derive(Deserialize)]
pub struct Database {
    /// Database URL string.
    pub url: String,
}

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
        }
    }
}

/// AWS S3-compatible storage configuration.
#[derive(Deserialize)]
pub struct S3Storage {
    /// Access key identifier.
    pub access_key_id: String,

    /// Secret access key.
    pub secret_access_key: String,

    /// S3 region name.
    pub region: String,

    /// S3 endpoint URL.
    pub endpoint_url: String,

    /// S3 bucket name for submitted file contents.
    pub bucket: String,
}

/// Content store backend selection.
#[derive(Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum Backend {
    /// Files are stored under a local directory, sharded by content hash.
    Local {
        /// Root directory of the content store.
        path: PathBuf,
    },

    /// Files are stored as objects of a single S3 bucket.
    S3(S3Storage),
}

/// Content store configuration.
#[derive(Deserialize)]
pub struct Storage {
    /// Selected storage backend.
    #[serde(flatten)]
    pub backend: Backend,

    /// Max size of a single stored file, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

// Student uploads are source files, so a few megabytes is plenty.
fn default_max_file_size() -> usize {
    n_mib_bytes!(5) as usize
}

/// General configuration.
#[derive(Deserialize)]
pub struct Config {
    /// General database configuration.
    pub database: Database,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,

    /// Content store configuration.
    pub storage: Storage,
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new(path: Option<PathBuf>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: Option<PathBuf>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(PathBuf::from("Config.toml"))))
            .merge(Env::prefixed("CONFIG_").split("_"))
    }

    /// Create new config suitable for running unit tests.
    #[cfg(feature = "test-utils")]
    pub fn for_tests() -> Self {
        Self {
            database: Database {
                url: String::from("sqlite::memory:"),
            },
            #[cfg(feature = "logging")]
            logging: Logging::default(),
            storage: Storage {
                backend: Backend::Local {
                    path: std::env::temp_dir().join("grading-content"),
                },
                max_file_size: default_max_file_size(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::{
        providers::{Format, Toml},
        Figment,
    };

    use super::{Backend, Config};

    #[test]
    fn local_storage_with_default_limit() {
        let config: Config = Figment::new()
            .merge(Toml::string(
                r#"
                [database]
                url = "sqlite::memory:"

                [storage]
                backend = "local"
                path = "/var/lib/grading"
                "#,
            ))
            .extract()
            .expect("unable to parse config");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.storage.max_file_size, 5 * 1024 * 1024);
        assert!(matches!(
            config.storage.backend,
            Backend::Local { ref path } if path.to_str() == Some("/var/lib/grading")
        ));
    }

    #[test]
    fn s3_storage() {
        let config: Config = Figment::new()
            .merge(Toml::string(
                r#"
                [database]
                url = "postgres://localhost/grading"

                [storage]
                backend = "s3"
                access_key_id = "key"
                secret_access_key = "secret"
                region = "us-east-1"
                endpoint_url = "http://localhost:9000"
                bucket = "submissions"
                max_file_size = 1024
                "#,
            ))
            .extract()
            .expect("unable to parse config");

        assert_eq!(config.storage.max_file_size, 1024);

        let Backend::S3(s3) = config.storage.backend else {
            panic!("expected s3 backend");
        };

        assert_eq!(s3.bucket, "submissions");
    }
}
