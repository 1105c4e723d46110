use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use http::HeaderValue;
use serde::{Deserialize, Serialize};
use stashbox_backend::{Cache, NoopCache};
use stashbox_fs::{FileCache, FileCacheError};
use thiserror::Error;

use crate::rate_limit::Ticker;
use crate::transport::Transport;

/// Errors raised while turning a [`TransportConfig`] into a [`Transport`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The user agent cannot be sent as a header value.
    #[error("invalid user agent {value:?}")]
    InvalidUserAgent {
        /// The rejected value.
        value: String,
        /// Why `http` rejected it.
        #[source]
        source: http::header::InvalidHeaderValue,
    },

    /// A rate limit interval of zero would never throttle anything.
    #[error("rate limit interval must be greater than zero")]
    ZeroInterval,

    /// The file cache settings are invalid.
    #[error(transparent)]
    FileCache(#[from] FileCacheError),
}

/// Declarative transport settings.
///
/// ```yaml
/// retries: 2
/// user_agent: "crawler/1.0"
/// rate_limit:
///   interval: 250ms
/// cache:
///   File:
///     root: /var/cache/crawler
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Extra attempts after a failed exchange.
    #[serde(default)]
    pub retries: usize,
    /// `User-Agent` override for every outgoing request.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Throttling applied before every uncached exchange.
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
    /// Where responses are cached.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// One exchange per interval.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Time between two exchanges (e.g., "1s", "250ms").
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

/// Cache selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub enum CacheConfig {
    /// Nothing is cached.
    #[default]
    Disabled,
    /// Responses are stored as files under a directory.
    File(FileCacheConfig),
}

/// Settings of the filesystem cache.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileCacheConfig {
    /// Directory holding the records.
    pub root: PathBuf,
    /// Write through a temporary file and rename.
    #[serde(default = "default_atomic")]
    pub atomic: bool,
}

fn default_atomic() -> bool {
    true
}

impl CacheConfig {
    /// Builds the selected cache.
    pub fn into_cache(self) -> Result<Arc<dyn Cache>, ConfigError> {
        Ok(match self {
            CacheConfig::Disabled => Arc::new(NoopCache),
            CacheConfig::File(file) => Arc::new(
                FileCache::builder()
                    .root(file.root)
                    .atomic_writes(file.atomic)
                    .build()?,
            ),
        })
    }
}

impl TransportConfig {
    /// Resolves every setting into a ready-to-init transport.
    pub fn into_transport(self) -> Result<Transport<Arc<dyn Cache>>, ConfigError> {
        let mut builder = Transport::builder()
            .cache(self.cache.into_cache()?)
            .retries(self.retries);

        if let Some(value) = self.user_agent {
            let header = HeaderValue::try_from(value.as_str())
                .map_err(|source| ConfigError::InvalidUserAgent { value, source })?;
            builder = builder.user_agent(header);
        }

        if let Some(rate_limit) = self.rate_limit {
            if rate_limit.interval.is_zero() {
                return Err(ConfigError::ZeroInterval);
            }
            builder = builder.rate_limiter(Ticker::new(rate_limit.interval));
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(yaml: &str) -> TransportConfig {
        serde_saphyr::from_str(yaml).unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("{}");
        assert_eq!(config, TransportConfig::default());

        let transport = config.into_transport().unwrap();
        assert_eq!(transport.retries(), 0);
        assert_eq!(transport.cache().name(), "noop");
        assert!(transport.user_agent().is_none());
        assert!(!transport.is_rate_limited());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
        retries: 2
        user_agent: "crawler/1.0"
        rate_limit:
          interval: 250ms
        cache:
          File:
            root: /tmp/stashbox-config
        "#;

        let config = parse(yaml);
        assert_eq!(
            config,
            TransportConfig {
                retries: 2,
                user_agent: Some("crawler/1.0".to_owned()),
                rate_limit: Some(RateLimitConfig {
                    interval: Duration::from_millis(250),
                }),
                cache: CacheConfig::File(FileCacheConfig {
                    root: PathBuf::from("/tmp/stashbox-config"),
                    atomic: true,
                }),
            }
        );

        let transport = config.into_transport().unwrap();
        assert_eq!(transport.retries(), 2);
        assert_eq!(transport.cache().name(), "file");
        assert_eq!(transport.user_agent().unwrap(), "crawler/1.0");
        assert!(transport.is_rate_limited());
    }

    #[test]
    fn test_invalid_user_agent() {
        let config = TransportConfig {
            user_agent: Some("bad\nagent".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            config.into_transport(),
            Err(ConfigError::InvalidUserAgent { .. })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = parse("rate_limit:\n  interval: 0s\n");
        assert!(matches!(
            config.into_transport(),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = serde_saphyr::from_str::<TransportConfig>("retry_count: 3\n");
        assert!(result.is_err());
    }
}
