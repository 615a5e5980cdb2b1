//! Server and virtual-host configuration (§6 "Configuration (recognised options)").
//!
//! Distinct from [`crate::limits`]: the `limits` types bound resource usage
//! (buffer sizes, timeouts, connection counts) the way the teacher's crate
//! always has; `ServerConfig`/`VhostConfig` describe what the server serves
//! and to whom, which the teacher's single-document-root design never needed.
//! `ConfigError` is `thiserror`-based rather than the hand-rolled
//! `ErrorKind`/`Display` pair in [`crate::errors`] — that hot-path type is
//! tuned for a `const fn` canned-response table, which configuration
//! validation (checked once, at startup) has no use for.

use std::path::PathBuf;
use thiserror::Error;

/// Token-bucket parameters for [`crate::server::ratelimit::RateLimiter`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimiterConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        RateLimiterConfig { capacity: 100.0, refill_per_sec: 50.0 }
    }
}

/// Top-level server configuration: listener-wide settings plus the list of
/// virtual hosts dispatched by `Host` header (§4.6).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory new request/message payload spool files are created in.
    pub tmp_dir: PathBuf,
    /// Hard cap on a request body, enforced before any byte is spooled.
    pub client_max_body_size: u64,
    /// File extensions (without the dot) sent with `Content-Encoding: gzip`
    /// when the client advertises `Accept-Encoding: gzip`.
    pub gzip_mimetypes: Vec<String>,
    /// Number of worker tasks draining the global ready queue (§4.9).
    pub workers: usize,
    /// TCP `listen()` backlog.
    pub backlog: u32,
    pub ratelimiter: RateLimiterConfig,
    pub vhosts: Vec<VhostConfig>,
}

/// One virtual host: a `Host` header pattern plus the document root and
/// default document it serves (§4.6 vhost dispatch, §4.7 data-source filter).
#[derive(Debug, Clone)]
pub struct VhostConfig {
    /// Matched against the inbound `Host` header, case-insensitively.
    pub host_pattern: String,
    pub root: PathBuf,
    pub index: String,
    /// TLS is out of scope (§1 Non-goals) — these fields exist so a config
    /// file shape that names them doesn't need a second, incompatible parser
    /// bolted on later; nothing in this crate reads them.
    pub tls_fullchain: Option<PathBuf>,
    pub tls_private: Option<PathBuf>,
    pub tls_ciphers: Option<String>,
}

impl VhostConfig {
    pub fn new(host_pattern: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        VhostConfig {
            host_pattern: host_pattern.into(),
            root: root.into(),
            index: "index.html".to_string(),
            tls_fullchain: None,
            tls_private: None,
            tls_ciphers: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            tmp_dir: std::env::temp_dir(),
            client_max_body_size: 10 * 1024 * 1024,
            gzip_mimetypes: vec!["html", "css", "js", "json", "svg", "txt"]
                .into_iter()
                .map(String::from)
                .collect(),
            workers: 4,
            backlog: 1024,
            ratelimiter: RateLimiterConfig::default(),
            vhosts: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no virtual host configured")]
    NoVhosts,
    #[error("virtual host {0:?} has an empty host pattern")]
    EmptyHostPattern(usize),
    #[error("virtual host {pattern:?} has an unreadable document root {root:?}: {source}")]
    RootUnreadable {
        pattern: String,
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tmp_dir {0:?} is not a writable directory")]
    TmpDirUnwritable(PathBuf),
}

impl ServerConfig {
    /// Validates the configuration at startup, the one point where a
    /// `Result`-returning, allocation-tolerant error path makes sense for
    /// this otherwise zero-allocation server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vhosts.is_empty() {
            return Err(ConfigError::NoVhosts);
        }

        for (i, vhost) in self.vhosts.iter().enumerate() {
            if vhost.host_pattern.is_empty() {
                return Err(ConfigError::EmptyHostPattern(i));
            }

            std::fs::metadata(&vhost.root).map_err(|source| ConfigError::RootUnreadable {
                pattern: vhost.host_pattern.clone(),
                root: vhost.root.clone(),
                source,
            })?;
        }

        if std::fs::metadata(&self.tmp_dir).is_err() {
            return Err(ConfigError::TmpDirUnwritable(self.tmp_dir.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_vhosts() {
        let config = ServerConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::NoVhosts)));
    }

    #[test]
    fn valid_vhost_against_existing_dir() {
        let mut config = ServerConfig::default();
        config.vhosts.push(VhostConfig::new("example.com", std::env::temp_dir()));

        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_host_pattern() {
        let mut config = ServerConfig::default();
        config.vhosts.push(VhostConfig::new("", std::env::temp_dir()));

        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyHostPattern(0))
        ));
    }
}
