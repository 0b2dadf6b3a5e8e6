//! Rewrite configuration.
//!
//! The configuration is owned by whoever embeds the interceptor. The engine
//! only reads it, once per message, so a host can retarget downloads between
//! two reports by calling [`SharedConfig::update_download_targets`].
//!
//! # Sources
//!
//! | Source | Constructor |
//! |--------|-------------|
//! | Code | [`RewriteConfig::redirect`], [`RewriteConfig::blackhole`] |
//! | Environment | [`RewriteConfig::from_env`] |
//! | JSON | [`RewriteConfig::from_json_str`], [`RewriteConfig::from_file`] |
//!
//! # Example
//!
//! ```ignore
//! use ws_interceptor::{RewriteConfig, SharedConfig};
//!
//! let config = SharedConfig::new(RewriteConfig::redirect(r"D:\out"));
//! config.update_download_targets(r"D:\reports\2026", "invoice.pdf");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Filename used when the original path has no usable last segment.
pub const DEFAULT_FILENAME: &str = "download";

/// Sink path used by the blackhole policy when none is configured.
pub const DEFAULT_BLACKHOLE_PATH: &str = r"C:\Windows\Temp\qms_discard.tmp";

/// Environment variable selecting the [`RewritePolicy`].
pub const ENV_POLICY: &str = "WS_INTERCEPTOR_POLICY";

/// Environment variable holding the destination directory.
pub const ENV_DOWNLOAD_DIR: &str = "WS_INTERCEPTOR_DOWNLOAD_DIR";

/// Environment variable holding the override filename.
pub const ENV_FILENAME: &str = "WS_INTERCEPTOR_FILENAME";

/// Environment variable holding the sink path.
pub const ENV_BLACKHOLE_PATH: &str = "WS_INTERCEPTOR_BLACKHOLE_PATH";

/// Environment variable holding comma separated block patterns.
pub const ENV_BLOCK_PATTERNS: &str = "WS_INTERCEPTOR_BLOCK_PATTERNS";

// ============================================================================
// RewritePolicy
// ============================================================================

/// What happens to the destination path (`Pars[1]`) of a save command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewritePolicy {
    /// Leave the path alone; parameters are still extracted.
    Passthrough,

    /// Join the override (or original) filename onto the download directory.
    #[default]
    Redirect,

    /// Replace the path with the sink path.
    Blackhole,
}

impl RewritePolicy {
    /// Returns the lowercase name used in config files and the environment.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Redirect => "redirect",
            Self::Blackhole => "blackhole",
        }
    }
}

impl fmt::Display for RewritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewritePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passthrough" | "none" => Ok(Self::Passthrough),
            "redirect" => Ok(Self::Redirect),
            "blackhole" | "sink" => Ok(Self::Blackhole),
            other => Err(Error::config(format!("unknown rewrite policy: {other}"))),
        }
    }
}

// ============================================================================
// RewriteConfig
// ============================================================================

/// Values the engine reads while rewriting.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Inbound destination path policy.
    pub policy: RewritePolicy,

    /// Destination directory for [`RewritePolicy::Redirect`].
    pub download_dir: Option<String>,

    /// Filename that replaces the original basename.
    pub filename: Option<String>,

    /// Sink path for [`RewritePolicy::Blackhole`].
    pub blackhole_path: Option<String>,

    /// Outbound substrings that cause a frame to be dropped and the
    /// channel closed.
    pub block_patterns: Vec<String>,
}

// ============================================================================
// RewriteConfig - Constructors
// ============================================================================

impl RewriteConfig {
    /// Creates a redirect configuration with no directory set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a redirect configuration targeting `download_dir`.
    #[inline]
    #[must_use]
    pub fn redirect(download_dir: impl Into<String>) -> Self {
        Self {
            policy: RewritePolicy::Redirect,
            download_dir: Some(download_dir.into()),
            ..Self::default()
        }
    }

    /// Creates a blackhole configuration using the default sink path.
    #[inline]
    #[must_use]
    pub fn blackhole() -> Self {
        Self {
            policy: RewritePolicy::Blackhole,
            ..Self::default()
        }
    }

    /// Creates a configuration that never touches destination paths.
    #[inline]
    #[must_use]
    pub fn passthrough() -> Self {
        Self {
            policy: RewritePolicy::Passthrough,
            ..Self::default()
        }
    }

    /// Loads configuration from the `WS_INTERCEPTOR_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the policy variable holds an unknown name.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the policy value is unknown.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let policy = match non_empty(ENV_POLICY) {
            Some(value) => value.parse()?,
            None => RewritePolicy::default(),
        };

        let block_patterns = non_empty(ENV_BLOCK_PATTERNS)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|pattern| !pattern.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            policy,
            download_dir: non_empty(ENV_DOWNLOAD_DIR),
            filename: non_empty(ENV_FILENAME),
            blackhole_path: non_empty(ENV_BLACKHOLE_PATH),
            block_patterns,
        };

        debug!(policy = %config.policy, "Rewrite configuration loaded from environment");

        Ok(config)
    }

    /// Parses configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document does not describe a config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid rewrite configuration: {e}")))
    }

    /// Reads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the file cannot be read
    /// - [`Error::Config`] if the contents are not a valid config
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;

        debug!(path = %path.display(), policy = %config.policy, "Rewrite configuration loaded");

        Ok(config)
    }
}

// ============================================================================
// RewriteConfig - Builder Methods
// ============================================================================

impl RewriteConfig {
    /// Sets the policy.
    #[inline]
    #[must_use]
    pub fn with_policy(mut self, policy: RewritePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the override filename.
    #[inline]
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Sets the sink path.
    #[inline]
    #[must_use]
    pub fn with_blackhole_path(mut self, path: impl Into<String>) -> Self {
        self.blackhole_path = Some(path.into());
        self
    }

    /// Adds an outbound block pattern.
    #[inline]
    #[must_use]
    pub fn with_block_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.block_patterns.push(pattern.into());
        self
    }
}

// ============================================================================
// RewriteConfig - Accessors
// ============================================================================

impl RewriteConfig {
    /// Returns the download directory, or `""` when unset.
    #[inline]
    #[must_use]
    pub fn download_dir(&self) -> &str {
        self.download_dir.as_deref().unwrap_or_default()
    }

    /// Returns the override filename if one is set and non-empty.
    #[inline]
    #[must_use]
    pub fn filename_override(&self) -> Option<&str> {
        self.filename.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns the sink path, falling back to [`DEFAULT_BLACKHOLE_PATH`].
    #[inline]
    #[must_use]
    pub fn blackhole_path(&self) -> &str {
        self.blackhole_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .unwrap_or(DEFAULT_BLACKHOLE_PATH)
    }

    /// Returns the first block pattern contained in `text`.
    #[must_use]
    pub fn blocking_pattern(&self, text: &str) -> Option<&str> {
        self.block_patterns
            .iter()
            .map(String::as_str)
            .find(|pattern| !pattern.is_empty() && text.contains(pattern))
    }
}

// ============================================================================
// SharedConfig
// ============================================================================

/// Shared, externally owned handle to a [`RewriteConfig`].
///
/// Clones share the same underlying configuration.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<RewriteConfig>>,
}

impl SharedConfig {
    /// Wraps a configuration.
    #[inline]
    #[must_use]
    pub fn new(config: RewriteConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Runs `f` against the current configuration.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&RewriteConfig) -> R) -> R {
        f(&self.inner.read())
    }

    /// Returns a copy of the current configuration.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> RewriteConfig {
        self.inner.read().clone()
    }

    /// Replaces the whole configuration.
    pub fn replace(&self, config: RewriteConfig) {
        *self.inner.write() = config;
    }

    /// Points subsequent redirects at `download_dir` / `filename`.
    pub fn update_download_targets(
        &self,
        download_dir: impl Into<String>,
        filename: impl Into<String>,
    ) {
        let download_dir = download_dir.into();
        let filename = filename.into();

        debug!(%download_dir, %filename, "Download targets updated");

        let mut guard = self.inner.write();
        guard.download_dir = Some(download_dir);
        guard.filename = Some(filename);
    }
}

impl From<RewriteConfig> for SharedConfig {
    fn from(config: RewriteConfig) -> Self {
        Self::new(config)
    }
}

// ============================================================================
// Tests
// ============================================================================
