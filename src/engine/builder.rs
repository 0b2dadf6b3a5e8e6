//! Builder pattern for interceptor configuration.
//!
//! # Example
//!
//! ```ignore
//! use ws_interceptor::{Interceptor, RewriteConfig};
//!
//! let interceptor = Interceptor::builder()
//!     .config(RewriteConfig::blackhole())
//!     .observer(|event| tracing::info!(?event, "intercept event"))
//!     .build();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::config::{RewriteConfig, SharedConfig};
use crate::error::Result;

use super::Interceptor;
use super::events::{InterceptEvent, Observer, ParamsSlot};

// ============================================================================
// InterceptorBuilder
// ============================================================================

/// Builder for an [`Interceptor`].
///
/// Use [`Interceptor::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct InterceptorBuilder {
    /// Shared configuration.
    config: Option<SharedConfig>,
    /// Parameter slot.
    params: Option<ParamsSlot>,
    /// Event observer.
    observer: Option<Observer>,
}

impl InterceptorBuilder {
    /// Creates a builder with default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the environment
    /// holds an invalid policy.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new().config(RewriteConfig::from_env()?))
    }

    /// Sets an owned configuration.
    #[inline]
    #[must_use]
    pub fn config(mut self, config: RewriteConfig) -> Self {
        self.config = Some(SharedConfig::new(config));
        self
    }

    /// Sets a configuration handle the host keeps updating.
    #[inline]
    #[must_use]
    pub fn shared_config(mut self, config: SharedConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the slot extracted parameters are written to.
    #[inline]
    #[must_use]
    pub fn params_slot(mut self, slot: ParamsSlot) -> Self {
        self.params = Some(slot);
        self
    }

    /// Sets the event observer.
    #[inline]
    #[must_use]
    pub fn observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&InterceptEvent) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Builds the interceptor.
    #[must_use]
    pub fn build(self) -> Interceptor {
        Interceptor::from_parts(
            self.config.unwrap_or_default(),
            self.params.unwrap_or_default(),
            self.observer,
        )
    }
}

impl fmt::Debug for InterceptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorBuilder")
            .field("config", &self.config)
            .field("params", &self.params)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::RewritePolicy;

    #[test]
    fn test_default_build() {
        let interceptor = InterceptorBuilder::new().build();
        assert_eq!(interceptor.config().snapshot(), RewriteConfig::default());
        assert!(interceptor.params().is_empty());
    }

    #[test]
    fn test_shared_config_is_not_copied() {
        let shared = SharedConfig::new(RewriteConfig::redirect(r"D:\out"));
        let interceptor = InterceptorBuilder::new().shared_config(shared.clone()).build();

        shared.replace(RewriteConfig::blackhole());
        assert_eq!(interceptor.config().snapshot().policy, RewritePolicy::Blackhole);
    }

    #[test]
    fn test_params_slot_is_shared() {
        let slot = ParamsSlot::new();
        let interceptor = InterceptorBuilder::new().params_slot(slot.clone()).build();

        interceptor.process_inbound_text(
            crate::identifiers::ChannelId::generate(),
            r#"[{"Act":"DO","Fn":"FileFastSave","Pars":["mtempPrt(9,\"T\",1,\"b\",\"f\",\"l\")"]}]"#,
        );
        assert_eq!(slot.latest().map(|p| p.report_id), Some(9));
    }
}
