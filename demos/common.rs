//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub url: String,
    pub download_base: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    ///
    /// The first positional argument is the WebSocket URL.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();

        let url = args
            .iter()
            .find(|a| !a.starts_with("--"))
            .cloned()
            .unwrap_or_else(|| "ws://127.0.0.1:9000/socket".to_string());

        let download_base = args
            .iter()
            .find_map(|a| a.strip_prefix("--download-base="))
            .map(String::from);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url,
            download_base,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "ws_interceptor=debug"
    } else {
        "ws_interceptor=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
