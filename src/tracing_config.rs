//! Log output for the standin engine.
//!
//! The solver only emits `tracing` events; this module installs a subscriber
//! for them. Set `STANDIN_LOG` (or `RUST_LOG`) to enable it and
//! `STANDIN_LOG_FORMAT` to pick the layout:
//!
//! - `text` (default): flat `fmt` lines
//! - `tree`: nested spans via `tracing-tree`, one indent per substitution depth
//! - `json`: one JSON object per event
//!
//! ```bash
//! STANDIN_LOG=standin_solver::standin=trace STANDIN_LOG_FORMAT=tree cargo test
//! STANDIN_LOG=debug STANDIN_LOG_FORMAT=json cargo bench
//! ```
//!
//! Nothing is installed when neither variable is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

const LOG_VAR: &str = "STANDIN_LOG";
const LOG_FORMAT_VAR: &str = "STANDIN_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Unknown values fall back to [`LogFormat::Text`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => LogFormat::Tree,
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_VAR)
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default()
    }
}

/// `STANDIN_LOG` wins over `RUST_LOG`; both use the `RUST_LOG` directive syntax.
fn build_filter() -> Option<EnvFilter> {
    match std::env::var(LOG_VAR) {
        Ok(directives) => Some(EnvFilter::builder().parse_lossy(directives)),
        Err(_) if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() => {
            Some(EnvFilter::from_default_env())
        }
        Err(_) => None,
    }
}

/// Install the global subscriber, writing to stderr.
///
/// Returns whether a subscriber was installed by this call. Safe to call
/// repeatedly (from every test, for instance): later calls are no-ops.
pub fn init_tracing() -> bool {
    let Some(filter) = build_filter() else {
        return false;
    };

    let format = LogFormat::from_env();
    let installed = match format {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::new(2)
                .with_writer(std::io::stderr)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_targets(true);
            Registry::default().with(filter).with(tree_layer).try_init().is_ok()
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(json_layer).try_init().is_ok()
        }
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok(),
    };
    if installed {
        tracing::debug!(?format, "standin tracing initialised");
    }
    installed
}
