//! Engine and terminal configuration.
//!
//! Both configs are plain structs with `Default` impls; `EngineConfig::from_env`
//! lets binaries tune the flush guard without recompiling.

use std::time::Duration;

/// Environment variable read by [`EngineConfig::from_env`].
pub const MAX_FLUSH_TASKS_ENV: &str = "SPARK_DOM_MAX_FLUSH_TASKS";

const DEFAULT_MAX_FLUSH_TASKS: usize = 10_000;

/// Per-engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound on tasks executed by one `flush` call.
    pub max_flush_tasks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_flush_tasks: DEFAULT_MAX_FLUSH_TASKS,
        }
    }
}

impl EngineConfig {
    /// Defaults, overridden by `SPARK_DOM_MAX_FLUSH_TASKS` when it parses.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_FLUSH_TASKS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(limit) if limit > 0 => config.max_flush_tasks = limit,
                _ => log::warn!("ignoring {MAX_FLUSH_TASKS_ENV}={raw:?}: expected a positive integer"),
            }
        }
        config
    }

    /// Builder-style override of the flush guard.
    pub fn with_max_flush_tasks(mut self, limit: usize) -> Self {
        self.max_flush_tasks = limit.max(1);
        self
    }
}

/// Terminal mount settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountConfig {
    /// How long one `tick` waits for input.
    pub tick: Duration,
    /// Capture mouse events (clicks become `click` events).
    pub mouse_capture: bool,
    /// Stop the loop on Ctrl+C.
    pub exit_on_ctrl_c: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16),
            mouse_capture: true,
            exit_on_ctrl_c: true,
        }
    }
}
