use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings loaded from `isobridge.yaml`.
///
/// Every section falls back to its defaults when absent, so a partial file
/// (or no file at all) is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub runtime: RuntimeSettings,

    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Worker threads of the tokio pool running bridged operations.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,

    /// Bound of each domain's admission queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Simulated latency of the mock data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_user_delay_ms")]
    pub user_delay_ms: u64,

    #[serde(default = "default_posts_delay_ms")]
    pub posts_delay_ms: u64,
}

impl SourceSettings {
    pub fn user_delay(&self) -> Duration {
        Duration::from_millis(self.user_delay_ms)
    }

    pub fn posts_delay(&self) -> Duration {
        Duration::from_millis(self.posts_delay_ms)
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            user_delay_ms: default_user_delay_ms(),
            posts_delay_ms: default_posts_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_search_latency_ms")]
    pub latency_ms: u64,
}

impl SearchSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            latency_ms: default_search_latency_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_dir")]
    pub dir: String,

    #[serde(default = "default_log_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_console")]
    pub console: bool,

    /// Write the log file as JSON lines instead of text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            prefix: default_log_prefix(),
            debug: false,
            console: default_console(),
            json: false,
        }
    }
}

fn default_worker_threads() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_user_delay_ms() -> u64 {
    500
}

fn default_posts_delay_ms() -> u64 {
    600
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_search_latency_ms() -> u64 {
    200
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_prefix() -> String {
    "isobridge".to_string()
}

fn default_console() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.runtime.worker_threads, 4);
        assert_eq!(settings.source.user_delay(), Duration::from_millis(500));
        assert_eq!(settings.source.posts_delay(), Duration::from_millis(600));
        assert_eq!(settings.search.debounce(), Duration::from_millis(300));
        assert_eq!(settings.logging.prefix, "isobridge");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "runtime:\n  queue_capacity: 8\nsource:\n  user_delay_ms: 10\n";
        let settings: Settings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.runtime.queue_capacity, 8);
        assert_eq!(settings.runtime.worker_threads, 4);
        assert_eq!(settings.source.user_delay_ms, 10);
        assert_eq!(settings.source.posts_delay_ms, 600);
        assert_eq!(settings.logging, LoggingSettings::default());
    }
}
