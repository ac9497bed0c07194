//! Runtime settings read from the environment (and `.env`).

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_BOND_LIMIT: usize = 5000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base: String,
    pub bond_limit: usize,
    /// `None` means requests may hang indefinitely.
    pub http_timeout: Option<Duration>,
    /// Stored theme preference (`light` / `dark`), if any.
    pub theme: Option<String>,
    pub log_file: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bond_limit: DEFAULT_BOND_LIMIT,
            http_timeout: None,
            theme: None,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (the environment in
    /// production, a map in tests). Unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        Self {
            api_base: non_empty("PRISM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bond_limit: non_empty("PRISM_BOND_LIMIT")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(DEFAULT_BOND_LIMIT),
            http_timeout: non_empty("PRISM_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|&secs| secs > 0)
                .map(Duration::from_secs),
            theme: non_empty("PRISM_THEME"),
            log_file: non_empty("PRISM_LOG_FILE"),
        }
    }

    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        self
    }

    pub fn with_bond_limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.bond_limit = limit;
        }
        self
    }
}
