use crate::rules::RuleTable;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Per-failure-kind retry budget. The default is one retry for every kind;
/// the map exists so a deployment can tighten or loosen individual kinds
/// without touching the driver.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: HashMap<String, usize>,
    pub default_max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let mut max_retries = HashMap::new();
        max_retries.insert("backend".to_string(), 1);
        max_retries.insert("malformed_output".to_string(), 1);
        max_retries.insert("schema_violation".to_string(), 1);

        Self {
            max_retries,
            default_max_retries: 1,
        }
    }
}

impl RetryConfig {
    pub fn retries_for(&self, kind: &str) -> usize {
        self.max_retries
            .get(kind)
            .copied()
            .unwrap_or(self.default_max_retries)
    }
}

/// Everything tunable about one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub rules: RuleTable,
    pub retry: RetryConfig,
    /// A backend call not resolving within this window is treated as a
    /// failure and follows the same fallback path as a validation failure.
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rules: RuleTable::default(),
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// Trait for clients that read their API key from the environment,
/// consulting `.env` first.
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Find the API key by checking environment variables first, then .env file
    fn find_key() -> Option<String> {
        // First try to load .env file (silently fail if not found)
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME).ok()
    }
}
