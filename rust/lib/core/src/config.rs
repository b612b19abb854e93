use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Runtime configuration shared by the client library and the CLI.
///
/// The CLI builds one from its context file and command-line flags, then
/// hands it to the REST client and the pending-orders store.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Backend base URL, e.g. `http://localhost:3000/api`.
    pub server: String,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Upper bound on concurrent per-unit requests during a batch action.
    pub max_in_flight: usize,

    /// Maximum number of cached query results.
    pub cache_capacity: u64,

    /// How long a cached query result stays fresh without invalidation.
    pub cache_ttl: Duration,

    /// Directory for local state (pending-orders database).
    pub data_dir: Option<PathBuf>,

    /// Path to the pending-orders database.
    /// Defaults to `{data_dir}/cart.redb` if not specified.
    pub cart_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:3000/api".to_string(),
            request_timeout: Duration::from_secs(30),
            max_in_flight: 8,
            cache_capacity: 1_000,
            cache_ttl: Duration::from_secs(300),
            data_dir: None,
            cart_path: None,
        }
    }
}

impl TrackerConfig {
    /// Parse configuration from command-line style arguments.
    ///
    /// Supported flags:
    /// - `--server=URL`
    /// - `--timeout-secs=N`
    /// - `--max-in-flight=N`
    /// - `--cache-capacity=N`
    /// - `--cache-ttl-secs=N`
    /// - `--data-dir=PATH`
    /// - `--cart=PATH`
    ///
    /// Unknown flags are ignored; unparsable numbers keep the default.
    pub fn from_args(args: &[String]) -> Self {
        let mut config = TrackerConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--server=") {
                config.server = val.trim_end_matches('/').to_string();
            } else if let Some(val) = arg.strip_prefix("--timeout-secs=") {
                if let Some(n) = parse_number("timeout-secs", val) {
                    config.request_timeout = Duration::from_secs(n);
                }
            } else if let Some(val) = arg.strip_prefix("--max-in-flight=") {
                if let Some(n) = parse_number("max-in-flight", val) {
                    config.max_in_flight = (n as usize).max(1);
                }
            } else if let Some(val) = arg.strip_prefix("--cache-capacity=") {
                if let Some(n) = parse_number("cache-capacity", val) {
                    config.cache_capacity = n;
                }
            } else if let Some(val) = arg.strip_prefix("--cache-ttl-secs=") {
                if let Some(n) = parse_number("cache-ttl-secs", val) {
                    config.cache_ttl = Duration::from_secs(n);
                }
            } else if let Some(val) = arg.strip_prefix("--data-dir=") {
                config.data_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--cart=") {
                config.cart_path = Some(PathBuf::from(val));
            }
        }

        config
    }

    /// Resolve the pending-orders database path, falling back to `{data_dir}/cart.redb`.
    pub fn resolve_cart_path(&self) -> PathBuf {
        self.cart_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("cart.redb"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

fn parse_number(flag: &str, val: &str) -> Option<u64> {
    match val.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(flag, value = val, "ignoring non-numeric flag value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args() {
        let args = vec![
            "--server=http://mes.local/api/".to_string(),
            "--max-in-flight=3".to_string(),
            "--timeout-secs=5".to_string(),
            "--data-dir=/tmp/h10cm".to_string(),
        ];
        let config = TrackerConfig::from_args(&args);
        assert_eq!(config.server, "http://mes.local/api");
        assert_eq!(config.max_in_flight, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/h10cm")));
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let args = vec![
            "--max-in-flight=lots".to_string(),
            "--cache-ttl-secs=0".to_string(),
        ];
        let config = TrackerConfig::from_args(&args);
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn zero_in_flight_is_clamped() {
        let config = TrackerConfig::from_args(&["--max-in-flight=0".to_string()]);
        assert_eq!(config.max_in_flight, 1);
    }

    #[test]
    fn test_resolve_defaults() {
        let config = TrackerConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(config.resolve_cart_path(), PathBuf::from("/data/cart.redb"));

        let config = TrackerConfig {
            cart_path: Some(PathBuf::from("/elsewhere/orders.redb")),
            ..config
        };
        assert_eq!(config.resolve_cart_path(), PathBuf::from("/elsewhere/orders.redb"));
    }
}
