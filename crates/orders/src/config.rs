//! Downstream service locations.

use std::time::Duration;

/// Default menu service base URL.
pub const DEFAULT_MENU_URL: &str = "http://localhost:8000";
/// Default inventory service base URL.
pub const DEFAULT_INVENTORY_URL: &str = "http://localhost:8002";
/// Default billing service base URL.
pub const DEFAULT_BILLING_URL: &str = "http://localhost:8003";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the orchestrator finds the leaf services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrls {
    pub menu: String,
    pub inventory: String,
    pub billing: String,
    /// Applied to every downstream request. No retries are made.
    pub timeout: Duration,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        Self {
            menu: DEFAULT_MENU_URL.to_string(),
            inventory: DEFAULT_INVENTORY_URL.to_string(),
            billing: DEFAULT_BILLING_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceUrls {
    /// Reads `MENU_SERVICE_URL`, `INVENTORY_SERVICE_URL`,
    /// `BILLING_SERVICE_URL` and `HTTP_TIMEOUT_MS` through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            menu: lookup("MENU_SERVICE_URL").unwrap_or(defaults.menu),
            inventory: lookup("INVENTORY_SERVICE_URL").unwrap_or(defaults.inventory),
            billing: lookup("BILLING_SERVICE_URL").unwrap_or(defaults.billing),
            timeout: lookup("HTTP_TIMEOUT_MS")
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Reads the service URLs from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}
