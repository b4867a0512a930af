//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use orders::ServiceUrls;

/// Which services a process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceKind {
    Menu,
    Orders,
    Inventory,
    Billing,
    /// Every service in one process, with the orchestrator calling the
    /// other services in-process.
    #[default]
    All,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Menu => "menu",
            ServiceKind::Orders => "orders",
            ServiceKind::Inventory => "inventory",
            ServiceKind::Billing => "billing",
            ServiceKind::All => "all",
        }
    }

    /// Port used when `PORT` is not set.
    pub fn default_port(&self) -> u16 {
        match self {
            ServiceKind::Menu => 8000,
            ServiceKind::Orders => 8001,
            ServiceKind::Inventory => 8002,
            ServiceKind::Billing => 8003,
            ServiceKind::All => 3000,
        }
    }

    /// Returns true if this process serves `other`.
    pub fn serves(&self, other: ServiceKind) -> bool {
        *self == ServiceKind::All || *self == other
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "menu" => Ok(ServiceKind::Menu),
            "orders" => Ok(ServiceKind::Orders),
            "inventory" => Ok(ServiceKind::Inventory),
            "billing" => Ok(ServiceKind::Billing),
            "all" | "" => Ok(ServiceKind::All),
            other => Err(ConfigError::UnknownService(other.to_string())),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown SERVICE '{0}', expected menu, orders, inventory, billing or all")]
    UnknownService(String),

    #[error("Invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// Default stock given to items the inventory has never seen.
pub const DEFAULT_STOCK: u32 = 100;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default depends on `SERVICE`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON lines, anything else for plain text
/// - `SERVICE`: `menu`, `orders`, `inventory`, `billing` or `all` (default)
/// - `MENU_SERVICE_URL`, `INVENTORY_SERVICE_URL`, `BILLING_SERVICE_URL`,
///   `HTTP_TIMEOUT_MS`: where the orchestrator finds the other services
/// - `ORDERS_SERVICE_URL`: where billing sends its callbacks
/// - `DEFAULT_STOCK`: stock for unknown items, `none` to refuse them
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub service: ServiceKind,
    pub services: ServiceUrls,
    pub orders_url: String,
    pub default_stock: Option<u32>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let service: ServiceKind = lookup("SERVICE")
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();

        let port = match lookup("PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: port,
            })?,
            None => service.default_port(),
        };

        let default_stock = match lookup("DEFAULT_STOCK") {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            Some(value) => Some(value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "DEFAULT_STOCK",
                value,
            })?),
            None => Some(DEFAULT_STOCK),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format,
            service,
            services: ServiceUrls::from_lookup(&lookup),
            orders_url: lookup("ORDERS_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:8001".to_string()),
            default_stock,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the timeout applied to outbound HTTP calls.
    pub fn http_timeout(&self) -> Duration {
        self.services.timeout
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: ServiceKind::All.default_port(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            service: ServiceKind::All,
            services: ServiceUrls::default(),
            orders_url: "http://localhost:8001".to_string(),
            default_stock: Some(DEFAULT_STOCK),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let env: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |name| env.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_default_values() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.service, ServiceKind::All);
        assert_eq!(config.default_stock, Some(100));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_port_follows_service() {
        let config = Config::from_lookup(lookup(&[("SERVICE", "inventory")])).unwrap();
        assert_eq!(config.port, 8002);

        let config =
            Config::from_lookup(lookup(&[("SERVICE", "billing"), ("PORT", "9000")])).unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("LOG_FORMAT", "JSON"),
            ("DEFAULT_STOCK", "none"),
            ("INVENTORY_SERVICE_URL", "http://inventory:8002"),
            ("ORDERS_SERVICE_URL", "http://orders:8001"),
        ]))
        .unwrap();

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_stock, None);
        assert_eq!(config.services.inventory, "http://inventory:8002");
        assert_eq!(config.orders_url, "http://orders:8001");
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[("SERVICE", "kitchen")])).unwrap_err(),
            ConfigError::UnknownService("kitchen".to_string())
        );
        assert!(matches!(
            Config::from_lookup(lookup(&[("PORT", "http")])),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_serves() {
        assert!(ServiceKind::All.serves(ServiceKind::Billing));
        assert!(ServiceKind::Menu.serves(ServiceKind::Menu));
        assert!(!ServiceKind::Menu.serves(ServiceKind::Orders));
    }
}
