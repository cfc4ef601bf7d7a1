//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ATELIER_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ATELIER_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ATELIER_PAYMENTS__WEBHOOK_SECRET=...` sets the `payments.webhook_secret` field.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ATELIER_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Public URL of the site, used for payment redirect and cancel links
    pub site_url: String,
    /// Convenience override for `database.url`, normally set via DATABASE_URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// PostgreSQL connection settings
    pub database: DatabaseConfig,
    /// Payment provider settings and the credit pack price list
    pub payments: PaymentsConfig,
    /// Airtable content proxy settings
    pub content: ContentConfig,
    /// Signup abuse protection settings
    pub signup_guard: SignupGuardConfig,
    /// Image generation API key resolution
    pub generation: GenerationConfig,
    /// Email relay transport and sender identity
    pub email: EmailConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// PostgreSQL connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection string for the database
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/atelier".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

/// Connection pool configuration with all SQLx parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
        }
    }
}

/// Payment provider configuration.
///
/// Credentials should be set via environment variables:
/// - `ATELIER_PAYMENTS__API_KEY` - provider API key for charge creation
/// - `ATELIER_PAYMENTS__WEBHOOK_SECRET` - shared secret for webhook signatures
///
/// When `webhook_secret` is unset, webhook signature verification is skipped
/// entirely ("open mode", local testing only).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentsConfig {
    /// Provider API key for creating charges
    pub api_key: Option<String>,
    /// Shared secret for webhook signature verification
    pub webhook_secret: Option<String>,
    /// Provider API base URL (overridable for tests)
    pub api_url: Url,
    /// Fixed price list. Client-supplied amounts must match one of these
    /// exactly; the credited amount always comes from the pack, never from
    /// the client.
    pub packs: Vec<CreditPack>,
}

/// A purchasable credit pack: a fixed USD price and the credits it grants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreditPack {
    pub name: String,
    /// USD amount, matched exactly against the client-supplied amount
    pub amount: Decimal,
    /// Credits granted when a charge for this pack confirms
    pub credits: i32,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            webhook_secret: None,
            api_url: Url::parse("https://api.commerce.coinbase.com").unwrap(),
            packs: vec![
                CreditPack {
                    name: "Starter".to_string(),
                    amount: Decimal::new(500, 2), // 5.00
                    credits: 500,
                },
                CreditPack {
                    name: "Creator".to_string(),
                    amount: Decimal::new(1000, 2), // 10.00
                    credits: 1200,
                },
                CreditPack {
                    name: "Pro".to_string(),
                    amount: Decimal::new(2500, 2), // 25.00
                    credits: 3500,
                },
                CreditPack {
                    name: "Studio".to_string(),
                    amount: Decimal::new(5000, 2), // 50.00
                    credits: 8000,
                },
            ],
        }
    }
}

impl PaymentsConfig {
    /// Find the pack matching a client-supplied amount exactly
    pub fn find_pack(&self, amount: Decimal) -> Option<&CreditPack> {
        self.packs.iter().find(|p| p.amount == amount)
    }
}

/// Airtable content proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Airtable personal access token (set via ATELIER_CONTENT__TOKEN)
    pub token: Option<String>,
    /// Airtable base ID
    pub base_id: String,
    /// Airtable API base URL (overridable for tests)
    pub api_url: Url,
    /// Tables clients are allowed to read through the proxy
    pub allowed_tables: Vec<String>,
    /// Cache-Control max-age for proxied responses (seconds)
    pub cache_max_age: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_id: String::new(),
            api_url: Url::parse("https://api.airtable.com").unwrap(),
            allowed_tables: vec!["Portfolio".to_string(), "Testimonials".to_string(), "Faq".to_string()],
            cache_max_age: 300,
        }
    }
}

/// Signup abuse protection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignupGuardConfig {
    /// Enable the rate check. When false, `check` always answers allowed.
    pub enabled: bool,
    /// Maximum signup attempts per IP or fingerprint within the window
    pub max_attempts: i32,
    /// Sliding window length in hours
    pub window_hours: u64,
}

impl Default for SignupGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            window_hours: 24,
        }
    }
}

impl SignupGuardConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_hours * 3600)
    }
}

/// Image generation API key resolution.
///
/// The key is looked up here first; when unset, the `system_config` table
/// row `generation_api_key` is consulted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
}

/// Email configuration for the transactional relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
// Note: Cannot use deny_unknown_fields here due to #[serde(flatten)] on transport
pub struct EmailConfig {
    /// Email transport method
    #[serde(flatten)]
    pub transport: EmailTransportConfig,
    /// Sender email address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransportConfig::default(),
            from_email: "noreply@example.com".to_string(),
            from_name: "Atelier".to_string(),
        }
    }
}

/// Email transport configuration - either SMTP or file-based for testing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmailTransportConfig {
    /// Send emails via SMTP server
    Smtp {
        /// SMTP server hostname
        host: String,
        /// SMTP server port
        port: u16,
        /// SMTP authentication username
        username: String,
        /// SMTP authentication password
        password: String,
        /// Use TLS encryption
        use_tls: bool,
    },
    /// Write emails to files (for development/testing)
    File {
        /// Directory path where email files will be written
        path: String,
    },
}

impl Default for EmailTransportConfig {
    fn default() -> Self {
        Self::File {
            path: "./emails".to_string(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Url(Url::parse("http://localhost:5173").unwrap())],
            allow_credentials: false,
            max_age: Some(3600),
        }
    }
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            site_url: "http://localhost:5173".to_string(),
            database_url: None,
            database: DatabaseConfig::default(),
            payments: PaymentsConfig::default(),
            content: ContentConfig::default(),
            signup_guard: SignupGuardConfig::default(),
            generation: GenerationConfig::default(),
            email: EmailConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL wins over the YAML connection string
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("ATELIER_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.payments.packs.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: payments.packs cannot be empty. Define at least one credit pack.".to_string(),
            });
        }

        for pack in &self.payments.packs {
            if pack.amount <= Decimal::ZERO || pack.credits <= 0 {
                return Err(Error::Internal {
                    operation: format!(
                        "Config validation: credit pack '{}' must have a positive amount and credits",
                        pack.name
                    ),
                });
            }
        }

        if self.signup_guard.max_attempts < 1 {
            return Err(Error::Internal {
                operation: "Config validation: signup_guard.max_attempts must be at least 1".to_string(),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load_from(jail: &Jail, file: &str) -> Result<Config, figment::Error> {
        let _ = jail;
        let args = Args {
            config: file.to_string(),
            validate: false,
        };
        Config::load(&args)
    }

    #[test]
    fn test_credit_packs_from_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
payments:
  packs:
    - name: Mini
      amount: "3.50"
      credits: 300
"#,
            )?;

            let config = load_from(jail, "test.yaml")?;
            assert_eq!(config.payments.packs.len(), 1);
            assert_eq!(config.payments.packs[0].credits, 300);
            assert_eq!(config.payments.packs[0].amount, Decimal::new(350, 2));
            Ok(())
        });
    }

    #[test]
    fn test_pack_lookup_is_exact() {
        let payments = PaymentsConfig::default();
        assert!(payments.find_pack(Decimal::new(500, 2)).is_some());
        // 5.0 and 5.00 are the same decimal value
        assert!(payments.find_pack(Decimal::new(50, 1)).is_some());
        assert!(payments.find_pack(Decimal::new(5001, 3)).is_none());
    }

    #[test]
    fn test_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 4000\n")?;
            jail.set_env("ATELIER_PORT", "5000");
            jail.set_env("ATELIER_SIGNUP_GUARD__MAX_ATTEMPTS", "9");

            let config = load_from(jail, "test.yaml")?;
            assert_eq!(config.port, 5000);
            assert_eq!(config.signup_guard.max_attempts, 9);
            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
database:
  url: postgres://yaml-host/atelier
"#,
            )?;
            jail.set_env("DATABASE_URL", "postgres://env-host/atelier");

            let config = load_from(jail, "test.yaml")?;
            assert_eq!(config.database.url, "postgres://env-host/atelier");
            Ok(())
        });
    }

    #[test]
    fn test_empty_packs_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
payments:
  packs: []
"#,
            )?;

            let result = load_from(jail, "test.yaml");
            assert!(result.is_err());
            Ok(())
        });
    }

    #[test]
    fn test_wildcard_cors_with_credentials_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
cors:
  allowed_origins: ["*"]
  allow_credentials: true
"#,
            )?;

            let result = load_from(jail, "test.yaml");
            assert!(result.is_err());
            Ok(())
        });
    }
}
