use config::ConfigError;
use std::str::FromStr;
use std::time::Duration;

use crate::extraction::TenantDatabase;
use crate::retry::RetryPolicy;

/// Tenant databases reconciled when `TENANT_DATABASES` is not set, in order
pub const DEFAULT_TENANT_DATABASES: [&str; 8] = [
    "portal_calera",
    "portal_cholchol",
    "portal_curacautin",
    "portal_maipo",
    "portal_olivar",
    "portal_pichidegua",
    "portal_pirque",
    "portal_rengo",
];

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub pool_size: u32,
    pub connect_timeout: Duration,
    pub tenants: Vec<TenantDatabase>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Hard verification failures tolerated before the run aborts
    pub max_failures: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    /// Login for the relay, also used as the sender address
    pub user: String,
    pub password: String,
    pub receiver: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub mail: MailConfig,
    pub extraction_retry: RetryPolicy,
    pub verification_retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::NotFound(key.into()));

        let tenants = match lookup("TENANT_DATABASES") {
            Some(list) => parse_tenants(&list)?,
            None => DEFAULT_TENANT_DATABASES
                .iter()
                .map(|name| TenantDatabase::from(*name))
                .collect(),
        };

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            port: parse_or("DB_PORT", lookup("DB_PORT"), 3306)?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            pool_size: parse_or("DB_POOL_SIZE", lookup("DB_POOL_SIZE"), 4)?,
            connect_timeout: Duration::from_secs(parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                lookup("DB_CONNECT_TIMEOUT_SECS"),
                30,
            )?),
            tenants,
        };

        let api = ApiConfig {
            base_url: required("TBK_URL")?,
            max_failures: parse_value("TBK_MAX_FAILURES", &required("TBK_MAX_FAILURES")?)?,
            timeout: Duration::from_secs(20),
        };

        let mail = MailConfig {
            server: required("EMAIL_SERVER")?,
            port: parse_value("EMAIL_PORT", &required("EMAIL_PORT")?)?,
            user: required("EMAIL_USER")?,
            password: required("EMAIL_PASSWORD")?,
            receiver: required("EMAIL_RECEIVER")?,
            timeout: Duration::from_secs(30),
        };

        Ok(Self {
            database,
            api,
            mail,
            extraction_retry: RetryPolicy::extraction(),
            verification_retry: RetryPolicy::verification(),
        })
    }
}

/// Comma separated tenant list; blanks are skipped, order is kept
pub fn parse_tenants(list: &str) -> Result<Vec<TenantDatabase>, ConfigError> {
    let tenants: Vec<TenantDatabase> = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(TenantDatabase::from)
        .collect();

    if tenants.is_empty() {
        return Err(ConfigError::Message(
            "TENANT_DATABASES must name at least one database".to_string(),
        ));
    }
    Ok(tenants)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Message(format!("{} has an invalid value: {:?}", key, raw)))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
