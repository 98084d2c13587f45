use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use validator::{Validate, ValidationError};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default, env_parse};

const BLANK: &str = "cannot be blank";

/// One DNS label: starts with an alphanumeric or underscore, at most 63 characters
static DNS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62}(\.[a-zA-Z0-9_][a-zA-Z0-9_-]{0,62})*[._]?$")
        .expect("DNS name pattern is valid")
});

/// MongoDB connection settings
///
/// Field names double as the external keys used in error reports and serialized documents.
/// `conn_timeout` is serialized as a number of milliseconds.
///
/// # Example
///
/// ```ignore
/// use mongo_store::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig {
///     host: "localhost".into(),
///     port: "27017".into(),
///     db: "app".into(),
///     username: "root".into(),
///     password: "secret".into(),
///     conn_timeout: Duration::from_secs(5),
///     pool_size: 5,
/// };
/// config.check()?;
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct StoreConfig {
    /// Server hostname or IP literal
    #[validate(custom(function = "validate_host"))]
    pub host: String,

    /// Server port, kept as text so malformed input can be reported
    #[validate(custom(function = "validate_port"))]
    pub port: String,

    /// Target database name
    #[validate(length(min = 1, message = "cannot be blank"))]
    pub db: String,

    #[validate(length(min = 1, message = "cannot be blank"))]
    pub username: String,

    #[validate(length(min = 1, message = "cannot be blank"))]
    pub password: String,

    /// Deadline for connecting and the initial ping
    #[serde(with = "duration_ms")]
    #[validate(custom(function = "validate_conn_timeout"))]
    pub conn_timeout: Duration,

    /// Minimum pool size handed to the driver
    #[validate(range(min = 1, message = "cannot be blank"))]
    pub pool_size: u64,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &"***")
            .field("conn_timeout", &self.conn_timeout)
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

impl StoreConfig {
    /// Check every field and collect all violations
    ///
    /// Each failing field appears once in the result, keyed by its external name.
    pub fn check(&self) -> Result<(), ConfigViolations> {
        self.validate().map_err(ConfigViolations::from)
    }

    /// Format the MongoDB connection string
    ///
    /// Pure formatting: no escaping and no validation, so it can be called on any config.
    pub fn connection_string(&self) -> String {
        format!(
            "mongodb://{}:{}@{}:{}/{}?ssl=false&authSource=admin",
            self.username, self.password, self.host, self.port, self.db
        )
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// IP literal or DNS name
fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.is_empty() {
        return Err(invalid("required", BLANK));
    }
    if is_host(host) {
        Ok(())
    } else {
        Err(invalid("host", "must be a valid host"))
    }
}

fn is_host(host: &str) -> bool {
    if host.parse::<IpAddr>().is_ok() {
        return true;
    }
    host.chars().filter(|c| *c != '.').count() <= 255 && DNS_NAME.is_match(host)
}

/// Decimal port number in 1..=65535
fn validate_port(port: &str) -> Result<(), ValidationError> {
    if port.is_empty() {
        return Err(invalid("required", BLANK));
    }
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(invalid("port", "must be a valid port number")),
    }
}

fn validate_conn_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(invalid("required", BLANK));
    }
    Ok(())
}

/// Configuration violations keyed by field name
///
/// Holds one human-readable message per failing field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigViolations(BTreeMap<String, String>);

impl ConfigViolations {
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Message reported for `field`, if it failed
    pub fn message(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<validator::ValidationErrors> for ConfigViolations {
    fn from(errors: validator::ValidationErrors) -> Self {
        let violations = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                let first = errs.first()?;
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                Some((field.to_string(), message))
            })
            .collect();
        ConfigViolations(violations)
    }
}

impl fmt::Display for ConfigViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigViolations {}

/// Load StoreConfig from environment variables
///
/// - `MONGO_HOST`, `MONGO_DB`, `MONGO_USERNAME`, `MONGO_PASSWORD` - empty when unset
/// - `MONGO_PORT` (default: 27017)
/// - `MONGO_CONN_TIMEOUT_MS` (default: 10000)
/// - `MONGO_POOL_SIZE` (default: 5)
///
/// Unset strings are left empty so that [`StoreConfig::check`] reports all of them together.
#[cfg(feature = "config")]
impl FromEnv for StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let conn_timeout_ms: u64 = env_parse("MONGO_CONN_TIMEOUT_MS", 10_000)?;

        Ok(Self {
            host: env_or_default("MONGO_HOST", ""),
            port: env_or_default("MONGO_PORT", "27017"),
            db: env_or_default("MONGO_DB", ""),
            username: env_or_default("MONGO_USERNAME", ""),
            password: env_or_default("MONGO_PASSWORD", ""),
            conn_timeout: Duration::from_millis(conn_timeout_ms),
            pool_size: env_parse("MONGO_POOL_SIZE", 5)?,
        })
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
