use secure_string::SecureString;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::common::{DEFAULT_HOST, DEFAULT_PORT};
use crate::errors::{ErrorKind, GeoMongoError, GeoMongoResult};

pub const PARAM_HOST: &str = "host";
pub const PARAM_PORT: &str = "port";
pub const PARAM_DATABASE: &str = "database";
pub const PARAM_USER: &str = "user";
pub const PARAM_PASSWORD: &str = "passwd";

/// Describes one connection parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub key: &'static str,
    pub title: &'static str,
    pub required: bool,
    pub default_value: Option<String>,
    pub is_password: bool,
}

/// Where and as whom to connect to a document store.
///
/// The password is kept in a [SecureString], which zeroes its memory on drop
/// and never shows up in `Debug` output.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    host: String,
    port: u16,
    database: String,
    user: Option<String>,
    password: Option<SecureString>,
}

impl ConnectionParams {
    pub fn new(database: &str) -> Self {
        ConnectionParams {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: database.to_string(),
            user: None,
            password: None,
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.user = Some(user.to_string());
        self.password = Some(SecureString::from(password));
        self
    }

    /// Reads the parameters from a key/value map using the keys `host`,
    /// `port`, `database`, `user` and `passwd`. `host` and `port` fall back
    /// to `localhost:27017`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::ValidationError] when `database` is missing or empty and
    /// [ErrorKind::InvalidDataType] when `port` is not a valid port number.
    pub fn from_params(params: &HashMap<String, String>) -> GeoMongoResult<ConnectionParams> {
        let database = match params.get(PARAM_DATABASE) {
            Some(database) if !database.trim().is_empty() => database.trim(),
            _ => {
                log::error!("Missing required connection parameter '{}'", PARAM_DATABASE);
                return Err(GeoMongoError::new(
                    &format!("Missing required connection parameter '{}'", PARAM_DATABASE),
                    ErrorKind::ValidationError,
                ));
            }
        };

        let mut connection = ConnectionParams::new(database);
        if let Some(host) = params.get(PARAM_HOST) {
            connection.host = host.trim().to_string();
        }

        if let Some(port) = params.get(PARAM_PORT) {
            connection.port = port.trim().parse::<u16>().map_err(|e| {
                log::error!("Invalid port '{}': {}", port, e);
                GeoMongoError::new_with_cause(
                    &format!("Invalid port '{}'", port),
                    ErrorKind::InvalidDataType,
                    GeoMongoError::from(e),
                )
            })?;
        }

        connection.user = params.get(PARAM_USER).cloned();
        connection.password = params
            .get(PARAM_PASSWORD)
            .map(|p| SecureString::from(p.as_str()));
        Ok(connection)
    }

    /// The parameters [ConnectionParams::from_params] understands.
    pub fn parameters_info() -> Vec<ParameterInfo> {
        vec![
            ParameterInfo {
                key: PARAM_HOST,
                title: "Host",
                required: true,
                default_value: Some(DEFAULT_HOST.to_string()),
                is_password: false,
            },
            ParameterInfo {
                key: PARAM_PORT,
                title: "Port",
                required: true,
                default_value: Some(DEFAULT_PORT.to_string()),
                is_password: false,
            },
            ParameterInfo {
                key: PARAM_DATABASE,
                title: "Database",
                required: true,
                default_value: None,
                is_password: false,
            },
            ParameterInfo {
                key: PARAM_USER,
                title: "User",
                required: true,
                default_value: None,
                is_password: false,
            },
            ParameterInfo {
                key: PARAM_PASSWORD,
                title: "Password",
                required: false,
                default_value: None,
                is_password: true,
            },
        ]
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.unsecure())
    }

    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }
}

impl Display for ConnectionParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.uri(), self.database)
    }
}
