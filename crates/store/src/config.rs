//! Store connection configuration.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;

use crate::engine::Deadline;
use crate::{Result, StoreError};

/// Pool ceiling unless configured.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_OP_TIMEOUT_SECS: u64 = 30;

/// One store: UNIX socket, credentials and database name.
///
/// Loadable from TOML:
///
/// ```toml
/// socket = "/run/mysqld/mysqld.sock"
/// username = "web"
/// password = "secret"
/// database = "site"
/// op_timeout_secs = 10
/// ```
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    pub socket: PathBuf,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// Default deadline for each operation; `0` disables it.
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

fn default_acquire_timeout_secs() -> u64 {
    DEFAULT_ACQUIRE_TIMEOUT_SECS
}

fn default_op_timeout_secs() -> u64 {
    DEFAULT_OP_TIMEOUT_SECS
}

impl StoreConfig {
    pub fn new(
        socket: impl Into<PathBuf>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            socket: socket.into(),
            username: username.into(),
            password: password.into(),
            database: database.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            op_timeout_secs: DEFAULT_OP_TIMEOUT_SECS,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| StoreError::Config(format!("invalid TOML: {e}")))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// `user:***@unix(socket)/database`, safe to log.
    pub fn dsn_redacted(&self) -> String {
        format!(
            "{}:***@unix({})/{}",
            self.username,
            self.socket.display(),
            self.database
        )
    }

    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .socket(&self.socket)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// A fresh deadline `op_timeout_secs` from now.
    pub fn deadline(&self) -> Deadline {
        match self.op_timeout_secs {
            0 => Deadline::none(),
            secs => Deadline::after(Duration::from_secs(secs)),
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("socket", &self.socket)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("op_timeout_secs", &self.op_timeout_secs)
            .finish()
    }
}
