//! Configuration for the linecho server and client.
//!
//! Supports command-line arguments, environment variables and a TOML
//! configuration file. CLI arguments take precedence over the environment,
//! which takes precedence over config file values.

use crate::error::Error;
use crate::protocol::DEFAULT_PORT;
use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "linecho-server")]
#[command(author = "linecho authors")]
#[command(version = "0.1.0")]
#[command(about = "Serve one client, echoing each line back as \"Sent: <line>\"", long_about = None)]
pub struct ServerArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:1234)
    #[arg(short = 'l', long, env = "LINECHO_LISTEN")]
    pub listen: Option<String>,

    /// Log level (trace, debug, info, warn, error); "info" defers to the
    /// config file's [logging] level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Command-line arguments for the console client
#[derive(Parser, Debug)]
#[command(name = "linecho-client")]
#[command(author = "linecho authors")]
#[command(version = "0.1.0")]
#[command(about = "Send console lines to a linecho server until \"Exit\"", long_about = None)]
pub struct ClientArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server address to connect to (e.g., 192.168.43.31:1234)
    #[arg(short = 'C', long, env = "LINECHO_CONNECT")]
    pub connect: Option<String>,

    /// Log level (trace, debug, info, warn, error); "info" defers to the
    /// config file's [logging] level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
///
/// One file may carry both the `[server]` and the `[client]` table.
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Address to bind to
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Client-related configuration
#[derive(Debug, Deserialize)]
pub struct ClientSection {
    /// Address of the server
    #[serde(default = "default_connect")]
    pub connect: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            connect: default_connect(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:1234".to_string()
}

fn default_connect() -> String {
    "127.0.0.1:1234".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: String,
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from CLI args, environment and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ServerArgs::parse())
    }

    /// Merge already-parsed arguments with the TOML file they point at.
    pub fn from_args(args: ServerArgs) -> Result<Self, ConfigError> {
        let toml_config = load_toml(args.config.as_deref())?;

        Ok(ServerConfig {
            listen: args.listen.unwrap_or(toml_config.server.listen),
            log_level: merge_log_level(args.log_level, toml_config.logging.level),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_level: default_log_level(),
        }
    }
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect: String,
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from CLI args, environment and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(ClientArgs::parse())
    }

    /// Merge already-parsed arguments with the TOML file they point at.
    pub fn from_args(args: ClientArgs) -> Result<Self, ConfigError> {
        let toml_config = load_toml(args.config.as_deref())?;

        Ok(ClientConfig {
            connect: args.connect.unwrap_or(toml_config.client.connect),
            log_level: merge_log_level(args.log_level, toml_config.logging.level),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect: default_connect(),
            log_level: default_log_level(),
        }
    }
}

fn load_toml(path: Option<&Path>) -> Result<TomlConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::TomlParse(path.to_path_buf(), e))
}

// The CLI default is "info", so only a non-default flag beats the file.
fn merge_log_level(cli: String, file: String) -> String {
    if cli != "info" {
        cli
    } else {
        file
    }
}

/// Resolve a configured address to the first matching socket address.
///
/// A bare IP (bracketed or not) or host name without a port gets
/// [`DEFAULT_PORT`].
pub fn resolve_addr(addr: &str) -> Result<SocketAddr, Error> {
    let bare = addr
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(addr);
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    let resolved = match addr.to_socket_addrs() {
        Ok(iter) => Some(iter),
        Err(_) if !addr.contains(':') => (addr, DEFAULT_PORT).to_socket_addrs().ok(),
        Err(_) => None,
    };

    resolved
        .and_then(|mut iter| iter.next())
        .ok_or_else(|| Error::InvalidAddress(addr.to_string()))
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::sync::{Mutex, MutexGuard};

    // Serializes every test that parses arguments, since clap reads the
    // LINECHO_* variables from the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets an environment variable for the lifetime of the guard.
    struct EnvVar {
        name: &'static str,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvVar {
        fn set(name: &'static str, value: &str) -> Self {
            let lock = env_lock();
            std::env::set_var(name, value);
            EnvVar { name, _lock: lock }
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            std::env::remove_var(self.name);
        }
    }

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.listen, "0.0.0.0:1234");
        assert_eq!(config.client.connect, "127.0.0.1:1234");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            listen = "127.0.0.1:4000"

            [client]
            connect = "192.168.43.31:1234"

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:4000");
        assert_eq!(config.client.connect, "192.168.43.31:1234");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str("[client]\nconnect = \"10.0.0.1:1234\"\n").unwrap();
        assert_eq!(config.client.connect, "10.0.0.1:1234");
        assert_eq!(config.server.listen, "0.0.0.0:1234");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let _lock = env_lock();
        let args = ServerArgs::try_parse_from(["linecho-server", "--listen", "127.0.0.1:0"]).unwrap();
        let config = ServerConfig::from_args(args).unwrap();
        assert_eq!(config.listen, "127.0.0.1:0");
        assert_eq!(config.log_level, "info");

        let args = ClientArgs::try_parse_from([
            "linecho-client",
            "--connect",
            "10.1.2.3:1234",
            "--log-level",
            "trace",
        ])
        .unwrap();
        let config = ClientConfig::from_args(args).unwrap();
        assert_eq!(config.connect, "10.1.2.3:1234");
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_file_values_and_cli_precedence() {
        let _lock = env_lock();
        let path = std::env::temp_dir().join(format!("linecho-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[server]\nlisten = \"127.0.0.1:5555\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let args = ServerArgs::try_parse_from(["linecho-server", "-c", path.to_str().unwrap()]).unwrap();
        let config = ServerConfig::from_args(args).unwrap();
        assert_eq!(config.listen, "127.0.0.1:5555");
        assert_eq!(config.log_level, "warn");

        let args = ServerArgs::try_parse_from([
            "linecho-server",
            "-c",
            path.to_str().unwrap(),
            "-l",
            "127.0.0.1:6666",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = ServerConfig::from_args(args).unwrap();
        assert_eq!(config.listen, "127.0.0.1:6666");
        assert_eq!(config.log_level, "debug");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_resolve_addr() {
        let addr = resolve_addr("127.0.0.1:4321").unwrap();
        assert_eq!(addr, "127.0.0.1:4321".parse::<SocketAddr>().unwrap());

        let addr = resolve_addr("192.168.43.31").unwrap();
        assert_eq!(addr, "192.168.43.31:1234".parse::<SocketAddr>().unwrap());

        let addr = resolve_addr("::1").unwrap();
        assert_eq!(addr, "[::1]:1234".parse::<SocketAddr>().unwrap());

        let addr = resolve_addr("[::1]:80").unwrap();
        assert_eq!(addr.port(), 80);

        assert!(matches!(
            resolve_addr("127.0.0.1:notaport"),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_env_sits_between_cli_and_file() {
        let path = std::env::temp_dir().join(format!("linecho-env-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[server]\nlisten = \"127.0.0.1:5555\"\n[client]\nconnect = \"127.0.0.1:5556\"\n",
        )
        .unwrap();
        let file = path.to_str().unwrap();

        {
            let _env = EnvVar::set("LINECHO_LISTEN", "10.9.9.9:77");

            let args = ServerArgs::try_parse_from(["linecho-server", "-c", file]).unwrap();
            assert_eq!(ServerConfig::from_args(args).unwrap().listen, "10.9.9.9:77");

            let args =
                ServerArgs::try_parse_from(["linecho-server", "-c", file, "-l", "1.2.3.4:5"]).unwrap();
            assert_eq!(ServerConfig::from_args(args).unwrap().listen, "1.2.3.4:5");
        }

        {
            let _env = EnvVar::set("LINECHO_CONNECT", "10.9.9.9:78");

            let args = ClientArgs::try_parse_from(["linecho-client", "-c", file]).unwrap();
            assert_eq!(ClientConfig::from_args(args).unwrap().connect, "10.9.9.9:78");

            let args =
                ClientArgs::try_parse_from(["linecho-client", "-c", file, "-C", "1.2.3.4:6"]).unwrap();
            assert_eq!(ClientConfig::from_args(args).unwrap().connect, "1.2.3.4:6");
        }

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_resolve_bare_host_and_bracketed_ip() {
        let addr = resolve_addr("localhost").unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), DEFAULT_PORT);

        let addr = resolve_addr("[::1]").unwrap();
        assert_eq!(addr, "[::1]:1234".parse::<SocketAddr>().unwrap());

        assert!(matches!(resolve_addr("[::1"), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_info_log_level_defers_to_file() {
        let _lock = env_lock();
        let path = std::env::temp_dir().join(format!("linecho-level-{}.toml", std::process::id()));
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let args = ServerArgs::try_parse_from([
            "linecho-server",
            "-c",
            path.to_str().unwrap(),
            "--log-level",
            "info",
        ])
        .unwrap();
        assert_eq!(ServerConfig::from_args(args).unwrap().log_level, "debug");
        std::fs::remove_file(&path).unwrap();

        let help = ServerArgs::command().render_long_help().to_string();
        assert!(help.contains("defers"));
        let help = ClientArgs::command().render_long_help().to_string();
        assert!(help.contains("defers"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let path = PathBuf::from("/nonexistent/linecho.toml");
        let err = load_toml(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
        assert!(err.to_string().contains("/nonexistent/linecho.toml"));
    }

    #[test]
    fn test_bad_toml_is_reported() {
        let path = std::env::temp_dir().join(format!("linecho-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[server\nlisten = 1").unwrap();
        let err = load_toml(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(..)));
        std::fs::remove_file(&path).unwrap();
    }
}
