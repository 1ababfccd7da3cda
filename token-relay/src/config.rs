//! Relay configuration from `TOKEN_RELAY_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_HOST: &str = "TOKEN_RELAY_HOST";
pub const ENV_PORT: &str = "TOKEN_RELAY_PORT";
pub const ENV_TOKEN_FILE: &str = "TOKEN_RELAY_TOKEN_FILE";
pub const ENV_LOGIN_SCRIPT: &str = "TOKEN_RELAY_LOGIN_SCRIPT";
pub const ENV_PYTHON: &str = "TOKEN_RELAY_PYTHON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Plain-text file holding the access token written by the login tool
    pub token_file: PathBuf,
    /// Desktop login tool started by `launch-login-tool`
    pub login_script: PathBuf,
    /// Interpreter used to run `login_script`
    pub python: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            token_file: PathBuf::from("access_token.txt"),
            login_script: PathBuf::from("login_gui_new.py"),
            python: "python".to_string(),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset, blank or unparsable values keep the
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            host: get(ENV_HOST).unwrap_or(defaults.host),
            port: get(ENV_PORT)
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            token_file: get(ENV_TOKEN_FILE)
                .map(PathBuf::from)
                .unwrap_or(defaults.token_file),
            login_script: get(ENV_LOGIN_SCRIPT)
                .map(PathBuf::from)
                .unwrap_or(defaults.login_script),
            python: get(ENV_PYTHON).unwrap_or(defaults.python),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(|_| None);
        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_PORT, "4100"),
            (ENV_TOKEN_FILE, "/tmp/token.txt"),
            (ENV_PYTHON, "python3"),
            (ENV_HOST, "  "),
        ]
        .into_iter()
        .collect();

        let config = RelayConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.port, 4100);
        assert_eq!(config.token_file, PathBuf::from("/tmp/token.txt"));
        assert_eq!(config.python, "python3");
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_bad_port_keeps_default() {
        let config = RelayConfig::from_lookup(|key| (key == ENV_PORT).then(|| "http".to_string()));
        assert_eq!(config.port, 3000);
    }
}
