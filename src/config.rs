//! Settings resolution for an export run.
//!
//! Settings are layered: built-in defaults, then the daemon's own config
//! file when one exists, then command-line flags, which take precedence.
//! Once resolved the settings are immutable for the rest of the run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Name of the daemon config file inside the app data directory.
pub const DAEMON_CONF_NAME: &str = "dcrd.conf";

/// Name of the daemon TLS certificate inside the app data directory.
pub const DAEMON_CERT_NAME: &str = "rpc.cert";

/// Network the daemon is expected to be serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Default RPC listen address of a local daemon on this network.
    pub fn default_rpc_connect(&self) -> &'static str {
        match self {
            Network::Mainnet => "localhost:9109",
            Network::Testnet => "localhost:19109",
        }
    }

    /// Canonical network name, as used in the hash manifest const.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet3",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// App data directory of the local daemon (`~/.dcrd` on unix).
pub fn daemon_app_dir() -> PathBuf {
    dirs_next::home_dir().map(|home| home.join(".dcrd")).unwrap_or_else(|| PathBuf::from(".dcrd"))
}

/// Resolved settings for an export run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Username for RPC connections.
    pub rpc_user: String,

    /// Password for RPC connections.
    pub rpc_pass: String,

    /// Explicit daemon address. When unset, the network default is used.
    pub rpc_connect: Option<String>,

    /// Path to the daemon TLS certificate.
    pub rpc_cert: PathBuf,

    /// Network to export filters for.
    pub network: Network,

    /// Target height to export up to. When unset, the chain tip is used.
    pub target_height: Option<u64>,

    /// Emit progress lines and final statistics to the diagnostic stream.
    pub progress: bool,

    /// Emit the hex hash manifest to stdout.
    pub hashes: bool,

    /// Emit length-prefixed raw filter data to stdout.
    pub binary: bool,
}

impl Settings {
    /// Create settings with the built-in defaults for the given network.
    pub fn new(network: Network) -> Self {
        Self {
            rpc_user: String::new(),
            rpc_pass: String::new(),
            rpc_connect: None,
            rpc_cert: daemon_app_dir().join(DAEMON_CERT_NAME),
            network,
            target_height: None,
            progress: false,
            hashes: false,
            binary: false,
        }
    }

    /// The daemon address to connect to: explicit override or network default.
    pub fn effective_rpc_connect(&self) -> String {
        self.rpc_connect.clone().unwrap_or_else(|| self.network.default_rpc_connect().to_string())
    }

    /// Layer credentials and network selection from the daemon's own config
    /// file on top of the current settings.
    ///
    /// The file is ini-style `key=value` lines. A missing or unparseable
    /// file is skipped silently: the daemon config is a convenience source,
    /// never a requirement.
    pub fn apply_daemon_config_file(&mut self, path: &Path) {
        let Ok(contents) = fs::read_to_string(path) else {
            return;
        };

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                // Bare keys act as boolean switches.
                None => (line, ""),
            };

            match key {
                "rpcuser" => self.rpc_user = value.to_string(),
                "rpcpass" => self.rpc_pass = value.to_string(),
                "testnet" => {
                    if value.is_empty() || matches!(value, "1" | "true") {
                        self.network = Network::Testnet;
                    }
                }
                _ => {}
            }
        }
    }

    /// Validate the resolved settings.
    ///
    /// Runs before any connection is opened; a conflict here must never
    /// reach the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hashes && self.binary {
            return Err(ConfigError::ConflictingOutputModes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_network_defaults() {
        assert_eq!(Network::Mainnet.default_rpc_connect(), "localhost:9109");
        assert_eq!(Network::Testnet.default_rpc_connect(), "localhost:19109");
        assert_eq!(Network::Mainnet.name(), "mainnet");
        assert_eq!(Network::Testnet.name(), "testnet3");
    }

    #[test]
    fn test_effective_rpc_connect_follows_network() {
        let mut settings = Settings::new(Network::Mainnet);
        assert_eq!(settings.effective_rpc_connect(), "localhost:9109");

        settings.network = Network::Testnet;
        assert_eq!(settings.effective_rpc_connect(), "localhost:19109");

        settings.rpc_connect = Some("node.example.org:9109".to_string());
        assert_eq!(settings.effective_rpc_connect(), "node.example.org:9109");
    }

    #[test]
    fn test_apply_daemon_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# daemon config").unwrap();
        writeln!(file, "rpcuser=alice").unwrap();
        writeln!(file, "rpcpass = hunter2").unwrap();
        writeln!(file, "testnet=1").unwrap();
        writeln!(file, "unknownkey=whatever").unwrap();

        let mut settings = Settings::new(Network::Mainnet);
        settings.apply_daemon_config_file(file.path());

        assert_eq!(settings.rpc_user, "alice");
        assert_eq!(settings.rpc_pass, "hunter2");
        assert_eq!(settings.network, Network::Testnet);
    }

    #[test]
    fn test_apply_daemon_config_file_bare_testnet_key() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "testnet").unwrap();

        let mut settings = Settings::new(Network::Mainnet);
        settings.apply_daemon_config_file(file.path());

        assert_eq!(settings.network, Network::Testnet);
    }

    #[test]
    fn test_apply_daemon_config_file_missing_is_silent() {
        let mut settings = Settings::new(Network::Mainnet);
        settings.rpc_user = "keepme".to_string();

        settings.apply_daemon_config_file(Path::new("/nonexistent/dcrd.conf"));

        assert_eq!(settings.rpc_user, "keepme");
        assert_eq!(settings.network, Network::Mainnet);
    }

    #[test]
    fn test_validate_rejects_conflicting_modes() {
        let mut settings = Settings::new(Network::Mainnet);
        settings.hashes = true;
        settings.binary = true;

        assert!(matches!(settings.validate(), Err(ConfigError::ConflictingOutputModes)));
    }

    #[test]
    fn test_validate_accepts_single_or_no_mode() {
        let mut settings = Settings::new(Network::Mainnet);
        assert!(settings.validate().is_ok());

        settings.hashes = true;
        assert!(settings.validate().is_ok());

        settings.hashes = false;
        settings.binary = true;
        assert!(settings.validate().is_ok());
    }
}
