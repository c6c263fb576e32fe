//! Daemon configuration (§6.4). Parsing and defaults only — loading from
//! disk and command-line overrides are wired in `main.rs`.

use serde::Deserialize;

use crate::error::{Error, Result};

/// `addr_flags` bitmask: default behavior for address announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct AddrFlags(pub u32);

impl AddrFlags {
    pub const SIGNAL: AddrFlags = AddrFlags(1);
    pub const SUBFLOW: AddrFlags = AddrFlags(2);
    pub const BACKUP: AddrFlags = AddrFlags(4);

    pub fn contains(self, other: AddrFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// `notify_flags` bitmask: monitor publication policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(transparent)]
pub struct NotifyFlags(pub u32);

impl NotifyFlags {
    pub const EXISTING: NotifyFlags = NotifyFlags(1);
    pub const SKIP_LL: NotifyFlags = NotifyFlags(2);
    pub const SKIP_HOST: NotifyFlags = NotifyFlags(4);
    pub const ROUTE_CHECK: NotifyFlags = NotifyFlags(8);

    pub fn contains(self, other: NotifyFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub addr_flags: AddrFlags,
    pub notify_flags: NotifyFlags,
    pub plugin_dir: String,
    pub default_plugin: Option<String>,
    pub load_plugins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr_flags: AddrFlags::SIGNAL,
            notify_flags: NotifyFlags::ROUTE_CHECK,
            plugin_dir: "/usr/lib/mptcpd/plugins".to_string(),
            default_plugin: None,
            load_plugins: Vec::new(),
        }
    }
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads and parses a configuration file; defaults are used for any
    /// key the file omits.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert!(cfg.addr_flags.contains(AddrFlags::SIGNAL));
        assert!(cfg.notify_flags.contains(NotifyFlags::ROUTE_CHECK));
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            plugin_dir = "/opt/mptcpd/plugins"
            load_plugins = ["ecmp", "lowrtt"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.plugin_dir, "/opt/mptcpd/plugins");
        assert_eq!(cfg.load_plugins, vec!["ecmp", "lowrtt"]);
        assert!(cfg.addr_flags.contains(AddrFlags::SIGNAL));
    }

    #[test]
    fn parses_flag_bitmasks() {
        let cfg = Config::from_toml_str(
            r#"
            addr_flags = 3
            notify_flags = 6
            "#,
        )
        .unwrap();

        assert!(cfg.addr_flags.contains(AddrFlags::SIGNAL));
        assert!(cfg.addr_flags.contains(AddrFlags::SUBFLOW));
        assert!(cfg.notify_flags.contains(NotifyFlags::SKIP_LL));
        assert!(cfg.notify_flags.contains(NotifyFlags::SKIP_HOST));
    }
}
