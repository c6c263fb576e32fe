//! Daemon-level error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("netlink operation failed: {0}")]
    Netlink(#[from] nlink::netlink::Error),

    #[error("address id space exhausted")]
    Exhausted,

    #[error("endpoint family must be v4 or v6")]
    InvalidFamily,

    #[error("address id 0 is reserved and cannot be mapped")]
    InvalidId,

    #[error("endpoint {0} is unbound (unspecified or broadcast)")]
    Unbound(std::net::IpAddr),

    #[error("no listener registered for {0}")]
    NoSuchListener(std::net::SocketAddr),

    #[error("failed to bind listener on {addr}: {source}")]
    ListenFailed {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin {name} registration failed: {reason}")]
    PluginRegistration { name: String, reason: String },

    #[error("plugin {0} provided no callbacks")]
    EmptyPluginVtable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
