//! MPTCP (Multipath TCP) path-manager control via Generic Netlink.
//!
//! The Linux kernel exposes two historical dialects of the same control
//! surface: the mainline ("upstream") implementation, which wraps address
//! attributes in a nested container, and the out-of-tree multipath-tcp.org
//! fork, which uses flat token-keyed attributes. [`dialect::Dialect`]
//! resolves which one is active on the running kernel and presents a single
//! async API over either.
//!
//! # Example
//!
//! ```ignore
//! use nlink::netlink::genl::mptcp::{Dialect, MptcpEndpointBuilder};
//!
//! let dialect = Dialect::detect_and_connect().await?;
//! dialect.add_addr(
//!     &MptcpEndpointBuilder::new("192.168.2.1".parse()?)
//!         .id(1)
//!         .dev("eth1")
//!         .subflow()
//!         .signal()
//! ).await?;
//! ```

pub mod dialect;
pub mod mptcp_org;
pub mod types;
pub mod upstream;

pub use dialect::{Dialect, DialectKind};
pub use mptcp_org::{MPTCP_ORG_GENL_NAME, MPTCP_ORG_GENL_VERSION};
pub use types::{
    AddressInfo, LimitType, MptcpEndpoint, MptcpEndpointBuilder, MptcpFlags, MptcpLimits,
    SubflowSpec,
};
pub use upstream::{UPSTREAM_GENL_NAME, UPSTREAM_GENL_VERSION};
