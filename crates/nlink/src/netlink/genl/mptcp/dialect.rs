//! Runtime dialect selection between the upstream and mptcp.org kernels.
//!
//! Selection is pure observation of `/proc/sys/net/mptcp/*`; this module
//! never writes to those files. The result is a closed sum type — exactly
//! one of `{Upstream, MptcpOrg, NotReady}` — matching the "tagged variants
//! for dialects" design note.

use std::path::Path;

use super::types::{AddressInfo, LimitType, MptcpEndpointBuilder, MptcpFlags, MptcpLimits, SubflowSpec};
use crate::netlink::connection::Connection;
use crate::netlink::error::{Error, Result};
use crate::netlink::protocol::{Mptcp, MptcpOrg};

const UPSTREAM_SYSCTL: &str = "/proc/sys/net/mptcp/enabled";
const MPTCP_ORG_SYSCTL: &str = "/proc/sys/net/mptcp/mptcp_enabled";
const MPTCP_ORG_PATH_MANAGER_SYSCTL: &str = "/proc/sys/net/mptcp/mptcp_path_manager";

/// Which MPTCP kernel dialect is active on this host, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectKind {
    /// Mainline Linux kernel MPTCP implementation.
    Upstream,
    /// Out-of-tree multipath-tcp.org kernel fork.
    MptcpOrg,
}

fn sysctl_is_enabled(path: &str) -> bool {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.trim().parse::<i64>().map(|v| v != 0).unwrap_or(false),
        Err(_) => false,
    }
}

/// Probe `/proc/sys/net/mptcp/*` to decide which dialect is active.
///
/// Returns `None` if neither `enabled` nor `mptcp_enabled` reads non-zero.
pub fn probe() -> Option<DialectKind> {
    probe_under(Path::new("/"))
}

fn probe_under(root: &Path) -> Option<DialectKind> {
    let upstream = root.join(UPSTREAM_SYSCTL.trim_start_matches('/'));
    let mptcp_org = root.join(MPTCP_ORG_SYSCTL.trim_start_matches('/'));

    if sysctl_is_enabled(upstream.to_str().unwrap_or(UPSTREAM_SYSCTL)) {
        return Some(DialectKind::Upstream);
    }
    if sysctl_is_enabled(mptcp_org.to_str().unwrap_or(MPTCP_ORG_SYSCTL)) {
        return Some(DialectKind::MptcpOrg);
    }
    None
}

/// Warn (via the returned bool) if the mptcp.org path manager sysctl is not
/// set to `"netlink"`. Per §6.1, this is observation-only.
pub fn mptcp_org_path_manager_is_netlink() -> bool {
    std::fs::read_to_string(MPTCP_ORG_PATH_MANAGER_SYSCTL)
        .map(|s| s.trim() == "netlink")
        .unwrap_or(false)
}

/// A live connection to whichever dialect was selected at startup.
pub enum Dialect {
    /// Upstream kernel dialect connection.
    Upstream(Connection<Mptcp>),
    /// mptcp.org dialect connection.
    MptcpOrg(Connection<MptcpOrg>),
}

impl Dialect {
    /// Probe the kernel and connect to whichever dialect is enabled.
    ///
    /// Returns `Error::NotSupported` if neither sysctl reports enabled —
    /// callers should treat this as "PathManager not ready" per §4.6 and
    /// retry later rather than treating it as fatal.
    pub async fn detect_and_connect() -> Result<Self> {
        match probe() {
            Some(DialectKind::Upstream) => Ok(Dialect::Upstream(Connection::<Mptcp>::new_async().await?)),
            Some(DialectKind::MptcpOrg) => {
                Ok(Dialect::MptcpOrg(Connection::<MptcpOrg>::new_async().await?))
            }
            None => Err(Error::NotSupported("MPTCP path manager not ready: neither dialect is enabled".into())),
        }
    }

    /// Which dialect this connection is using.
    pub fn kind(&self) -> DialectKind {
        match self {
            Dialect::Upstream(_) => DialectKind::Upstream,
            Dialect::MptcpOrg(_) => DialectKind::MptcpOrg,
        }
    }

    /// True once the GENL family has been resolved (always true for a live
    /// `Dialect`, since construction fails otherwise — kept for symmetry
    /// with the supervisor's readiness polling of the *unconnected* case).
    pub fn ready(&self) -> bool {
        true
    }

    /// Add a local endpoint.
    pub async fn add_addr(&self, endpoint: &MptcpEndpointBuilder) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.add_endpoint(endpoint).await,
            Dialect::MptcpOrg(c) => c.add_endpoint(endpoint).await,
        }
    }

    /// Remove a local endpoint by ID.
    pub async fn remove_addr(&self, id: u8) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.del_endpoint(id).await,
            Dialect::MptcpOrg(c) => c.del_endpoint(id).await,
        }
    }

    /// List every configured local endpoint.
    pub async fn dump_addrs(&self) -> Result<Vec<AddressInfo>> {
        match self {
            Dialect::Upstream(c) => c.dump_addrs().await,
            Dialect::MptcpOrg(c) => c.dump_addrs().await,
        }
    }

    /// Fetch a single endpoint by ID via each dialect's targeted `GET_ADDR`.
    pub async fn get_addr(&self, id: u8) -> Result<Option<AddressInfo>> {
        match self {
            Dialect::Upstream(c) => c.get_endpoint(id).await,
            Dialect::MptcpOrg(c) => c.get_endpoint(id).await,
        }
    }

    /// Remove every configured endpoint.
    pub async fn flush_addrs(&self) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.flush_endpoints().await,
            Dialect::MptcpOrg(c) => c.flush_endpoints().await,
        }
    }

    /// Set one or more limits. `EINVAL` on an empty limits set.
    pub async fn set_limits(&self, limits: &[(LimitType, u32)]) -> Result<()> {
        if limits.is_empty() {
            return Err(Error::from_errno(-libc::EINVAL));
        }
        let mut value = MptcpLimits::default();
        for (kind, limit) in limits {
            match kind {
                LimitType::RcvAddAddrs => value.add_addr_accepted = Some(*limit),
                LimitType::Subflows => value.subflows = Some(*limit),
            }
        }
        match self {
            Dialect::Upstream(c) => c.set_limits(&value).await,
            Dialect::MptcpOrg(c) => c.set_limits(&value).await,
        }
    }

    /// Read the currently configured limits.
    pub async fn get_limits(&self) -> Result<MptcpLimits> {
        match self {
            Dialect::Upstream(c) => c.get_limits().await,
            Dialect::MptcpOrg(c) => c.get_limits().await,
        }
    }

    /// Create a subflow for an existing connection.
    pub async fn add_subflow(&self, spec: &SubflowSpec) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.add_subflow(spec).await,
            Dialect::MptcpOrg(c) => c.add_subflow(spec).await,
        }
    }

    /// Tear down a subflow.
    pub async fn remove_subflow(&self, spec: &SubflowSpec) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.remove_subflow(spec).await,
            Dialect::MptcpOrg(c) => c.remove_subflow(spec).await,
        }
    }

    /// Toggle backup priority on a subflow.
    pub async fn set_backup(&self, spec: &SubflowSpec) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.set_backup(spec).await,
            Dialect::MptcpOrg(c) => c.set_backup(spec).await,
        }
    }

    /// Set endpoint flags. Upstream-only; `NotSupported` on mptcp.org.
    pub async fn set_flags(&self, id: u8, flags: MptcpFlags) -> Result<()> {
        match self {
            Dialect::Upstream(c) => c.set_endpoint_flags(id, flags).await,
            Dialect::MptcpOrg(c) => c.set_endpoint_flags(id, flags).await,
        }
    }

    /// The resolved GENL family ID for the active dialect.
    pub fn family_id(&self) -> u16 {
        match self {
            Dialect::Upstream(c) => c.family_id(),
            Dialect::MptcpOrg(c) => c.family_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn probe_prefers_upstream_when_both_enabled() {
        let dir = std::env::temp_dir().join(format!("mptcpd-dialect-test-{}", std::process::id()));
        let sys = dir.join("proc/sys/net/mptcp");
        fs::create_dir_all(&sys).unwrap();
        fs::write(sys.join("enabled"), "1\n").unwrap();
        fs::write(sys.join("mptcp_enabled"), "1\n").unwrap();

        assert_eq!(probe_under(&dir), Some(DialectKind::Upstream));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn probe_falls_back_to_mptcp_org() {
        let dir = std::env::temp_dir().join(format!("mptcpd-dialect-test-org-{}", std::process::id()));
        let sys = dir.join("proc/sys/net/mptcp");
        fs::create_dir_all(&sys).unwrap();
        fs::write(sys.join("mptcp_enabled"), "1\n").unwrap();

        assert_eq!(probe_under(&dir), Some(DialectKind::MptcpOrg));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn probe_none_when_neither_enabled() {
        let dir = std::env::temp_dir().join(format!("mptcpd-dialect-test-none-{}", std::process::id()));
        let sys = dir.join("proc/sys/net/mptcp");
        fs::create_dir_all(&sys).unwrap();
        fs::write(sys.join("enabled"), "0\n").unwrap();

        assert_eq!(probe_under(&dir), None);
        fs::remove_dir_all(&dir).ok();
    }
}
