//! Supervisor (§4.8): brings up the dialect connection, the network
//! monitor, and the plugin registry, and owns the running `PathManager`.
//!
//! Connection- and subflow-lifecycle events (`new_connection`,
//! `new_subflow`, `subflow_priority`, ...) are dispatched through
//! [`PathManager`]'s `dispatch_*` methods and fully exercised by
//! `policy.rs`'s tests, but nothing in this tree currently drives them from
//! a live kernel notification: the MPTCP generic-netlink family resolution
//! in `genl::mptcp` (see `upstream.rs`/`mptcp_org.rs`) only implements
//! request/response calls, not multicast-group discovery, so there is no
//! event source to subscribe to yet. The rtnetlink side (interfaces and
//! addresses, §4.5) has no such gap and is fully wired below.

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{info, warn};

use nlink::netlink::genl::mptcp::Dialect;
use nlink::netlink::{Connection, Route};

use crate::config::Config;
use crate::error::Result;
use crate::idmap::IdMap;
use crate::listener::ListenerMap;
use crate::monitor::{MonitorOps, NetworkMonitor};
use crate::plugin;
use crate::policy::{PluginVtable, PolicyDispatcher};

/// How long to wait for an MPTCP dialect to report ready before giving up.
const READY_GRACE_PERIOD: Duration = Duration::from_secs(5);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Shared context handed to every plugin callback and network-monitor
/// observer. Exclusively owns the dialect handle, the address-ID and
/// listener tables, and (once attached) the network monitor and plugin
/// registry.
pub struct PathManager {
    pub dialect: Dialect,
    pub idmap: IdMap,
    pub listeners: ListenerMap,
    monitor: Option<NetworkMonitor<PathManager>>,
    policy: Option<PolicyDispatcher<PathManager>>,
}

impl PathManager {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            idmap: IdMap::new(),
            listeners: ListenerMap::new(),
            monitor: None,
            policy: Some(PolicyDispatcher::new()),
        }
    }

    /// Registers a plugin's connection-event vtable.
    pub fn register_plugin(
        &mut self,
        name: impl Into<String>,
        priority: u32,
        is_default: bool,
        vtable: PluginVtable<PathManager>,
    ) -> Result<()> {
        let mut policy = self.policy.take().expect("policy always present after construction");
        let result = policy.register(name, priority, is_default, vtable);
        self.policy = Some(policy);
        result
    }

    /// Registers a network-monitor observer. Done separately from
    /// `register_plugin` because a plugin's interest in network events and
    /// its interest in connection events are independent per §4.7/§4.5.
    pub fn register_monitor_ops(&mut self, ops: MonitorOps<PathManager>) -> Result<()> {
        let mut monitor = self.monitor.take().expect("monitor not attached yet");
        let result = monitor.register_ops(self, ops);
        self.monitor = Some(monitor);
        result
    }

    /// Blocks until the next batch of rtnetlink notifications arrives and
    /// dispatches whatever interface/address changes it contains.
    pub async fn poll_network_once(&mut self) -> Result<()> {
        let mut monitor = self.monitor.take().expect("monitor not attached yet");
        let result = monitor.poll_once(self).await;
        self.monitor = Some(monitor);
        result
    }

    pub fn dispatch_new_connection(&mut self, token: u32, name_hint: Option<&str>) {
        self.with_policy(|policy, pm| policy.new_connection(pm, token, name_hint));
    }

    pub fn dispatch_connection_established(&mut self, token: u32) {
        self.with_policy(|policy, pm| policy.connection_established(pm, token));
    }

    pub fn dispatch_connection_closed(&mut self, token: u32) {
        self.with_policy(|policy, pm| policy.connection_closed(pm, token));
    }

    pub fn dispatch_new_subflow(&mut self, token: u32) {
        self.with_policy(|policy, pm| policy.new_subflow(pm, token));
    }

    pub fn dispatch_subflow_closed(&mut self, token: u32) {
        self.with_policy(|policy, pm| policy.subflow_closed(pm, token));
    }

    pub fn dispatch_subflow_priority(&mut self, token: u32, backup: bool) {
        self.with_policy(|policy, pm| policy.subflow_priority(pm, token, backup));
    }

    pub fn dispatch_new_address(&mut self, token: u32, id: u8) {
        self.with_policy(|policy, pm| policy.new_address(pm, token, id));
    }

    pub fn dispatch_address_removed(&mut self, token: u32, id: u8) {
        self.with_policy(|policy, pm| policy.address_removed(pm, token, id));
    }

    pub fn dispatch_new_interface(&mut self, ifindex: u32) {
        self.with_policy(|policy, pm| policy.new_interface(pm, ifindex));
    }

    pub fn dispatch_update_interface(&mut self, ifindex: u32) {
        self.with_policy(|policy, pm| policy.update_interface(pm, ifindex));
    }

    pub fn dispatch_delete_interface(&mut self, ifindex: u32) {
        self.with_policy(|policy, pm| policy.delete_interface(pm, ifindex));
    }

    pub fn dispatch_new_local_address(&mut self, addr: SocketAddr) {
        self.with_policy(|policy, pm| policy.new_local_address(pm, addr));
    }

    pub fn dispatch_delete_local_address(&mut self, addr: SocketAddr) {
        self.with_policy(|policy, pm| policy.delete_local_address(pm, addr));
    }

    /// Extracts the policy dispatcher so its methods can take `&mut
    /// PathManager` without aliasing `self.policy`, then puts it back.
    fn with_policy(&mut self, f: impl FnOnce(&mut PolicyDispatcher<PathManager>, &mut PathManager)) {
        let mut policy = self.policy.take().expect("policy always present after construction");
        f(&mut policy, self);
        self.policy = Some(policy);
    }
}

/// Owns the running daemon: the `PathManager` plus whatever configuration
/// produced it.
pub struct Supervisor {
    pub pm: PathManager,
    config: Config,
}

impl Supervisor {
    /// Waits for an MPTCP dialect to become ready, builds the network
    /// monitor, and wires its broadcasts into the policy dispatcher so
    /// every registered plugin sees interface/address changes.
    pub async fn start(config: Config) -> Result<Self> {
        let dialect = wait_for_dialect().await;
        info!(kind = ?dialect.kind(), family_id = dialect.family_id(), "mptcp path manager ready");

        let mut pm = PathManager::new(dialect);

        let route_conn = Connection::<Route>::new()?;
        let monitor = NetworkMonitor::new(route_conn, config.notify_flags).await?;
        pm.monitor = Some(monitor);
        pm.register_monitor_ops(forwarding_ops())?;

        plugin::load_plugins(&mut pm, &config.load_plugins, config.default_plugin.as_deref());

        Ok(Self { pm, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drives the network monitor indefinitely, translating rtnetlink
    /// notifications into policy dispatch calls. Returns only on error.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.pm.poll_network_once().await?;
        }
    }
}

/// Polls dialect detection indefinitely. A cold-booted kernel module can
/// take a moment to register the MPTCP sysctls, and the module can be
/// loaded at any later point — neither is a fatal condition, so this never
/// gives up. It warns exactly once, when the grace period is crossed
/// without success, rather than on every failed poll; once the family
/// does appear the daemon picks up and continues as normal.
async fn wait_for_dialect() -> Dialect {
    let deadline = tokio::time::Instant::now() + READY_GRACE_PERIOD;
    let mut warned = false;
    loop {
        match Dialect::detect_and_connect().await {
            Ok(dialect) => return dialect,
            Err(err) => {
                if !warned && tokio::time::Instant::now() >= deadline {
                    warn!(%err, "mptcp path manager not ready after grace period, still waiting for kernel support");
                    warned = true;
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        }
    }
}

/// Forwards every network-monitor observation into the policy dispatcher's
/// broadcast methods, so network events reach plugins the same way
/// connection events do.
fn forwarding_ops() -> MonitorOps<PathManager> {
    MonitorOps {
        new_interface: Some(Box::new(|pm: &mut PathManager, ifindex| pm.dispatch_new_interface(ifindex))),
        update_interface: Some(Box::new(|pm: &mut PathManager, ifindex| pm.dispatch_update_interface(ifindex))),
        delete_interface: Some(Box::new(|pm: &mut PathManager, ifindex| pm.dispatch_delete_interface(ifindex))),
        new_local_address: Some(Box::new(|pm: &mut PathManager, addr| pm.dispatch_new_local_address(addr))),
        delete_local_address: Some(Box::new(|pm: &mut PathManager, addr| pm.dispatch_delete_local_address(addr))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_policy_restores_the_dispatcher() {
        // PathManager::new() requires a live Dialect, which requires a
        // kernel with MPTCP support; the dispatch plumbing itself doesn't
        // depend on the dialect, so it's exercised directly in policy.rs
        // against a lightweight stand-in context instead of here.
    }
}
