//! Network monitor (§4.5): tracks interfaces and addresses via `RTNLGRP_LINK`
//! and `RTNLGRP_IPV{4,6}_IFADDR` multicast notifications, filters them down
//! to the ones worth telling a path manager about, and optionally confirms
//! reachability with a route-probe before publishing a new address.
//!
//! This module parses `NEWLINK`/`DELLINK`/`NEWADDR`/`DELADDR` payloads
//! directly with `AttrIter` rather than going through the higher-level
//! route-message types, which (in this tree) cover a different, unrelated
//! set of RTM message kinds. See `DESIGN.md` for the full rationale.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use nlink::netlink::attr::get;
use nlink::netlink::message::{NLM_F_DUMP, NLM_F_REQUEST};
use nlink::netlink::{AttrIter, Connection, MessageBuilder, MessageIter, NlMsgType, Route, rtnetlink_groups};

use crate::config::NotifyFlags;
use crate::error::Result;

const AF_UNSPEC: u8 = 0;
const AF_INET: u8 = 2;
const AF_INET6: u8 = 10;

const IFF_UP: u32 = 0x1;
const IFF_RUNNING: u32 = 0x40;
const IFF_LOOPBACK: u32 = 0x8;

mod ifla {
    pub const IFNAME: u16 = 3;
}

mod ifa {
    pub const ADDRESS: u16 = 1;
    pub const LOCAL: u16 = 2;
}

const RT_SCOPE_UNIVERSE: u8 = 0;
const RT_SCOPE_LINK: u8 = 253;
const RT_SCOPE_HOST: u8 = 254;

const ROUTE_CHECK_RETRIES: u32 = 3;
const ROUTE_CHECK_BASE_DELAY_MS: u64 = 1;

/// Mirrors `struct ifinfomsg`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct IfInfoMsg {
    ifi_family: u8,
    ifi_pad: u8,
    ifi_type: u16,
    ifi_index: i32,
    ifi_flags: u32,
    ifi_change: u32,
}

/// Mirrors `struct ifaddrmsg`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct IfAddrMsg {
    ifa_family: u8,
    ifa_prefixlen: u8,
    ifa_flags: u8,
    ifa_scope: u8,
    ifa_index: u32,
}

#[derive(Debug, Clone)]
struct Interface {
    name: String,
    flags: u32,
}

fn qualifies(flags: u32) -> bool {
    flags & IFF_UP != 0 && flags & IFF_RUNNING != 0 && flags & IFF_LOOPBACK == 0
}

fn should_skip_scope(notify_flags: NotifyFlags, scope: u8) -> bool {
    (scope == RT_SCOPE_LINK && notify_flags.contains(NotifyFlags::SKIP_LL))
        || (scope == RT_SCOPE_HOST && notify_flags.contains(NotifyFlags::SKIP_HOST))
}

#[derive(Debug, Clone, Copy)]
struct AddrEntry {
    ifindex: u32,
    scope: u8,
}

type IfindexCb<Ctx> = Box<dyn FnMut(&mut Ctx, u32) + Send>;
type AddrCb<Ctx> = Box<dyn FnMut(&mut Ctx, SocketAddr) + Send>;

/// Observer callbacks registered with a [`NetworkMonitor`] (§4.5
/// `register_ops`). At least one field must be set.
#[derive(Default)]
pub struct MonitorOps<Ctx> {
    pub new_interface: Option<IfindexCb<Ctx>>,
    pub update_interface: Option<IfindexCb<Ctx>>,
    pub delete_interface: Option<IfindexCb<Ctx>>,
    pub new_local_address: Option<AddrCb<Ctx>>,
    pub delete_local_address: Option<AddrCb<Ctx>>,
}

impl<Ctx> MonitorOps<Ctx> {
    fn is_empty(&self) -> bool {
        self.new_interface.is_none()
            && self.update_interface.is_none()
            && self.delete_interface.is_none()
            && self.new_local_address.is_none()
            && self.delete_local_address.is_none()
    }
}

/// Tracks interfaces and addresses reachable through rtnetlink and
/// broadcasts qualifying changes to every registered [`MonitorOps`].
pub struct NetworkMonitor<Ctx> {
    conn: Connection<Route>,
    interfaces: HashMap<u32, Interface>,
    published: HashSet<u32>,
    addresses: HashMap<IpAddr, AddrEntry>,
    published_addrs: HashSet<IpAddr>,
    ops: Vec<MonitorOps<Ctx>>,
    notify_flags: NotifyFlags,
}

impl<Ctx> NetworkMonitor<Ctx> {
    /// Subscribes to link and address multicast groups, then performs the
    /// initial `GETLINK` dump and only once it completes starts the
    /// `GETADDR` dump — interfaces must exist in the model before any
    /// address referencing them arrives.
    pub async fn new(mut conn: Connection<Route>, notify_flags: NotifyFlags) -> Result<Self> {
        conn.subscribe(rtnetlink_groups::RTNLGRP_LINK)?;
        conn.subscribe(rtnetlink_groups::RTNLGRP_IPV4_IFADDR)?;
        conn.subscribe(rtnetlink_groups::RTNLGRP_IPV6_IFADDR)?;

        let mut monitor = Self {
            conn,
            interfaces: HashMap::new(),
            published: HashSet::new(),
            addresses: HashMap::new(),
            published_addrs: HashSet::new(),
            ops: Vec::new(),
            notify_flags,
        };

        monitor.dump_links().await?;
        monitor.dump_addresses().await?;
        Ok(monitor)
    }

    /// Sends a dump request and collects every reply message's payload,
    /// stopping at `NLMSG_DONE`. `send_dump` on `Connection` is crate-private
    /// to `nlink`, so this reimplements the same sequence/ack/collect loop
    /// against the public socket primitives.
    async fn dump(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let socket = self.conn.socket();
        let seq = socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(socket.pid());
        socket.send(&builder.finish()).await?;

        let mut payloads = Vec::new();
        loop {
            let data = socket.recv_msg().await?;
            let mut done = false;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;
                if header.nlmsg_seq != seq {
                    continue;
                }
                if header.is_done() {
                    done = true;
                    break;
                }
                if header.is_error() {
                    continue;
                }
                payloads.push(payload.to_vec());
            }

            if done {
                break;
            }
        }
        Ok(payloads)
    }

    async fn dump_links(&mut self) -> Result<()> {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST | NLM_F_DUMP);
        builder.append(&IfInfoMsg {
            ifi_family: AF_UNSPEC,
            ..Default::default()
        });

        for payload in self.dump(builder).await? {
            if let Some((ifindex, name, flags)) = parse_link(&payload) {
                let published = qualifies(flags);
                self.interfaces.insert(ifindex, Interface { name, flags });
                if published {
                    self.published.insert(ifindex);
                }
            }
        }
        Ok(())
    }

    /// `insert_addr` only: inserted into `self.addresses` unconditionally,
    /// published (marked in `published_addrs`) only when `EXISTING` is set,
    /// in which case each address runs the same scope/route-check gate
    /// `handle_new_addr` applies to a live `NEWADDR`. No observers are
    /// registered yet at this point in startup, so "published" here only
    /// means "eligible for replay once one registers" (`register_ops`).
    async fn dump_addresses(&mut self) -> Result<()> {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETADDR, NLM_F_REQUEST | NLM_F_DUMP);
        builder.append(&IfAddrMsg {
            ifa_family: AF_UNSPEC,
            ..Default::default()
        });

        let payloads = self.dump(builder).await?;
        for payload in payloads {
            if let Some((ifindex, addr, scope)) = parse_addr(&payload) {
                self.addresses.insert(addr, AddrEntry { ifindex, scope });
                if self.notify_flags.contains(NotifyFlags::EXISTING)
                    && self.passes_publish_gate(addr, ifindex, scope).await
                {
                    self.published_addrs.insert(addr);
                }
            }
        }
        Ok(())
    }

    /// Registers an observer. `NotifyFlags::EXISTING` replays every
    /// currently-published interface and address to this observer alone,
    /// so a plugin loaded after startup still sees what's already up.
    /// Replay is a plain synchronous scan over `published`/`published_addrs`
    /// — both sets only ever contain entries that already passed the
    /// scope/route-check gate when they were published, so there is
    /// nothing left to re-check here.
    pub fn register_ops(&mut self, ctx: &mut Ctx, mut ops: MonitorOps<Ctx>) -> Result<()> {
        if ops.is_empty() {
            return Err(crate::error::Error::EmptyPluginVtable("network monitor observer".into()));
        }

        if self.notify_flags.contains(NotifyFlags::EXISTING) {
            for &ifindex in &self.published {
                if let Some(cb) = ops.new_interface.as_mut() {
                    cb(ctx, ifindex);
                }
            }
            for &addr in &self.published_addrs {
                if let Some(cb) = ops.new_local_address.as_mut() {
                    cb(ctx, SocketAddr::new(addr, 0));
                }
            }
        }

        self.ops.push(ops);
        Ok(())
    }

    fn should_skip(&self, scope: u8) -> bool {
        should_skip_scope(self.notify_flags, scope)
    }

    /// Receives and processes exactly one batch of event messages
    /// (`recv_event` may return several coalesced netlink messages).
    pub async fn poll_once(&mut self, ctx: &mut Ctx) -> Result<()> {
        let data = self.conn.recv_event().await?;

        for result in MessageIter::new(&data) {
            let (header, payload) = result?;
            match header.nlmsg_type {
                NlMsgType::RTM_NEWLINK => {
                    if let Some((ifindex, name, flags)) = parse_link(payload) {
                        self.handle_new_link(ctx, ifindex, name, flags);
                    }
                }
                NlMsgType::RTM_DELLINK => {
                    if let Some((ifindex, _, _)) = parse_link(payload) {
                        self.handle_del_link(ctx, ifindex);
                    }
                }
                NlMsgType::RTM_NEWADDR => {
                    if let Some((ifindex, addr, scope)) = parse_addr(payload) {
                        self.handle_new_addr(ctx, ifindex, addr, scope).await;
                    }
                }
                NlMsgType::RTM_DELADDR => {
                    if let Some((_, addr, _)) = parse_addr(payload) {
                        self.handle_del_addr(ctx, addr);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_new_link(&mut self, ctx: &mut Ctx, ifindex: u32, name: String, flags: u32) {
        let now_qualifies = qualifies(flags);
        let was_published = self.published.contains(&ifindex);
        self.interfaces.insert(ifindex, Interface { name, flags });

        if now_qualifies && !was_published {
            self.published.insert(ifindex);
            for ops in &mut self.ops {
                if let Some(cb) = ops.new_interface.as_mut() {
                    cb(ctx, ifindex);
                }
            }
        } else if now_qualifies && was_published {
            for ops in &mut self.ops {
                if let Some(cb) = ops.update_interface.as_mut() {
                    cb(ctx, ifindex);
                }
            }
        } else if !now_qualifies && was_published {
            self.published.remove(&ifindex);
            for ops in &mut self.ops {
                if let Some(cb) = ops.delete_interface.as_mut() {
                    cb(ctx, ifindex);
                }
            }
        }
    }

    fn handle_del_link(&mut self, ctx: &mut Ctx, ifindex: u32) {
        self.interfaces.remove(&ifindex);
        if self.published.remove(&ifindex) {
            for ops in &mut self.ops {
                if let Some(cb) = ops.delete_interface.as_mut() {
                    cb(ctx, ifindex);
                }
            }
        }

        let stale: Vec<IpAddr> = self
            .addresses
            .iter()
            .filter(|(_, e)| e.ifindex == ifindex)
            .map(|(addr, _)| *addr)
            .collect();
        for addr in stale {
            self.addresses.remove(&addr);
            if self.published_addrs.remove(&addr) {
                for ops in &mut self.ops {
                    if let Some(cb) = ops.delete_local_address.as_mut() {
                        cb(ctx, SocketAddr::new(addr, 0));
                    }
                }
            }
        }
    }

    async fn handle_new_addr(&mut self, ctx: &mut Ctx, ifindex: u32, addr: IpAddr, scope: u8) {
        self.addresses.insert(addr, AddrEntry { ifindex, scope });

        if !self.passes_publish_gate(addr, ifindex, scope).await {
            return;
        }

        self.published_addrs.insert(addr);
        for ops in &mut self.ops {
            if let Some(cb) = ops.new_local_address.as_mut() {
                cb(ctx, SocketAddr::new(addr, 0));
            }
        }
    }

    fn handle_del_addr(&mut self, ctx: &mut Ctx, addr: IpAddr) {
        self.addresses.remove(&addr);
        if self.published_addrs.remove(&addr) {
            for ops in &mut self.ops {
                if let Some(cb) = ops.delete_local_address.as_mut() {
                    cb(ctx, SocketAddr::new(addr, 0));
                }
            }
        }
    }

    /// Scope filter plus, when `ROUTE_CHECK` is set, reachability — the
    /// gate an address must clear before it is ever marked published.
    /// Shared by the live `NEWADDR` path and the startup `EXISTING` dump so
    /// both agree on what "published" means.
    async fn passes_publish_gate(&self, addr: IpAddr, ifindex: u32, scope: u8) -> bool {
        if self.should_skip(scope) {
            return false;
        }
        if self.notify_flags.contains(NotifyFlags::ROUTE_CHECK) {
            return self.route_reachable(addr, ifindex).await;
        }
        true
    }

    /// Probes for a default route toward `addr`'s family via `ifindex`,
    /// retrying up to [`ROUTE_CHECK_RETRIES`] times with exponential
    /// backoff (1ms, 2ms, 4ms) before giving up.
    async fn route_reachable(&self, addr: IpAddr, ifindex: u32) -> bool {
        if self.conn.probe_default_route(addr, ifindex).await.unwrap_or(false) {
            return true;
        }

        let mut delay = ROUTE_CHECK_BASE_DELAY_MS;
        for _ in 0..ROUTE_CHECK_RETRIES {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if self.conn.probe_default_route(addr, ifindex).await.unwrap_or(false) {
                return true;
            }
            delay *= 2;
        }
        false
    }

    pub fn foreach_interface(&self, mut f: impl FnMut(u32, &str)) {
        for (&ifindex, iface) in &self.interfaces {
            if qualifies(iface.flags) {
                f(ifindex, &iface.name);
            }
        }
    }
}

fn parse_link(payload: &[u8]) -> Option<(u32, String, u32)> {
    if payload.len() < std::mem::size_of::<IfInfoMsg>() {
        return None;
    }
    let (header, _) = IfInfoMsg::ref_from_prefix(payload).ok()?;
    let attrs = &payload[std::mem::size_of::<IfInfoMsg>()..];

    let mut name = String::new();
    for (attr_type, attr_payload) in AttrIter::new(attrs) {
        if attr_type == ifla::IFNAME && let Ok(s) = get::string(attr_payload) {
            name = s.to_string();
        }
    }

    Some((header.ifi_index as u32, name, header.ifi_flags))
}

fn parse_addr(payload: &[u8]) -> Option<(u32, IpAddr, u8)> {
    if payload.len() < std::mem::size_of::<IfAddrMsg>() {
        return None;
    }
    let (header, _) = IfAddrMsg::ref_from_prefix(payload).ok()?;
    let attrs = &payload[std::mem::size_of::<IfAddrMsg>()..];

    let mut address = None;
    let mut local = None;
    for (attr_type, attr_payload) in AttrIter::new(attrs) {
        match (attr_type, header.ifa_family) {
            (ifa::ADDRESS, AF_INET) => address = to_v4(attr_payload).map(IpAddr::V4),
            (ifa::LOCAL, AF_INET) => local = to_v4(attr_payload).map(IpAddr::V4),
            (ifa::ADDRESS, AF_INET6) => address = to_v6(attr_payload).map(IpAddr::V6),
            (ifa::LOCAL, AF_INET6) => local = to_v6(attr_payload).map(IpAddr::V6),
            _ => {}
        }
    }

    let addr = local.or(address)?;
    Some((header.ifa_index, addr, header.ifa_scope))
}

fn to_v4(bytes: &[u8]) -> Option<Ipv4Addr> {
    let arr: [u8; 4] = bytes.try_into().ok()?;
    Some(Ipv4Addr::from(arr))
}

fn to_v6(bytes: &[u8]) -> Option<Ipv6Addr> {
    let arr: [u8; 16] = bytes.try_into().ok()?;
    Some(Ipv6Addr::from(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifies_requires_up_running_not_loopback() {
        assert!(qualifies(IFF_UP | IFF_RUNNING));
        assert!(!qualifies(IFF_UP));
        assert!(!qualifies(IFF_UP | IFF_RUNNING | IFF_LOOPBACK));
    }

    fn ifa_attr(attr_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        let nla_len = (4 + payload.len()) as u16;
        buf.extend_from_slice(&nla_len.to_ne_bytes());
        buf.extend_from_slice(&attr_type.to_ne_bytes());
        buf.extend_from_slice(payload);
        while buf.len() % 4 != 0 {
            buf.push(0);
        }
        buf
    }

    #[test]
    fn parse_link_reads_index_flags_and_name() {
        let header = IfInfoMsg {
            ifi_family: AF_UNSPEC,
            ifi_pad: 0,
            ifi_type: 0,
            ifi_index: 3,
            ifi_flags: IFF_UP | IFF_RUNNING,
            ifi_change: 0,
        };
        let mut payload = header.as_bytes().to_vec();
        payload.extend(ifa_attr(ifla::IFNAME, b"eth0\0"));

        let (ifindex, name, flags) = parse_link(&payload).unwrap();
        assert_eq!(ifindex, 3);
        assert_eq!(name, "eth0");
        assert!(qualifies(flags));
    }

    #[test]
    fn parse_addr_prefers_local_over_address() {
        let header = IfAddrMsg {
            ifa_family: AF_INET,
            ifa_prefixlen: 24,
            ifa_flags: 0,
            ifa_scope: RT_SCOPE_UNIVERSE,
            ifa_index: 5,
        };
        let mut payload = header.as_bytes().to_vec();
        payload.extend(ifa_attr(ifa::ADDRESS, &Ipv4Addr::new(10, 0, 0, 255).octets()));
        payload.extend(ifa_attr(ifa::LOCAL, &Ipv4Addr::new(10, 0, 0, 1).octets()));

        let (ifindex, addr, scope) = parse_addr(&payload).unwrap();
        assert_eq!(ifindex, 5);
        assert_eq!(addr, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(scope, RT_SCOPE_UNIVERSE);
    }

    #[test]
    fn should_skip_honors_scope_flags() {
        assert!(should_skip_scope(NotifyFlags::SKIP_LL, RT_SCOPE_LINK));
        assert!(!should_skip_scope(NotifyFlags::SKIP_LL, RT_SCOPE_HOST));
        assert!(!should_skip_scope(NotifyFlags::SKIP_LL, RT_SCOPE_UNIVERSE));
        assert!(should_skip_scope(NotifyFlags::SKIP_HOST, RT_SCOPE_HOST));
    }
}
