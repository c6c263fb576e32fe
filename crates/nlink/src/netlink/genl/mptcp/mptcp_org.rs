//! Connection<MptcpOrg> — the out-of-tree multipath-tcp.org kernel dialect.
//!
//! Unlike the upstream dialect's nested `PM_ATTR_ADDR` container, this
//! dialect emits flat attributes directly on the message: token, family,
//! source/dest address, source/dest port. Ports are carried in host byte
//! order on the wire, matching that kernel module's own convention (the
//! upstream dialect instead follows the generic nested-address-container
//! convention, network byte order).
//!
//! This module shares the same command surface (§4.6) as the upstream
//! dialect but does not support `set_flags` — callers get `NotSupported`.

use std::net::IpAddr;

use super::types::{AddressInfo, LimitType, MptcpEndpointBuilder, MptcpFlags, MptcpLimits, SubflowSpec};
use crate::netlink::attr::AttrIter;
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::Connection;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::GENL_HDRLEN;
use crate::netlink::genl::mptcp::upstream::resolve_family;
use crate::netlink::message::{MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NlMsgError};
use crate::netlink::protocol::{MptcpOrg, ProtocolState};
use crate::netlink::socket::NetlinkSocket;
use crate::netlink::types::mptcp::mptcp_pm_cmd;

/// GENL family name for the mptcp.org out-of-tree dialect.
pub const MPTCP_ORG_GENL_NAME: &str = "mptcp_pm";
/// GENL protocol version used by this dialect.
pub const MPTCP_ORG_GENL_VERSION: u8 = 1;

/// Flat attribute IDs used by the mptcp.org dialect.
pub mod attr {
    /// Connection token (u32).
    pub const TOKEN: u16 = 1;
    /// Address family (u16).
    pub const FAMILY: u16 = 2;
    /// Source/local IPv4 address (4 bytes).
    pub const SADDR4: u16 = 3;
    /// Source/local IPv6 address (16 bytes).
    pub const SADDR6: u16 = 4;
    /// Source/local port (u16, host byte order).
    pub const SPORT: u16 = 5;
    /// Destination/remote IPv4 address (4 bytes).
    pub const DADDR4: u16 = 6;
    /// Destination/remote IPv6 address (16 bytes).
    pub const DADDR6: u16 = 7;
    /// Destination/remote port (u16, host byte order).
    pub const DPORT: u16 = 8;
    /// Local address ID (u8).
    pub const LOC_ID: u16 = 9;
    /// Endpoint flags (u32).
    pub const FLAGS: u16 = 10;
    /// Interface index (u32).
    pub const IF_IDX: u16 = 11;
    /// Backup flag (u8, boolean).
    pub const BACKUP: u16 = 12;
    /// Max additional addresses accepted from peer (u32).
    pub const RCV_ADD_ADDRS: u16 = 13;
    /// Max subflows per connection (u32).
    pub const SUBFLOWS: u16 = 14;
}

impl Connection<MptcpOrg> {
    /// Create a new mptcp.org-dialect MPTCP connection.
    ///
    /// Resolves the `"mptcp_pm"` GENL family ID during initialization.
    pub async fn new_async() -> Result<Self> {
        let socket = NetlinkSocket::new(MptcpOrg::PROTOCOL)?;
        let family_id = resolve_family(&socket, MPTCP_ORG_GENL_NAME).await?;
        Ok(Self::from_parts(socket, MptcpOrg { family_id }))
    }

    /// The resolved GENL family ID.
    pub fn family_id(&self) -> u16 {
        self.state().family_id
    }

    /// Add an endpoint.
    pub async fn add_endpoint(&self, endpoint: &MptcpEndpointBuilder) -> Result<()> {
        self.command(mptcp_pm_cmd::ADD_ADDR, |builder| {
            append_addr_flat(builder, endpoint.address, endpoint.port, endpoint.id, endpoint.ifindex);
            let flags = endpoint.flags.to_raw();
            if flags != 0 {
                builder.append_attr_u32(attr::FLAGS, flags);
            }
        })
        .await?;
        Ok(())
    }

    /// Delete an endpoint by ID.
    pub async fn del_endpoint(&self, id: u8) -> Result<()> {
        self.command(mptcp_pm_cmd::DEL_ADDR, |builder| {
            builder.append_attr_u8(attr::LOC_ID, id);
        })
        .await?;
        Ok(())
    }

    /// Get a single endpoint by ID.
    pub async fn get_endpoint(&self, id: u8) -> Result<Option<AddressInfo>> {
        let responses = self
            .dump(mptcp_pm_cmd::GET_ADDR, |builder| {
                builder.append_attr_u8(attr::LOC_ID, id);
            })
            .await?;
        for response in &responses {
            if let Some(info) = parse_address_info(response)? {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    /// List every configured endpoint.
    pub async fn dump_addrs(&self) -> Result<Vec<AddressInfo>> {
        let responses = self.dump(mptcp_pm_cmd::GET_ADDR, |_| {}).await?;
        let mut infos = Vec::with_capacity(responses.len());
        for response in &responses {
            if let Some(info) = parse_address_info(response)? {
                infos.push(info);
            }
        }
        Ok(infos)
    }

    /// Remove every configured endpoint.
    pub async fn flush_endpoints(&self) -> Result<()> {
        self.command(mptcp_pm_cmd::FLUSH_ADDRS, |_| {}).await?;
        Ok(())
    }

    /// Set subflow/add-addr limits.
    pub async fn set_limits(&self, limits: &MptcpLimits) -> Result<()> {
        if limits.subflows.is_none() && limits.add_addr_accepted.is_none() {
            return Err(Error::from_errno(-libc::EINVAL));
        }
        self.command(mptcp_pm_cmd::SET_LIMITS, |builder| {
            if let Some(subflows) = limits.subflows {
                builder.append_attr_u32(attr::SUBFLOWS, subflows);
            }
            if let Some(add_addr) = limits.add_addr_accepted {
                builder.append_attr_u32(attr::RCV_ADD_ADDRS, add_addr);
            }
        })
        .await?;
        Ok(())
    }

    /// Read the currently configured limits.
    ///
    /// Upstream `mptcpd` historically had a bug where this path issued
    /// `GET_ADDR` instead of `GET_LIMITS`; per spec this is preserved as an
    /// open question rather than silently "fixed" in the original source,
    /// but the *correct*, spec-mandated behavior for this reimplementation
    /// is to use the limits command.
    pub async fn get_limits(&self) -> Result<MptcpLimits> {
        let responses = self.dump(mptcp_pm_cmd::GET_LIMITS, |_| {}).await?;
        for response in &responses {
            if let Some(limits) = parse_limits(response)? {
                return Ok(limits);
            }
        }
        Ok(MptcpLimits::default())
    }

    /// `set_flags` has no mptcp.org equivalent.
    pub async fn set_endpoint_flags(&self, _id: u8, _flags: MptcpFlags) -> Result<()> {
        Err(Error::NotSupported("set_flags is upstream-only".into()))
    }

    /// Create a subflow for an existing connection. `EINVAL` if the remote
    /// endpoint's port is zero.
    pub async fn add_subflow(&self, spec: &SubflowSpec) -> Result<()> {
        if spec.remote_port == 0 {
            return Err(Error::from_errno(-libc::EINVAL));
        }
        self.command(mptcp_pm_cmd::SUBFLOW_CREATE, |builder| {
            append_subflow_flat(builder, spec);
        })
        .await?;
        Ok(())
    }

    /// Tear down a subflow.
    pub async fn remove_subflow(&self, spec: &SubflowSpec) -> Result<()> {
        self.command(mptcp_pm_cmd::SUBFLOW_DESTROY, |builder| {
            append_subflow_flat(builder, spec);
        })
        .await?;
        Ok(())
    }

    /// Toggle backup priority for a subflow.
    pub async fn set_backup(&self, spec: &SubflowSpec) -> Result<()> {
        self.command(mptcp_pm_cmd::SET_FLAGS, |builder| {
            builder.append_attr_u32(attr::TOKEN, spec.token);
            if spec.local_id != 0 {
                builder.append_attr_u8(attr::LOC_ID, spec.local_id);
            }
            if spec.backup {
                builder.append_attr_u8(attr::BACKUP, 1);
            }
        })
        .await?;
        Ok(())
    }

    async fn command(&self, cmd: u8, build_attrs: impl FnOnce(&mut MessageBuilder)) -> Result<Vec<u8>> {
        let family_id = self.state().family_id;
        let mut builder = MessageBuilder::new(family_id, NLM_F_REQUEST | NLM_F_ACK);
        builder.append(&crate::netlink::genl::GenlMsgHdr::new(cmd, MPTCP_ORG_GENL_VERSION));
        build_attrs(&mut builder);

        let seq = self.socket().next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket().pid());

        self.socket().send(&builder.finish()).await?;
        let response: Vec<u8> = self.socket().recv_msg().await?;
        check_ack(&response, seq)?;
        Ok(response)
    }

    async fn dump(&self, cmd: u8, build_attrs: impl FnOnce(&mut MessageBuilder)) -> Result<Vec<Vec<u8>>> {
        let family_id = self.state().family_id;
        let mut builder = MessageBuilder::new(family_id, NLM_F_REQUEST | NLM_F_DUMP);
        builder.append(&crate::netlink::genl::GenlMsgHdr::new(cmd, MPTCP_ORG_GENL_VERSION));
        build_attrs(&mut builder);

        let seq = self.socket().next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket().pid());

        self.socket().send(&builder.finish()).await?;

        let mut responses = Vec::new();
        loop {
            let data: Vec<u8> = self.socket().recv_msg().await?;
            let mut done = false;
            for result in MessageIter::new(&data) {
                let (header, payload) = result?;
                if header.nlmsg_seq != seq {
                    continue;
                }
                if header.is_error() {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                    continue;
                }
                if header.is_done() {
                    done = true;
                    break;
                }
                responses.push(payload.to_vec());
            }
            if done {
                break;
            }
        }
        Ok(responses)
    }
}

fn check_ack(data: &[u8], seq: u32) -> Result<()> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;
        if header.nlmsg_seq != seq {
            continue;
        }
        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            if !err.is_ack() {
                return Err(Error::from_errno(err.error));
            }
        }
    }
    Ok(())
}

fn append_addr_flat(
    builder: &mut MessageBuilder,
    address: IpAddr,
    port: Option<u16>,
    id: Option<u8>,
    ifindex: Option<u32>,
) {
    let family = match address {
        IpAddr::V4(_) => libc::AF_INET as u16,
        IpAddr::V6(_) => libc::AF_INET6 as u16,
    };
    builder.append_attr(attr::FAMILY, &family.to_ne_bytes());
    match address {
        IpAddr::V4(a) => builder.append_attr(attr::SADDR4, &a.octets()),
        IpAddr::V6(a) => builder.append_attr(attr::SADDR6, &a.octets()),
    }
    if let Some(port) = port
        && port != 0
    {
        // host byte order on this dialect's wire
        builder.append_attr_u16(attr::SPORT, port);
    }
    if let Some(id) = id
        && id != 0
    {
        builder.append_attr_u8(attr::LOC_ID, id);
    }
    if let Some(ifindex) = ifindex
        && ifindex != 0
    {
        builder.append_attr_u32(attr::IF_IDX, ifindex);
    }
}

fn append_subflow_flat(builder: &mut MessageBuilder, spec: &SubflowSpec) {
    builder.append_attr_u32(attr::TOKEN, spec.token);
    if spec.local_id != 0 {
        builder.append_attr_u8(attr::LOC_ID, spec.local_id);
    }
    if let Some(local_addr) = spec.local_addr {
        let family = match local_addr {
            IpAddr::V4(_) => libc::AF_INET as u16,
            IpAddr::V6(_) => libc::AF_INET6 as u16,
        };
        builder.append_attr(attr::FAMILY, &family.to_ne_bytes());
        match local_addr {
            IpAddr::V4(a) => builder.append_attr(attr::SADDR4, &a.octets()),
            IpAddr::V6(a) => builder.append_attr(attr::SADDR6, &a.octets()),
        }
        if let Some(port) = spec.local_port
            && port != 0
        {
            builder.append_attr_u16(attr::SPORT, port);
        }
    }
    match spec.remote_addr {
        IpAddr::V4(a) => builder.append_attr(attr::DADDR4, &a.octets()),
        IpAddr::V6(a) => builder.append_attr(attr::DADDR6, &a.octets()),
    }
    if spec.remote_port != 0 {
        builder.append_attr_u16(attr::DPORT, spec.remote_port);
    }
    if spec.backup {
        builder.append_attr_u8(attr::BACKUP, 1);
    }
}

fn parse_address_info(payload: &[u8]) -> Result<Option<AddressInfo>> {
    if payload.len() < GENL_HDRLEN {
        return Ok(None);
    }
    let mut address = IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED);
    let mut port = None;
    let mut id = 0u8;
    let mut flags = 0u32;
    let mut ifindex = None;
    let mut found = false;

    for (attr_type, payload) in AttrIter::new(&payload[GENL_HDRLEN..]) {
        found = true;
        match attr_type {
            t if t == attr::LOC_ID && !payload.is_empty() => id = payload[0],
            t if t == attr::SADDR4 && payload.len() >= 4 => {
                let octets: [u8; 4] = payload[..4].try_into().unwrap();
                address = IpAddr::V4(octets.into());
            }
            t if t == attr::SADDR6 && payload.len() >= 16 => {
                let octets: [u8; 16] = payload[..16].try_into().unwrap();
                address = IpAddr::V6(octets.into());
            }
            t if t == attr::SPORT && payload.len() >= 2 => {
                let p = u16::from_ne_bytes(payload[..2].try_into().unwrap());
                if p != 0 {
                    port = Some(p);
                }
            }
            t if t == attr::FLAGS && payload.len() >= 4 => {
                flags = u32::from_ne_bytes(payload[..4].try_into().unwrap());
            }
            t if t == attr::IF_IDX && payload.len() >= 4 => {
                let v = u32::from_ne_bytes(payload[..4].try_into().unwrap());
                if v != 0 {
                    ifindex = Some(v);
                }
            }
            _ => {}
        }
    }

    if !found {
        return Ok(None);
    }
    Ok(Some(AddressInfo { address, port, id, flags, ifindex }))
}

fn parse_limits(payload: &[u8]) -> Result<Option<MptcpLimits>> {
    if payload.len() < GENL_HDRLEN {
        return Ok(None);
    }
    let mut limits = MptcpLimits::default();
    let mut found = false;
    for (attr_type, attr_payload) in AttrIter::new(&payload[GENL_HDRLEN..]) {
        match attr_type {
            t if t == attr::SUBFLOWS && attr_payload.len() >= 4 => {
                limits.subflows = Some(u32::from_ne_bytes(attr_payload[..4].try_into().unwrap()));
                found = true;
            }
            t if t == attr::RCV_ADD_ADDRS && attr_payload.len() >= 4 => {
                limits.add_addr_accepted =
                    Some(u32::from_ne_bytes(attr_payload[..4].try_into().unwrap()));
                found = true;
            }
            _ => {}
        }
    }
    Ok(if found { Some(limits) } else { None })
}

/// Translate a dialect-agnostic [`LimitType`] into this dialect's attribute ID.
pub(crate) fn limit_attr_id(kind: LimitType) -> u16 {
    match kind {
        LimitType::RcvAddAddrs => attr::RCV_ADD_ADDRS,
        LimitType::Subflows => attr::SUBFLOWS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_is_host_byte_order_on_the_wire() {
        let mut builder = MessageBuilder::new(1, NLM_F_REQUEST);
        append_addr_flat(&mut builder, "10.0.0.5".parse().unwrap(), Some(0x1234), None, None);
        let msg = builder.finish();
        let body = &msg[crate::netlink::message::NLMSG_HDRLEN..];
        let (_, payload) = AttrIter::new(body)
            .find(|(t, _)| *t == attr::SPORT)
            .expect("sport attribute present");
        assert_eq!(u16::from_ne_bytes(payload.try_into().unwrap()), 0x1234);
    }

    #[test]
    fn set_flags_is_not_supported() {
        // Exercised at the dialect layer in dialect.rs; here we just assert
        // the attribute module doesn't define a FLAGS-setting command path
        // distinct from add_endpoint's inline flags attribute.
        assert_eq!(attr::FLAGS, 10);
    }

    #[test]
    fn parse_empty_payload_yields_none() {
        assert!(parse_address_info(&[]).unwrap().is_none());
    }
}
