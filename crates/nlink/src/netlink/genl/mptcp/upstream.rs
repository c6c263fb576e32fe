//! Connection<Mptcp> — the upstream kernel MPTCP PM dialect.
//!
//! Address attributes are wrapped inside a nested `PM_ATTR_ADDR` (or
//! `PM_ATTR_ADDR_REMOTE`) container: family, address, and optional
//! id/port/flags/ifindex. Optional fields with a sentinel zero value are
//! omitted entirely rather than encoded as zero.

use std::net::IpAddr;

use super::types::{
    AddressInfo, LimitType, MptcpEndpoint, MptcpEndpointBuilder, MptcpFlags, MptcpLimits,
    SubflowSpec,
};
use crate::netlink::attr::{AttrIter, NLA_F_NESTED, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::Connection;
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{CtrlAttr, CtrlCmd, GENL_HDRLEN, GENL_ID_CTRL, GenlMsgHdr};
use crate::netlink::message::{MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NlMsgError};
use crate::netlink::protocol::{Mptcp, ProtocolState};
use crate::netlink::socket::NetlinkSocket;
use crate::netlink::types::mptcp::{mptcp_pm_addr_attr, mptcp_pm_attr, mptcp_pm_cmd};

/// GENL family name for the upstream kernel MPTCP PM dialect.
pub const UPSTREAM_GENL_NAME: &str = "mptcp";
/// GENL protocol version used by this dialect.
pub const UPSTREAM_GENL_VERSION: u8 = 1;

impl Connection<Mptcp> {
    /// Create a new upstream-dialect MPTCP connection.
    ///
    /// Resolves the `"mptcp"` GENL family ID during initialization.
    pub async fn new_async() -> Result<Self> {
        let socket = NetlinkSocket::new(Mptcp::PROTOCOL)?;
        let family_id = resolve_family(&socket, UPSTREAM_GENL_NAME).await?;
        Ok(Self::from_parts(socket, Mptcp { family_id }))
    }

    /// The resolved GENL family ID.
    pub fn family_id(&self) -> u16 {
        self.state().family_id
    }

    /// Add an endpoint. `aid == 0` lets the kernel assign the ID.
    pub async fn add_endpoint(&self, endpoint: &MptcpEndpointBuilder) -> Result<()> {
        self.command(mptcp_pm_cmd::ADD_ADDR, |builder| {
            let token = builder.nest_start(mptcp_pm_attr::ADDR);
            append_endpoint_attrs(builder, endpoint);
            builder.nest_end(token);
        })
        .await?;
        Ok(())
    }

    /// Delete an endpoint by ID.
    pub async fn del_endpoint(&self, id: u8) -> Result<()> {
        self.command(mptcp_pm_cmd::DEL_ADDR, |builder| {
            let token = builder.nest_start(mptcp_pm_attr::ADDR);
            builder.append_attr_u8(mptcp_pm_addr_attr::ID, id);
            builder.nest_end(token);
        })
        .await?;
        Ok(())
    }

    /// Get a single endpoint by ID.
    pub async fn get_endpoint(&self, id: u8) -> Result<Option<AddressInfo>> {
        let responses = self
            .dump(mptcp_pm_cmd::GET_ADDR, |builder| {
                let token = builder.nest_start(mptcp_pm_attr::ADDR);
                builder.append_attr_u8(mptcp_pm_addr_attr::ID, id);
                builder.nest_end(token);
            })
            .await?;
        for response in &responses {
            if let Some(info) = parse_address_info(response)? {
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    /// List every endpoint currently configured.
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

    /// Convenience wrapper over [`Self::dump_addrs`] returning the richer
    /// builder-oriented [`MptcpEndpoint`] type.
    pub async fn get_endpoints(&self) -> Result<Vec<MptcpEndpoint>> {
        Ok(self
            .dump_addrs()
            .await?
            .into_iter()
            .map(|info| MptcpEndpoint {
                id: info.id,
                address: info.address,
                port: info.port,
                ifindex: info.ifindex,
                flags: MptcpFlags::from_raw(info.flags),
            })
            .collect())
    }

    /// Remove every configured endpoint.
    pub async fn flush_endpoints(&self) -> Result<()> {
        self.command(mptcp_pm_cmd::FLUSH_ADDRS, |_| {}).await?;
        Ok(())
    }

    /// Set subflow/add-addr limits. `EINVAL` if both fields are `None`.
    pub async fn set_limits(&self, limits: &MptcpLimits) -> Result<()> {
        if limits.subflows.is_none() && limits.add_addr_accepted.is_none() {
            return Err(Error::from_errno(-libc::EINVAL));
        }
        self.command(mptcp_pm_cmd::SET_LIMITS, |builder| {
            if let Some(subflows) = limits.subflows {
                builder.append_attr_u32(mptcp_pm_attr::SUBFLOWS, subflows);
            }
            if let Some(add_addr) = limits.add_addr_accepted {
                builder.append_attr_u32(mptcp_pm_attr::RCV_ADD_ADDRS, add_addr);
            }
        })
        .await?;
        Ok(())
    }

    /// Read the currently configured limits.
    pub async fn get_limits(&self) -> Result<MptcpLimits> {
        let responses = self.dump(mptcp_pm_cmd::GET_LIMITS, |_| {}).await?;
        for response in &responses {
            if let Some(limits) = parse_limits(response)? {
                return Ok(limits);
            }
        }
        Ok(MptcpLimits::default())
    }

    /// Set endpoint flags by ID.
    pub async fn set_endpoint_flags(&self, id: u8, flags: MptcpFlags) -> Result<()> {
        self.command(mptcp_pm_cmd::SET_FLAGS, |builder| {
            let token = builder.nest_start(mptcp_pm_attr::ADDR);
            builder.append_attr_u8(mptcp_pm_addr_attr::ID, id);
            let raw = flags.to_raw();
            if raw != 0 {
                builder.append_attr_u32(mptcp_pm_addr_attr::FLAGS, raw);
            }
            builder.nest_end(token);
        })
        .await?;
        Ok(())
    }

    /// Ask the kernel to create a new subflow for an existing connection.
    ///
    /// `EINVAL` if the remote endpoint's port is zero.
    pub async fn add_subflow(&self, spec: &SubflowSpec) -> Result<()> {
        if spec.remote_port == 0 {
            return Err(Error::from_errno(-libc::EINVAL));
        }
        self.command(mptcp_pm_cmd::SUBFLOW_CREATE, |builder| {
            append_subflow_attrs(builder, spec);
        })
        .await?;
        Ok(())
    }

    /// Tear down a previously created subflow.
    pub async fn remove_subflow(&self, spec: &SubflowSpec) -> Result<()> {
        self.command(mptcp_pm_cmd::SUBFLOW_DESTROY, |builder| {
            append_subflow_attrs(builder, spec);
        })
        .await?;
        Ok(())
    }

    /// Toggle the backup priority flag for an existing subflow.
    pub async fn set_backup(&self, spec: &SubflowSpec) -> Result<()> {
        self.command(mptcp_pm_cmd::SET_FLAGS, |builder| {
            builder.append_attr_u32(mptcp_pm_attr::TOKEN, spec.token);
            let token = builder.nest_start(mptcp_pm_attr::ADDR);
            if spec.local_id != 0 {
                builder.append_attr_u8(mptcp_pm_addr_attr::ID, spec.local_id);
            }
            if spec.backup {
                builder.append_attr_u32(
                    mptcp_pm_addr_attr::FLAGS,
                    crate::netlink::types::mptcp::mptcp_pm_flags::BACKUP,
                );
            }
            builder.nest_end(token);
        })
        .await?;
        Ok(())
    }

    async fn command(&self, cmd: u8, build_attrs: impl FnOnce(&mut MessageBuilder)) -> Result<Vec<u8>> {
        let family_id = self.state().family_id;
        let mut builder = MessageBuilder::new(family_id, NLM_F_REQUEST | NLM_F_ACK);
        builder.append(&GenlMsgHdr::new(cmd, UPSTREAM_GENL_VERSION));
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
        builder.append(&GenlMsgHdr::new(cmd, UPSTREAM_GENL_VERSION));
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

/// Resolve a GENL family ID via `CTRL_CMD_GETFAMILY`.
pub(crate) async fn resolve_family(socket: &NetlinkSocket, name: &str) -> Result<u16> {
    let mut builder = MessageBuilder::new(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK);
    builder.append(&GenlMsgHdr::new(CtrlCmd::GetFamily as u8, 1));
    builder.append_attr_str(CtrlAttr::FamilyName as u16, name);

    let seq = socket.next_seq();
    builder.set_seq(seq);
    builder.set_pid(socket.pid());

    socket.send(&builder.finish()).await?;
    let response: Vec<u8> = socket.recv_msg().await?;

    for result in MessageIter::new(&response) {
        let (header, payload) = result?;
        if header.nlmsg_seq != seq {
            continue;
        }
        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            if !err.is_ack() {
                if err.error == -libc::ENOENT {
                    return Err(Error::FamilyNotFound { name: name.to_string() });
                }
                return Err(Error::from_errno(err.error));
            }
            continue;
        }
        if header.is_done() {
            continue;
        }
        if payload.len() < GENL_HDRLEN {
            return Err(Error::InvalidMessage("GENL header too short".into()));
        }
        for (attr_type, attr_payload) in AttrIter::new(&payload[GENL_HDRLEN..]) {
            if attr_type == CtrlAttr::FamilyId as u16 {
                return get::u16_ne(attr_payload);
            }
        }
    }

    Err(Error::FamilyNotFound { name: name.to_string() })
}

/// Append family/address/id/port/ifindex/flags attributes for an endpoint
/// builder, omitting any attribute whose value is the sentinel (0/None).
pub(crate) fn append_endpoint_attrs(builder: &mut MessageBuilder, endpoint: &MptcpEndpointBuilder) {
    let family = match endpoint.address {
        IpAddr::V4(_) => libc::AF_INET as u16,
        IpAddr::V6(_) => libc::AF_INET6 as u16,
    };
    builder.append_attr(mptcp_pm_addr_attr::FAMILY, &family.to_ne_bytes());

    match endpoint.address {
        IpAddr::V4(addr) => builder.append_attr(mptcp_pm_addr_attr::ADDR4, &addr.octets()),
        IpAddr::V6(addr) => builder.append_attr(mptcp_pm_addr_attr::ADDR6, &addr.octets()),
    }

    if let Some(id) = endpoint.id
        && id != 0
    {
        builder.append_attr_u8(mptcp_pm_addr_attr::ID, id);
    }

    if let Some(port) = endpoint.port {
        builder.append_attr(mptcp_pm_addr_attr::PORT, &port.to_be_bytes());
    }

    if let Some(ifindex) = endpoint.ifindex {
        if ifindex != 0 {
            builder.append_attr_u32(mptcp_pm_addr_attr::IF_IDX, ifindex);
        }
    } else if let Some(ref dev) = endpoint.dev
        && let Ok(ifindex) = crate::util::device::get_ifindex(dev)
    {
        builder.append_attr_u32(mptcp_pm_addr_attr::IF_IDX, ifindex);
    }

    let flags = endpoint.flags.to_raw();
    if flags != 0 {
        builder.append_attr_u32(mptcp_pm_addr_attr::FLAGS, flags);
    }
}

fn append_subflow_attrs(builder: &mut MessageBuilder, spec: &SubflowSpec) {
    builder.append_attr_u32(mptcp_pm_attr::TOKEN, spec.token);
    if spec.local_id != 0 {
        builder.append_attr_u8(mptcp_pm_attr::LOC_ID, spec.local_id);
    }

    if let Some(local_addr) = spec.local_addr {
        let token = builder.nest_start(mptcp_pm_attr::ADDR);
        append_raw_addr(builder, local_addr, spec.local_port, spec.local_id);
        builder.nest_end(token);
    }

    let token = builder.nest_start(mptcp_pm_attr::ADDR_REMOTE);
    append_raw_addr(builder, spec.remote_addr, Some(spec.remote_port), 0);
    builder.nest_end(token);

    if spec.backup {
        builder.append_attr_u32(mptcp_pm_addr_attr::FLAGS as u16, crate::netlink::types::mptcp::mptcp_pm_flags::BACKUP);
    }
}

fn append_raw_addr(builder: &mut MessageBuilder, addr: IpAddr, port: Option<u16>, id: u8) {
    let family = match addr {
        IpAddr::V4(_) => libc::AF_INET as u16,
        IpAddr::V6(_) => libc::AF_INET6 as u16,
    };
    builder.append_attr(mptcp_pm_addr_attr::FAMILY, &family.to_ne_bytes());
    match addr {
        IpAddr::V4(a) => builder.append_attr(mptcp_pm_addr_attr::ADDR4, &a.octets()),
        IpAddr::V6(a) => builder.append_attr(mptcp_pm_addr_attr::ADDR6, &a.octets()),
    }
    if id != 0 {
        builder.append_attr_u8(mptcp_pm_addr_attr::ID, id);
    }
    if let Some(port) = port
        && port != 0
    {
        builder.append_attr(mptcp_pm_addr_attr::PORT, &port.to_be_bytes());
    }
}

/// Parse a single `GET_ADDR` dump item into an [`AddressInfo`].
pub(crate) fn parse_address_info(payload: &[u8]) -> Result<Option<AddressInfo>> {
    if payload.len() < GENL_HDRLEN {
        return Ok(None);
    }
    for (attr_type, attr_payload) in AttrIter::new(&payload[GENL_HDRLEN..]) {
        if attr_type == mptcp_pm_attr::ADDR {
            return Ok(Some(parse_addr_attrs(attr_payload)?));
        }
    }
    Ok(None)
}

fn parse_addr_attrs(data: &[u8]) -> Result<AddressInfo> {
    let mut address = IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED);
    let mut port = None;
    let mut id = 0u8;
    let mut flags = 0u32;
    let mut ifindex = None;

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == mptcp_pm_addr_attr::ID && !payload.is_empty() => id = payload[0],
            t if t == mptcp_pm_addr_attr::ADDR4 && payload.len() >= 4 => {
                let octets: [u8; 4] = payload[..4].try_into().unwrap();
                address = IpAddr::V4(octets.into());
            }
            t if t == mptcp_pm_addr_attr::ADDR6 && payload.len() >= 16 => {
                let octets: [u8; 16] = payload[..16].try_into().unwrap();
                address = IpAddr::V6(octets.into());
            }
            t if t == mptcp_pm_addr_attr::PORT && payload.len() >= 2 => {
                let p = u16::from_be_bytes(payload[..2].try_into().unwrap());
                if p != 0 {
                    port = Some(p);
                }
            }
            t if t == mptcp_pm_addr_attr::FLAGS && payload.len() >= 4 => {
                flags = u32::from_ne_bytes(payload[..4].try_into().unwrap());
            }
            t if t == mptcp_pm_addr_attr::IF_IDX && payload.len() >= 4 => {
                let v = u32::from_ne_bytes(payload[..4].try_into().unwrap());
                if v != 0 {
                    ifindex = Some(v);
                }
            }
            _ => {}
        }
    }

    Ok(AddressInfo { address, port, id, flags, ifindex })
}

fn parse_limits(payload: &[u8]) -> Result<Option<MptcpLimits>> {
    if payload.len() < GENL_HDRLEN {
        return Ok(None);
    }
    let mut limits = MptcpLimits::default();
    let mut found = false;
    for (attr_type, attr_payload) in AttrIter::new(&payload[GENL_HDRLEN..]) {
        match attr_type {
            t if t == mptcp_pm_attr::SUBFLOWS && attr_payload.len() >= 4 => {
                limits.subflows = Some(u32::from_ne_bytes(attr_payload[..4].try_into().unwrap()));
                found = true;
            }
            t if t == mptcp_pm_attr::RCV_ADD_ADDRS && attr_payload.len() >= 4 => {
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
        LimitType::RcvAddAddrs => mptcp_pm_attr::RCV_ADD_ADDRS,
        LimitType::Subflows => mptcp_pm_attr::SUBFLOWS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_payload_yields_none() {
        assert!(parse_address_info(&[]).unwrap().is_none());
    }

    #[test]
    fn parse_limits_empty_yields_none() {
        assert!(parse_limits(&[]).unwrap().is_none());
    }

    /// Scenario S3 from the spec: add_addr encoding for
    /// endpoint 10.0.0.5:0, aid 7, flags SUBFLOW, ifindex 3, token 0.
    /// The nested ADDR container must contain exactly family/ADDR4/ID/FLAGS/IF_IDX,
    /// with no PORT attribute (port is zero) and no TOKEN attribute (not carried
    /// in the add_addr payload for the upstream dialect).
    #[test]
    fn add_addr_s3_encoding() {
        let endpoint = MptcpEndpointBuilder::new("10.0.0.5".parse().unwrap())
            .id(7)
            .subflow()
            .ifindex(3);

        let mut builder = MessageBuilder::new(1, NLM_F_REQUEST | NLM_F_ACK);
        let nest = builder.nest_start(mptcp_pm_attr::ADDR);
        append_endpoint_attrs(&mut builder, &endpoint);
        builder.nest_end(nest);
        let msg = builder.finish();

        // Re-parse: skip the outer nlmsg header, then find the nested ADDR attr.
        let body = &msg[crate::netlink::message::NLMSG_HDRLEN..];
        let (nest_type, nest_payload) = AttrIter::new(body).next().expect("nested attr present");
        assert_eq!(nest_type & !NLA_F_NESTED, mptcp_pm_attr::ADDR);

        let mut seen = std::collections::HashSet::new();
        for (attr_type, payload) in AttrIter::new(nest_payload) {
            seen.insert(attr_type);
            match attr_type {
                t if t == mptcp_pm_addr_attr::FAMILY => {
                    assert_eq!(u16::from_ne_bytes(payload.try_into().unwrap()), libc::AF_INET as u16);
                }
                t if t == mptcp_pm_addr_attr::ADDR4 => {
                    assert_eq!(payload, &[10, 0, 0, 5]);
                }
                t if t == mptcp_pm_addr_attr::ID => assert_eq!(payload, &[7]),
                t if t == mptcp_pm_addr_attr::FLAGS => {
                    assert_eq!(u32::from_ne_bytes(payload.try_into().unwrap()), 2);
                }
                t if t == mptcp_pm_addr_attr::IF_IDX => {
                    assert_eq!(u32::from_ne_bytes(payload.try_into().unwrap()), 3);
                }
                other => panic!("unexpected attribute {other}"),
            }
        }
        assert_eq!(
            seen,
            [
                mptcp_pm_addr_attr::FAMILY,
                mptcp_pm_addr_attr::ADDR4,
                mptcp_pm_addr_attr::ID,
                mptcp_pm_addr_attr::FLAGS,
                mptcp_pm_addr_attr::IF_IDX,
            ]
            .into_iter()
            .collect()
        );
        assert!(!seen.contains(&mptcp_pm_addr_attr::PORT));
    }

    #[test]
    fn add_addr_zero_sentinels_are_omitted() {
        let endpoint = MptcpEndpointBuilder::new("10.0.0.5".parse().unwrap());
        let mut builder = MessageBuilder::new(1, NLM_F_REQUEST);
        append_endpoint_attrs(&mut builder, &endpoint);
        let msg = builder.finish();
        let body = &msg[crate::netlink::message::NLMSG_HDRLEN..];
        for (attr_type, _) in AttrIter::new(body) {
            assert_ne!(attr_type, mptcp_pm_addr_attr::ID);
            assert_ne!(attr_type, mptcp_pm_addr_attr::FLAGS);
            assert_ne!(attr_type, mptcp_pm_addr_attr::IF_IDX);
            assert_ne!(attr_type, mptcp_pm_addr_attr::PORT);
        }
    }
}
