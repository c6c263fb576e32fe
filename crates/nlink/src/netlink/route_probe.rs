//! Single-shot `RTM_GETROUTE` reachability probe.
//!
//! Used by the network monitor to decide whether a freshly observed address
//! is reachable via a default route before publishing it to the path
//! manager. This never walks a full route dump — it sends one kernel-side
//! route lookup for a documentation-space destination and inspects the
//! single reply.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::{AttrIter, get};
use super::builder::MessageBuilder;
use super::connection::Connection;
use super::error::Result;
use super::message::{MessageIter, NLM_F_REQUEST, NlMsgType};
use super::protocol::Route;

const AF_INET: u8 = 2;
const AF_INET6: u8 = 10;

/// `RTM_F_LOOKUP_TABLE`: resolve via the table the route would actually use.
const RTM_F_LOOKUP_TABLE: u32 = 0x1000;
/// `RTM_F_FIB_MATCH`: return the FIB entry, not the resolved nexthop.
const RTM_F_FIB_MATCH: u32 = 0x2000;

mod rta {
    pub const DST: u16 = 1;
    pub const OIF: u16 = 4;
}

/// Documentation-space probe destinations (RFC 5737 / RFC 3849).
const PROBE_DST_V4: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);
const PROBE_DST_V6: Ipv6Addr = Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 0);

/// Mirrors `struct rtmsg`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
struct RtMsg {
    rtm_family: u8,
    rtm_dst_len: u8,
    rtm_src_len: u8,
    rtm_tos: u8,
    rtm_table: u8,
    rtm_protocol: u8,
    rtm_scope: u8,
    rtm_type: u8,
    rtm_flags: u32,
}

impl Connection<Route> {
    /// Probe whether `ifindex` carries a default route toward the
    /// documentation-space destination matching `family`.
    ///
    /// Returns `Ok(true)` only when the kernel's reply contains no `RTA_DST`
    /// (i.e. the match was the default route) and its `RTA_OIF` equals
    /// `ifindex`. Any other reply, or an error from the kernel (e.g. no
    /// route at all), is treated as "not reachable" rather than propagated,
    /// since a probe failure is a normal outcome for an address that simply
    /// isn't routable yet.
    pub async fn probe_default_route(&self, family: IpAddr, ifindex: u32) -> Result<bool> {
        let builder = match family {
            IpAddr::V4(_) => build_probe(AF_INET, &PROBE_DST_V4.octets(), ifindex),
            IpAddr::V6(_) => build_probe(AF_INET6, &PROBE_DST_V6.octets(), ifindex),
        };

        let response = match self.send_request(builder).await {
            Ok(response) => response,
            Err(_) => return Ok(false),
        };

        for result in MessageIter::new(&response) {
            let (header, payload) = result?;
            if header.nlmsg_type != NlMsgType::RTM_NEWROUTE {
                continue;
            }
            if payload.len() < std::mem::size_of::<RtMsg>() {
                continue;
            }
            let attrs = &payload[std::mem::size_of::<RtMsg>()..];
            return Ok(is_default_route_via(attrs, ifindex));
        }

        Ok(false)
    }
}

fn build_probe(af: u8, dst: &[u8], ifindex: u32) -> MessageBuilder {
    let mut builder = MessageBuilder::new(NlMsgType::RTM_GETROUTE, NLM_F_REQUEST);

    let rtmsg = RtMsg {
        rtm_family: af,
        rtm_dst_len: (dst.len() * 8) as u8,
        rtm_src_len: 0,
        rtm_tos: 0,
        rtm_table: 0,
        rtm_protocol: 0,
        rtm_scope: 0,
        rtm_type: 0,
        rtm_flags: RTM_F_LOOKUP_TABLE | RTM_F_FIB_MATCH,
    };
    builder.append(&rtmsg);

    builder.append_attr(rta::DST, dst);
    builder.append_attr_u32(rta::OIF, ifindex);

    builder
}

/// `true` iff the attribute set carries no `RTA_DST` (default route) and its
/// `RTA_OIF` matches `ifindex`.
fn is_default_route_via(attrs: &[u8], ifindex: u32) -> bool {
    let mut has_dst = false;
    let mut oif = None;

    for (attr_type, payload) in AttrIter::new(attrs) {
        match attr_type {
            rta::DST => has_dst = true,
            rta::OIF => oif = get::u32_ne(payload).ok(),
            _ => {}
        }
    }

    !has_dst && oif == Some(ifindex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(attr_type: u16, payload: &[u8]) -> Vec<u8> {
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
    fn default_route_with_matching_oif_is_reachable() {
        let attrs = attr(rta::OIF, &3u32.to_ne_bytes());
        assert!(is_default_route_via(&attrs, 3));
    }

    #[test]
    fn default_route_with_other_oif_is_not_reachable() {
        let attrs = attr(rta::OIF, &3u32.to_ne_bytes());
        assert!(!is_default_route_via(&attrs, 7));
    }

    #[test]
    fn specific_route_with_dst_is_not_reachable() {
        let mut attrs = attr(rta::DST, &PROBE_DST_V4.octets());
        attrs.extend(attr(rta::OIF, &3u32.to_ne_bytes()));
        assert!(!is_default_route_via(&attrs, 3));
    }

    #[test]
    fn build_probe_v4_sets_lookup_flags() {
        let builder = build_probe(AF_INET, &PROBE_DST_V4.octets(), 2);
        let bytes = builder.as_bytes();
        assert!(!bytes.is_empty());
    }
}
