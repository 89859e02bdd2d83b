//! Link requests: create, delete and query network interfaces.
//!
//! # Example
//!
//! ```ignore
//! use brlink::netlink::Connection;
//! use brlink::netlink::link::BridgeLink;
//!
//! let conn = Connection::new()?;
//!
//! // Create a bridge with STP enabled
//! conn.add_link(BridgeLink::new("br0").stp(true))?;
//!
//! // Read it back
//! let link = conn.get_link("br0")?.expect("br0 exists");
//! assert!(link.is_bridge());
//!
//! conn.del_link("br0")?;
//! ```

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::{self, get};
use super::builder::MessageBuilder;
use super::connection::{Connection, ack_request, get_request};
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_ACK, NLM_F_CREATE, NLM_F_EXCL, NLM_F_REQUEST, NlMsgType,
};
use crate::util::ifname;

/// Interface info message (struct ifinfomsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    /// Address family (usually AF_UNSPEC).
    pub ifi_family: u8,
    /// Padding.
    pub ifi_pad: u8,
    /// Device type (ARPHRD_*).
    pub ifi_type: u16,
    /// Interface index.
    pub ifi_index: i32,
    /// Device flags (IFF_*).
    pub ifi_flags: u32,
    /// Change mask.
    pub ifi_change: u32,
}

impl IfInfoMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new interface info message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface index.
    pub fn with_index(mut self, index: i32) -> Self {
        self.ifi_index = index;
        self
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}

/// Interface link attributes (IFLA_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum IflaAttr {
    Ifname = 3,
    Mtu = 4,
    Master = 10,
    Linkinfo = 18,
}

/// Nested IFLA_INFO_* attributes inside IFLA_LINKINFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum IflaInfo {
    Kind = 1,
    Data = 2,
}

/// Bridge-specific attributes (IFLA_BR_*) carried in IFLA_INFO_DATA.
pub mod bridge {
    pub const IFLA_BR_FORWARD_DELAY: u16 = 1;
    pub const IFLA_BR_HELLO_TIME: u16 = 2;
    pub const IFLA_BR_MAX_AGE: u16 = 3;
    pub const IFLA_BR_AGEING_TIME: u16 = 4;
    pub const IFLA_BR_STP_STATE: u16 = 5;
    pub const IFLA_BR_PRIORITY: u16 = 6;
    pub const IFLA_BR_VLAN_FILTERING: u16 = 7;
}

/// One kind-specific attribute placed inside IFLA_INFO_DATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindAttr {
    /// Attribute type.
    pub kind: u16,
    /// Raw payload.
    pub data: Vec<u8>,
}

impl KindAttr {
    /// A u8 attribute.
    pub fn u8(kind: u16, value: u8) -> Self {
        Self {
            kind,
            data: vec![value],
        }
    }

    /// A u16 attribute (native endian).
    pub fn u16(kind: u16, value: u16) -> Self {
        Self {
            kind,
            data: value.to_ne_bytes().to_vec(),
        }
    }

    /// A u32 attribute (native endian).
    pub fn u32(kind: u16, value: u32) -> Self {
        Self {
            kind,
            data: value.to_ne_bytes().to_vec(),
        }
    }
}

/// Build an `RTM_NEWLINK` request creating interface `name` of type `kind`.
///
/// Flags request creation, exclusivity and an acknowledgment. `extra` goes
/// into an IFLA_INFO_DATA nest, which is omitted when `extra` is empty.
pub fn link_create_request(name: &str, kind: &str, extra: &[KindAttr]) -> Result<MessageBuilder> {
    ifname::validate(name)?;

    let mut builder = MessageBuilder::new(
        NlMsgType::RTM_NEWLINK,
        NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL,
    );
    builder.append(&IfInfoMsg::new());
    builder.append_attr_str(IflaAttr::Ifname as u16, name);

    // IFLA_LINKINFO -> IFLA_INFO_KIND [, IFLA_INFO_DATA]
    let linkinfo = builder.nest_start(IflaAttr::Linkinfo as u16);
    builder.append_attr_str(IflaInfo::Kind as u16, kind);
    if !extra.is_empty() {
        let data = builder.nest_start(IflaInfo::Data as u16);
        for attr in extra {
            builder.append_attr(attr.kind, &attr.data);
        }
        builder.nest_end(data);
    }
    builder.nest_end(linkinfo);

    Ok(builder)
}

/// Build an `RTM_DELLINK` request for interface `name`, acknowledged.
pub fn link_delete_request(name: &str) -> Result<MessageBuilder> {
    ifname::validate(name)?;

    let mut builder = ack_request(NlMsgType::RTM_DELLINK);
    builder.append(&IfInfoMsg::new());
    builder.append_attr_str(IflaAttr::Ifname as u16, name);
    Ok(builder)
}

/// Build an `RTM_GETLINK` request for interface `name`.
pub fn link_get_request(name: &str) -> Result<MessageBuilder> {
    ifname::validate(name)?;

    let mut builder = get_request(NlMsgType::RTM_GETLINK);
    builder.append(&IfInfoMsg::new());
    builder.append_attr_str(IflaAttr::Ifname as u16, name);
    Ok(builder)
}

/// Trait for link configurations that can be added to the system.
pub trait LinkConfig {
    /// Get the name of this interface.
    fn name(&self) -> &str;

    /// Get the kind string for this link type (e.g., "bridge").
    fn kind(&self) -> &str;

    /// Build the netlink message for creating this link.
    fn build(&self) -> Result<MessageBuilder>;
}

/// Configuration for a bridge interface.
///
/// # Example
///
/// ```ignore
/// use brlink::netlink::link::BridgeLink;
///
/// let bridge = BridgeLink::new("br0")
///     .stp(true)
///     .vlan_filtering(true);
///
/// conn.add_link(bridge)?;
/// ```
#[derive(Debug, Clone)]
pub struct BridgeLink {
    name: String,
    mtu: Option<u32>,
    /// Forward delay in centiseconds
    forward_delay: Option<u32>,
    /// Hello time in centiseconds
    hello_time: Option<u32>,
    /// Max age in centiseconds
    max_age: Option<u32>,
    /// Ageing time in centiseconds
    ageing_time: Option<u32>,
    /// STP state (0 = off, 1 = on)
    stp_state: Option<u32>,
    priority: Option<u16>,
    vlan_filtering: Option<bool>,
}

impl BridgeLink {
    /// Create a new bridge interface configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mtu: None,
            forward_delay: None,
            hello_time: None,
            max_age: None,
            ageing_time: None,
            stp_state: None,
            priority: None,
            vlan_filtering: None,
        }
    }

    /// Set the MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Enable or disable STP.
    pub fn stp(mut self, enabled: bool) -> Self {
        self.stp_state = Some(u32::from(enabled));
        self
    }

    /// Set the forward delay in milliseconds.
    pub fn forward_delay_ms(mut self, ms: u32) -> Self {
        // Kernel expects centiseconds (USER_HZ typically 100)
        self.forward_delay = Some(ms / 10);
        self
    }

    /// Set the hello time in milliseconds.
    pub fn hello_time_ms(mut self, ms: u32) -> Self {
        self.hello_time = Some(ms / 10);
        self
    }

    /// Set the max age in milliseconds.
    pub fn max_age_ms(mut self, ms: u32) -> Self {
        self.max_age = Some(ms / 10);
        self
    }

    /// Set the ageing time in seconds.
    pub fn ageing_time(mut self, seconds: u32) -> Self {
        self.ageing_time = Some(seconds.saturating_mul(100));
        self
    }

    /// Set the bridge priority.
    pub fn priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Enable or disable VLAN filtering.
    pub fn vlan_filtering(mut self, enabled: bool) -> Self {
        self.vlan_filtering = Some(enabled);
        self
    }

    /// Bridge options as IFLA_BR_* attributes, in kernel attribute order.
    pub fn kind_attrs(&self) -> Vec<KindAttr> {
        let mut attrs = Vec::new();
        if let Some(val) = self.forward_delay {
            attrs.push(KindAttr::u32(bridge::IFLA_BR_FORWARD_DELAY, val));
        }
        if let Some(val) = self.hello_time {
            attrs.push(KindAttr::u32(bridge::IFLA_BR_HELLO_TIME, val));
        }
        if let Some(val) = self.max_age {
            attrs.push(KindAttr::u32(bridge::IFLA_BR_MAX_AGE, val));
        }
        if let Some(val) = self.ageing_time {
            attrs.push(KindAttr::u32(bridge::IFLA_BR_AGEING_TIME, val));
        }
        if let Some(val) = self.stp_state {
            attrs.push(KindAttr::u32(bridge::IFLA_BR_STP_STATE, val));
        }
        if let Some(val) = self.priority {
            attrs.push(KindAttr::u16(bridge::IFLA_BR_PRIORITY, val));
        }
        if let Some(enabled) = self.vlan_filtering {
            attrs.push(KindAttr::u8(bridge::IFLA_BR_VLAN_FILTERING, u8::from(enabled)));
        }
        attrs
    }
}

impl LinkConfig for BridgeLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "bridge"
    }

    fn build(&self) -> Result<MessageBuilder> {
        let mut builder = link_create_request(&self.name, self.kind(), &self.kind_attrs())?;
        if let Some(mtu) = self.mtu {
            builder.append_attr_u32(IflaAttr::Mtu as u16, mtu);
        }
        Ok(builder)
    }
}

/// A link as reported by the kernel in an `RTM_NEWLINK` reply.
#[derive(Debug, Clone, Default)]
pub struct LinkMessage {
    pub(crate) header: IfInfoMsg,
    pub(crate) name: Option<String>,
    pub(crate) kind: Option<String>,
    pub(crate) master: Option<u32>,
    pub(crate) mtu: Option<u32>,
}

impl LinkMessage {
    /// Parse the first message of a reply buffer.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let msg = MessageIter::new(data)
            .next()
            .ok_or_else(|| Error::InvalidMessage("empty link reply".into()))?;
        if msg.msg_type() != NlMsgType::RTM_NEWLINK {
            return Err(Error::InvalidMessage(format!(
                "expected RTM_NEWLINK, got message type {}",
                msg.msg_type()
            )));
        }

        let header = IfInfoMsg::from_bytes(msg.payload())?;
        let base = IfInfoMsg::SIZE;

        let name = msg
            .find_attr(base, IflaAttr::Ifname as u16)
            .map(get::string)
            .transpose()?
            .map(str::to_owned);
        let kind = msg
            .find_attr(base, IflaAttr::Linkinfo as u16)
            .and_then(|info| attr::find(info, IflaInfo::Kind as u16))
            .map(get::string)
            .transpose()?
            .map(str::to_owned);
        let master = msg
            .find_attr(base, IflaAttr::Master as u16)
            .map(get::u32_ne)
            .transpose()?;
        let mtu = msg
            .find_attr(base, IflaAttr::Mtu as u16)
            .map(get::u32_ne)
            .transpose()?;

        Ok(Self {
            header,
            name,
            kind,
            master,
            mtu,
        })
    }

    /// Interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifi_index as u32
    }

    /// Interface name (IFLA_IFNAME).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Link type kind from IFLA_LINKINFO (e.g., "bridge").
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Master device index (IFLA_MASTER).
    pub fn master(&self) -> Option<u32> {
        self.master
    }

    /// MTU (IFLA_MTU).
    pub fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    /// Check whether this link is a bridge.
    pub fn is_bridge(&self) -> bool {
        self.kind() == Some("bridge")
    }
}

impl Connection {
    /// Add a new network interface.
    pub fn add_link<L: LinkConfig>(&self, config: L) -> Result<()> {
        let builder = config.build()?;
        self.request_ack(builder)
    }

    /// Delete a network interface by name.
    pub fn del_link(&self, name: &str) -> Result<()> {
        self.request_ack(link_delete_request(name)?)
    }

    /// Look up a network interface by name.
    ///
    /// Returns `None` if the interface doesn't exist.
    pub fn get_link(&self, name: &str) -> Result<Option<LinkMessage>> {
        match self.request(link_get_request(name)?) {
            Ok(reply) => LinkMessage::parse(&reply).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrIter, NLA_F_NESTED};
    use crate::netlink::message::{NLMSG_HDRLEN, NlMsgHdr};

    #[test]
    fn test_ifinfomsg_size() {
        assert_eq!(IfInfoMsg::SIZE, 16);
    }

    #[test]
    fn test_create_bridge_request_size() {
        let msg = link_create_request("br0", "bridge", &[]).unwrap().finish();

        // header 16 + ifinfomsg 16
        // + IFLA_IFNAME: 4 + "br0\0" = 8
        // + IFLA_LINKINFO: 4 + IFLA_INFO_KIND (4 + "bridge\0" = 11, padded 12) = 16
        assert_eq!(msg.len(), 56);

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len, 56);
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_NEWLINK);
        assert_eq!(
            header.nlmsg_flags,
            NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL
        );
    }

    #[test]
    fn test_create_request_layout() {
        let msg = link_create_request("br0", "bridge", &[]).unwrap().finish();
        let attrs = &msg[NLMSG_HDRLEN + IfInfoMsg::SIZE..];

        assert_eq!(attrs[..8], [8, 0, 3, 0, b'b', b'r', b'0', 0]);
        assert_eq!(u16::from_ne_bytes([attrs[8], attrs[9]]), 16);
        assert_eq!(u16::from_ne_bytes([attrs[10], attrs[11]]), 18 | NLA_F_NESTED);
        assert_eq!(u16::from_ne_bytes([attrs[12], attrs[13]]), 11);
        assert_eq!(&attrs[16..23], b"bridge\0");
        assert_eq!(attrs[23], 0);
    }

    #[test]
    fn test_create_request_with_kind_data() {
        let extra = [
            KindAttr::u32(bridge::IFLA_BR_STP_STATE, 1),
            KindAttr::u8(bridge::IFLA_BR_VLAN_FILTERING, 1),
        ];
        let msg = link_create_request("br0", "bridge", &extra).unwrap().finish();
        let parsed = MessageIter::new(&msg).next().unwrap();

        let info = parsed
            .find_attr(IfInfoMsg::SIZE, IflaAttr::Linkinfo as u16)
            .unwrap();
        let data = attr::find(info, IflaInfo::Data as u16).unwrap();
        let children: Vec<_> = AttrIter::new(data)
            .map(|(kind, payload)| KindAttr {
                kind,
                data: payload.to_vec(),
            })
            .collect();
        assert_eq!(children, extra);
    }

    #[test]
    fn test_delete_request() {
        let msg = link_delete_request("br0").unwrap().finish();
        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_DELLINK);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK);
        assert_eq!(msg.len(), NLMSG_HDRLEN + IfInfoMsg::SIZE + 8);
    }

    #[test]
    fn test_get_request_has_no_ack_flag() {
        let msg = link_get_request("br0").unwrap().finish();
        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_type, NlMsgType::RTM_GETLINK);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(link_create_request("", "bridge", &[]).is_err());
        assert!(link_create_request("averyveryverylongname", "bridge", &[]).is_err());
        assert!(matches!(
            link_delete_request("br 0"),
            Err(Error::Interface(_))
        ));
    }

    #[test]
    fn test_bridge_link_options() {
        let link = BridgeLink::new("br0")
            .stp(true)
            .ageing_time(300)
            .forward_delay_ms(15000)
            .priority(4096);
        assert_eq!(
            link.kind_attrs(),
            vec![
                KindAttr::u32(bridge::IFLA_BR_FORWARD_DELAY, 1500),
                KindAttr::u32(bridge::IFLA_BR_AGEING_TIME, 30000),
                KindAttr::u32(bridge::IFLA_BR_STP_STATE, 1),
                KindAttr::u16(bridge::IFLA_BR_PRIORITY, 4096),
            ]
        );
        assert!(BridgeLink::new("br0").kind_attrs().is_empty());
    }

    #[test]
    fn test_bridge_link_mtu_is_top_level() {
        let msg = BridgeLink::new("br0").mtu(9000).build().unwrap().finish();
        let parsed = MessageIter::new(&msg).next().unwrap();
        let mtu = parsed
            .find_attr(IfInfoMsg::SIZE, IflaAttr::Mtu as u16)
            .unwrap();
        assert_eq!(get::u32_ne(mtu).unwrap(), 9000);
    }

    /// Reply shaped like the kernel's answer to RTM_GETLINK for a bridge.
    fn newlink_reply(name: &str, kind: Option<&str>) -> Vec<u8> {
        let mut builder = MessageBuilder::new(NlMsgType::RTM_NEWLINK, 0);
        builder.append(&IfInfoMsg::new().with_index(7));
        builder.append_attr_str(IflaAttr::Ifname as u16, name);
        builder.append_attr_u32(IflaAttr::Mtu as u16, 1500);
        if let Some(kind) = kind {
            let info = builder.nest_start(IflaAttr::Linkinfo as u16);
            builder.append_attr_str(IflaInfo::Kind as u16, kind);
            builder.nest_end(info);
        }
        builder.finish()
    }

    #[test]
    fn test_parse_bridge_link() {
        let link = LinkMessage::parse(&newlink_reply("br0", Some("bridge"))).unwrap();
        assert_eq!(link.ifindex(), 7);
        assert_eq!(link.name(), Some("br0"));
        assert_eq!(link.kind(), Some("bridge"));
        assert_eq!(link.mtu(), Some(1500));
        assert_eq!(link.master(), None);
        assert!(link.is_bridge());
    }

    #[test]
    fn test_parse_plain_link() {
        let link = LinkMessage::parse(&newlink_reply("eth0", None)).unwrap();
        assert_eq!(link.kind(), None);
        assert!(!link.is_bridge());
    }

    #[test]
    fn test_parse_rejects_other_types() {
        let msg = ack_request(NlMsgType::RTM_DELLINK).finish();
        assert!(matches!(
            LinkMessage::parse(&msg),
            Err(Error::InvalidMessage(_))
        ));
        assert!(LinkMessage::parse(&[]).is_err());
    }
}
