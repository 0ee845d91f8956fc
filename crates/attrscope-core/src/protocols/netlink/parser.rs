use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::NetlinkError;
use super::layout;
use super::reader::{NetlinkHeader, NetlinkReader};
use crate::engine::handlers::{
    AddressHandler, BytesHandler, NestedHandler, TextHandler, UnsignedHandler,
};
use crate::engine::{
    AttributeWalker, DecodeContext, DecodeOutput, ExplicitHeader, FieldOrder, FieldWidth,
    RecordFormat, TypeDispatchTable,
};

/// `nlattr` header rules: `len | type`, host order, 4-byte alignment.
pub fn netlink_format() -> RecordFormat {
    RecordFormat::explicit(ExplicitHeader {
        order: FieldOrder::LengthFirst,
        type_width: FieldWidth::U16,
        length_width: FieldWidth::U16,
        type_mask: u32::from(layout::NLA_TYPE_MASK),
        flag_mask: u32::from(layout::NLA_F_NESTED | layout::NLA_F_NET_BYTEORDER),
        alignment: layout::NLA_ALIGNTO,
        byte_order: None,
        network_order_flag: Some(u32::from(layout::NLA_F_NET_BYTEORDER)),
    })
}

/// Netlink protocol the message was read from; message type numbers are
/// only meaningful within one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetlinkBus {
    #[default]
    Route,
    Generic,
}

impl NetlinkBus {
    /// Attribute set for `message_type` on this bus.
    pub fn family_for(&self, message_type: u16) -> NetlinkFamily {
        if message_type < layout::NLMSG_MIN_TYPE {
            return NetlinkFamily::control();
        }
        match (*self, message_type) {
            (NetlinkBus::Route, layout::RTM_NEWLINK..=layout::RTM_SETLINK) => {
                NetlinkFamily::route_link()
            }
            (NetlinkBus::Route, layout::RTM_NEWADDR..=layout::RTM_GETADDR) => {
                NetlinkFamily::route_addr()
            }
            (NetlinkBus::Generic, layout::GENL_ID_CTRL) => NetlinkFamily::generic_ctrl(),
            (NetlinkBus::Generic, _) => {
                NetlinkFamily::new("genl", layout::GENL_HDRLEN, TypeDispatchTable::new())
                    .with_version_offset(layout::GENL_VERSION_OFFSET)
            }
            (NetlinkBus::Route, _) => NetlinkFamily::new("rtnetlink", 0, TypeDispatchTable::new()),
        }
    }
}

/// Family header size and attribute handlers for one message family.
#[derive(Debug, Clone)]
pub struct NetlinkFamily {
    pub name: &'static str,
    /// Fixed family header between `nlmsghdr` and the attributes.
    pub header_len: usize,
    /// Byte of the family header holding the family's protocol version.
    pub version_offset: Option<usize>,
    pub attributes: TypeDispatchTable,
}

impl NetlinkFamily {
    pub fn new(name: &'static str, header_len: usize, attributes: TypeDispatchTable) -> Self {
        Self {
            name,
            header_len,
            version_offset: None,
            attributes,
        }
    }

    pub fn with_version_offset(mut self, offset: usize) -> Self {
        self.version_offset = Some(offset);
        self
    }

    /// `NLMSG_ERROR`, `NLMSG_DONE` and friends: the payload is a fixed struct.
    pub fn control() -> Self {
        Self::new("control", usize::MAX, TypeDispatchTable::new())
    }

    /// Generic netlink controller (`nlctrl`).
    pub fn generic_ctrl() -> Self {
        let mut op = TypeDispatchTable::new();
        op.register(layout::CTRL_ATTR_OP_ID, UnsignedHandler::fixed(4))
            .register(layout::CTRL_ATTR_OP_FLAGS, UnsignedHandler::fixed(4));
        let mut ops = TypeDispatchTable::new();
        ops.set_fallback(NestedHandler::new(Arc::new(op)));

        let mut group = TypeDispatchTable::new();
        group
            .register(layout::CTRL_ATTR_MCAST_GRP_NAME, TextHandler)
            .register(layout::CTRL_ATTR_MCAST_GRP_ID, UnsignedHandler::fixed(4));
        let mut groups = TypeDispatchTable::new();
        groups.set_fallback(NestedHandler::new(Arc::new(group)));

        let mut attributes = TypeDispatchTable::new();
        attributes
            .register(layout::CTRL_ATTR_FAMILY_ID, UnsignedHandler::fixed(2))
            .register(layout::CTRL_ATTR_FAMILY_NAME, TextHandler)
            .register(layout::CTRL_ATTR_VERSION, UnsignedHandler::fixed(4))
            .register(layout::CTRL_ATTR_HDRSIZE, UnsignedHandler::fixed(4))
            .register(layout::CTRL_ATTR_MAXATTR, UnsignedHandler::fixed(4))
            .register(layout::CTRL_ATTR_OPS, NestedHandler::new(Arc::new(ops)))
            .register(
                layout::CTRL_ATTR_MCAST_GROUPS,
                NestedHandler::new(Arc::new(groups)),
            );
        Self::new("nlctrl", layout::GENL_HDRLEN, attributes)
            .with_version_offset(layout::GENL_VERSION_OFFSET)
    }

    /// rtnetlink link messages (`RTM_*LINK`).
    pub fn route_link() -> Self {
        let mut info = TypeDispatchTable::new();
        info.register(layout::IFLA_INFO_KIND, TextHandler)
            .register(layout::IFLA_INFO_DATA, BytesHandler);

        let mut attributes = TypeDispatchTable::new();
        attributes
            .register(layout::IFLA_ADDRESS, BytesHandler)
            .register(layout::IFLA_BROADCAST, BytesHandler)
            .register(layout::IFLA_IFNAME, TextHandler)
            .register(layout::IFLA_MTU, UnsignedHandler::fixed(4))
            .register(layout::IFLA_LINK, UnsignedHandler::fixed(4))
            .register(layout::IFLA_QDISC, TextHandler)
            .register(layout::IFLA_STATS, BytesHandler)
            .register(layout::IFLA_TXQLEN, UnsignedHandler::fixed(4))
            .register(layout::IFLA_OPERSTATE, UnsignedHandler::fixed(1))
            .register(layout::IFLA_LINKMODE, UnsignedHandler::fixed(1))
            .register(layout::IFLA_LINKINFO, NestedHandler::new(Arc::new(info)));
        Self::new("rtnl-link", layout::IFINFOMSG_LEN, attributes)
    }

    /// rtnetlink address messages (`RTM_*ADDR`).
    pub fn route_addr() -> Self {
        let mut attributes = TypeDispatchTable::new();
        attributes
            .register(layout::IFA_ADDRESS, AddressHandler)
            .register(layout::IFA_LOCAL, AddressHandler)
            .register(layout::IFA_LABEL, TextHandler)
            .register(layout::IFA_BROADCAST, AddressHandler)
            .register(layout::IFA_CACHEINFO, BytesHandler)
            .register(layout::IFA_FLAGS, UnsignedHandler::fixed(4));
        Self::new("rtnl-addr", layout::IFADDRMSG_LEN, attributes)
    }
}

/// One decoded netlink message.
#[derive(Debug, Clone)]
pub struct NetlinkMessage {
    pub header: NetlinkHeader,
    pub family: &'static str,
    pub family_header: Vec<u8>,
    pub output: DecodeOutput,
}

/// Decode one netlink message, picking the family from the message type.
pub fn decode_netlink_message(
    buffer: &[u8],
    ctx: &DecodeContext,
    bus: NetlinkBus,
) -> Result<NetlinkMessage, NetlinkError> {
    let header = NetlinkReader::new(buffer, ctx.byte_order).header()?;
    let family = bus.family_for(header.message_type);
    decode_with_family(buffer, ctx, &family)
}

/// Decode one netlink message with a caller-supplied family.
///
/// Framing errors are returned; attribute anomalies end up in
/// `output.diagnostics`.
pub fn decode_with_family(
    buffer: &[u8],
    ctx: &DecodeContext,
    family: &NetlinkFamily,
) -> Result<NetlinkMessage, NetlinkError> {
    let reader = NetlinkReader::new(buffer, ctx.byte_order);
    let header = reader.header()?;
    let payload = header.payload_range();
    let family_end = payload.start.saturating_add(family.header_len).min(payload.end);
    if family.header_len != usize::MAX && family_end - payload.start < family.header_len {
        return Err(NetlinkError::TooShort {
            needed: payload.start + family.header_len,
            actual: payload.end,
        });
    }
    let family_header = reader.read_slice(payload.start..family_end)?.to_vec();

    let mut ctx = ctx.clone();
    if let Some(version) = family
        .version_offset
        .and_then(|offset| family_header.get(offset))
    {
        ctx = ctx.protocol_version(u16::from(*version));
    }

    let format = netlink_format();
    let output = AttributeWalker::new(&format).walk(
        buffer,
        family_end,
        payload.end,
        &ctx,
        &family.attributes,
    );
    debug!(
        message_type = header.message_type,
        family = family.name,
        attributes = output.tree.len(),
        diagnostics = output.diagnostics.len(),
        "netlink message decoded"
    );
    Ok(NetlinkMessage {
        header,
        family: family.name,
        family_header,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::{NetlinkBus, decode_netlink_message};
    use crate::engine::encode::{bytes_leaf, encode_attributes, nested, unsigned_leaf};
    use crate::engine::{Attribute, AttributeValue, ByteOrder, DecodeContext};
    use crate::protocols::netlink::error::NetlinkError;
    use crate::protocols::netlink::layout;

    fn message(message_type: u16, family_header: &[u8], attributes: &[Attribute]) -> Vec<u8> {
        let body = encode_attributes(attributes, &super::netlink_format(), ByteOrder::Little)
            .unwrap();
        let length = (layout::NLMSG_HDRLEN + family_header.len() + body.len()) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(&message_type.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(family_header);
        bytes.extend_from_slice(&body);
        bytes
    }

    fn le() -> DecodeContext {
        DecodeContext::new(ByteOrder::Little)
    }

    #[test]
    fn generic_ctrl_family_decodes_nested_ops() {
        let nested_flag = u32::from(layout::NLA_F_NESTED);
        let attrs = [
            unsigned_leaf(layout::CTRL_ATTR_FAMILY_ID, 0x1c, 2),
            bytes_leaf(layout::CTRL_ATTR_FAMILY_NAME, b"nlctrl\0"),
            nested(
                layout::CTRL_ATTR_OPS,
                nested_flag,
                vec![nested(
                    1,
                    nested_flag,
                    vec![unsigned_leaf(1, 3, 4), unsigned_leaf(2, 0x0a, 4)],
                )],
            ),
        ];
        let bytes = message(layout::GENL_ID_CTRL, &[1, 2, 0, 0], &attrs);
        let msg = decode_netlink_message(&bytes, &le(), NetlinkBus::Generic).unwrap();

        assert_eq!(msg.family, "nlctrl");
        assert!(msg.output.diagnostics.is_empty());
        let tree = &msg.output.tree;
        assert_eq!(tree[0].value, AttributeValue::Unsigned(0x1c));
        assert_eq!(tree[1].value, AttributeValue::Text("nlctrl".to_string()));
        assert_eq!(tree[2].flags, nested_flag);
        let op = &tree[2].children[0];
        assert_eq!(op.child(1).unwrap().value, AttributeValue::Unsigned(3));
        assert_eq!(op.child(2).unwrap().value, AttributeValue::Unsigned(0x0a));
        assert_eq!(msg.output.end_offset, bytes.len());
    }

    #[test]
    fn net_byteorder_flag_reads_big_endian() {
        let mut mtu = unsigned_leaf(layout::IFLA_MTU, 1500, 4);
        mtu.flags = u32::from(layout::NLA_F_NET_BYTEORDER);
        let attrs = [bytes_leaf(layout::IFLA_IFNAME, b"eth0\0"), mtu];
        let bytes = message(layout::RTM_NEWLINK, &[0u8; layout::IFINFOMSG_LEN], &attrs);
        let value_start = bytes.len() - 4;
        assert_eq!(&bytes[value_start..], &1500u32.to_be_bytes());

        let msg = decode_netlink_message(&bytes, &le(), NetlinkBus::Route).unwrap();
        assert_eq!(msg.family, "rtnl-link");
        assert_eq!(msg.output.tree[0].value, AttributeValue::Text("eth0".to_string()));
        assert_eq!(msg.output.tree[1].value, AttributeValue::Unsigned(1500));
    }

    #[test]
    fn address_attributes_decode_as_ip() {
        let attrs = [bytes_leaf(layout::IFA_LOCAL, &[192, 0, 2, 1])];
        let bytes = message(layout::RTM_NEWADDR, &[0u8; layout::IFADDRMSG_LEN], &attrs);
        let msg = decode_netlink_message(&bytes, &le(), NetlinkBus::Route).unwrap();
        assert_eq!(
            msg.output.tree[0].value,
            AttributeValue::Address("192.0.2.1".parse().unwrap())
        );
    }

    #[test]
    fn control_messages_carry_no_attributes() {
        let bytes = message(layout::NLMSG_DONE, &[0, 0, 0, 0], &[]);
        let msg = decode_netlink_message(&bytes, &le(), NetlinkBus::Route).unwrap();
        assert_eq!(msg.family, "control");
        assert_eq!(msg.family_header, vec![0, 0, 0, 0]);
        assert!(msg.output.tree.is_empty());
        assert!(msg.output.diagnostics.is_empty());
    }

    #[test]
    fn truncated_family_header_is_a_framing_error() {
        let bytes = message(layout::RTM_NEWLINK, &[0u8; 4], &[]);
        let err = decode_netlink_message(&bytes, &le(), NetlinkBus::Route).unwrap_err();
        assert_eq!(
            err,
            NetlinkError::TooShort {
                needed: 32,
                actual: 20
            }
        );
    }

    #[test]
    fn genl_version_lands_in_context() {
        let bytes = message(0x20, &[1, 3, 0, 0], &[bytes_leaf(1, b"x")]);
        let msg = decode_netlink_message(&bytes, &le(), NetlinkBus::Generic).unwrap();
        assert_eq!(msg.family, "genl");
        assert_eq!(msg.family_header[1], 3);
        assert!(msg.output.tree[0].value.is_opaque());
    }
}
