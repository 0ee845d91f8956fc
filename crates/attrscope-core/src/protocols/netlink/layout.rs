use std::ops::Range;

pub const NLMSG_HDRLEN: usize = 16;
pub const NLMSG_ALIGNTO: usize = 4;
pub const NLMSG_LEN_RANGE: Range<usize> = 0..4;
pub const NLMSG_TYPE_RANGE: Range<usize> = 4..6;
pub const NLMSG_FLAGS_RANGE: Range<usize> = 6..8;
pub const NLMSG_SEQ_RANGE: Range<usize> = 8..12;
pub const NLMSG_PID_RANGE: Range<usize> = 12..16;

/// Message types below this value are netlink control messages.
pub const NLMSG_MIN_TYPE: u16 = 0x10;
pub const NLMSG_NOOP: u16 = 0x1;
pub const NLMSG_ERROR: u16 = 0x2;
pub const NLMSG_DONE: u16 = 0x3;

pub const NLA_HDRLEN: usize = 4;
pub const NLA_ALIGNTO: usize = 4;
pub const NLA_F_NESTED: u16 = 0x8000;
pub const NLA_F_NET_BYTEORDER: u16 = 0x4000;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

pub const GENL_HDRLEN: usize = 4;
pub const GENL_VERSION_OFFSET: usize = 1;
pub const GENL_ID_CTRL: u16 = 0x10;

pub const CTRL_ATTR_FAMILY_ID: u32 = 1;
pub const CTRL_ATTR_FAMILY_NAME: u32 = 2;
pub const CTRL_ATTR_VERSION: u32 = 3;
pub const CTRL_ATTR_HDRSIZE: u32 = 4;
pub const CTRL_ATTR_MAXATTR: u32 = 5;
pub const CTRL_ATTR_OPS: u32 = 6;
pub const CTRL_ATTR_MCAST_GROUPS: u32 = 7;
pub const CTRL_ATTR_OP_ID: u32 = 1;
pub const CTRL_ATTR_OP_FLAGS: u32 = 2;
pub const CTRL_ATTR_MCAST_GRP_NAME: u32 = 1;
pub const CTRL_ATTR_MCAST_GRP_ID: u32 = 2;

pub const RTM_NEWLINK: u16 = 16;
pub const RTM_GETLINK: u16 = 18;
pub const RTM_SETLINK: u16 = 19;
pub const RTM_NEWADDR: u16 = 20;
pub const RTM_GETADDR: u16 = 22;
/// `struct ifinfomsg`
pub const IFINFOMSG_LEN: usize = 16;
/// `struct ifaddrmsg`
pub const IFADDRMSG_LEN: usize = 8;

pub const IFLA_ADDRESS: u32 = 1;
pub const IFLA_BROADCAST: u32 = 2;
pub const IFLA_IFNAME: u32 = 3;
pub const IFLA_MTU: u32 = 4;
pub const IFLA_LINK: u32 = 5;
pub const IFLA_QDISC: u32 = 6;
pub const IFLA_STATS: u32 = 7;
pub const IFLA_TXQLEN: u32 = 13;
pub const IFLA_OPERSTATE: u32 = 16;
pub const IFLA_LINKMODE: u32 = 17;
pub const IFLA_LINKINFO: u32 = 18;
pub const IFLA_INFO_KIND: u32 = 1;
pub const IFLA_INFO_DATA: u32 = 2;

pub const IFA_ADDRESS: u32 = 1;
pub const IFA_LOCAL: u32 = 2;
pub const IFA_LABEL: u32 = 3;
pub const IFA_BROADCAST: u32 = 4;
pub const IFA_CACHEINFO: u32 = 6;
pub const IFA_FLAGS: u32 = 8;
