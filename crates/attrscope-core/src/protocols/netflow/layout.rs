use std::ops::Range;

pub const NETFLOW_V9: u16 = 9;
pub const PACKET_HEADER_LEN: usize = 20;
pub const VERSION_RANGE: Range<usize> = 0..2;
pub const COUNT_RANGE: Range<usize> = 2..4;
pub const SYS_UPTIME_RANGE: Range<usize> = 4..8;
pub const UNIX_SECS_RANGE: Range<usize> = 8..12;
pub const SEQUENCE_RANGE: Range<usize> = 12..16;
pub const SOURCE_ID_RANGE: Range<usize> = 16..20;

pub const FLOWSET_HEADER_LEN: usize = 4;
pub const TEMPLATE_FLOWSET_ID: u32 = 0;
pub const OPTIONS_TEMPLATE_FLOWSET_ID: u32 = 1;
pub const MIN_DATA_FLOWSET_ID: u32 = 256;

/// `template_id | field_count`
pub const TEMPLATE_HEADER_LEN: usize = 4;
/// `template_id | option_scope_length | option_length`
pub const OPTIONS_TEMPLATE_HEADER_LEN: usize = 6;
/// `field_type | field_length`
pub const FIELD_SPEC_LEN: usize = 4;

pub const IN_BYTES: u32 = 1;
pub const IN_PKTS: u32 = 2;
pub const FLOWS: u32 = 3;
pub const PROTOCOL: u32 = 4;
pub const SRC_TOS: u32 = 5;
pub const TCP_FLAGS: u32 = 6;
pub const L4_SRC_PORT: u32 = 7;
pub const IPV4_SRC_ADDR: u32 = 8;
pub const SRC_MASK: u32 = 9;
pub const INPUT_SNMP: u32 = 10;
pub const L4_DST_PORT: u32 = 11;
pub const IPV4_DST_ADDR: u32 = 12;
pub const DST_MASK: u32 = 13;
pub const OUTPUT_SNMP: u32 = 14;
pub const IPV4_NEXT_HOP: u32 = 15;
pub const SRC_AS: u32 = 16;
pub const DST_AS: u32 = 17;
pub const BGP_IPV4_NEXT_HOP: u32 = 18;
pub const LAST_SWITCHED: u32 = 21;
pub const FIRST_SWITCHED: u32 = 22;
pub const IPV6_SRC_ADDR: u32 = 27;
pub const IPV6_DST_ADDR: u32 = 28;
pub const IPV6_NEXT_HOP: u32 = 62;
pub const IN_SRC_MAC: u32 = 56;
pub const OUT_DST_MAC: u32 = 57;
pub const IF_NAME: u32 = 82;
pub const IF_DESC: u32 = 83;
pub const SAMPLER_NAME: u32 = 84;
