use std::ops::Range;

pub const MESSAGE_HEADER_LEN: usize = 10;
/// `reserved(3) | version(3) | message type(10)`
pub const VERSION_TYPE_RANGE: Range<usize> = 0..2;
pub const MESSAGE_LENGTH_RANGE: Range<usize> = 2..6;
pub const MESSAGE_ID_RANGE: Range<usize> = 6..10;
pub const VERSION_SHIFT: u16 = 10;
pub const VERSION_MASK: u16 = 0x7;
pub const MESSAGE_TYPE_MASK: u16 = 0x03ff;
/// LLRP 1.0.1 and 1.1.
pub const SUPPORTED_VERSIONS: std::ops::RangeInclusive<u8> = 1..=2;

pub const TLV_HEADER_LEN: usize = 4;
pub const TLV_TYPE_MASK: u32 = 0x03ff;
pub const TV_DISCRIMINATOR: u8 = 0x80;
pub const TV_TYPE_MASK: u8 = 0x7f;

/// Value length per TV parameter type (header byte excluded).
pub const TV_LENGTHS: &[(u8, usize)] = &[
    (TV_ANTENNA_ID, 2),
    (TV_FIRST_SEEN_UTC, 8),
    (TV_FIRST_SEEN_UPTIME, 8),
    (TV_LAST_SEEN_UTC, 8),
    (TV_LAST_SEEN_UPTIME, 8),
    (TV_PEAK_RSSI, 1),
    (TV_CHANNEL_INDEX, 2),
    (TV_TAG_SEEN_COUNT, 2),
    (TV_RO_SPEC_ID, 4),
    (TV_INVENTORY_PARAMETER_SPEC_ID, 2),
    (TV_C1G2_CRC, 2),
    (TV_C1G2_PC, 2),
    (TV_EPC_96, 12),
    (TV_SPEC_INDEX, 2),
    (TV_CLIENT_REQUEST_OP_SPEC_RESULT, 2),
    (TV_ACCESS_SPEC_ID, 4),
    (TV_OP_SPEC_ID, 2),
    (TV_C1G2_SINGULATION_DETAILS, 4),
    (TV_C1G2_XPC_W1, 2),
    (TV_C1G2_XPC_W2, 2),
];

pub const TV_ANTENNA_ID: u8 = 1;
pub const TV_FIRST_SEEN_UTC: u8 = 2;
pub const TV_FIRST_SEEN_UPTIME: u8 = 3;
pub const TV_LAST_SEEN_UTC: u8 = 4;
pub const TV_LAST_SEEN_UPTIME: u8 = 5;
pub const TV_PEAK_RSSI: u8 = 6;
pub const TV_CHANNEL_INDEX: u8 = 7;
pub const TV_TAG_SEEN_COUNT: u8 = 8;
pub const TV_RO_SPEC_ID: u8 = 9;
pub const TV_INVENTORY_PARAMETER_SPEC_ID: u8 = 10;
pub const TV_C1G2_CRC: u8 = 11;
pub const TV_C1G2_PC: u8 = 12;
pub const TV_EPC_96: u8 = 13;
pub const TV_SPEC_INDEX: u8 = 14;
pub const TV_CLIENT_REQUEST_OP_SPEC_RESULT: u8 = 15;
pub const TV_ACCESS_SPEC_ID: u8 = 16;
pub const TV_OP_SPEC_ID: u8 = 17;
pub const TV_C1G2_SINGULATION_DETAILS: u8 = 18;
pub const TV_C1G2_XPC_W1: u8 = 19;
pub const TV_C1G2_XPC_W2: u8 = 20;

pub const PARAM_UTC_TIMESTAMP: u32 = 128;
pub const PARAM_UPTIME: u32 = 129;
pub const PARAM_RO_SPEC: u32 = 177;
pub const PARAM_TAG_REPORT_DATA: u32 = 240;
pub const PARAM_EPC_DATA: u32 = 241;
pub const PARAM_READER_EVENT_NOTIFICATION_DATA: u32 = 246;
pub const PARAM_ANTENNA_EVENT: u32 = 255;
pub const PARAM_CONNECTION_ATTEMPT_EVENT: u32 = 256;
pub const PARAM_LLRP_STATUS: u32 = 287;
pub const PARAM_FIELD_ERROR: u32 = 288;
pub const PARAM_PARAMETER_ERROR: u32 = 289;
pub const PARAM_CUSTOM: u32 = 1023;

/// `ROSpecID(4) | Priority(1) | CurrentState(1)`
pub const RO_SPEC_PREFIX_LEN: usize = 6;
/// `StatusCode(2) | ErrorDescriptionByteCount(2)`
pub const LLRP_STATUS_PREFIX_LEN: usize = 4;
/// `ParameterType(2) | ErrorCode(2)`
pub const PARAMETER_ERROR_PREFIX_LEN: usize = 4;

pub const VENDOR_IMPINJ: u64 = 25882;
pub const IMPINJ_SEARCH_MODE: u64 = 23;
pub const IMPINJ_PEAK_RSSI: u64 = 57;
pub const IMPINJ_RF_PHASE_ANGLE: u64 = 56;
pub const IMPINJ_RF_DOPPLER_FREQUENCY: u64 = 68;

pub const MSG_GET_READER_CAPABILITIES: u16 = 1;
pub const MSG_GET_READER_CONFIG: u16 = 2;
pub const MSG_SET_READER_CONFIG: u16 = 3;
pub const MSG_ADD_ROSPEC: u16 = 20;
pub const MSG_DELETE_ROSPEC: u16 = 21;
pub const MSG_START_ROSPEC: u16 = 22;
pub const MSG_STOP_ROSPEC: u16 = 23;
pub const MSG_ENABLE_ROSPEC: u16 = 24;
pub const MSG_DISABLE_ROSPEC: u16 = 25;
pub const MSG_RO_ACCESS_REPORT: u16 = 61;
pub const MSG_KEEPALIVE: u16 = 62;
pub const MSG_READER_EVENT_NOTIFICATION: u16 = 63;
pub const MSG_ERROR_MESSAGE: u16 = 100;
pub const MSG_CUSTOM_MESSAGE: u16 = 1023;

/// Fixed fields between the message header and the first parameter.
pub fn fixed_body_len(message_type: u16) -> usize {
    match message_type {
        MSG_GET_READER_CAPABILITIES => 1,
        MSG_GET_READER_CONFIG => 7,
        MSG_SET_READER_CONFIG => 1,
        MSG_DELETE_ROSPEC..=MSG_DISABLE_ROSPEC => 4,
        // VendorIdentifier(4) | MessageSubtype(1)
        MSG_CUSTOM_MESSAGE => 5,
        _ => 0,
    }
}
