//! Netlink attribute decoding.
//!
//! `nlmsghdr` framing is read by `reader`; the attributes after the family
//! header are walked by the engine with the `nlattr` rules from
//! [`netlink_format`]. Families are dispatch tables plus a fixed header
//! length, so new families are configuration rather than code.
//!
//! Header fields and attribute values follow host byte order unless an
//! attribute carries `NLA_F_NET_BYTEORDER`.
//!
//! Version française (résumé):
//! Le module lit l'en-tête `nlmsghdr` dans `reader`, puis parcourt les
//! attributs `nlattr` avec le moteur. Une famille se résume à une table de
//! dispatch et à la longueur de son en-tête fixe. L'ordre des octets est
//! celui de l'hôte, sauf pour les attributs marqués `NLA_F_NET_BYTEORDER`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::NetlinkError;
pub use parser::{
    NetlinkBus, NetlinkFamily, NetlinkMessage, decode_netlink_message, decode_with_family,
    netlink_format,
};
pub use reader::{NetlinkHeader, NetlinkReader};
