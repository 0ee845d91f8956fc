//! LLRP parameter decoding.
//!
//! Parameters come in two header forms sharing one type space: TLV (types
//! 128..=1023) and TV (types 1..=127, high bit set, length from a table).
//! Custom parameters (type 1023) are resolved by vendor id, then by vendor
//! subtype.
//!
//! Version française (résumé):
//! Les paramètres LLRP partagent un seul espace de types avec deux formes
//! d'en-tête : TLV (128..=1023) et TV (1..=127, longueur tirée d'une table).
//! Les paramètres propriétaires (type 1023) sont résolus par identifiant de
//! fournisseur puis par sous-type.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::LlrpError;
pub use parser::{
    LlrpMessage, custom_parameters, decode_llrp_message, decode_llrp_with, llrp_format,
    llrp_parameters,
};
pub use reader::{LlrpHeader, LlrpReader};
