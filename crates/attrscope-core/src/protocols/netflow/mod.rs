//! NetFlow v9 export decoding.
//!
//! Flowsets are walked as explicit-length records. Template flowsets
//! register schemas in the session's cache under the exporter and the
//! packet's `source_id`; data flowsets are decoded against those schemas and
//! degrade to unresolved bodies when no schema is known.
//!
//! Version française (résumé):
//! Les flowsets sont des enregistrements à longueur explicite. Les gabarits
//! sont enregistrés dans le cache de la session, par exportateur et par
//! `source_id` ; les données sans gabarit connu restent non résolues.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::NetflowError;
pub use parser::{
    NetflowPacket, NetflowSession, netflow_fields, netflow_flowsets, netflow_format,
};
pub use reader::{NetflowHeader, NetflowReader};
