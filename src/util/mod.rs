//! Utility modules for arbordom.
//!
//! Contains `QName` lexical helpers shared by the name model, the reader,
//! and the writer.

pub mod qname;
