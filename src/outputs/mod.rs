//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: writes a [`DigestOutput`](crate::pipeline::DigestOutput) as the
//!   dated `digest.json` consumed by rendering and delivery

pub mod json;
