#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Core traits and types for the pdts timing master.
//!
//! This crate holds the pieces that do not depend on any particular firmware generation:
//! the batched register transport, sleepers used by the poll loops, frequency units and the
//! command rate synthesizer.

/// Common constants and units.
pub mod common;
/// Periodic command rate synthesis.
pub mod rate;
/// An interface to the master registers.
pub mod register;
/// Sleep strategies used while polling.
pub mod sleep;
#[doc(hidden)]
pub mod utils;
