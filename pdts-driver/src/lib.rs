#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Synchronization, delay calibration and run control for the pdts timing master.

/// Periodic command generators.
pub mod command;
/// Error definitions.
pub mod error;
/// Firmware generations and their register semantics.
pub mod firmware;
/// Session-wide configuration.
pub mod option;
/// Partition run control.
pub mod partition;
/// Endpoint synchronization and delay calibration.
pub mod sync;

pub use pdts_core as core;
