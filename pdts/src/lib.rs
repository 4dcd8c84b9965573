#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::unescaped_backticks)]

//! Control of a timing distribution master: endpoint synchronization, round-trip ranging,
//! transmit delay calibration, periodic command generation and partition run control.

/// Register interfaces.
pub mod interface;
/// A prelude for the crate.
pub mod prelude;
/// Master session.
pub mod session;

pub use pdts_core as core;
pub use pdts_driver as driver;

pub use session::MasterSession;
