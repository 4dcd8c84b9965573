#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

//! A register-level emulator of the pdts timing master firmware.
//!
//! Time inside the emulator advances with status polls, not with the wall clock: a receiver
//! locks after a fixed number of reads of its ready flag, an echo completes after a fixed
//! number of reads of its done flag, and so on.

/// Emulated remote endpoint.
pub mod endpoint;
/// Emulator error.
pub mod error;
/// Emulated master.
pub mod master;
#[doc(hidden)]
pub mod params;

pub use endpoint::EndpointEmulator;
pub use error::EmulatorError;
pub use master::MasterEmulator;
