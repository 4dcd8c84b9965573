mod auto;
#[doc(hidden)]
pub mod params;
mod v4;
mod v5;
/// Firmware version.
pub mod version;

use pdts_core::register::{RegisterError, RegisterInterface};

use crate::{
    error::TimingError,
    sync::{LockStatus, RangingResult},
};

pub use auto::Auto;
pub use v4::V4;
pub use v5::V5;
use version::FirmwareVersion;

/// A trait that abstracts over the register semantics of a firmware generation.
pub trait Firmware: std::fmt::Debug + Send {
    /// Accepts or rejects the firmware running on the master.
    fn detect(&mut self, version: FirmwareVersion) -> Result<(), TimingError>;

    /// Reads the receiver status once.
    fn lock_status<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<LockStatus, RegisterError>;

    /// Reads the result of a completed echo.
    fn echo_result<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<RangingResult, RegisterError>;
}
