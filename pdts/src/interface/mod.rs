#[cfg(feature = "interface-audit")]
mod audit;

#[cfg(feature = "interface-audit")]
#[cfg_attr(docsrs, doc(cfg(feature = "interface-audit")))]
pub use audit::{Audit, AuditOption};
#[cfg(feature = "interface-audit")]
#[cfg_attr(docsrs, doc(cfg(feature = "interface-audit")))]
pub use pdts_firmware_emulator::EndpointEmulator;

pub use pdts_core::register::{RegisterError, RegisterInterface};
