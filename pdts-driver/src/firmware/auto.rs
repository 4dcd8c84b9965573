use getset::CopyGetters;
use pdts_core::register::{RegisterError, RegisterInterface};

use super::{
    version::{FirmwareVersion, Generation},
    Firmware, V4, V5,
};
use crate::{
    error::TimingError,
    sync::{LockStatus, RangingResult},
};

/// A firmware that selects its register semantics from the version reported by the master.
///
/// Until [`Firmware::detect`] succeeds, the newest generation is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
pub struct Auto {
    #[getset(get_copy = "pub")]
    /// The detected generation.
    generation: Generation,
}

impl Default for Auto {
    fn default() -> Self {
        Self {
            generation: Generation::V5,
        }
    }
}

impl Firmware for Auto {
    #[tracing::instrument(level = "debug", skip(self))]
    fn detect(&mut self, version: FirmwareVersion) -> Result<(), TimingError> {
        let generation = version
            .generation()
            .ok_or(TimingError::IncompatibleFirmware(version))?;
        tracing::debug!("Firmware {} uses {} register semantics", version, generation);
        self.generation = generation;
        Ok(())
    }

    fn lock_status<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<LockStatus, RegisterError> {
        match self.generation {
            Generation::V4 => V4.lock_status(reg),
            Generation::V5 => V5.lock_status(reg),
        }
    }

    fn echo_result<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<RangingResult, RegisterError> {
        match self.generation {
            Generation::V4 => V4.echo_result(reg),
            Generation::V5 => V5.echo_result(reg),
        }
    }
}
