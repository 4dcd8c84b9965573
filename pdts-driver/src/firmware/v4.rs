use pdts_core::register::{RegisterError, RegisterInterface, Transaction};

use super::{
    params::{ECHO_DELTA, RX_RDY},
    version::{FirmwareVersion, Generation},
    Firmware,
};
use crate::{
    error::TimingError,
    sync::{LockStatus, RangingResult},
};

/// Firmware with a single ready bit and a single echo delta register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct V4;

impl Firmware for V4 {
    fn detect(&mut self, version: FirmwareVersion) -> Result<(), TimingError> {
        match version.generation() {
            Some(Generation::V4) => Ok(()),
            _ => Err(TimingError::IncompatibleFirmware(version)),
        }
    }

    fn lock_status<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<LockStatus, RegisterError> {
        let mut tx = Transaction::new();
        let rdy = tx.read(RX_RDY);
        let values = tx.commit(reg)?;
        Ok(LockStatus::new(values.get(rdy)? != 0, None))
    }

    fn echo_result<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<RangingResult, RegisterError> {
        let mut tx = Transaction::new();
        let delta = tx.read(ECHO_DELTA);
        let values = tx.commit(reg)?;
        Ok(RangingResult::new(values.get(delta)? as u64, None, None))
    }
}
