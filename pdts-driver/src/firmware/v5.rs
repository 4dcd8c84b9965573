use pdts_core::register::{join_u64, RegisterError, RegisterInterface, Transaction};

use super::{
    params::{ECHO_RX_H, ECHO_RX_L, ECHO_TX_H, ECHO_TX_L, RX_RDY, RX_STATE},
    version::{FirmwareVersion, Generation},
    Firmware,
};
use crate::{
    error::TimingError,
    sync::{LockStatus, RangingResult},
};

/// Firmware with a 4-bit receiver state and paired 64-bit echo timestamps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct V5;

impl Firmware for V5 {
    fn detect(&mut self, version: FirmwareVersion) -> Result<(), TimingError> {
        match version.generation() {
            Some(Generation::V5) => Ok(()),
            _ => Err(TimingError::IncompatibleFirmware(version)),
        }
    }

    fn lock_status<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<LockStatus, RegisterError> {
        let mut tx = Transaction::new();
        let rdy = tx.read(RX_RDY);
        let state = tx.read(RX_STATE);
        let values = tx.commit(reg)?;
        Ok(LockStatus::new(
            values.get(rdy)? != 0,
            Some((values.get(state)? & 0xF) as u8),
        ))
    }

    fn echo_result<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<RangingResult, RegisterError> {
        let mut tx = Transaction::new();
        let tx_l = tx.read(ECHO_TX_L);
        let tx_h = tx.read(ECHO_TX_H);
        let rx_l = tx.read(ECHO_RX_L);
        let rx_h = tx.read(ECHO_RX_H);
        let values = tx.commit(reg)?;

        let sent = join_u64(values.get(tx_h)?, values.get(tx_l)?);
        let received = join_u64(values.get(rx_h)?, values.get(rx_l)?);
        Ok(RangingResult::new(
            received.wrapping_sub(sent),
            Some(sent),
            Some(received),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ScriptedInterface;

    #[rstest::rstest]
    #[case(LockStatus::new(true, Some(0x8)), 1, 0x8)]
    #[case(LockStatus::new(false, Some(0x3)), 0, 0x3)]
    #[case(LockStatus::new(false, Some(0xC)), 0, 0xFC)]
    #[test]
    fn lock_status(
        #[case] expect: LockStatus,
        #[case] rdy: u32,
        #[case] state: u32,
    ) -> anyhow::Result<()> {
        let mut reg = ScriptedInterface::new()
            .with(RX_RDY, rdy)
            .with(RX_STATE, state);
        assert_eq!(expect, V5.lock_status(&mut reg)?);
        Ok(())
    }

    #[test]
    fn echo_result() -> anyhow::Result<()> {
        let mut reg = ScriptedInterface::new()
            .with(ECHO_TX_L, 0xFFFF_FF00)
            .with(ECHO_TX_H, 0x1)
            .with(ECHO_RX_L, 0x0000_0010)
            .with(ECHO_RX_H, 0x2);
        assert_eq!(
            RangingResult::new(
                0x110,
                Some(0x0000_0001_FFFF_FF00),
                Some(0x0000_0002_0000_0010)
            ),
            V5.echo_result(&mut reg)?
        );
        Ok(())
    }

    #[rstest::rstest]
    #[case(Ok(()), FirmwareVersion::new(5, 1, 0))]
    #[case(Ok(()), FirmwareVersion::new(6, 0, 3))]
    #[case(
        Err(TimingError::IncompatibleFirmware(FirmwareVersion::new(4, 9, 9))),
        FirmwareVersion::new(4, 9, 9)
    )]
    #[test]
    fn detect(#[case] expect: Result<(), TimingError>, #[case] version: FirmwareVersion) {
        assert_eq!(expect, V5.detect(version));
    }
}
