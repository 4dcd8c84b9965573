use std::{ops::ControlFlow, time::Duration};

use pdts_core::{
    register::{self, RegisterInterface, Transaction},
    sleep::Sleep,
};

use super::poll_until;
use crate::{
    error::TimingError,
    firmware::{
        params::{ECHO_DONE, ECHO_GO},
        Firmware,
    },
};

/// Result of one ranging echo exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangingResult {
    round_trip_ticks: u64,
    tx_timestamp: Option<u64>,
    rx_timestamp: Option<u64>,
}

impl RangingResult {
    /// Creates a new [`RangingResult`].
    #[must_use]
    pub const fn new(
        round_trip_ticks: u64,
        tx_timestamp: Option<u64>,
        rx_timestamp: Option<u64>,
    ) -> Self {
        Self {
            round_trip_ticks,
            tx_timestamp,
            rx_timestamp,
        }
    }

    /// Round-trip time in master clock ticks.
    #[must_use]
    pub const fn round_trip_ticks(&self) -> u64 {
        self.round_trip_ticks
    }

    /// Raw transmit timestamp, if the firmware reports it.
    #[must_use]
    pub const fn tx_timestamp(&self) -> Option<u64> {
        self.tx_timestamp
    }

    /// Raw receive timestamp, if the firmware reports it.
    #[must_use]
    pub const fn rx_timestamp(&self) -> Option<u64> {
        self.rx_timestamp
    }
}

/// Measures the round trip of the link currently routed to the master.
///
/// The link must already be locked; no lock check is made here.
#[derive(Debug)]
pub struct EchoRangingService<'a, F: Firmware, S: Sleep> {
    firmware: &'a F,
    sleeper: &'a S,
    interval: Duration,
}

impl<'a, F: Firmware, S: Sleep> EchoRangingService<'a, F, S> {
    /// Creates a new [`EchoRangingService`] polling every `interval`.
    #[must_use]
    pub const fn new(firmware: &'a F, sleeper: &'a S, interval: Duration) -> Self {
        Self {
            firmware,
            sleeper,
            interval,
        }
    }

    /// Issues an echo and waits for it to come back.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn measure_round_trip<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        timeout: Duration,
    ) -> Result<RangingResult, TimingError> {
        let mut tx = Transaction::new();
        tx.pulse(ECHO_GO);
        tx.commit(reg)?;

        match poll_until(self.sleeper, self.interval, timeout, || {
            Ok(if register::read(reg, ECHO_DONE)? != 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })? {
            ControlFlow::Break(()) => {
                let result = self.firmware.echo_result(reg)?;
                tracing::debug!("round trip: {} ticks", result.round_trip_ticks);
                Ok(result)
            }
            ControlFlow::Continue(()) => Err(TimingError::EchoTimeout(timeout)),
        }
    }
}
