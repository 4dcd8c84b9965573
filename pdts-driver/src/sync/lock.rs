use std::{ops::ControlFlow, time::Duration};

use pdts_core::{
    register::{RegisterInterface, Transaction},
    sleep::Sleep,
};

use super::poll_until;
use crate::{
    error::TimingError,
    firmware::{
        params::{RX_EN, RX_STATE_ERROR, RX_STATE_LOCKED},
        Firmware,
    },
};

/// Lock state of the link behind the master receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// The receiver reports no state at all.
    Unknown,
    /// The receiver is acquiring.
    WaitingForLock,
    /// The receiver decodes the incoming stream.
    Locked,
    /// The receiver reports an error state.
    Failed,
}

/// A single observation of the receiver status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    ready: bool,
    state: Option<u8>,
}

impl LockStatus {
    /// Creates a new [`LockStatus`].
    ///
    /// `state` is `None` for firmware that only exposes the ready flag.
    #[must_use]
    pub const fn new(ready: bool, state: Option<u8>) -> Self {
        Self { ready, state }
    }

    /// The ready flag.
    #[must_use]
    pub const fn ready(&self) -> bool {
        self.ready
    }

    /// The state code.
    #[must_use]
    pub const fn state(&self) -> Option<u8> {
        self.state
    }

    /// Derives the [`LockState`] of this observation.
    #[must_use]
    pub const fn lock_state(&self) -> LockState {
        match (self.ready, self.state) {
            (true, None) | (true, Some(RX_STATE_LOCKED)) => LockState::Locked,
            (_, Some(s)) if s >= RX_STATE_ERROR => LockState::Failed,
            (false, Some(0)) => LockState::Unknown,
            _ => LockState::WaitingForLock,
        }
    }
}

/// Waits for the master receiver to lock onto the link currently routed to it.
#[derive(Debug)]
pub struct EndpointLockMonitor<'a, F: Firmware, S: Sleep> {
    firmware: &'a F,
    sleeper: &'a S,
    interval: Duration,
}

impl<'a, F: Firmware, S: Sleep> EndpointLockMonitor<'a, F, S> {
    /// Creates a new [`EndpointLockMonitor`] polling every `interval`.
    #[must_use]
    pub const fn new(firmware: &'a F, sleeper: &'a S, interval: Duration) -> Self {
        Self {
            firmware,
            sleeper,
            interval,
        }
    }

    /// Restarts link acquisition and waits until the receiver reports lock.
    ///
    /// Returns without sleeping if the first poll already reports lock. Otherwise returns
    /// [`TimingError::LockTimeout`] with the last observed status once more than `timeout`
    /// has elapsed.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn wait_for_lock<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        timeout: Duration,
    ) -> Result<LockState, TimingError> {
        let mut tx = Transaction::new();
        tx.write(RX_EN, 0).write(RX_EN, 1);
        tx.commit(reg)?;

        match poll_until(self.sleeper, self.interval, timeout, || {
            let status = self.firmware.lock_status(reg)?;
            tracing::trace!("receiver status: {:?}", status);
            Ok(match status.lock_state() {
                LockState::Locked => ControlFlow::Break(LockState::Locked),
                _ => ControlFlow::Continue(status),
            })
        })? {
            ControlFlow::Break(state) => Ok(state),
            ControlFlow::Continue(last) => {
                tracing::debug!(
                    "Receiver did not lock within {:?}: {:?}",
                    timeout,
                    last.lock_state()
                );
                Err(TimingError::LockTimeout {
                    ready: last.ready,
                    state: last.state,
                })
            }
        }
    }
}
