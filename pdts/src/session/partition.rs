use std::time::Duration;

use pdts_core::{register::RegisterInterface, sleep::Sleep};
use pdts_driver::{
    error::TimingError,
    partition::{PartitionConfig, PartitionRunController, PartitionState, PartitionStatus},
};

/// A borrowed handle to one partition of a [`MasterSession`].
///
/// [`MasterSession`]: crate::MasterSession
pub struct Partition<'a, R: RegisterInterface, S: Sleep> {
    interface: &'a mut R,
    sleeper: &'a S,
    controller: &'a mut PartitionRunController,
}

impl<'a, R: RegisterInterface, S: Sleep> Partition<'a, R, S> {
    pub(crate) fn new(
        interface: &'a mut R,
        sleeper: &'a S,
        controller: &'a mut PartitionRunController,
    ) -> Self {
        Self {
            interface,
            sleeper,
            controller,
        }
    }

    /// The partition id.
    #[must_use]
    pub fn id(&self) -> u8 {
        self.controller.id()
    }

    /// The current run state.
    #[must_use]
    pub fn state(&self) -> PartitionState {
        self.controller.state()
    }

    /// The last configuration written.
    #[must_use]
    pub fn config(&self) -> PartitionConfig {
        self.controller.config()
    }

    /// Disables the partition and clears its trigger counters.
    pub fn reset(&mut self) -> Result<(), TimingError> {
        self.controller.reset(self.interface)
    }

    /// Writes the trigger configuration.
    pub fn configure(
        &mut self,
        trigger_mask: u8,
        enable_spill_gate: bool,
        rate_control_enabled: bool,
    ) -> Result<(), TimingError> {
        self.controller.configure(
            self.interface,
            trigger_mask,
            enable_spill_gate,
            rate_control_enabled,
        )
    }

    /// Sets the partition-enable bit.
    pub fn enable(&mut self, enable: bool) -> Result<(), TimingError> {
        self.controller.enable(self.interface, enable)
    }

    /// Sets the trigger-enable bit.
    pub fn enable_triggers(&mut self, enable: bool) -> Result<(), TimingError> {
        self.controller.enable_triggers(self.interface, enable)
    }

    /// Requests a run and waits up to `timeout` for the partition to enter it.
    pub fn start(&mut self, timeout: Duration) -> Result<(), TimingError> {
        self.controller.start(self.interface, self.sleeper, timeout)
    }

    /// Withdraws the run request and waits up to `timeout` for the partition to leave it.
    pub fn stop(&mut self, timeout: Duration) -> Result<(), TimingError> {
        self.controller.stop(self.interface, self.sleeper, timeout)
    }

    /// Reads the status registers.
    pub fn status(&mut self) -> Result<PartitionStatus, TimingError> {
        self.controller.status(self.interface)
    }
}
