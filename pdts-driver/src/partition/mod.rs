use std::{ops::ControlFlow, time::Duration};

use getset::CopyGetters;
use pdts_core::{
    register::{RegisterInterface, Transaction},
    sleep::Sleep,
};

use crate::{
    error::TimingError,
    firmware::params::{partition_ctrl, partition_stat},
    sync::poll_until,
};

/// Run state of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionState {
    /// Not taking data.
    #[default]
    Idle,
    /// Taking data.
    Running,
}

/// Trigger configuration of a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartitionConfig {
    /// Mask of accepted trigger command types.
    pub trigger_mask: u8,
    /// Gate triggers with the spill signal.
    pub spill_gate_enabled: bool,
    /// Enable trigger rate control.
    pub rate_control_enabled: bool,
}

/// A snapshot of the partition status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionStatus {
    /// Partition-enable bit.
    pub enabled: bool,
    /// The partition reports it is running.
    pub in_run: bool,
    /// The event buffer is close to full.
    pub buffer_warning: bool,
    /// The event buffer overflowed.
    pub buffer_error: bool,
    /// The number of words in the event buffer.
    pub buffer_occupancy: u32,
}

/// Start/stop state machine of one partition.
#[derive(Debug, CopyGetters)]
pub struct PartitionRunController {
    #[getset(get_copy = "pub")]
    /// The partition id.
    id: u8,
    #[getset(get_copy = "pub")]
    /// The current run state.
    state: PartitionState,
    #[getset(get_copy = "pub")]
    /// The last configuration written.
    config: PartitionConfig,
    interval: Duration,
}

impl PartitionRunController {
    /// Creates a new [`PartitionRunController`] for partition `id` in `Idle`.
    pub fn new(id: u8, num_partitions: u8, interval: Duration) -> Result<Self, TimingError> {
        if id >= num_partitions {
            return Err(TimingError::InvalidPartition { id, num_partitions });
        }
        Ok(Self {
            id,
            state: PartitionState::Idle,
            config: PartitionConfig::default(),
            interval,
        })
    }

    fn ctrl(&self, field: &str) -> String {
        partition_ctrl(self.id, field)
    }

    fn stat(&self, field: &str) -> String {
        partition_stat(self.id, field)
    }

    /// Disables the partition, its triggers and its buffer, and clears the trigger counters.
    #[tracing::instrument(level = "debug", skip(self, reg), fields(id = self.id))]
    pub fn reset<R: RegisterInterface + ?Sized>(&mut self, reg: &mut R) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(self.ctrl("part_en"), 0)
            .write(self.ctrl("trig_en"), 0)
            .write(self.ctrl("buf_en"), 0)
            .write(self.ctrl("trig_ctr_rst"), 0)
            .pulse(self.ctrl("trig_ctr_rst"));
        tx.commit(reg)?;
        self.state = PartitionState::Idle;
        Ok(())
    }

    /// Writes the trigger configuration. The run state is unchanged.
    #[tracing::instrument(level = "debug", skip(self, reg), fields(id = self.id))]
    pub fn configure<R: RegisterInterface + ?Sized>(
        &mut self,
        reg: &mut R,
        trigger_mask: u8,
        enable_spill_gate: bool,
        rate_control_enabled: bool,
    ) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(self.ctrl("trig_mask"), trigger_mask as _)
            .write(self.ctrl("spill_gate_en"), enable_spill_gate as _)
            .write(self.ctrl("rate_ctrl_en"), rate_control_enabled as _);
        tx.commit(reg)?;
        self.config = PartitionConfig {
            trigger_mask,
            spill_gate_enabled: enable_spill_gate,
            rate_control_enabled,
        };
        Ok(())
    }

    /// Sets the partition-enable bit.
    pub fn enable<R: RegisterInterface + ?Sized>(
        &mut self,
        reg: &mut R,
        enable: bool,
    ) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(self.ctrl("part_en"), enable as _);
        tx.commit(reg)?;
        Ok(())
    }

    /// Sets the trigger-enable bit.
    pub fn enable_triggers<R: RegisterInterface + ?Sized>(
        &mut self,
        reg: &mut R,
        enable: bool,
    ) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(self.ctrl("trig_en"), enable as _);
        tx.commit(reg)?;
        Ok(())
    }

    /// Flushes the buffer, requests a run and waits for the partition to enter it.
    ///
    /// On timeout the run request stays asserted.
    #[tracing::instrument(level = "debug", skip(self, reg, sleeper), fields(id = self.id))]
    pub fn start<R: RegisterInterface + ?Sized, S: Sleep + ?Sized>(
        &mut self,
        reg: &mut R,
        sleeper: &S,
        timeout: Duration,
    ) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(self.ctrl("trig_en"), 0)
            .write(self.ctrl("buf_en"), 0)
            .write(self.ctrl("buf_en"), 1)
            .write(self.ctrl("run_req"), 1);
        tx.commit(reg)?;

        self.wait_in_run(reg, sleeper, timeout, true)?;
        self.state = PartitionState::Running;
        tracing::info!("Partition {} running", self.id);
        Ok(())
    }

    /// Withdraws the run request and waits for the partition to leave the run.
    #[tracing::instrument(level = "debug", skip(self, reg, sleeper), fields(id = self.id))]
    pub fn stop<R: RegisterInterface + ?Sized, S: Sleep + ?Sized>(
        &mut self,
        reg: &mut R,
        sleeper: &S,
        timeout: Duration,
    ) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(self.ctrl("run_req"), 0);
        tx.commit(reg)?;

        self.wait_in_run(reg, sleeper, timeout, false)?;
        self.state = PartitionState::Idle;
        tracing::info!("Partition {} stopped", self.id);
        Ok(())
    }

    fn wait_in_run<R: RegisterInterface + ?Sized, S: Sleep + ?Sized>(
        &self,
        reg: &mut R,
        sleeper: &S,
        timeout: Duration,
        expect: bool,
    ) -> Result<(), TimingError> {
        let in_run = self.stat("in_run");
        match poll_until(sleeper, self.interval, timeout, || {
            let mut tx = Transaction::new();
            let v = tx.read(in_run.as_str());
            Ok(if (tx.commit(reg)?.get(v)? != 0) == expect {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })? {
            ControlFlow::Break(()) => Ok(()),
            ControlFlow::Continue(()) => {
                tracing::warn!(
                    "Partition {} did not {} the run within {:?}",
                    self.id,
                    if expect { "enter" } else { "leave" },
                    timeout
                );
                Err(TimingError::RunRequestTimeout(timeout))
            }
        }
    }

    /// Reads the status registers.
    pub fn status<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
    ) -> Result<PartitionStatus, TimingError> {
        let mut tx = Transaction::new();
        let enabled = tx.read(self.ctrl("part_en"));
        let in_run = tx.read(self.stat("in_run"));
        let buf_warn = tx.read(self.stat("buf_warn"));
        let buf_err = tx.read(self.stat("buf_err"));
        let buf_occ = tx.read(self.stat("buf_occ"));
        let values = tx.commit(reg)?;
        Ok(PartitionStatus {
            enabled: values.get(enabled)? != 0,
            in_run: values.get(in_run)? != 0,
            buffer_warning: values.get(buf_warn)? != 0,
            buffer_error: values.get(buf_err)? != 0,
            buffer_occupancy: values.get(buf_occ)?,
        })
    }
}
