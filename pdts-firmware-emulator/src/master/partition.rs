use getset::CopyGetters;

use crate::params::BUFFER_CAPACITY;

/// An emulated partition.
///
/// `in_run` follows `run_req` after `run_latency` polls of `in_run`, unless stalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct PartitionEmulator {
    /// Partition-enable bit.
    enabled: bool,
    /// Trigger-enable bit.
    triggers_enabled: bool,
    /// Buffer-enable bit.
    buffer_enabled: bool,
    /// Run-request bit.
    run_requested: bool,
    /// Running state reported to the master.
    in_run: bool,
    /// Trigger mask.
    trigger_mask: u8,
    /// Spill gate enable.
    spill_gate_enabled: bool,
    /// Rate control enable.
    rate_control_enabled: bool,
    /// Number of trigger-counter resets.
    counter_resets: usize,
    /// Number of buffer flushes.
    buffer_flushes: usize,
    /// Words in the event buffer.
    buffer_occupancy: u32,
    /// Polls of `in_run` needed to follow a run request.
    run_latency: u32,
    /// A stalled partition never follows run requests.
    stalled: bool,
    #[getset(skip)]
    trig_ctr_rst: bool,
    #[getset(skip)]
    pending_polls: u32,
}

impl Default for PartitionEmulator {
    fn default() -> Self {
        Self {
            enabled: false,
            triggers_enabled: false,
            buffer_enabled: false,
            run_requested: false,
            in_run: false,
            trigger_mask: 0,
            spill_gate_enabled: false,
            rate_control_enabled: false,
            counter_resets: 0,
            buffer_flushes: 0,
            buffer_occupancy: 0,
            run_latency: 1,
            stalled: false,
            trig_ctr_rst: false,
            pending_polls: 0,
        }
    }
}

impl PartitionEmulator {
    /// Sets the number of polls needed to follow a run request.
    pub const fn set_run_latency(&mut self, run_latency: u32) {
        self.run_latency = run_latency;
    }

    /// Stalls or releases the partition.
    pub const fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Fills the event buffer.
    pub fn set_buffer_occupancy(&mut self, occupancy: u32) {
        self.buffer_occupancy = occupancy.min(BUFFER_CAPACITY);
    }

    fn poll_in_run(&mut self) -> bool {
        if !self.stalled && self.in_run != self.run_requested {
            if self.pending_polls >= self.run_latency {
                self.in_run = self.run_requested;
            } else {
                self.pending_polls += 1;
            }
        }
        self.in_run
    }

    pub(crate) fn read_ctrl(&self, field: &str) -> Option<u32> {
        Some(match field {
            "part_en" => self.enabled as _,
            "trig_en" => self.triggers_enabled as _,
            "buf_en" => self.buffer_enabled as _,
            "trig_ctr_rst" => self.trig_ctr_rst as _,
            "run_req" => self.run_requested as _,
            "trig_mask" => self.trigger_mask as _,
            "spill_gate_en" => self.spill_gate_enabled as _,
            "rate_ctrl_en" => self.rate_control_enabled as _,
            _ => return None,
        })
    }

    pub(crate) fn read_stat(&mut self, field: &str) -> Option<u32> {
        Some(match field {
            "in_run" => self.poll_in_run() as _,
            "buf_warn" => (self.buffer_occupancy >= BUFFER_CAPACITY * 3 / 4) as _,
            "buf_err" => (self.buffer_occupancy >= BUFFER_CAPACITY) as _,
            "buf_occ" => self.buffer_occupancy,
            _ => return None,
        })
    }

    pub(crate) fn write_ctrl(&mut self, field: &str, value: u32) -> Option<()> {
        let bit = value & 0x1 != 0;
        match field {
            "part_en" => self.enabled = bit,
            "trig_en" => self.triggers_enabled = bit,
            "buf_en" => {
                if bit && !self.buffer_enabled {
                    self.buffer_occupancy = 0;
                    self.buffer_flushes += 1;
                }
                self.buffer_enabled = bit;
            }
            "trig_ctr_rst" => {
                if bit && !self.trig_ctr_rst {
                    self.counter_resets += 1;
                }
                self.trig_ctr_rst = bit;
            }
            "run_req" => {
                if bit != self.run_requested {
                    self.pending_polls = 0;
                }
                self.run_requested = bit;
            }
            "trig_mask" => self.trigger_mask = value as _,
            "spill_gate_en" => self.spill_gate_enabled = bit,
            "rate_ctrl_en" => self.rate_control_enabled = bit,
            _ => return None,
        }
        Some(())
    }
}
