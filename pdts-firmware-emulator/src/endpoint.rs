use getset::CopyGetters;

use crate::params::COARSE_DELAY_TICKS;

/// A remote endpoint attached to one downstream path of the master.
#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct EndpointEmulator {
    /// Address on the command bus.
    addr: u16,
    /// Mux channel the endpoint hangs off.
    channel: u8,
    /// Secondary bus sub-channel, if any.
    sub_channel: Option<u8>,
    /// Round trip in ticks with all delays at zero.
    base_rtt: u64,
    /// Number of ready-flag polls before the receiver locks.
    lock_latency: u32,
    /// Transmitter enable.
    tx_enabled: bool,
    /// Coarse transmit delay.
    coarse: u8,
    /// Fine transmit delay.
    fine: u8,
    /// Phase transmit delay.
    phase: u8,
    /// Number of delay writes received.
    delay_updates: usize,
    /// A broken endpoint never transmits.
    broken: bool,
}

impl EndpointEmulator {
    /// Creates a new [`EndpointEmulator`] with its transmitter enabled.
    #[must_use]
    pub const fn new(addr: u16, channel: u8) -> Self {
        Self {
            addr,
            channel,
            sub_channel: None,
            base_rtt: 200,
            lock_latency: 2,
            tx_enabled: true,
            coarse: 0,
            fine: 0,
            phase: 0,
            delay_updates: 0,
            broken: false,
        }
    }

    /// Places the endpoint behind a secondary bus sub-channel.
    #[must_use]
    pub const fn with_sub_channel(self, sub_channel: u8) -> Self {
        Self {
            sub_channel: Some(sub_channel),
            ..self
        }
    }

    /// Sets the round trip with all delays at zero.
    #[must_use]
    pub const fn with_base_rtt(self, base_rtt: u64) -> Self {
        Self { base_rtt, ..self }
    }

    /// Sets the number of polls before lock.
    #[must_use]
    pub const fn with_lock_latency(self, lock_latency: u32) -> Self {
        Self {
            lock_latency,
            ..self
        }
    }

    /// Sets the initial transmitter enable.
    #[must_use]
    pub const fn with_tx_enabled(self, tx_enabled: bool) -> Self {
        Self { tx_enabled, ..self }
    }

    /// Breaks the endpoint.
    pub const fn break_down(&mut self) {
        self.broken = true;
    }

    /// Repairs the endpoint.
    pub const fn repair(&mut self) {
        self.broken = false;
    }

    /// Checks if the endpoint currently drives the upstream link.
    #[must_use]
    pub const fn is_transmitting(&self) -> bool {
        self.tx_enabled && !self.broken
    }

    /// Checks if the endpoint is reachable with the given mux selection.
    #[must_use]
    pub const fn is_routed(&self, mux: u32, sub_mux: u32) -> bool {
        self.channel as u32 == mux
            && match self.sub_channel {
                Some(sub) => sub as u32 == sub_mux,
                None => true,
            }
    }

    /// The round trip with the current delays.
    #[must_use]
    pub const fn round_trip_ticks(&self) -> u64 {
        self.base_rtt + self.coarse as u64 * COARSE_DELAY_TICKS + self.fine as u64
    }

    pub(crate) const fn set_tx_enabled(&mut self, enable: bool) {
        self.tx_enabled = enable;
    }

    pub(crate) const fn set_delays(&mut self, coarse: u8, fine: u8, phase: u8) {
        self.coarse = coarse;
        self.fine = fine;
        self.phase = phase;
        self.delay_updates += 1;
    }
}
