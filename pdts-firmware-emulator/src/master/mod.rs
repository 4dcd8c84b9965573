mod generator;
mod partition;

use std::collections::BTreeSet;

use pdts_driver::firmware::version::{FirmwareVersion, Generation};

use crate::{endpoint::EndpointEmulator, error::EmulatorError, params::*};

pub use generator::GeneratorEmulator;
pub use partition::PartitionEmulator;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Strobes {
    all: bool,
    addr: u32,
    tx_en: bool,
    go: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct DelayCommand {
    addr: u32,
    coarse: u8,
    fine: u8,
    phase: u8,
    update: bool,
    go: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Echo {
    go: bool,
    pending: Option<u32>,
    done: bool,
    tx: u64,
    rx: u64,
}

/// An emulated timing master.
#[derive(Debug)]
pub struct MasterEmulator {
    version: FirmwareVersion,
    endpoints: Vec<EndpointEmulator>,
    mux: u32,
    sub_mux: u32,
    rx_enabled: bool,
    rx_polls: u32,
    echo: Echo,
    echo_latency: u32,
    sfp: Strobes,
    delay: DelayCommand,
    tx_history: Vec<BTreeSet<u16>>,
    generators: [GeneratorEmulator; NUM_GENERATORS],
    partitions: Vec<PartitionEmulator>,
    timestamp: u64,
    faults: usize,
    broken: bool,
}

impl MasterEmulator {
    /// Creates a new [`MasterEmulator`] running `version` with `num_partitions` partitions.
    #[must_use]
    pub fn new(version: FirmwareVersion, num_partitions: usize) -> Self {
        Self {
            version,
            endpoints: Vec::new(),
            mux: 0,
            sub_mux: 0,
            rx_enabled: false,
            rx_polls: 0,
            echo: Echo::default(),
            echo_latency: 1,
            sfp: Strobes::default(),
            delay: DelayCommand::default(),
            tx_history: Vec::new(),
            generators: [GeneratorEmulator::default(); NUM_GENERATORS],
            partitions: vec![PartitionEmulator::default(); num_partitions],
            timestamp: 0,
            faults: 0,
            broken: false,
        }
    }

    /// Attaches endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: impl IntoIterator<Item = EndpointEmulator>) -> Self {
        self.endpoints.extend(endpoints);
        self
    }

    /// Sets the number of done-flag polls before an echo completes.
    #[must_use]
    pub const fn with_echo_latency(mut self, echo_latency: u32) -> Self {
        self.echo_latency = echo_latency;
        self
    }

    /// The running firmware version.
    #[must_use]
    pub const fn version(&self) -> FirmwareVersion {
        self.version
    }

    /// The attached endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[EndpointEmulator] {
        &self.endpoints
    }

    /// The endpoint at `addr`.
    #[must_use]
    pub fn endpoint(&self, addr: u16) -> Option<&EndpointEmulator> {
        self.endpoints.iter().find(|ep| ep.addr() == addr)
    }

    /// The endpoint at `addr`.
    #[must_use]
    pub fn endpoint_mut(&mut self, addr: u16) -> Option<&mut EndpointEmulator> {
        self.endpoints.iter_mut().find(|ep| ep.addr() == addr)
    }

    /// The current mux selection.
    #[must_use]
    pub const fn mux(&self) -> (u32, u32) {
        (self.mux, self.sub_mux)
    }

    /// The set of transmitting endpoint addresses after each executed bus command.
    #[must_use]
    pub fn tx_history(&self) -> &[BTreeSet<u16>] {
        &self.tx_history
    }

    /// The periodic command generator `channel`.
    #[must_use]
    pub fn generator(&self, channel: usize) -> Option<&GeneratorEmulator> {
        self.generators.get(channel)
    }

    /// The partition `id`.
    #[must_use]
    pub fn partition(&self, id: usize) -> Option<&PartitionEmulator> {
        self.partitions.get(id)
    }

    /// The partition `id`.
    #[must_use]
    pub fn partition_mut(&mut self, id: usize) -> Option<&mut PartitionEmulator> {
        self.partitions.get_mut(id)
    }

    /// The timestamp counter.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Makes the next `n` accesses fail with [`EmulatorError::NoResponse`].
    pub const fn inject_faults(&mut self, n: usize) {
        self.faults = n;
    }

    /// Breaks the master. Every access fails until repaired.
    pub const fn break_down(&mut self) {
        self.broken = true;
    }

    /// Repairs the master.
    pub const fn repair(&mut self) {
        self.broken = false;
    }

    /// Checks if the master is broken.
    #[must_use]
    pub const fn is_broken(&self) -> bool {
        self.broken
    }

    fn generation(&self) -> Generation {
        self.version.generation().unwrap_or(Generation::V5)
    }

    fn access(&mut self) -> Result<(), EmulatorError> {
        if self.broken {
            return Err(EmulatorError::NoResponse);
        }
        if self.faults > 0 {
            self.faults -= 1;
            return Err(EmulatorError::NoResponse);
        }
        Ok(())
    }

    fn routed(&self) -> impl Iterator<Item = &EndpointEmulator> {
        self.endpoints
            .iter()
            .filter(|ep| ep.is_transmitting() && ep.is_routed(self.mux, self.sub_mux))
    }

    fn locked_endpoint(&self) -> Option<&EndpointEmulator> {
        if !self.rx_enabled {
            return None;
        }
        let mut routed = self.routed();
        match (routed.next(), routed.next()) {
            (Some(ep), None) if self.rx_polls > ep.lock_latency() => Some(ep),
            _ => None,
        }
    }

    fn rx_state(&self) -> u32 {
        if !self.rx_enabled {
            return RX_STATE_IDLE;
        }
        match self.routed().count() {
            0 => RX_STATE_SEARCH,
            1 if self.locked_endpoint().is_some() => RX_STATE_LOCKED,
            1 => RX_STATE_ALIGN,
            _ => RX_STATE_COLLISION,
        }
    }

    /// Reads a register.
    pub fn read(&mut self, path: &str) -> Result<u32, EmulatorError> {
        self.access()?;
        let unknown = || EmulatorError::UnknownRegister(path.to_owned());
        let generation = self.generation();
        Ok(match path {
            VERSION => self.version.word(),
            TSTAMP_L => {
                self.timestamp += TSTAMP_STEP;
                self.timestamp as u32
            }
            TSTAMP_H => (self.timestamp >> 32) as u32,
            RX_EN => self.rx_enabled as _,
            RX_RDY => {
                self.rx_polls = self.rx_polls.saturating_add(1);
                self.locked_endpoint().is_some() as _
            }
            RX_STATE if generation == Generation::V5 => self.rx_state(),
            ECHO_GO => self.echo.go as _,
            ECHO_DONE => {
                if let Some(remaining) = self.echo.pending {
                    if remaining == 0 {
                        self.echo.pending = None;
                        self.echo.done = true;
                    } else {
                        self.echo.pending = Some(remaining - 1);
                    }
                }
                self.echo.done as _
            }
            ECHO_DELTA if generation == Generation::V4 => self.echo.rx.wrapping_sub(self.echo.tx) as _,
            ECHO_TX_L if generation == Generation::V5 => self.echo.tx as u32,
            ECHO_TX_H if generation == Generation::V5 => (self.echo.tx >> 32) as u32,
            ECHO_RX_L if generation == Generation::V5 => self.echo.rx as u32,
            ECHO_RX_H if generation == Generation::V5 => (self.echo.rx >> 32) as u32,
            SFP_ADDR => self.sfp.addr,
            SFP_ALL => self.sfp.all as _,
            SFP_TX_EN => self.sfp.tx_en as _,
            SFP_GO => self.sfp.go as _,
            DELAY_ADDR => self.delay.addr,
            DELAY_COARSE => self.delay.coarse as _,
            DELAY_FINE => self.delay.fine as _,
            DELAY_PHASE => self.delay.phase as _,
            DELAY_UPDATE => self.delay.update as _,
            DELAY_GO => self.delay.go as _,
            MUX => self.mux,
            SUB_MUX => self.sub_mux,
            _ => {
                if let Some((ch, field)) = indexed(path, COMMAND_PREFIX) {
                    return self
                        .generators
                        .get(ch)
                        .and_then(|g| g.read(field))
                        .ok_or_else(unknown);
                }
                if let Some((id, field)) = indexed(path, PARTITION_PREFIX) {
                    let part = self.partitions.get_mut(id).ok_or_else(unknown)?;
                    return if let Some(field) = field.strip_prefix("csr.ctrl.") {
                        part.read_ctrl(field)
                    } else if let Some(field) = field.strip_prefix("csr.stat.") {
                        part.read_stat(field)
                    } else {
                        None
                    }
                    .ok_or_else(unknown);
                }
                return Err(unknown());
            }
        })
    }

    /// Writes a register.
    pub fn write(&mut self, path: &str, value: u32) -> Result<(), EmulatorError> {
        self.access()?;
        let unknown = || EmulatorError::UnknownRegister(path.to_owned());
        let bit = value & 0x1 != 0;
        match path {
            VERSION | TSTAMP_L | TSTAMP_H | RX_RDY | RX_STATE | ECHO_DONE | ECHO_DELTA
            | ECHO_TX_L | ECHO_TX_H | ECHO_RX_L | ECHO_RX_H => {
                return Err(EmulatorError::ReadOnly(path.to_owned()))
            }
            RX_EN => {
                if bit && !self.rx_enabled {
                    self.rx_polls = 0;
                }
                self.rx_enabled = bit;
            }
            ECHO_GO => {
                if bit && !self.echo.go {
                    self.issue_echo();
                }
                self.echo.go = bit;
            }
            SFP_ADDR => self.sfp.addr = value,
            SFP_ALL => self.sfp.all = bit,
            SFP_TX_EN => self.sfp.tx_en = bit,
            SFP_GO => {
                if bit && !self.sfp.go {
                    self.execute_sfp();
                }
                self.sfp.go = bit;
            }
            DELAY_ADDR => self.delay.addr = value,
            DELAY_COARSE => self.delay.coarse = value as _,
            DELAY_FINE => self.delay.fine = value as _,
            DELAY_PHASE => self.delay.phase = value as _,
            DELAY_UPDATE => self.delay.update = bit,
            DELAY_GO => {
                if bit && !self.delay.go && self.delay.update {
                    self.execute_delay();
                }
                self.delay.go = bit;
            }
            MUX => self.mux = value,
            SUB_MUX => self.sub_mux = value,
            _ => {
                if let Some((ch, field)) = indexed(path, COMMAND_PREFIX) {
                    return self
                        .generators
                        .get_mut(ch)
                        .and_then(|g| g.write(field, value))
                        .ok_or_else(unknown);
                }
                if let Some((id, field)) = indexed(path, PARTITION_PREFIX) {
                    return self
                        .partitions
                        .get_mut(id)
                        .and_then(|part| part.write_ctrl(field.strip_prefix("csr.ctrl.")?, value))
                        .ok_or_else(unknown);
                }
                return Err(unknown());
            }
        }
        Ok(())
    }

    fn issue_echo(&mut self) {
        self.echo.done = false;
        self.echo.pending = None;
        let Some(rtt) = self.locked_endpoint().map(EndpointEmulator::round_trip_ticks) else {
            return;
        };
        self.echo.tx = self.timestamp;
        self.echo.rx = self.timestamp.wrapping_add(rtt);
        self.echo.pending = Some(self.echo_latency);
    }

    fn execute_sfp(&mut self) {
        let Strobes {
            all, addr, tx_en, ..
        } = self.sfp;
        self.endpoints
            .iter_mut()
            .filter(|ep| all || ep.addr() as u32 == addr)
            .for_each(|ep| ep.set_tx_enabled(tx_en));
        self.tx_history.push(
            self.endpoints
                .iter()
                .filter(|ep| ep.tx_enabled())
                .map(EndpointEmulator::addr)
                .collect(),
        );
    }

    fn execute_delay(&mut self) {
        let DelayCommand {
            addr,
            coarse,
            fine,
            phase,
            ..
        } = self.delay;
        if let Some(ep) = self
            .endpoints
            .iter_mut()
            .find(|ep| ep.addr() as u32 == addr)
        {
            ep.set_delays(coarse, fine, phase);
        }
    }
}

fn indexed<'a>(path: &'a str, prefix: &str) -> Option<(usize, &'a str)> {
    let (idx, field) = path.strip_prefix(prefix)?.split_once('.')?;
    Some((idx.parse().ok()?, field))
}
