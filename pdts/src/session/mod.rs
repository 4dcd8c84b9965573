mod partition;

use std::{collections::BTreeSet, time::Duration};

use getset::{Getters, MutGetters};
use pdts_core::{
    rate::RateSpec,
    register::{self, join_u64, RegisterInterface, Transaction},
    sleep::{Sleep, StdSleeper},
    utils::retry,
};
use pdts_driver::{
    command::{CommandGenerator, PeriodicCommand},
    error::TimingError,
    firmware::{
        params::{TSTAMP_H, TSTAMP_L, VERSION},
        version::FirmwareVersion,
        Auto, Firmware,
    },
    option::SessionOption,
    partition::PartitionRunController,
    sync::{
        DelayCalibrator, DelayReport, DelayTriplet, EchoRangingService, EndpointAddress,
        EndpointLockMonitor, LinkRouter, LockState, MuxRoute, RangingResult,
    },
};

pub use partition::Partition;

/// A connection to a timing master.
///
/// The session owns the register interface, the firmware capability and the sleeper used by
/// every poll loop. Dropping an open session closes it.
#[derive(Getters, MutGetters)]
pub struct MasterSession<R: RegisterInterface, F: Firmware = Auto, S: Sleep = StdSleeper> {
    #[getset(get = "pub", get_mut = "pub")]
    /// The register interface.
    interface: R,
    #[getset(get = "pub")]
    /// The firmware capability.
    firmware: F,
    #[getset(get = "pub")]
    /// The sleeper used while polling.
    sleeper: S,
    #[getset(get = "pub")]
    /// The session option.
    option: SessionOption,
    #[getset(get = "pub")]
    /// The firmware version reported by the master.
    version: FirmwareVersion,
    partitions: Vec<PartitionRunController>,
    generator: CommandGenerator,
}

impl<R: RegisterInterface> MasterSession<R> {
    /// Opens a session with the default option, detecting the firmware generation.
    pub fn open(interface: R) -> Result<Self, TimingError> {
        Self::open_with(
            interface,
            Auto::default(),
            StdSleeper,
            SessionOption::default(),
        )
    }
}

impl<R: RegisterInterface, F: Firmware, S: Sleep> MasterSession<R, F, S> {
    /// Opens a session.
    ///
    /// The firmware version is read up to [`SessionOption::open_retries`] times and then
    /// checked by `firmware`. If any step after opening fails, the interface is closed again.
    #[tracing::instrument(level = "debug", skip(interface, firmware, sleeper))]
    pub fn open_with(
        mut interface: R,
        mut firmware: F,
        sleeper: S,
        option: SessionOption,
    ) -> Result<Self, TimingError> {
        interface.open()?;

        let (version, partitions) = match Self::handshake(&mut interface, &mut firmware, &option)
        {
            Ok(r) => r,
            Err(e) => {
                if let Err(close_err) = interface.close() {
                    tracing::warn!("Failed to close interface after failed open: {}", close_err);
                }
                return Err(e);
            }
        };

        Ok(Self {
            interface,
            firmware,
            sleeper,
            option,
            version,
            partitions,
            generator: CommandGenerator::new(option.clock_frequency),
        })
    }

    fn handshake(
        interface: &mut R,
        firmware: &mut F,
        option: &SessionOption,
    ) -> Result<(FirmwareVersion, Vec<PartitionRunController>), TimingError> {
        let version = FirmwareVersion::from_word(retry(option.open_retries, |attempt| {
            tracing::trace!("reading firmware version (attempt {})", attempt);
            register::read(interface, VERSION)
        })?);
        firmware.detect(version)?;
        tracing::info!("Master firmware {}", version);

        let partitions = (0..option.num_partitions)
            .map(|id| PartitionRunController::new(id, option.num_partitions, option.poll_interval))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((version, partitions))
    }

    /// Disables every periodic command generator and closes the interface.
    ///
    /// Closing a closed session does nothing.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn close(&mut self) -> Result<(), TimingError> {
        if !self.interface.is_open() {
            return Ok(());
        }
        self.generator.disable_all(&mut self.interface)?;
        self.interface.close()?;
        Ok(())
    }

    /// Reads the 64-bit master timestamp counter.
    pub fn timestamp(&mut self) -> Result<u64, TimingError> {
        let mut tx = Transaction::new();
        let lo = tx.read(TSTAMP_L);
        let hi = tx.read(TSTAMP_H);
        let values = tx.commit(&mut self.interface)?;
        Ok(join_u64(values.get(hi)?, values.get(lo)?))
    }

    /// Restarts link acquisition and waits for the receiver to lock.
    pub fn wait_for_lock(&mut self, timeout: Duration) -> Result<LockState, TimingError> {
        EndpointLockMonitor::new(&self.firmware, &self.sleeper, self.option.poll_interval)
            .wait_for_lock(&mut self.interface, timeout)
    }

    /// Issues a ranging echo on the locked link.
    pub fn measure_round_trip(&mut self, timeout: Duration) -> Result<RangingResult, TimingError> {
        EchoRangingService::new(&self.firmware, &self.sleeper, self.option.poll_interval)
            .measure_round_trip(&mut self.interface, timeout)
    }

    /// Switches the mux to `route`, optionally checking that the link behind it locks.
    pub fn switch_route(&mut self, route: MuxRoute, verify_lock: bool) -> Result<bool, TimingError> {
        LinkRouter::new(&self.firmware, &self.sleeper, &self.option).switch_route(
            &mut self.interface,
            route,
            verify_lock,
        )
    }

    /// Returns the channels whose link locks.
    pub fn scan_all_routes(&mut self) -> BTreeSet<u8> {
        LinkRouter::new(&self.firmware, &self.sleeper, &self.option)
            .scan_all_routes(&mut self.interface)
    }

    /// Measures the round trip of `endpoint`.
    pub fn measure_endpoint_rtt(
        &mut self,
        endpoint: EndpointAddress,
        control_sfp: bool,
        route: Option<MuxRoute>,
    ) -> Result<RangingResult, TimingError> {
        DelayCalibrator::new(&self.firmware, &self.sleeper, &self.option).measure_endpoint_rtt(
            &mut self.interface,
            endpoint,
            control_sfp,
            route,
        )
    }

    /// Writes `delays` to `endpoint`, optionally measuring the round trip before and after.
    pub fn apply_endpoint_delay(
        &mut self,
        endpoint: EndpointAddress,
        delays: DelayTriplet,
        measure_rtt: bool,
        control_sfp: bool,
        route: Option<MuxRoute>,
    ) -> Result<DelayReport, TimingError> {
        DelayCalibrator::new(&self.firmware, &self.sleeper, &self.option).apply_endpoint_delay(
            &mut self.interface,
            endpoint,
            delays,
            measure_rtt,
            control_sfp,
            route,
        )
    }

    /// Starts a periodic command generator.
    pub fn enable_periodic_command(
        &mut self,
        cmd: &PeriodicCommand,
    ) -> Result<RateSpec, TimingError> {
        self.generator.enable(&mut self.interface, cmd)
    }

    /// Stops a periodic command generator.
    pub fn disable_periodic_command(&mut self, channel: u8) -> Result<(), TimingError> {
        self.generator.disable(&mut self.interface, channel)
    }

    /// Returns the partition `id`.
    pub fn partition(&mut self, id: u8) -> Result<Partition<'_, R, S>, TimingError> {
        let num_partitions = self.option.num_partitions;
        let controller = self
            .partitions
            .get_mut(id as usize)
            .ok_or(TimingError::InvalidPartition { id, num_partitions })?;
        Ok(Partition::new(
            &mut self.interface,
            &self.sleeper,
            controller,
        ))
    }
}

impl<R: RegisterInterface, F: Firmware, S: Sleep> Drop for MasterSession<R, F, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close the session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        num::NonZeroUsize,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };

    use pdts_core::{
        common::kHz,
        register::{RegisterError, Request},
    };
    use pdts_driver::{firmware::V4, sync::BoardVariant};
    use pdts_firmware_emulator::EndpointEmulator;

    use super::*;
    use crate::interface::{Audit, AuditOption};

    fn option() -> SessionOption {
        SessionOption {
            poll_interval: Duration::from_millis(1),
            default_timeout: Duration::from_millis(50),
            route_lock_timeout: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn open(audit: AuditOption) -> Result<MasterSession<Audit>, TimingError> {
        MasterSession::open_with(Audit::new(audit), Auto::default(), StdSleeper, option())
    }

    #[test]
    fn open_close() -> anyhow::Result<()> {
        let mut session = open(AuditOption::default())?;
        assert!(session.interface().is_open());
        assert_eq!(FirmwareVersion::new(5, 3, 0), *session.version());

        session.close()?;
        assert!(!session.interface().is_open());
        session.close()?;
        Ok(())
    }

    #[test]
    fn open_retries_version_read() -> anyhow::Result<()> {
        let mut audit = Audit::new(AuditOption::default());
        audit.inject_faults(2);
        let session =
            MasterSession::open_with(audit, Auto::default(), StdSleeper, option())?;
        assert_eq!(FirmwareVersion::new(5, 3, 0), *session.version());
        Ok(())
    }

    #[test]
    fn open_gives_up() {
        let mut audit = Audit::new(AuditOption::default());
        audit.inject_faults(3);
        assert_eq!(
            Some(TimingError::Register(RegisterError::new(
                "Master does not respond"
            ))),
            MasterSession::open_with(audit, Auto::default(), StdSleeper, option()).err()
        );

        let mut audit = Audit::new(AuditOption::default());
        audit.inject_faults(3);
        let option = SessionOption {
            open_retries: NonZeroUsize::MIN.saturating_add(3),
            ..option()
        };
        assert!(MasterSession::open_with(audit, Auto::default(), StdSleeper, option).is_ok());
    }

    struct CountingClose {
        audit: Audit,
        closes: Arc<AtomicUsize>,
    }

    impl RegisterInterface for CountingClose {
        fn open(&mut self) -> Result<(), RegisterError> {
            self.audit.open()
        }

        fn close(&mut self) -> Result<(), RegisterError> {
            self.closes.fetch_add(1, Ordering::Relaxed);
            self.audit.close()
        }

        fn dispatch(&mut self, requests: &[Request]) -> Result<Vec<u32>, RegisterError> {
            self.audit.dispatch(requests)
        }

        fn is_open(&self) -> bool {
            self.audit.is_open()
        }
    }

    #[rstest::rstest]
    #[case(
        TimingError::Register(RegisterError::new("Master does not respond")),
        3,
        FirmwareVersion::new(5, 3, 0)
    )]
    #[case(
        TimingError::IncompatibleFirmware(FirmwareVersion::new(3, 0, 0)),
        0,
        FirmwareVersion::new(3, 0, 0)
    )]
    #[test]
    fn failed_open_closes_interface(
        #[case] expect: TimingError,
        #[case] faults: usize,
        #[case] version: FirmwareVersion,
    ) {
        let closes = Arc::new(AtomicUsize::new(0));
        let mut audit = Audit::new(AuditOption {
            version,
            ..Default::default()
        });
        audit.inject_faults(faults);
        let interface = CountingClose {
            audit,
            closes: closes.clone(),
        };

        assert_eq!(
            Some(expect),
            MasterSession::open_with(interface, Auto::default(), StdSleeper, option()).err()
        );
        assert_eq!(1, closes.load(Ordering::Relaxed));
    }

    #[rstest::rstest]
    #[case(FirmwareVersion::new(3, 0, 0))]
    #[case(FirmwareVersion::new(7, 1, 0))]
    #[test]
    fn open_incompatible(#[case] version: FirmwareVersion) {
        assert_eq!(
            Some(TimingError::IncompatibleFirmware(version)),
            open(AuditOption {
                version,
                ..Default::default()
            })
            .err()
        );
    }

    #[test]
    fn open_fixed_generation_mismatch() {
        assert_eq!(
            Some(TimingError::IncompatibleFirmware(FirmwareVersion::new(5, 3, 0))),
            MasterSession::open_with(
                Audit::new(AuditOption::default()),
                V4,
                StdSleeper,
                option()
            )
            .err()
        );
    }

    #[test]
    fn timestamp() -> anyhow::Result<()> {
        let mut session = open(AuditOption::default())?;
        let t0 = session.timestamp()?;
        let t1 = session.timestamp()?;
        assert!(t0 < t1);
        assert_eq!(session.interface().timestamp(), t1);
        Ok(())
    }

    #[test]
    fn lock_and_echo() -> anyhow::Result<()> {
        let mut session = open(AuditOption {
            endpoints: vec![EndpointEmulator::new(1, 0).with_base_rtt(480)],
            ..Default::default()
        })?;
        assert_eq!(LockState::Locked, session.wait_for_lock(Duration::from_secs(1))?);
        assert_eq!(
            480,
            session
                .measure_round_trip(Duration::from_secs(1))?
                .round_trip_ticks()
        );
        Ok(())
    }

    #[test]
    fn partition_out_of_range() -> anyhow::Result<()> {
        let mut session = open(AuditOption::default())?;
        assert!(session.partition(3).is_ok());
        assert_eq!(
            Some(TimingError::InvalidPartition {
                id: 4,
                num_partitions: 4
            }),
            session.partition(4).err()
        );
        Ok(())
    }

    #[test]
    fn close_disables_generators() -> anyhow::Result<()> {
        let mut session = open(AuditOption::default())?;
        session.enable_periodic_command(&PeriodicCommand::new(0, 0x1, 1. * kHz))?;
        assert_eq!(Some(true), session.interface().generator(0).map(|g| g.enabled()));

        session.close()?;
        assert_eq!(Some(false), session.interface().generator(0).map(|g| g.enabled()));
        Ok(())
    }

    #[test]
    fn drop_closes_broken_session() -> anyhow::Result<()> {
        let mut session = open(AuditOption::default())?;
        session.interface_mut().break_down();
        drop(session);
        Ok(())
    }

    #[test]
    fn custom_board() -> anyhow::Result<()> {
        let mut session = MasterSession::open_with(
            Audit::new(AuditOption::default()),
            Auto::default(),
            StdSleeper,
            SessionOption {
                board: BoardVariant::SINGLE,
                ..option()
            },
        )?;
        assert_eq!(
            Err(TimingError::InvalidChannel {
                channel: 1,
                num_channels: 1
            }),
            session.switch_route(MuxRoute::new(1), false)
        );
        Ok(())
    }
}
