use std::time::Duration;

use pdts_core::{
    register::{RegisterInterface, Transaction},
    sleep::Sleep,
};

use super::{
    DelayTriplet, EchoRangingService, EndpointAddress, EndpointLockMonitor, LinkRouter, MuxRoute,
    RangingResult,
};
use crate::{
    error::TimingError,
    firmware::{params::*, Firmware},
    option::SessionOption,
};

/// Round trips measured before and after a delay write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayReport {
    /// Measurement before the delay write.
    pub pre: Option<RangingResult>,
    /// Measurement after the delay write.
    pub post: Option<RangingResult>,
}

/// Measures endpoint round trips and programs endpoint transmit delays.
///
/// When `control_sfp` is requested, the shared command bus is sequenced so that only the
/// target endpoint transmits: every endpoint is disabled before the target is enabled, in one
/// ordered batch.
#[derive(Debug)]
pub struct DelayCalibrator<'a, F: Firmware, S: Sleep> {
    monitor: EndpointLockMonitor<'a, F, S>,
    echo: EchoRangingService<'a, F, S>,
    router: LinkRouter<'a, F, S>,
    timeout: Duration,
}

impl<'a, F: Firmware, S: Sleep> DelayCalibrator<'a, F, S> {
    /// Creates a new [`DelayCalibrator`].
    #[must_use]
    pub const fn new(firmware: &'a F, sleeper: &'a S, option: &SessionOption) -> Self {
        Self {
            monitor: EndpointLockMonitor::new(firmware, sleeper, option.poll_interval),
            echo: EchoRangingService::new(firmware, sleeper, option.poll_interval),
            router: LinkRouter::new(firmware, sleeper, option),
            timeout: option.default_timeout,
        }
    }

    /// Measures the round trip of `endpoint`.
    ///
    /// With `control_sfp`, the endpoint's transmitter is disabled again on success and on
    /// lock timeout. An echo timeout is returned as is, leaving the transmitter enabled.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn measure_endpoint_rtt<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
        control_sfp: bool,
        route: Option<MuxRoute>,
    ) -> Result<RangingResult, TimingError> {
        if let Some(route) = route {
            self.router.board().validate(route)?;
        }

        let result = self.setup_and_measure(reg, endpoint, control_sfp, route)?;
        if control_sfp {
            self.disable_tx(reg, endpoint)?;
        }
        tracing::info!(
            "{}: round trip {} ticks",
            endpoint,
            result.round_trip_ticks()
        );
        Ok(result)
    }

    /// Writes `delays` to `endpoint`, optionally measuring the round trip before and after.
    ///
    /// The pre measurement happens before any delay write, so a failure there leaves the
    /// delays untouched. A failure in the post measurement does not revert the write.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn apply_endpoint_delay<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
        delays: DelayTriplet,
        measure_rtt: bool,
        control_sfp: bool,
        route: Option<MuxRoute>,
    ) -> Result<DelayReport, TimingError> {
        delays.validate()?;
        if let Some(route) = route {
            self.router.board().validate(route)?;
        }

        let pre = if measure_rtt {
            Some(self.setup_and_measure(reg, endpoint, control_sfp, route)?)
        } else {
            None
        };

        self.write_delay(reg, endpoint, delays)?;

        let post = if measure_rtt {
            Some(self.lock_and_measure(reg, endpoint, control_sfp)?)
        } else {
            None
        };

        if control_sfp {
            self.disable_tx(reg, endpoint)?;
        }

        let report = DelayReport { pre, post };
        tracing::info!("{}: applied {:?}, {:?}", endpoint, delays, report);
        Ok(report)
    }

    fn setup_and_measure<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
        control_sfp: bool,
        route: Option<MuxRoute>,
    ) -> Result<RangingResult, TimingError> {
        if control_sfp {
            self.isolate(reg, endpoint)?;
        }
        if let Some(route) = route {
            self.router.switch_route(reg, route, false)?;
        }
        self.lock_and_measure(reg, endpoint, control_sfp)
    }

    fn lock_and_measure<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
        control_sfp: bool,
    ) -> Result<RangingResult, TimingError> {
        if let Err(e) = self.monitor.wait_for_lock(reg, self.timeout) {
            if control_sfp && matches!(e, TimingError::LockTimeout { .. }) {
                if let Err(cleanup) = self.disable_tx(reg, endpoint) {
                    tracing::error!("Failed to disable {} after lock timeout: {}", endpoint, cleanup);
                }
            }
            return Err(e);
        }
        self.echo.measure_round_trip(reg, self.timeout)
    }

    fn isolate<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
    ) -> Result<(), TimingError> {
        tracing::debug!("Enabling transmit on {} only", endpoint);
        let mut tx = Transaction::new();
        // all off, then the target on
        tx.write(SFP_ALL, 1).write(SFP_TX_EN, 0).pulse(SFP_GO);
        tx.write(SFP_ALL, 0)
            .write(SFP_ADDR, endpoint.get() as _)
            .write(SFP_TX_EN, 1)
            .pulse(SFP_GO);
        tx.commit(reg)?;
        Ok(())
    }

    fn disable_tx<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
    ) -> Result<(), TimingError> {
        tracing::debug!("Disabling transmit on {}", endpoint);
        let mut tx = Transaction::new();
        tx.write(SFP_ALL, 0)
            .write(SFP_ADDR, endpoint.get() as _)
            .write(SFP_TX_EN, 0)
            .pulse(SFP_GO);
        tx.commit(reg)?;
        Ok(())
    }

    fn write_delay<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        endpoint: EndpointAddress,
        delays: DelayTriplet,
    ) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        tx.write(DELAY_ADDR, endpoint.get() as _)
            .write(DELAY_COARSE, delays.coarse() as _)
            .write(DELAY_FINE, delays.fine() as _)
            .write(DELAY_PHASE, delays.phase() as _)
            .write(DELAY_UPDATE, 1)
            .pulse(DELAY_GO)
            .write(DELAY_UPDATE, 0);
        tx.commit(reg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pdts_core::register::Request;

    use super::*;
    use crate::{
        firmware::V5,
        tests::{RecordingSleeper, ScriptedInterface},
    };

    const ENDPOINT: EndpointAddress = EndpointAddress::new(5);

    #[derive(Debug, PartialEq, Eq)]
    enum SfpCommand {
        All(u32),
        One(u32, u32),
    }

    fn sfp_commands(reg: &ScriptedInterface) -> Vec<SfpCommand> {
        let (mut all, mut addr, mut tx_en) = (0, 0, 0);
        reg.log
            .iter()
            .filter_map(|req| match req {
                Request::Write { path, value } => {
                    match path.as_str() {
                        SFP_ALL => all = *value,
                        SFP_ADDR => addr = *value,
                        SFP_TX_EN => tx_en = *value,
                        SFP_GO if *value == 1 => {
                            return Some(if all == 1 {
                                SfpCommand::All(tx_en)
                            } else {
                                SfpCommand::One(addr, tx_en)
                            });
                        }
                        _ => {}
                    }
                    None
                }
                Request::Read { .. } => None,
            })
            .collect()
    }

    fn option() -> SessionOption {
        SessionOption {
            poll_interval: Duration::from_millis(1),
            default_timeout: Duration::from_millis(10),
            ..Default::default()
        }
    }

    fn locked() -> ScriptedInterface {
        ScriptedInterface::new()
            .with(RX_RDY, 1)
            .with(RX_STATE, 0x8)
            .with(ECHO_DONE, 1)
            .with(ECHO_TX_L, 100)
            .with(ECHO_TX_H, 0)
            .with(ECHO_RX_L, 400)
            .with(ECHO_RX_H, 0)
    }

    #[test]
    fn measure_with_sfp_control() -> anyhow::Result<()> {
        let mut reg = locked();
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        let result =
            calibrator.measure_endpoint_rtt(&mut reg, ENDPOINT, true, Some(MuxRoute::new(2)))?;
        assert_eq!(300, result.round_trip_ticks());
        assert_eq!(
            vec![
                SfpCommand::All(0),
                SfpCommand::One(5, 1),
                SfpCommand::One(5, 0)
            ],
            sfp_commands(&reg)
        );
        assert_eq!(vec![2], reg.writes_to(MUX));
        Ok(())
    }

    #[test]
    fn measure_without_sfp_control() -> anyhow::Result<()> {
        let mut reg = locked();
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        calibrator.measure_endpoint_rtt(&mut reg, ENDPOINT, false, None)?;
        assert!(sfp_commands(&reg).is_empty());
        assert!(reg.writes_to(MUX).is_empty());
        Ok(())
    }

    #[test]
    fn lock_timeout_disables_endpoint() {
        let mut reg = locked().with(RX_RDY, 0).with(RX_STATE, 0x3);
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        assert_eq!(
            Err(TimingError::LockTimeout {
                ready: false,
                state: Some(0x3)
            }),
            calibrator.measure_endpoint_rtt(&mut reg, ENDPOINT, true, None)
        );
        assert_eq!(Some(&SfpCommand::One(5, 0)), sfp_commands(&reg).last());
        assert_eq!(0, reg.writes_to(ECHO_GO).len());
    }

    #[test]
    fn echo_timeout_propagates() {
        let mut reg = locked().with(ECHO_DONE, 0);
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        assert_eq!(
            Err(TimingError::EchoTimeout(Duration::from_millis(10))),
            calibrator.measure_endpoint_rtt(&mut reg, ENDPOINT, true, None)
        );
        assert_eq!(Some(&SfpCommand::One(5, 1)), sfp_commands(&reg).last());
    }

    #[test]
    fn invalid_route_writes_nothing() {
        let mut reg = locked();
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        assert_eq!(
            Err(TimingError::InvalidChannel {
                channel: 8,
                num_channels: 8
            }),
            calibrator.measure_endpoint_rtt(&mut reg, ENDPOINT, true, Some(MuxRoute::new(8)))
        );
        assert!(reg.log.is_empty());
    }

    #[test]
    fn apply_delay_with_measurement() -> anyhow::Result<()> {
        let mut reg = locked();
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        let report = calibrator.apply_endpoint_delay(
            &mut reg,
            ENDPOINT,
            DelayTriplet::new(3, 17, 2)?,
            true,
            true,
            None,
        )?;
        assert_eq!(Some(300), report.pre.map(|r| r.round_trip_ticks()));
        assert_eq!(Some(300), report.post.map(|r| r.round_trip_ticks()));

        assert_eq!(vec![5], reg.writes_to(DELAY_ADDR));
        assert_eq!(vec![3], reg.writes_to(DELAY_COARSE));
        assert_eq!(vec![17], reg.writes_to(DELAY_FINE));
        assert_eq!(vec![2], reg.writes_to(DELAY_PHASE));
        assert_eq!(vec![1, 0], reg.writes_to(DELAY_UPDATE));
        assert_eq!(vec![1, 0], reg.writes_to(DELAY_GO));
        assert_eq!(2, reg.writes_to(ECHO_GO).len() / 2);
        assert_eq!(Some(&SfpCommand::One(5, 0)), sfp_commands(&reg).last());

        let delay_write = reg
            .log
            .iter()
            .position(|r| matches!(r, Request::Write { path, .. } if path == DELAY_ADDR));
        let first_lock = reg
            .log
            .iter()
            .position(|r| matches!(r, Request::Read { path } if path == RX_RDY));
        assert!(first_lock < delay_write);
        Ok(())
    }

    #[test]
    fn apply_delay_without_measurement() -> anyhow::Result<()> {
        let mut reg = ScriptedInterface::new();
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        let report = calibrator.apply_endpoint_delay(
            &mut reg,
            ENDPOINT,
            DelayTriplet::new(1, 1, 1)?,
            false,
            true,
            None,
        )?;
        assert_eq!(DelayReport::default(), report);
        assert_eq!(0, reg.reads_of(RX_RDY));
        assert_eq!(vec![SfpCommand::One(5, 0)], sfp_commands(&reg));
        Ok(())
    }

    #[test]
    fn apply_delay_aborts_before_write_on_lock_timeout() -> anyhow::Result<()> {
        let mut reg = locked().with(RX_RDY, 0).with(RX_STATE, 0x3);
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        assert!(matches!(
            calibrator.apply_endpoint_delay(
                &mut reg,
                ENDPOINT,
                DelayTriplet::new(1, 1, 1)?,
                true,
                true,
                None,
            ),
            Err(TimingError::LockTimeout { .. })
        ));
        assert!(reg.writes_to(DELAY_ADDR).is_empty());
        assert_eq!(Some(&SfpCommand::One(5, 0)), sfp_commands(&reg).last());
        Ok(())
    }

    #[test]
    fn apply_delay_post_failure_keeps_write() -> anyhow::Result<()> {
        let mut reg = locked()
            .with_sequence(RX_RDY, [1, 0])
            .with_sequence(RX_STATE, [0x8, 0x3]);
        let sleeper = RecordingSleeper::default();
        let option = option();
        let calibrator = DelayCalibrator::new(&V5, &sleeper, &option);

        assert!(matches!(
            calibrator.apply_endpoint_delay(
                &mut reg,
                ENDPOINT,
                DelayTriplet::new(4, 0, 0)?,
                true,
                true,
                None,
            ),
            Err(TimingError::LockTimeout { .. })
        ));
        assert_eq!(vec![4], reg.writes_to(DELAY_COARSE));
        assert_eq!(Some(&SfpCommand::One(5, 0)), sfp_commands(&reg).last());
        Ok(())
    }
}
