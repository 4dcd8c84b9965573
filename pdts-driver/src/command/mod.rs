use pdts_core::{
    common::Freq,
    rate::RateSpec,
    register::{RegisterInterface, Transaction},
};

use crate::{
    error::TimingError,
    firmware::params::{command_ctrl, NUM_COMMAND_CHANNELS},
};

/// A command broadcast by one of the periodic command generators.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeriodicCommand {
    /// The generator.
    pub channel: u8,
    /// The command code.
    pub command: u8,
    /// The mean rate.
    pub rate: Freq<f64>,
    /// If `true`, commands are emitted with Poisson-distributed spacing instead of periodically.
    pub poisson: bool,
}

impl PeriodicCommand {
    /// Creates a new periodic [`PeriodicCommand`].
    #[must_use]
    pub const fn new(channel: u8, command: u8, rate: Freq<f64>) -> Self {
        Self {
            channel,
            command,
            rate,
            poisson: false,
        }
    }

    /// Switches between periodic and Poisson spacing.
    #[must_use]
    pub const fn with_poisson(self, poisson: bool) -> Self {
        Self { poisson, ..self }
    }
}

/// Programs the periodic command generators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandGenerator {
    clock: Freq<f64>,
}

impl CommandGenerator {
    /// The number of generators.
    pub const NUM_CHANNELS: u8 = NUM_COMMAND_CHANNELS;

    /// Creates a new [`CommandGenerator`] driven by `clock`.
    #[must_use]
    pub const fn new(clock: Freq<f64>) -> Self {
        Self { clock }
    }

    fn validate(channel: u8) -> Result<(), TimingError> {
        if channel >= Self::NUM_CHANNELS {
            return Err(TimingError::InvalidCommandChannel {
                channel,
                num_channels: Self::NUM_CHANNELS,
            });
        }
        Ok(())
    }

    /// Starts emitting `cmd` and returns the synthesized rate.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn enable<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        cmd: &PeriodicCommand,
    ) -> Result<RateSpec, TimingError> {
        Self::validate(cmd.channel)?;
        let spec = RateSpec::compute(cmd.rate, self.clock)?;

        let ch = cmd.channel;
        let mut tx = Transaction::new();
        tx.write(command_ctrl(ch, "en"), 0)
            .write(command_ctrl(ch, "type"), cmd.command as _)
            .write(command_ctrl(ch, "rate_div_d"), spec.divisor() as _)
            .write(command_ctrl(ch, "rate_div_p"), spec.prescale() as _)
            .write(command_ctrl(ch, "patt"), cmd.poisson as _)
            .write(command_ctrl(ch, "en"), 1);
        tx.commit(reg)?;

        tracing::info!(
            "Generator {}: command {:#X} at {:?}, every {:?} (requested {:?})",
            ch,
            cmd.command,
            spec.actual(),
            spec.actual().period().unwrap_or_default(),
            spec.requested()
        );
        Ok(spec)
    }

    /// Stops the generator `channel`.
    pub fn disable<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        channel: u8,
    ) -> Result<(), TimingError> {
        Self::validate(channel)?;
        let mut tx = Transaction::new();
        tx.write(command_ctrl(channel, "en"), 0);
        tx.commit(reg)?;
        Ok(())
    }

    /// Stops every generator.
    pub fn disable_all<R: RegisterInterface + ?Sized>(&self, reg: &mut R) -> Result<(), TimingError> {
        let mut tx = Transaction::new();
        (0..Self::NUM_CHANNELS).for_each(|ch| {
            tx.write(command_ctrl(ch, "en"), 0);
        });
        tx.commit(reg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pdts_core::{
        common::{kHz, Hz, CLOCK_FREQ},
        rate::RateError,
    };

    use super::*;
    use crate::tests::ScriptedInterface;

    #[test]
    fn enable() -> anyhow::Result<()> {
        let mut reg = ScriptedInterface::new();
        let generator = CommandGenerator::new(CLOCK_FREQ);

        let spec = generator.enable(
            &mut reg,
            &PeriodicCommand::new(2, 0x8, 1. * Hz).with_poisson(true),
        )?;
        assert_eq!(10, spec.divisor());
        assert_eq!(238, spec.prescale());
        assert_eq!(
            vec![
                ("master.scmd_gen.chan_ctrl2.en", 0),
                ("master.scmd_gen.chan_ctrl2.type", 0x8),
                ("master.scmd_gen.chan_ctrl2.rate_div_d", 10),
                ("master.scmd_gen.chan_ctrl2.rate_div_p", 238),
                ("master.scmd_gen.chan_ctrl2.patt", 1),
                ("master.scmd_gen.chan_ctrl2.en", 1),
            ],
            reg.writes()
        );
        assert_eq!(1, reg.dispatches);
        Ok(())
    }

    #[rstest::rstest]
    #[case(
        TimingError::InvalidCommandChannel { channel: 4, num_channels: 4 },
        PeriodicCommand::new(4, 0x1, 1. * kHz)
    )]
    #[case(
        TimingError::RateOutOfRange(RateError::RateOutOfRange(62.5e6 * Hz, 0)),
        PeriodicCommand::new(0, 0x1, 62.5e6 * Hz)
    )]
    #[test]
    fn enable_rejects(#[case] expect: TimingError, #[case] cmd: PeriodicCommand) {
        let mut reg = ScriptedInterface::new();
        let generator = CommandGenerator::new(CLOCK_FREQ);

        assert_eq!(Err(expect), generator.enable(&mut reg, &cmd));
        assert!(reg.log.is_empty());
    }

    #[test]
    fn disable() -> anyhow::Result<()> {
        let mut reg = ScriptedInterface::new();
        let generator = CommandGenerator::new(CLOCK_FREQ);

        generator.disable(&mut reg, 3)?;
        assert_eq!(vec![("master.scmd_gen.chan_ctrl3.en", 0)], reg.writes());
        assert_eq!(
            Err(TimingError::InvalidCommandChannel {
                channel: 4,
                num_channels: 4
            }),
            generator.disable(&mut reg, 4)
        );
        Ok(())
    }

    #[test]
    fn disable_all() -> anyhow::Result<()> {
        let mut reg = ScriptedInterface::new();
        CommandGenerator::new(CLOCK_FREQ).disable_all(&mut reg)?;
        assert!((0..4).all(|ch| reg.value(&format!("master.scmd_gen.chan_ctrl{ch}.en")) == Some(0)));
        assert_eq!(1, reg.dispatches);
        Ok(())
    }
}
