use std::{collections::BTreeSet, time::Duration};

use itertools::Itertools;
use pdts_core::{
    register::{RegisterInterface, Transaction},
    sleep::Sleep,
};

use super::EndpointLockMonitor;
use crate::{
    error::TimingError,
    firmware::{
        params::{MUX, SUB_MUX},
        Firmware,
    },
    option::SessionOption,
};

/// Physical output layout of a master board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardVariant {
    num_channels: u8,
    num_sub_channels: u8,
}

impl BoardVariant {
    /// A fan-out board with 8 outputs.
    pub const FANOUT: Self = Self::new(8, 0);
    /// A board with a single output.
    pub const SINGLE: Self = Self::new(1, 0);
    /// A fan-out board with 8 outputs, each followed by an 8-way secondary bus.
    pub const CASCADE: Self = Self::new(8, 8);

    /// Creates a new [`BoardVariant`].
    #[must_use]
    pub const fn new(num_channels: u8, num_sub_channels: u8) -> Self {
        Self {
            num_channels,
            num_sub_channels,
        }
    }

    /// The number of mux channels.
    #[must_use]
    pub const fn num_channels(&self) -> u8 {
        self.num_channels
    }

    /// The number of secondary bus sub-channels. `0` if the board has no secondary bus.
    #[must_use]
    pub const fn num_sub_channels(&self) -> u8 {
        self.num_sub_channels
    }

    /// Every route behind `channel`, one per sub-channel on boards with a secondary bus.
    pub fn routes(&self, channel: u8) -> impl Iterator<Item = MuxRoute> {
        let num_sub_channels = self.num_sub_channels;
        (0..num_sub_channels.max(1)).map(move |sub| match num_sub_channels {
            0 => MuxRoute::new(channel),
            _ => MuxRoute::new(channel).with_sub_channel(sub),
        })
    }

    /// Checks that `route` exists on this board.
    pub fn validate(&self, route: MuxRoute) -> Result<(), TimingError> {
        if route.channel >= self.num_channels {
            return Err(TimingError::InvalidChannel {
                channel: route.channel,
                num_channels: self.num_channels,
            });
        }
        match route.sub_channel {
            Some(sub_channel) if sub_channel >= self.num_sub_channels => {
                Err(TimingError::InvalidSubChannel {
                    sub_channel,
                    num_sub_channels: self.num_sub_channels,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for BoardVariant {
    fn default() -> Self {
        Self::FANOUT
    }
}

/// A downstream path selected by the mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MuxRoute {
    channel: u8,
    sub_channel: Option<u8>,
}

impl MuxRoute {
    /// Creates a new [`MuxRoute`] on `channel`.
    #[must_use]
    pub const fn new(channel: u8) -> Self {
        Self {
            channel,
            sub_channel: None,
        }
    }

    /// Selects a secondary bus sub-channel behind the channel.
    #[must_use]
    pub const fn with_sub_channel(self, sub_channel: u8) -> Self {
        Self {
            sub_channel: Some(sub_channel),
            ..self
        }
    }

    /// The mux channel.
    #[must_use]
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// The secondary bus sub-channel.
    #[must_use]
    pub const fn sub_channel(&self) -> Option<u8> {
        self.sub_channel
    }
}

impl std::fmt::Display for MuxRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sub_channel {
            Some(sub) => write!(f, "channel {}.{}", self.channel, sub),
            None => write!(f, "channel {}", self.channel),
        }
    }
}

/// Selects which downstream path carries the command stream.
#[derive(Debug)]
pub struct LinkRouter<'a, F: Firmware, S: Sleep> {
    board: BoardVariant,
    monitor: EndpointLockMonitor<'a, F, S>,
    lock_timeout: Duration,
}

impl<'a, F: Firmware, S: Sleep> LinkRouter<'a, F, S> {
    /// Creates a new [`LinkRouter`].
    #[must_use]
    pub const fn new(firmware: &'a F, sleeper: &'a S, option: &SessionOption) -> Self {
        Self {
            board: option.board,
            monitor: EndpointLockMonitor::new(firmware, sleeper, option.poll_interval),
            lock_timeout: option.route_lock_timeout,
        }
    }

    /// The board this router switches on.
    #[must_use]
    pub const fn board(&self) -> BoardVariant {
        self.board
    }

    /// Switches the mux to `route`.
    ///
    /// On a board with a secondary bus the sub-mux is always written. A route without a
    /// sub-channel selects sub-channel 0.
    ///
    /// If `verify_lock` is `true`, waits for the receiver to lock and returns whether it did.
    /// A lock timeout is not an error here. Otherwise returns `true` without waiting.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn switch_route<R: RegisterInterface + ?Sized>(
        &self,
        reg: &mut R,
        route: MuxRoute,
        verify_lock: bool,
    ) -> Result<bool, TimingError> {
        self.board.validate(route)?;

        let mut tx = Transaction::new();
        tx.write(MUX, route.channel as _);
        if self.board.num_sub_channels > 0 {
            tx.write(SUB_MUX, route.sub_channel.unwrap_or(0) as _);
        }
        tx.commit(reg)?;
        tracing::debug!("Switched to {}", route);

        if !verify_lock {
            return Ok(true);
        }
        match self.monitor.wait_for_lock(reg, self.lock_timeout) {
            Ok(_) => Ok(true),
            Err(TimingError::LockTimeout { ready, state }) => {
                tracing::debug!(
                    "{} did not lock (ready = {}, state = {:?})",
                    route,
                    ready,
                    state
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Switches through every channel and collects the ones that lock.
    ///
    /// On a board with a secondary bus each sub-channel is tried in turn, and a channel
    /// counts as locked once any of its sub-channels locks.
    /// Failures on individual routes are logged and skipped.
    #[tracing::instrument(level = "debug", skip(self, reg))]
    pub fn scan_all_routes<R: RegisterInterface + ?Sized>(&self, reg: &mut R) -> BTreeSet<u8> {
        let locked = (0..self.board.num_channels)
            .filter(|&channel| {
                self.board.routes(channel).any(|route| {
                    match self.switch_route(reg, route, true) {
                        Ok(locked) => locked,
                        Err(e) => {
                            tracing::warn!("Failed to scan {}: {}", route, e);
                            false
                        }
                    }
                })
            })
            .collect::<BTreeSet<_>>();
        tracing::info!(
            "Locked channels: [{}]",
            locked.iter().map(|c| c.to_string()).join(", ")
        );
        locked
    }
}
