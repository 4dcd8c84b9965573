use std::time::Duration;

use pdts_core::{rate::RateError, register::RegisterError};
use thiserror::Error;

use crate::firmware::version::FirmwareVersion;

/// A interface for error handling in pdts-driver.
#[derive(Error, Debug, PartialEq, Clone)]
#[non_exhaustive]
pub enum TimingError {
    /// The endpoint never reported lock within the deadline.
    #[error("Endpoint did not lock (ready = {ready}, state = {state:?})")]
    LockTimeout {
        /// The last observed ready flag.
        ready: bool,
        /// The last observed state code, if the firmware exposes one.
        state: Option<u8>,
    },
    /// The ranging echo never completed within the deadline.
    #[error("Echo did not complete within {0:?}")]
    EchoTimeout(Duration),
    /// The partition failed to enter or leave the running state within the deadline.
    #[error("Run request was not acknowledged within {0:?}")]
    RunRequestTimeout(Duration),

    /// Mux channel is out of range.
    #[error("Channel ({channel}) is out of range ([0, {num_channels}))")]
    InvalidChannel {
        /// The requested channel.
        channel: u8,
        /// The number of channels on the board.
        num_channels: u8,
    },
    /// Mux sub-channel is out of range.
    #[error("Sub-channel ({sub_channel}) is out of range ([0, {num_sub_channels}))")]
    InvalidSubChannel {
        /// The requested sub-channel.
        sub_channel: u8,
        /// The number of sub-channels on the board.
        num_sub_channels: u8,
    },
    /// Periodic command generator channel is out of range.
    #[error("Command generator ({channel}) is out of range ([0, {num_channels}))")]
    InvalidCommandChannel {
        /// The requested generator.
        channel: u8,
        /// The number of generators.
        num_channels: u8,
    },
    /// Partition id is out of range.
    #[error("Partition ({id}) is out of range ([0, {num_partitions}))")]
    InvalidPartition {
        /// The requested partition.
        id: u8,
        /// The number of partitions.
        num_partitions: u8,
    },
    /// Delay value does not fit its hardware field.
    #[error("{field} delay ({value}) is out of range ([0, {max}])")]
    DelayOutOfRange {
        /// The name of the field.
        field: &'static str,
        /// The requested value.
        value: u32,
        /// The maximum value of the field.
        max: u32,
    },

    /// The requested command rate is not representable.
    #[error("{0}")]
    RateOutOfRange(#[from] RateError),
    /// The firmware version is not supported by the selected firmware.
    #[error("Firmware {0} is not supported")]
    IncompatibleFirmware(FirmwareVersion),
    /// Error in the register interface.
    #[error("{0}")]
    Register(#[from] RegisterError),
}
