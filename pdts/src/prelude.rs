pub use crate::session::{MasterSession, Partition};

#[cfg(feature = "interface-audit")]
pub use crate::interface::{Audit, AuditOption};

pub use pdts_core::{
    common::{kHz, Freq, Hz, MHz},
    rate::RateSpec,
    register::{RegisterInterface, Transaction},
    sleep::{Sleep, SpinSleeper, StdSleeper},
};
pub use pdts_driver::{
    command::PeriodicCommand,
    error::TimingError,
    firmware::{version::FirmwareVersion, Auto, Firmware, V4, V5},
    option::SessionOption,
    partition::{PartitionConfig, PartitionState, PartitionStatus},
    sync::{BoardVariant, DelayReport, DelayTriplet, EndpointAddress, LockState, MuxRoute, RangingResult},
};
