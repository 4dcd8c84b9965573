mod calibrator;
mod echo;
mod endpoint;
mod lock;
mod poll;
mod route;

pub use calibrator::{DelayCalibrator, DelayReport};
pub use echo::{EchoRangingService, RangingResult};
pub use endpoint::{DelayTriplet, EndpointAddress};
pub use lock::{EndpointLockMonitor, LockState, LockStatus};
pub(crate) use poll::poll_until;
pub use route::{BoardVariant, LinkRouter, MuxRoute};
