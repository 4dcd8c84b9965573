mod calibration;
mod partition;

pub use test_runner::run;
