mod tests;

use std::time::Duration;

use anyhow::Result;

use pdts::{interface::EndpointEmulator, prelude::*};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let session = MasterSession::open_with(
        Audit::new(AuditOption {
            endpoints: vec![
                EndpointEmulator::new(0x10, 0).with_base_rtt(180),
                EndpointEmulator::new(0x11, 0).with_base_rtt(420),
                EndpointEmulator::new(0x20, 3).with_base_rtt(960),
            ],
            ..Default::default()
        }),
        Auto::default(),
        StdSleeper,
        SessionOption {
            poll_interval: Duration::from_millis(5),
            default_timeout: Duration::from_millis(500),
            route_lock_timeout: Duration::from_millis(100),
            ..Default::default()
        },
    )?;

    tests::run(session)
}
