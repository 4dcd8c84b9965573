use std::{collections::BTreeSet, time::Duration};

use pdts::{interface::EndpointEmulator, prelude::*};

fn open(board: BoardVariant, endpoints: Vec<EndpointEmulator>) -> anyhow::Result<MasterSession<Audit>> {
    Ok(MasterSession::open_with(
        Audit::new(AuditOption {
            endpoints,
            ..Default::default()
        }),
        Auto::default(),
        StdSleeper,
        SessionOption {
            poll_interval: Duration::from_millis(1),
            route_lock_timeout: Duration::from_millis(10),
            board,
            ..Default::default()
        },
    )?)
}

#[test]
fn scan_is_idempotent() -> anyhow::Result<()> {
    let mut session = open(
        BoardVariant::FANOUT,
        vec![
            EndpointEmulator::new(1, 0),
            EndpointEmulator::new(2, 3),
            EndpointEmulator::new(3, 5),
        ],
    )?;

    let first = session.scan_all_routes();
    let second = session.scan_all_routes();
    assert_eq!(BTreeSet::from([0, 3, 5]), first);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn scan_skips_broken_master() -> anyhow::Result<()> {
    let mut session = open(BoardVariant::FANOUT, vec![EndpointEmulator::new(1, 0)])?;
    session.interface_mut().break_down();
    assert!(session.scan_all_routes().is_empty());
    session.interface_mut().repair();
    assert_eq!(BTreeSet::from([0]), session.scan_all_routes());
    Ok(())
}

#[test]
fn switch_route_sub_channel() -> anyhow::Result<()> {
    let mut session = open(
        BoardVariant::CASCADE,
        vec![EndpointEmulator::new(1, 2).with_sub_channel(6)],
    )?;

    assert!(!session.switch_route(MuxRoute::new(2).with_sub_channel(5), true)?);
    assert!(session.switch_route(MuxRoute::new(2).with_sub_channel(6), true)?);
    assert!(session.switch_route(MuxRoute::new(7), false)?);
    assert_eq!(
        Err(TimingError::InvalidSubChannel {
            sub_channel: 8,
            num_sub_channels: 8
        }),
        session.switch_route(MuxRoute::new(2).with_sub_channel(8), true)
    );
    Ok(())
}

#[test]
fn route_without_sub_channel_ignores_history() -> anyhow::Result<()> {
    let mut session = open(
        BoardVariant::CASCADE,
        vec![EndpointEmulator::new(1, 2).with_sub_channel(6)],
    )?;

    let fresh = session.scan_all_routes();
    assert_eq!(BTreeSet::from([2]), fresh);
    assert!(!session.switch_route(MuxRoute::new(2), true)?);
    assert_eq!((2, 0), session.interface().mux());

    assert!(session.switch_route(MuxRoute::new(2).with_sub_channel(6), false)?);
    assert_eq!(fresh, session.scan_all_routes());
    assert!(!session.switch_route(MuxRoute::new(2), true)?);
    assert_eq!((2, 0), session.interface().mux());
    Ok(())
}
