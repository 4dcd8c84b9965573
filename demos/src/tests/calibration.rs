use pdts::prelude::*;

const ENDPOINTS: [u16; 3] = [0x10, 0x11, 0x20];

fn route_of(addr: u16) -> MuxRoute {
    MuxRoute::new(if addr >= 0x20 { 3 } else { 0 })
}

pub fn measure<R: RegisterInterface>(session: &mut MasterSession<R>) -> anyhow::Result<()> {
    ENDPOINTS.into_iter().try_for_each(|addr| {
        let endpoint = EndpointAddress::new(addr);
        let result = session.measure_endpoint_rtt(endpoint, true, Some(route_of(addr)))?;
        println!("{endpoint}: {} ticks", result.round_trip_ticks());
        anyhow::Ok(())
    })
}

pub fn calibrate<R: RegisterInterface>(session: &mut MasterSession<R>) -> anyhow::Result<()> {
    let rtts = ENDPOINTS
        .into_iter()
        .map(|addr| {
            let result =
                session.measure_endpoint_rtt(EndpointAddress::new(addr), true, Some(route_of(addr)))?;
            anyhow::Ok((addr, result.round_trip_ticks()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let target = rtts.iter().map(|&(_, rtt)| rtt).max().unwrap_or_default();

    rtts.into_iter().try_for_each(|(addr, rtt)| {
        let pad = target - rtt;
        let coarse = (pad / 16).min(DelayTriplet::COARSE_MAX as u64) as u8;
        let fine = (pad - coarse as u64 * 16).min(DelayTriplet::FINE_MAX as u64) as u8;
        let report = session.apply_endpoint_delay(
            EndpointAddress::new(addr),
            DelayTriplet::new(coarse, fine, 0)?,
            true,
            true,
            Some(route_of(addr)),
        )?;
        println!(
            "endpoint {addr:#x}: coarse = {coarse}, fine = {fine}, {:?} -> {:?}",
            report.pre.map(|r| r.round_trip_ticks()),
            report.post.map(|r| r.round_trip_ticks())
        );
        anyhow::Ok(())
    })
}
