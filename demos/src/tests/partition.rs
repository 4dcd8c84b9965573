use std::time::Duration;

use pdts::prelude::*;

pub fn partition_run<R: RegisterInterface>(session: &mut MasterSession<R>) -> anyhow::Result<()> {
    let timeout = session.option().default_timeout;
    let mut part = session.partition(0)?;

    part.reset()?;
    part.configure(0xFF, true, false)?;
    part.enable(true)?;
    part.start(timeout)?;
    part.enable_triggers(true)?;
    println!("partition {}: {:?}", part.id(), part.status()?);

    std::thread::sleep(Duration::from_millis(100));

    part.enable_triggers(false)?;
    part.stop(timeout)?;
    println!("partition {}: {:?}", part.id(), part.status()?);
    part.enable(false)?;

    Ok(())
}
