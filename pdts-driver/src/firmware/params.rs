pub const VERSION: &str = "master.global.version";

pub const TSTAMP_L: &str = "master.tstamp.ctr.val_l";
pub const TSTAMP_H: &str = "master.tstamp.ctr.val_h";

pub const RX_EN: &str = "master.rx.csr.ctrl.en";
pub const RX_RDY: &str = "master.rx.csr.stat.rdy";
pub const RX_STATE: &str = "master.rx.csr.stat.state";
pub const RX_STATE_LOCKED: u8 = 0x8;
pub const RX_STATE_ERROR: u8 = 0xC;

pub const ECHO_GO: &str = "master.echo.csr.ctrl.go";
pub const ECHO_DONE: &str = "master.echo.csr.stat.rx_done";
pub const ECHO_DELTA: &str = "master.echo.csr.stat.delta";
pub const ECHO_TX_L: &str = "master.echo.csr.tx_l";
pub const ECHO_TX_H: &str = "master.echo.csr.tx_h";
pub const ECHO_RX_L: &str = "master.echo.csr.rx_l";
pub const ECHO_RX_H: &str = "master.echo.csr.rx_h";

pub const SFP_ADDR: &str = "master.acmd.sfp.addr";
pub const SFP_ALL: &str = "master.acmd.sfp.all";
pub const SFP_TX_EN: &str = "master.acmd.sfp.tx_en";
pub const SFP_GO: &str = "master.acmd.sfp.go";

pub const DELAY_ADDR: &str = "master.acmd.delay.addr";
pub const DELAY_COARSE: &str = "master.acmd.delay.coarse";
pub const DELAY_FINE: &str = "master.acmd.delay.fine";
pub const DELAY_PHASE: &str = "master.acmd.delay.phase";
pub const DELAY_UPDATE: &str = "master.acmd.delay.update";
pub const DELAY_GO: &str = "master.acmd.delay.go";

pub const MUX: &str = "io.csr.ctrl.mux";
pub const SUB_MUX: &str = "io.csr.ctrl.sub_mux";

pub const NUM_COMMAND_CHANNELS: u8 = 4;

pub fn command_ctrl(channel: u8, field: &str) -> String {
    format!("master.scmd_gen.chan_ctrl{channel}.{field}")
}

pub fn partition_ctrl(id: u8, field: &str) -> String {
    format!("master.partition{id}.csr.ctrl.{field}")
}

pub fn partition_stat(id: u8, field: &str) -> String {
    format!("master.partition{id}.csr.stat.{field}")
}
