pub use pdts_driver::firmware::params::{
    DELAY_ADDR, DELAY_COARSE, DELAY_FINE, DELAY_GO, DELAY_PHASE, DELAY_UPDATE, ECHO_DELTA,
    ECHO_DONE, ECHO_GO, ECHO_RX_H, ECHO_RX_L, ECHO_TX_H, ECHO_TX_L, MUX, RX_EN, RX_RDY, RX_STATE,
    SFP_ADDR, SFP_ALL, SFP_GO, SFP_TX_EN, SUB_MUX, TSTAMP_H, TSTAMP_L, VERSION,
};
use pdts_driver::firmware::params;

pub const COMMAND_PREFIX: &str = "master.scmd_gen.chan_ctrl";
pub const PARTITION_PREFIX: &str = "master.partition";

pub const NUM_GENERATORS: usize = params::NUM_COMMAND_CHANNELS as usize;

pub const RX_STATE_IDLE: u32 = 0x0;
pub const RX_STATE_SEARCH: u32 = 0x1;
pub const RX_STATE_ALIGN: u32 = 0x6;
pub const RX_STATE_LOCKED: u32 = params::RX_STATE_LOCKED as u32;
pub const RX_STATE_COLLISION: u32 = params::RX_STATE_ERROR as u32;

pub const COARSE_DELAY_TICKS: u64 = 16;
pub const TSTAMP_STEP: u64 = 62_500;
pub const BUFFER_CAPACITY: u32 = 4096;
