//! VISA attribute identifiers and value constants, plus the immutable
//! name-to-value table published to embedders.
//!
//! The scripting front-end that historically consumed this surface exposed
//! every `VI_*` constant as an interpreter variable; here the same names are
//! available through a single read-only lookup table built once at first
//! access.

use std::collections::HashMap;

use crate::visa::status;
use crate::visa::{ViAttr, ViAttrState};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const VI_NULL: u32 = 0;

// Session attributes
pub const VI_ATTR_TMO_VALUE: ViAttr = 0x3FFF_001A;
pub const VI_ATTR_TERMCHAR: ViAttr = 0x3FFF_0018;
pub const VI_ATTR_TERMCHAR_EN: ViAttr = 0x3FFF_0038;
pub const VI_ATTR_SEND_END_EN: ViAttr = 0x3FFF_0016;
pub const VI_ATTR_INTF_TYPE: ViAttr = 0x3FFF_0171;
pub const VI_ATTR_INTF_NUM: ViAttr = 0x3FFF_0176;

// Serial-line attributes
pub const VI_ATTR_ASRL_BAUD: ViAttr = 0x3FFF_0021;
pub const VI_ATTR_ASRL_DATA_BITS: ViAttr = 0x3FFF_0022;
pub const VI_ATTR_ASRL_PARITY: ViAttr = 0x3FFF_0023;
pub const VI_ATTR_ASRL_STOP_BITS: ViAttr = 0x3FFF_0024;
pub const VI_ATTR_ASRL_FLOW_CNTRL: ViAttr = 0x3FFF_0025;
pub const VI_ATTR_ASRL_AVAIL_NUM: ViAttr = 0x3FFF_00AC;
pub const VI_ATTR_ASRL_CTS_STATE: ViAttr = 0x3FFF_00AE;
pub const VI_ATTR_ASRL_DCD_STATE: ViAttr = 0x3FFF_00AF;
pub const VI_ATTR_ASRL_DSR_STATE: ViAttr = 0x3FFF_00B1;
pub const VI_ATTR_ASRL_DTR_STATE: ViAttr = 0x3FFF_00B2;
pub const VI_ATTR_ASRL_RI_STATE: ViAttr = 0x3FFF_00BF;
pub const VI_ATTR_ASRL_RTS_STATE: ViAttr = 0x3FFF_00C0;
pub const VI_ATTR_ASRL_XON_CHAR: ViAttr = 0x3FFF_00C1;
pub const VI_ATTR_ASRL_XOFF_CHAR: ViAttr = 0x3FFF_00C2;
pub const VI_ATTR_ASRL_BREAK_STATE: ViAttr = 0x3FFF_01BC;

// Serial parity values
pub const VI_ASRL_PAR_NONE: ViAttrState = 0;
pub const VI_ASRL_PAR_ODD: ViAttrState = 1;
pub const VI_ASRL_PAR_EVEN: ViAttrState = 2;
pub const VI_ASRL_PAR_MARK: ViAttrState = 3;
pub const VI_ASRL_PAR_SPACE: ViAttrState = 4;

// Serial stop-bit values
pub const VI_ASRL_STOP_ONE: ViAttrState = 10;
pub const VI_ASRL_STOP_ONE5: ViAttrState = 15;
pub const VI_ASRL_STOP_TWO: ViAttrState = 20;

// Serial flow control values
pub const VI_ASRL_FLOW_NONE: ViAttrState = 0;
pub const VI_ASRL_FLOW_XON_XOFF: ViAttrState = 1;
pub const VI_ASRL_FLOW_RTS_CTS: ViAttrState = 2;
pub const VI_ASRL_FLOW_DTR_DSR: ViAttrState = 4;

// Modem-line states
pub const VI_STATE_ASSERTED: ViAttrState = 1;
pub const VI_STATE_UNASSERTED: ViAttrState = 0;
pub const VI_STATE_UNKNOWN: i32 = -1;

// Timeouts
pub const VI_TMO_IMMEDIATE: u32 = 0;
pub const VI_TMO_INFINITE: u32 = 0xFFFF_FFFF;

// Lock kinds
pub const VI_NO_LOCK: u32 = 0;
pub const VI_EXCLUSIVE_LOCK: u32 = 1;
pub const VI_SHARED_LOCK: u32 = 2;
pub const VI_LOAD_CONFIG: u32 = 4;

// Buffer masks for flush
pub const VI_READ_BUF: u16 = 1;
pub const VI_WRITE_BUF: u16 = 2;
pub const VI_READ_BUF_DISCARD: u16 = 4;
pub const VI_WRITE_BUF_DISCARD: u16 = 8;
pub const VI_IO_IN_BUF: u16 = 16;
pub const VI_IO_OUT_BUF: u16 = 32;
pub const VI_IO_IN_BUF_DISCARD: u16 = 64;
pub const VI_IO_OUT_BUF_DISCARD: u16 = 128;

// GPIB bus control
pub const VI_GPIB_ATN_DEASSERT: u16 = 0;
pub const VI_GPIB_ATN_ASSERT: u16 = 1;
pub const VI_GPIB_ATN_DEASSERT_HANDSHAKE: u16 = 2;
pub const VI_GPIB_ATN_ASSERT_IMMEDIATE: u16 = 3;
pub const VI_GPIB_REN_DEASSERT: u16 = 0;
pub const VI_GPIB_REN_ASSERT: u16 = 1;
pub const VI_GPIB_REN_DEASSERT_GTL: u16 = 2;
pub const VI_GPIB_REN_ASSERT_ADDRESS: u16 = 3;
pub const VI_GPIB_REN_ASSERT_LLO: u16 = 4;
pub const VI_GPIB_REN_ASSERT_ADDRESS_LLO: u16 = 5;
pub const VI_GPIB_REN_ADDRESS_GTL: u16 = 6;
pub const VI_NO_SEC_ADDR: u16 = 0xFFFF;

// Trigger protocols
pub const VI_TRIG_PROT_DEFAULT: u16 = 0;
pub const VI_TRIG_PROT_ON: u16 = 1;
pub const VI_TRIG_PROT_OFF: u16 = 2;
pub const VI_TRIG_PROT_SYNC: u16 = 5;

// Utility bus signals
pub const VI_UTIL_ASSERT_SYSRESET: u16 = 1;
pub const VI_UTIL_ASSERT_SYSFAIL: u16 = 2;
pub const VI_UTIL_DEASSERT_SYSFAIL: u16 = 3;

// Interrupt signal modes
pub const VI_ASSERT_SIGNAL: i16 = -1;
pub const VI_ASSERT_USE_ASSIGNED: i16 = 0;
pub const VI_ASSERT_IRQ1: i16 = 1;
pub const VI_ASSERT_IRQ2: i16 = 2;
pub const VI_ASSERT_IRQ3: i16 = 3;
pub const VI_ASSERT_IRQ4: i16 = 4;
pub const VI_ASSERT_IRQ5: i16 = 5;
pub const VI_ASSERT_IRQ6: i16 = 6;
pub const VI_ASSERT_IRQ7: i16 = 7;

// Interface types reported by parse-rsrc
pub const VI_INTF_GPIB: u16 = 1;
pub const VI_INTF_VXI: u16 = 2;
pub const VI_INTF_GPIB_VXI: u16 = 3;
pub const VI_INTF_ASRL: u16 = 4;
pub const VI_INTF_PXI: u16 = 5;
pub const VI_INTF_TCPIP: u16 = 6;
pub const VI_INTF_USB: u16 = 7;

pub const VI_FIND_BUFLEN: usize = 256;

macro_rules! named {
    ($($name:ident),* $(,)?) => {
        &[$((stringify!($name), $name as i64),)*]
    };
}

const BASE_CONSTANTS: &[(&str, i64)] = named![
    VI_NULL,
    VI_ATTR_TMO_VALUE,
    VI_ATTR_TERMCHAR,
    VI_ATTR_TERMCHAR_EN,
    VI_ATTR_SEND_END_EN,
    VI_ATTR_INTF_TYPE,
    VI_ATTR_INTF_NUM,
    VI_ATTR_ASRL_BAUD,
    VI_ATTR_ASRL_DATA_BITS,
    VI_ATTR_ASRL_PARITY,
    VI_ATTR_ASRL_STOP_BITS,
    VI_ATTR_ASRL_FLOW_CNTRL,
    VI_ATTR_ASRL_AVAIL_NUM,
    VI_ATTR_ASRL_CTS_STATE,
    VI_ATTR_ASRL_DCD_STATE,
    VI_ATTR_ASRL_DSR_STATE,
    VI_ATTR_ASRL_DTR_STATE,
    VI_ATTR_ASRL_RI_STATE,
    VI_ATTR_ASRL_RTS_STATE,
    VI_ATTR_ASRL_XON_CHAR,
    VI_ATTR_ASRL_XOFF_CHAR,
    VI_ATTR_ASRL_BREAK_STATE,
    VI_ASRL_PAR_NONE,
    VI_ASRL_PAR_ODD,
    VI_ASRL_PAR_EVEN,
    VI_ASRL_PAR_MARK,
    VI_ASRL_PAR_SPACE,
    VI_ASRL_STOP_ONE,
    VI_ASRL_STOP_ONE5,
    VI_ASRL_STOP_TWO,
    VI_ASRL_FLOW_NONE,
    VI_ASRL_FLOW_XON_XOFF,
    VI_ASRL_FLOW_RTS_CTS,
    VI_ASRL_FLOW_DTR_DSR,
    VI_STATE_ASSERTED,
    VI_STATE_UNASSERTED,
    VI_STATE_UNKNOWN,
    VI_TMO_IMMEDIATE,
    VI_TMO_INFINITE,
    VI_NO_LOCK,
    VI_EXCLUSIVE_LOCK,
    VI_SHARED_LOCK,
    VI_LOAD_CONFIG,
    VI_READ_BUF,
    VI_WRITE_BUF,
    VI_READ_BUF_DISCARD,
    VI_WRITE_BUF_DISCARD,
    VI_IO_IN_BUF,
    VI_IO_OUT_BUF,
    VI_IO_IN_BUF_DISCARD,
    VI_IO_OUT_BUF_DISCARD,
    VI_GPIB_ATN_DEASSERT,
    VI_GPIB_ATN_ASSERT,
    VI_GPIB_ATN_DEASSERT_HANDSHAKE,
    VI_GPIB_ATN_ASSERT_IMMEDIATE,
    VI_GPIB_REN_DEASSERT,
    VI_GPIB_REN_ASSERT,
    VI_GPIB_REN_DEASSERT_GTL,
    VI_GPIB_REN_ASSERT_ADDRESS,
    VI_GPIB_REN_ASSERT_LLO,
    VI_GPIB_REN_ASSERT_ADDRESS_LLO,
    VI_GPIB_REN_ADDRESS_GTL,
    VI_NO_SEC_ADDR,
    VI_TRIG_PROT_DEFAULT,
    VI_TRIG_PROT_ON,
    VI_TRIG_PROT_OFF,
    VI_TRIG_PROT_SYNC,
    VI_UTIL_ASSERT_SYSRESET,
    VI_UTIL_ASSERT_SYSFAIL,
    VI_UTIL_DEASSERT_SYSFAIL,
    VI_ASSERT_SIGNAL,
    VI_ASSERT_USE_ASSIGNED,
    VI_ASSERT_IRQ1,
    VI_ASSERT_IRQ2,
    VI_ASSERT_IRQ3,
    VI_ASSERT_IRQ4,
    VI_ASSERT_IRQ5,
    VI_ASSERT_IRQ6,
    VI_ASSERT_IRQ7,
    VI_INTF_GPIB,
    VI_INTF_VXI,
    VI_INTF_GPIB_VXI,
    VI_INTF_ASRL,
    VI_INTF_PXI,
    VI_INTF_TCPIP,
    VI_INTF_USB,
    VI_FIND_BUFLEN,
];

lazy_static! {
    static ref CONSTANTS: HashMap<&'static str, i64> = {
        let mut table = HashMap::new();
        for (name, value) in BASE_CONSTANTS {
            table.insert(*name, *value);
        }
        for (name, code) in status::KNOWN {
            table.insert(*name, *code as i64);
        }
        table
    };
}

/// The complete name-to-value table of recognized `VI_*` constants,
/// status codes included. Built once, immutable afterwards.
pub fn constants() -> &'static HashMap<&'static str, i64> {
    &CONSTANTS
}

/// Look up a single constant by its symbolic name.
pub fn constant(name: &str) -> Option<i64> {
    CONSTANTS.get(name).copied()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn table_contains_attributes_and_statuses() {
        assert_eq!(constant("VI_ATTR_TMO_VALUE"), Some(0x3FFF_001A));
        assert_eq!(constant("VI_ASRL_FLOW_RTS_CTS"), Some(2));
        assert_eq!(constant("VI_ERROR_TMO"), Some(-1073807339));
        assert_eq!(constant("VI_SUCCESS"), Some(0));
        assert_eq!(constant("VI_NO_SUCH_CONSTANT"), None);
    }

    #[test]
    fn table_has_no_conflicting_duplicates() {
        // building the map twice must give the same size as the source lists
        let unique = constants().len();
        assert_eq!(unique, BASE_CONSTANTS.len() + status::KNOWN.len());
    }
}
