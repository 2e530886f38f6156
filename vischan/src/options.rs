//! Conversions between the human-readable channel options and VISA
//! attribute values, plus option-name matching.
//!
//! Option names may be abbreviated to any unambiguous prefix; the per-option
//! minimum-prefix floors below reproduce the historical command surface
//! exactly, quirks included (e.g. `h` selects `handshake` when setting but
//! not when getting).

use std::fmt;
use std::fmt::{Display, Formatter};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::consts;
use crate::visa::{ViAttr, ViAttrState};
use crate::{Error, Result};

pub const SET_OPTIONS: &str = "handshake mode timeout ttycontrol xchar";
pub const GET_OPTIONS: &str = "handshake mode queue timeout ttystatus xchar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOption {
    Mode,
    Timeout,
    Handshake,
    Xchar,
    TtyControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetOption {
    Mode,
    Timeout,
    Handshake,
    Xchar,
    TtyStatus,
    Queue,
}

// (option, canonical name, minimum prefix length)
const SET_TABLE: &[(SetOption, &str, usize)] = &[
    (SetOption::Mode, "mode", 2),
    (SetOption::Timeout, "timeout", 2),
    (SetOption::Handshake, "handshake", 1),
    (SetOption::Xchar, "xchar", 1),
    (SetOption::TtyControl, "ttycontrol", 4),
];

const GET_TABLE: &[(GetOption, &str, usize)] = &[
    (GetOption::Mode, "mode", 2),
    (GetOption::Timeout, "timeout", 2),
    (GetOption::Handshake, "handshake", 2),
    (GetOption::Xchar, "xchar", 1),
    (GetOption::TtyStatus, "ttystatus", 4),
    (GetOption::Queue, "queue", 1),
];

pub fn match_set_option(name: &str) -> Option<SetOption> {
    SET_TABLE
        .iter()
        .find(|(_, canonical, floor)| name.len() >= *floor && canonical.starts_with(name))
        .map(|(option, _, _)| *option)
}

pub fn match_get_option(name: &str) -> Option<GetOption> {
    GET_TABLE
        .iter()
        .find(|(_, canonical, floor)| name.len() >= *floor && canonical.starts_with(name))
        .map(|(option, _, _)| *option)
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Parity {
    fn from_mode_char(c: char) -> Option<Parity> {
        match c {
            'n' => Some(Parity::None),
            'o' => Some(Parity::Odd),
            'e' => Some(Parity::Even),
            'm' => Some(Parity::Mark),
            's' => Some(Parity::Space),
            _ => None,
        }
    }

    fn mode_char(&self) -> char {
        match self {
            Parity::None => 'n',
            Parity::Odd => 'o',
            Parity::Even => 'e',
            Parity::Mark => 'm',
            Parity::Space => 's',
        }
    }

    pub fn attr(&self) -> ViAttrState {
        match self {
            Parity::None => consts::VI_ASRL_PAR_NONE,
            Parity::Odd => consts::VI_ASRL_PAR_ODD,
            Parity::Even => consts::VI_ASRL_PAR_EVEN,
            Parity::Mark => consts::VI_ASRL_PAR_MARK,
            Parity::Space => consts::VI_ASRL_PAR_SPACE,
        }
    }

    pub fn from_attr(value: ViAttrState) -> Option<Parity> {
        match value {
            consts::VI_ASRL_PAR_NONE => Some(Parity::None),
            consts::VI_ASRL_PAR_ODD => Some(Parity::Odd),
            consts::VI_ASRL_PAR_EVEN => Some(Parity::Even),
            consts::VI_ASRL_PAR_MARK => Some(Parity::Mark),
            consts::VI_ASRL_PAR_SPACE => Some(Parity::Space),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    pub fn count(&self) -> u32 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }

    pub fn from_count(count: u32) -> Option<DataBits> {
        match count {
            5 => Some(DataBits::Five),
            6 => Some(DataBits::Six),
            7 => Some(DataBits::Seven),
            8 => Some(DataBits::Eight),
            _ => None,
        }
    }

    pub fn attr(&self) -> ViAttrState {
        self.count() as ViAttrState
    }

    pub fn from_attr(value: ViAttrState) -> Option<DataBits> {
        if value <= u32::MAX as ViAttrState {
            DataBits::from_count(value as u32)
        } else {
            None
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    pub fn count(&self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }

    pub fn from_count(count: u32) -> Option<StopBits> {
        match count {
            1 => Some(StopBits::One),
            2 => Some(StopBits::Two),
            _ => None,
        }
    }

    pub fn attr(&self) -> ViAttrState {
        match self {
            StopBits::One => consts::VI_ASRL_STOP_ONE,
            StopBits::Two => consts::VI_ASRL_STOP_TWO,
        }
    }

    pub fn from_attr(value: ViAttrState) -> Option<StopBits> {
        match value {
            consts::VI_ASRL_STOP_ONE => Some(StopBits::One),
            consts::VI_ASRL_STOP_TWO => Some(StopBits::Two),
            _ => None,
        }
    }
}

/// Serial line parameters in the `baud,parity,data,stop` notation.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Hash)]
pub struct SerialMode {
    pub baud: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
}

impl SerialMode {
    pub fn parse(mode: &str) -> Result<SerialMode> {
        const BAD: &str = "bad value for mode";
        let parts: Vec<&str> = mode.split(',').collect();
        if parts.len() != 4 {
            return Err(Error::argument(anyhow!(
                "{}: should be baud,parity,data,stop",
                BAD
            )));
        }
        let baud: u32 = parts[0]
            .parse()
            .map_err(|_| Error::argument(anyhow!("{}: should be baud,parity,data,stop", BAD)))?;

        let mut parity_chars = parts[1].chars();
        let parity = parity_chars
            .next()
            .filter(|_| parity_chars.next().is_none())
            .and_then(Parity::from_mode_char)
            .ok_or_else(|| {
                Error::argument(anyhow!("{} parity: should be n, o, e, m, or s", BAD))
            })?;

        let data_bits = parts[2]
            .parse()
            .ok()
            .and_then(DataBits::from_count)
            .ok_or_else(|| Error::argument(anyhow!("{} data: should be 5, 6, 7, or 8", BAD)))?;

        let stop_bits = parts[3]
            .parse()
            .ok()
            .and_then(StopBits::from_count)
            .ok_or_else(|| Error::argument(anyhow!("{} stop: should be 1 or 2", BAD)))?;

        Ok(SerialMode {
            baud,
            parity,
            data_bits,
            stop_bits,
        })
    }
}

impl Display for SerialMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.baud,
            self.parity.mode_char(),
            self.data_bits.count(),
            self.stop_bits.count()
        )
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize, Hash)]
pub enum Handshake {
    None,
    XonXoff,
    RtsCts,
    DtrDsr,
}

impl Handshake {
    pub fn parse(value: &str) -> Result<Handshake> {
        if value.eq_ignore_ascii_case("none") {
            Ok(Handshake::None)
        } else if value.eq_ignore_ascii_case("xonxoff") {
            Ok(Handshake::XonXoff)
        } else if value.eq_ignore_ascii_case("rtscts") {
            Ok(Handshake::RtsCts)
        } else if value.eq_ignore_ascii_case("dtrdsr") {
            Ok(Handshake::DtrDsr)
        } else {
            Err(Error::argument(anyhow!(
                "bad value for handshake: must be one of xonxoff, rtscts, dtrdsr or none"
            )))
        }
    }

    pub fn attr(&self) -> ViAttrState {
        match self {
            Handshake::None => consts::VI_ASRL_FLOW_NONE,
            Handshake::XonXoff => consts::VI_ASRL_FLOW_XON_XOFF,
            Handshake::RtsCts => consts::VI_ASRL_FLOW_RTS_CTS,
            Handshake::DtrDsr => consts::VI_ASRL_FLOW_DTR_DSR,
        }
    }

    /// Flow values not produced by this adapter (e.g. combined flags) report
    /// as `none`, like the historical surface did.
    pub fn from_attr(value: ViAttrState) -> Handshake {
        match value {
            consts::VI_ASRL_FLOW_XON_XOFF => Handshake::XonXoff,
            consts::VI_ASRL_FLOW_RTS_CTS => Handshake::RtsCts,
            consts::VI_ASRL_FLOW_DTR_DSR => Handshake::DtrDsr,
            _ => Handshake::None,
        }
    }
}

impl Display for Handshake {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Handshake::None => "none",
            Handshake::XonXoff => "xonxoff",
            Handshake::RtsCts => "rtscts",
            Handshake::DtrDsr => "dtrdsr",
        };
        f.write_str(name)
    }
}

/// Writable modem-control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlLine {
    Dtr,
    Rts,
    Break,
}

impl ControlLine {
    pub fn parse(name: &str) -> Result<ControlLine> {
        if name.eq_ignore_ascii_case("DTR") {
            Ok(ControlLine::Dtr)
        } else if name.eq_ignore_ascii_case("RTS") {
            Ok(ControlLine::Rts)
        } else if name.eq_ignore_ascii_case("BREAK") {
            Ok(ControlLine::Break)
        } else {
            Err(Error::argument(anyhow!(
                "bad signal \"{}\" for ttycontrol: must be DTR, RTS or BREAK",
                name
            )))
        }
    }

    pub fn attr(&self) -> ViAttr {
        match self {
            ControlLine::Dtr => consts::VI_ATTR_ASRL_DTR_STATE,
            ControlLine::Rts => consts::VI_ATTR_ASRL_RTS_STATE,
            ControlLine::Break => consts::VI_ATTR_ASRL_BREAK_STATE,
        }
    }
}

/// Readable modem-status lines, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    Cts,
    Dsr,
    Ring,
    Dcd,
}

impl StatusLine {
    pub const ALL: [StatusLine; 4] = [
        StatusLine::Cts,
        StatusLine::Dsr,
        StatusLine::Ring,
        StatusLine::Dcd,
    ];

    pub fn attr(&self) -> ViAttr {
        match self {
            StatusLine::Cts => consts::VI_ATTR_ASRL_CTS_STATE,
            StatusLine::Dsr => consts::VI_ATTR_ASRL_DSR_STATE,
            StatusLine::Ring => consts::VI_ATTR_ASRL_RI_STATE,
            StatusLine::Dcd => consts::VI_ATTR_ASRL_DCD_STATE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusLine::Cts => "CTS",
            StatusLine::Dsr => "DSR",
            StatusLine::Ring => "RING",
            StatusLine::Dcd => "DCD",
        }
    }
}

/// `1` asserted, `0` unasserted, `x` indeterminate or unsupported.
pub fn line_state_label(value: ViAttrState) -> &'static str {
    match value {
        consts::VI_STATE_ASSERTED => "1",
        consts::VI_STATE_UNASSERTED => "0",
        _ => "x",
    }
}

/// Split a list-valued option payload into its whitespace-separated elements.
pub fn split_list(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}

pub fn parse_bool(value: &str) -> Result<bool> {
    let lower = value.to_ascii_lowercase();
    match lower.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::argument(anyhow!(
            "expected boolean value but got \"{}\"",
            value
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mode_roundtrip() {
        let mode = SerialMode::parse("9600,n,8,1").unwrap();
        assert_eq!(
            mode,
            SerialMode {
                baud: 9600,
                parity: Parity::None,
                data_bits: DataBits::Eight,
                stop_bits: StopBits::One,
            }
        );
        assert_eq!(mode.to_string(), "9600,n,8,1");

        let mode = SerialMode::parse("115200,e,7,2").unwrap();
        assert_eq!(mode.to_string(), "115200,e,7,2");
    }

    #[test]
    fn mode_rejects_malformed_input() {
        assert!(SerialMode::parse("9600,n,8").is_err());
        assert!(SerialMode::parse("9600,n,8,1,x").is_err());
        assert!(SerialMode::parse("fast,n,8,1").is_err());
        assert!(SerialMode::parse("9600,q,8,1").is_err());
        assert!(SerialMode::parse("9600,no,8,1").is_err());
        assert!(SerialMode::parse("9600,n,9,1").is_err());
        assert!(SerialMode::parse("9600,n,8,3").is_err());
    }

    #[test]
    fn handshake_names_are_case_insensitive() {
        assert_eq!(Handshake::parse("RTSCTS").unwrap(), Handshake::RtsCts);
        assert_eq!(Handshake::parse("XonXoff").unwrap(), Handshake::XonXoff);
        assert_eq!(Handshake::parse("none").unwrap(), Handshake::None);
        assert!(Handshake::parse("hardware").is_err());
    }

    #[test]
    fn handshake_attr_roundtrip() {
        for h in [
            Handshake::None,
            Handshake::XonXoff,
            Handshake::RtsCts,
            Handshake::DtrDsr,
        ]
        .iter()
        {
            assert_eq!(Handshake::from_attr(h.attr()), *h);
        }
        assert_eq!(Handshake::from_attr(99), Handshake::None);
    }

    #[test]
    fn option_prefixes_respect_floors() {
        assert_eq!(match_set_option("mode"), Some(SetOption::Mode));
        assert_eq!(match_set_option("mo"), Some(SetOption::Mode));
        assert_eq!(match_set_option("m"), None);
        assert_eq!(match_set_option("ti"), Some(SetOption::Timeout));
        assert_eq!(match_set_option("t"), None);
        assert_eq!(match_set_option("h"), Some(SetOption::Handshake));
        assert_eq!(match_set_option("x"), Some(SetOption::Xchar));
        assert_eq!(match_set_option("ttyc"), Some(SetOption::TtyControl));
        assert_eq!(match_set_option("tty"), None);
        assert_eq!(match_set_option("ttystatus"), None);
        assert_eq!(match_set_option(""), None);
        assert_eq!(match_set_option("modem"), None);

        assert_eq!(match_get_option("mo"), Some(GetOption::Mode));
        // getting requires two characters of "handshake", unlike setting
        assert_eq!(match_get_option("h"), None);
        assert_eq!(match_get_option("ha"), Some(GetOption::Handshake));
        assert_eq!(match_get_option("q"), Some(GetOption::Queue));
        assert_eq!(match_get_option("ttys"), Some(GetOption::TtyStatus));
        assert_eq!(match_get_option("ttycontrol"), None);
    }

    #[test]
    fn bool_values() {
        assert!(parse_bool("1").unwrap());
        assert!(parse_bool("TRUE").unwrap());
        assert!(parse_bool("on").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(!parse_bool("No").unwrap());
        assert!(parse_bool("2").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn line_states() {
        assert_eq!(line_state_label(consts::VI_STATE_ASSERTED), "1");
        assert_eq!(line_state_label(consts::VI_STATE_UNASSERTED), "0");
        assert_eq!(line_state_label(1234), "x");
    }
}
