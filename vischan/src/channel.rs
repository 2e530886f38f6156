//! The byte-stream face of a session.
//!
//! [`Channel`] is the hook set a generic stream consumer drives: read,
//! write, blocking toggle, named options, close, native-handle query. The
//! implementation for [`Session`] layers non-blocking semantics over the
//! runtime's inherently blocking transfers: an immediate device timeout is
//! installed while non-blocking, and a zero-byte timeout classifies as
//! [`Transfer::WouldBlock`] instead of an error.

use std::convert::TryFrom;

use anyhow::anyhow;

use crate::consts;
use crate::options::{self, GetOption, Handshake, SerialMode, SetOption, StatusLine};
use crate::session::Session;
use crate::visa::status::Status;
use crate::visa::ViAttrState;
use crate::{Error, Result};

/// Transfers are clamped to the largest count the runtime can express.
pub const MAX_TRANSFER: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Bytes actually moved; may be less than requested, including zero.
    Bytes(usize),
    /// Non-blocking mode and the device had nothing to exchange.
    WouldBlock,
}

/// The generic stream hooks a channel consumer calls.
pub trait Channel {
    fn read(&mut self, buf: &mut [u8]) -> Result<Transfer>;
    fn write(&mut self, buf: &[u8]) -> Result<Transfer>;
    fn set_blocking(&mut self, blocking: bool) -> Result<()>;
    fn set_option(&mut self, name: &str, value: &str) -> Result<()>;
    fn get_option(&mut self, name: &str) -> Result<String>;
    fn close(&mut self) -> Result<()>;
    /// The OS-level handle behind the channel, if any. VISA sessions are not
    /// backed by one, so this is always `None` here.
    fn native_handle(&self) -> Option<u64>;
}

impl Channel for Session {
    fn read(&mut self, buf: &mut [u8]) -> Result<Transfer> {
        self.ensure_stream()?;
        let len = buf.len().min(MAX_TRANSFER);
        log::debug!("session {}: read up to {} bytes", self.vi(), len);
        let (status, count) = self.lib().read(self.vi(), &mut buf[..len]);
        self.store_last_error(status);
        if status == Status::Timeout {
            if !self.blocking() && count == 0 {
                return Ok(Transfer::WouldBlock);
            }
            return Ok(Transfer::Bytes(count));
        }
        if status.is_error() {
            return Err(Error::visa(status));
        }
        Ok(Transfer::Bytes(count))
    }

    fn write(&mut self, buf: &[u8]) -> Result<Transfer> {
        self.ensure_stream()?;
        let len = buf.len().min(MAX_TRANSFER);
        log::debug!("session {}: write {} bytes", self.vi(), len);
        let (status, count) = self.lib().write(self.vi(), &buf[..len]);
        self.store_last_error(status);
        if status == Status::Timeout {
            if !self.blocking() && count == 0 {
                return Ok(Transfer::WouldBlock);
            }
            return Ok(Transfer::Bytes(count));
        }
        if status.is_error() {
            return Err(Error::visa(status));
        }
        Ok(Transfer::Bytes(count))
    }

    fn set_blocking(&mut self, blocking: bool) -> Result<()> {
        Session::set_blocking(self, blocking)
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_stream()?;
        let option = options::match_set_option(name).ok_or_else(|| Error::BadOption {
            option: name.to_string(),
            known: options::SET_OPTIONS,
        })?;
        match option {
            SetOption::Mode => {
                let mode = SerialMode::parse(value)?;
                apply_serial_mode(self, &mode)
            }
            SetOption::Timeout => {
                let ms: i64 = value.trim().parse().map_err(|_| {
                    Error::argument(anyhow!("expected integer but got \"{}\"", value))
                })?;
                let ms = u32::try_from(ms)
                    .map_err(|_| Error::argument(anyhow!("timeout out of range: {}", ms)))?;
                self.set_timeout(ms)
            }
            SetOption::Handshake => {
                let flow = Handshake::parse(value)?;
                let result =
                    self.lib()
                        .set_attribute(self.vi(), consts::VI_ATTR_ASRL_FLOW_CNTRL, flow.attr());
                self.record(result)
            }
            SetOption::Xchar => apply_xchars(self, value),
            SetOption::TtyControl => apply_tty_control(self, value),
        }
    }

    fn get_option(&mut self, name: &str) -> Result<String> {
        self.ensure_stream()?;
        let option = options::match_get_option(name).ok_or_else(|| Error::BadOption {
            option: name.to_string(),
            known: options::GET_OPTIONS,
        })?;
        match option {
            GetOption::Mode => read_serial_mode(self).map(|mode| mode.to_string()),
            GetOption::Timeout => self.get_timeout().map(|ms| ms.to_string()),
            GetOption::Handshake => {
                let result = self
                    .lib()
                    .get_attribute(self.vi(), consts::VI_ATTR_ASRL_FLOW_CNTRL);
                let value = self.record(result)?;
                Ok(Handshake::from_attr(value).to_string())
            }
            GetOption::Xchar => read_xchars(self),
            GetOption::TtyStatus => read_tty_status(self),
            GetOption::Queue => {
                let result = self
                    .lib()
                    .get_attribute(self.vi(), consts::VI_ATTR_ASRL_AVAIL_NUM);
                let available = self.record(result)?;
                // the adapter holds no stream buffers of its own, so the
                // write side is always empty
                Ok(format!("{} 0", available))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        Session::close(self)
    }

    fn native_handle(&self) -> Option<u64> {
        None
    }
}

/// Write the four serial-line attributes in order, stopping at the first
/// failure. No rollback: attributes already written stay applied.
fn apply_serial_mode(session: &mut Session, mode: &SerialMode) -> Result<()> {
    let writes: [(u32, ViAttrState); 4] = [
        (consts::VI_ATTR_ASRL_BAUD, mode.baud as ViAttrState),
        (consts::VI_ATTR_ASRL_PARITY, mode.parity.attr()),
        (consts::VI_ATTR_ASRL_DATA_BITS, mode.data_bits.attr()),
        (consts::VI_ATTR_ASRL_STOP_BITS, mode.stop_bits.attr()),
    ];
    for (attr, value) in writes.iter() {
        let result = session.lib().set_attribute(session.vi(), *attr, *value);
        session.record(result)?;
    }
    Ok(())
}

fn read_serial_mode(session: &mut Session) -> Result<SerialMode> {
    let baud = read_mode_attr(session, consts::VI_ATTR_ASRL_BAUD)?;
    let parity = read_mode_attr(session, consts::VI_ATTR_ASRL_PARITY)?;
    let data_bits = read_mode_attr(session, consts::VI_ATTR_ASRL_DATA_BITS)?;
    let stop_bits = read_mode_attr(session, consts::VI_ATTR_ASRL_STOP_BITS)?;

    let parity = options::Parity::from_attr(parity)
        .ok_or_else(|| Error::argument(anyhow!("device reported unknown parity value {}", parity)))?;
    let data_bits = options::DataBits::from_attr(data_bits).ok_or_else(|| {
        Error::argument(anyhow!("device reported unknown data-bits value {}", data_bits))
    })?;
    let stop_bits = options::StopBits::from_attr(stop_bits).ok_or_else(|| {
        Error::argument(anyhow!("device reported unknown stop-bits value {}", stop_bits))
    })?;

    session.store_last_error(Status::Success);
    Ok(SerialMode {
        baud: baud.min(u32::MAX as ViAttrState) as u32,
        parity,
        data_bits,
        stop_bits,
    })
}

/// Attribute read for the mode getter: failures are cached, successes are
/// not (the getter caches one success after all four reads).
fn read_mode_attr(session: &mut Session, attr: u32) -> Result<ViAttrState> {
    match session.lib().get_attribute(session.vi(), attr) {
        Ok((_, value)) => Ok(value),
        Err(status) => {
            session.store_last_error(status);
            Err(Error::visa(status))
        }
    }
}

/// Set the XON and XOFF characters from a two-element list. A failure after
/// the first write leaves the XON character changed; this mirrors the
/// attribute model of the runtime, which has no grouped updates.
fn apply_xchars(session: &mut Session, value: &str) -> Result<()> {
    let elements = options::split_list(value);
    if elements.len() != 2 {
        return Err(Error::argument(anyhow!(
            "bad value for xchar: should be a list of two elements"
        )));
    }
    let xon = elements[0].as_bytes().first().copied().unwrap_or(0);
    let xoff = elements[1].as_bytes().first().copied().unwrap_or(0);
    let result =
        session
            .lib()
            .set_attribute(session.vi(), consts::VI_ATTR_ASRL_XON_CHAR, xon as ViAttrState);
    session.record(result)?;
    let result = session.lib().set_attribute(
        session.vi(),
        consts::VI_ATTR_ASRL_XOFF_CHAR,
        xoff as ViAttrState,
    );
    session.record(result)
}

fn read_xchars(session: &mut Session) -> Result<String> {
    // both characters are read even if the first read fails; the first
    // failing status wins the cache
    let xon = session
        .lib()
        .get_attribute(session.vi(), consts::VI_ATTR_ASRL_XON_CHAR);
    let xoff = session
        .lib()
        .get_attribute(session.vi(), consts::VI_ATTR_ASRL_XOFF_CHAR);
    let first = match &xon {
        Ok((status, _)) => *status,
        Err(status) => *status,
    };
    let second = match &xoff {
        Ok((status, _)) => *status,
        Err(status) => *status,
    };
    let decisive = if first.is_error() { first } else { second };
    session.store_last_error(decisive);
    match (xon, xoff) {
        (Ok((_, xon)), Ok((_, xoff))) => {
            Ok(format!("{} {}", (xon as u8) as char, (xoff as u8) as char))
        }
        _ => Err(Error::visa(decisive)),
    }
}

/// Apply (signal, boolean) pairs in order. Odd-length input fails before any
/// write; an unknown signal or bad boolean fails where it is found, leaving
/// earlier pairs applied; a failed attribute write is cached and aborts.
fn apply_tty_control(session: &mut Session, value: &str) -> Result<()> {
    let elements = options::split_list(value);
    if elements.len() % 2 == 1 {
        return Err(Error::argument(anyhow!(
            "bad value for ttycontrol: should be a list of signal,value pairs"
        )));
    }
    for pair in elements.chunks_exact(2) {
        let asserted = options::parse_bool(pair[1])?;
        let line = options::ControlLine::parse(pair[0])?;
        let state = if asserted {
            consts::VI_STATE_ASSERTED
        } else {
            consts::VI_STATE_UNASSERTED
        };
        let result = session.lib().set_attribute(session.vi(), line.attr(), state);
        session.record(result)?;
    }
    Ok(())
}

/// Report the modem-status lines that can be read, in CTS DSR RING DCD
/// order. Lines whose attribute read fails are omitted; the status of the
/// final read is what lands in the cache.
fn read_tty_status(session: &mut Session) -> Result<String> {
    let mut parts = Vec::new();
    let mut status = Status::Success;
    for line in StatusLine::ALL.iter() {
        match session.lib().get_attribute(session.vi(), line.attr()) {
            Ok((read_status, value)) => {
                status = read_status;
                parts.push(format!("{} {}", line.label(), options::line_state_label(value)));
            }
            Err(read_status) => status = read_status,
        }
    }
    session.store_last_error(status);
    Ok(parts.join(" "))
}
