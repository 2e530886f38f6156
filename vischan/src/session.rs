//! Per-session state and lifecycle on top of one VISA connection.
//!
//! A [`Session`] owns exactly one runtime handle. Every status-producing
//! operation records the raw status it observed (success codes included) in
//! the session's last-error cache; a human-readable message is kept if and
//! only if the status denotes a failure. Capability and argument failures
//! never touch the cache.

use std::convert::TryFrom;
use std::sync::Arc;

use anyhow::anyhow;

use crate::consts;
use crate::visa::status::Status;
use crate::visa::{ViAttr, ViAttrState, ViResult, ViSession, VisaLibrary};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// A connection to one instrument, usable as a byte stream.
    Instrument,
    /// A resource-manager session: a factory/registry handle used to open
    /// and discover other sessions, never a data stream.
    ResourceManager,
}

pub struct Session {
    lib: Arc<dyn VisaLibrary>,
    vi: ViSession,
    kind: SessionKind,
    blocking: bool,
    /// Device timeout to restore when returning to blocking mode. Only
    /// meaningful while `blocking` is false.
    saved_timeout: u32,
    last_error: Status,
    last_error_msg: Option<String>,
    closed: bool,
}

impl Session {
    fn new(lib: Arc<dyn VisaLibrary>, vi: ViSession, kind: SessionKind) -> Session {
        Session {
            lib,
            vi,
            kind,
            blocking: true,
            saved_timeout: 0,
            last_error: Status::Success,
            last_error_msg: None,
            closed: false,
        }
    }

    /// Open a session to the default resource manager.
    pub fn open_default_rm(lib: Arc<dyn VisaLibrary>) -> Result<Session> {
        match lib.open_default_rm() {
            Ok((_, vi)) => {
                log::debug!("opened resource manager session {}", vi);
                Ok(Session::new(lib, vi, SessionKind::ResourceManager))
            }
            Err(status) => Err(Error::visa(status)),
        }
    }

    /// Open an instrument session through this (parent) session.
    pub fn open(
        &mut self,
        resource: &str,
        access_mode: u32,
        open_timeout_ms: u32,
    ) -> Result<Session> {
        let result = self.lib.open(self.vi, resource, access_mode, open_timeout_ms);
        let vi = self.record(result)?;
        log::debug!("opened session {} to {}", vi, resource);
        Ok(Session::new(self.lib.clone(), vi, SessionKind::Instrument))
    }

    pub fn vi(&self) -> ViSession {
        self.vi
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn is_resource_manager(&self) -> bool {
        self.kind == SessionKind::ResourceManager
    }

    pub fn blocking(&self) -> bool {
        self.blocking
    }

    /// Raw status of the most recent operation on this session.
    pub fn last_error(&self) -> Status {
        self.last_error
    }

    /// Translated message of the most recent operation; present iff that
    /// operation failed.
    pub fn last_error_message(&self) -> Option<&str> {
        self.last_error_msg.as_deref()
    }

    pub(crate) fn lib(&self) -> &Arc<dyn VisaLibrary> {
        &self.lib
    }

    pub(crate) fn ensure_stream(&self) -> Result<()> {
        if self.is_resource_manager() {
            Err(Error::NotSupported)
        } else {
            Ok(())
        }
    }

    pub(crate) fn store_last_error(&mut self, status: Status) {
        self.last_error = status;
        if status.is_error() {
            self.last_error_msg = Some(status.describe());
        } else {
            self.last_error_msg = None;
        }
    }

    /// Record the status of a library call in the cache and unwrap it.
    pub(crate) fn record<T>(&mut self, result: ViResult<T>) -> Result<T> {
        match result {
            Ok((status, value)) => {
                self.store_last_error(status);
                Ok(value)
            }
            Err(status) => {
                self.store_last_error(status);
                Err(Error::visa(status))
            }
        }
    }

    /// Current timeout in milliseconds. In non-blocking mode this is the
    /// saved value, not the device attribute (which holds the immediate
    /// sentinel until blocking mode is restored).
    pub fn get_timeout(&mut self) -> Result<u32> {
        if !self.blocking {
            Ok(self.saved_timeout)
        } else {
            let result = self.lib.get_attribute(self.vi, consts::VI_ATTR_TMO_VALUE);
            let value = self.record(result)?;
            Ok(value as u32)
        }
    }

    /// Set the timeout in milliseconds. In non-blocking mode only the saved
    /// value changes; it reaches the device when blocking mode is restored.
    pub fn set_timeout(&mut self, timeout_ms: u32) -> Result<()> {
        if !self.blocking {
            self.saved_timeout = timeout_ms;
            Ok(())
        } else {
            let result = self.lib.set_attribute(
                self.vi,
                consts::VI_ATTR_TMO_VALUE,
                timeout_ms as ViAttrState,
            );
            self.record(result)
        }
    }

    /// Toggle blocking mode.
    ///
    /// Leaving blocking mode saves the device timeout and installs the
    /// immediate sentinel; entering it writes the saved value back. Either
    /// transition aborts without changing the mode if the decisive attribute
    /// access fails.
    pub fn set_blocking(&mut self, blocking: bool) -> Result<()> {
        self.ensure_stream()?;
        if blocking == self.blocking {
            return Ok(());
        }
        if blocking {
            let result = self.lib.set_attribute(
                self.vi,
                consts::VI_ATTR_TMO_VALUE,
                self.saved_timeout as ViAttrState,
            );
            self.record(result)?;
            self.blocking = true;
        } else {
            let result = self.lib.get_attribute(self.vi, consts::VI_ATTR_TMO_VALUE);
            let current = self.record(result)?;
            self.saved_timeout = current as u32;
            let result = self.lib.set_attribute(
                self.vi,
                consts::VI_ATTR_TMO_VALUE,
                consts::VI_TMO_IMMEDIATE as ViAttrState,
            );
            // best effort: the mode switches even if the sentinel write
            // fails, and the failure stays visible in the cache
            let _ = self.record(result);
            self.blocking = false;
        }
        Ok(())
    }

    /// Read a raw attribute. The timeout attribute is routed through the
    /// blocking-aware accessor.
    pub fn get_attribute(&mut self, attr: ViAttr) -> Result<ViAttrState> {
        if attr == consts::VI_ATTR_TMO_VALUE {
            return self.get_timeout().map(ViAttrState::from);
        }
        let result = self.lib.get_attribute(self.vi, attr);
        self.record(result)
    }

    /// Write a raw attribute. The timeout attribute is routed through the
    /// blocking-aware accessor.
    pub fn set_attribute(&mut self, attr: ViAttr, value: ViAttrState) -> Result<()> {
        if attr == consts::VI_ATTR_TMO_VALUE {
            let timeout = u32::try_from(value)
                .map_err(|_| Error::argument(anyhow!("timeout value out of range: {}", value)))?;
            return self.set_timeout(timeout);
        }
        let result = self.lib.set_attribute(self.vi, attr, value);
        self.record(result)
    }

    pub fn clear(&mut self) -> Result<()> {
        let result = self.lib.clear(self.vi);
        self.record(result)
    }

    /// Acquire a lock on the underlying resource. For shared locks the
    /// granted access key is returned.
    pub fn lock(
        &mut self,
        lock_type: u32,
        timeout_ms: u32,
        requested_key: Option<&str>,
    ) -> Result<Option<String>> {
        let result = self.lib.lock(self.vi, lock_type, timeout_ms, requested_key);
        self.record(result)
    }

    pub fn unlock(&mut self) -> Result<()> {
        let result = self.lib.unlock(self.vi);
        self.record(result)
    }

    /// Search for resources matching `expression`, in discovery order.
    ///
    /// "No matches" is a success with an empty list; the resource-not-found
    /// status never reaches the caller or the error cache.
    pub fn find(&mut self, expression: &str) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let status = match self.lib.find_rsrc(self.vi, expression) {
            Ok((initial, (list, count, first))) => {
                let mut status = initial;
                let mut name = first;
                let mut remaining = count;
                while !status.is_error() && remaining > 0 {
                    found.push(name.clone());
                    remaining -= 1;
                    match self.lib.find_next(list) {
                        Ok((next_status, next_name)) => {
                            status = next_status;
                            name = next_name;
                        }
                        Err(next_status) => status = next_status,
                    }
                }
                let _ = self.lib.close(list);
                status
            }
            Err(status) => status,
        };
        if status.is_error() && status != Status::ResourceNotFound {
            self.store_last_error(status);
            Err(Error::visa(status))
        } else {
            self.store_last_error(Status::Success);
            Ok(found)
        }
    }

    /// Parse a resource address into (interface type, interface number).
    ///
    /// An address the runtime cannot parse or locate yields `None` with the
    /// error cache reset to success.
    pub fn parse_resource(&mut self, resource: &str) -> Result<Option<(u16, u16)>> {
        match self.lib.parse_rsrc(self.vi, resource) {
            Ok((status, interface)) => {
                self.store_last_error(status);
                Ok(Some(interface))
            }
            Err(status)
                if status == Status::InvalidResourceName
                    || status == Status::ResourceNotFound =>
            {
                self.store_last_error(Status::Success);
                Ok(None)
            }
            Err(status) => {
                self.store_last_error(status);
                Err(Error::visa(status))
            }
        }
    }

    pub fn assert_trigger(&mut self, protocol: u16) -> Result<()> {
        let result = self.lib.assert_trigger(self.vi, protocol);
        self.record(result)
    }

    pub fn assert_intr_signal(&mut self, mode: i16, status_id: u32) -> Result<()> {
        let result = self.lib.assert_intr_signal(self.vi, mode, status_id);
        self.record(result)
    }

    pub fn assert_util_signal(&mut self, line: u16) -> Result<()> {
        let result = self.lib.assert_util_signal(self.vi, line);
        self.record(result)
    }

    /// Transmit GPIB command bytes (ATN asserted); returns the number of
    /// bytes actually transmitted.
    pub fn gpib_command(&mut self, data: &[u8]) -> Result<usize> {
        let (status, count) = self.lib.gpib_command(self.vi, data);
        self.store_last_error(status);
        if status.is_error() {
            Err(Error::visa(status))
        } else {
            Ok(count)
        }
    }

    pub fn gpib_control_atn(&mut self, mode: u16) -> Result<()> {
        let result = self.lib.gpib_control_atn(self.vi, mode);
        self.record(result)
    }

    pub fn gpib_control_ren(&mut self, mode: u16) -> Result<()> {
        let result = self.lib.gpib_control_ren(self.vi, mode);
        self.record(result)
    }

    pub fn gpib_pass_control(&mut self, primary: u16, secondary: u16) -> Result<()> {
        let result = self.lib.gpib_pass_control(self.vi, primary, secondary);
        self.record(result)
    }

    pub fn gpib_send_ifc(&mut self) -> Result<()> {
        let result = self.lib.gpib_send_ifc(self.vi);
        self.record(result)
    }

    /// Stream up to `count` bytes from the device into a file; returns the
    /// number of bytes transferred. A timeout is success-shaped here.
    pub fn read_to_file(&mut self, path: &str, count: u32) -> Result<u32> {
        let (status, transferred) = self.lib.read_to_file(self.vi, path, count);
        self.store_last_error(status);
        if status.is_error() && status != Status::Timeout {
            Err(Error::visa(status))
        } else {
            Ok(transferred)
        }
    }

    /// Stream bytes from a file to the device; with no explicit count the
    /// whole file is sent. A timeout is success-shaped here.
    pub fn write_from_file(&mut self, path: &str, count: Option<u32>) -> Result<u32> {
        let count = match count {
            Some(count) => count,
            None => {
                let len = std::fs::metadata(path)?.len();
                len.min(u32::MAX as u64) as u32
            }
        };
        let (status, transferred) = self.lib.write_from_file(self.vi, path, count);
        self.store_last_error(status);
        if status.is_error() && status != Status::Timeout {
            Err(Error::visa(status))
        } else {
            Ok(transferred)
        }
    }

    /// Close the session: flush pending output (instrument sessions only,
    /// best-effort) and release the handle. On failure the session remains
    /// valid so the close can be retried.
    pub fn close(&mut self) -> Result<()> {
        if self.kind == SessionKind::Instrument {
            let _ = self
                .lib
                .flush(self.vi, consts::VI_WRITE_BUF | consts::VI_IO_OUT_BUF);
        }
        match self.lib.close(self.vi) {
            Ok(_) => {
                self.closed = true;
                self.last_error_msg = None;
                Ok(())
            }
            Err(status) => Err(Error::visa(status)),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if self.kind == SessionKind::Instrument {
            let _ = self
                .lib
                .flush(self.vi, consts::VI_WRITE_BUF | consts::VI_IO_OUT_BUF);
        }
        if let Err(status) = self.lib.close(self.vi) {
            log::warn!(
                "failed to close VISA session {}: {}",
                self.vi,
                status.describe()
            );
        }
    }
}
