//! Command dispatch: maps wire requests onto registry channels.
//!
//! Deliberately thin. Each arm validates and coerces arguments (unsigned
//! 16/32-bit bounds are checked explicitly, matching the script-facing
//! surface), forwards to the session, and transcribes out-parameters into a
//! [`Response`] without reinterpretation.

use std::convert::TryFrom;
use std::sync::Arc;

use anyhow::anyhow;

use vischan_protocol::{LastError, Request, ResourceInterface, Response};

use crate::channel::{Channel, Transfer};
use crate::registry::Registry;
use crate::session::Session;
use crate::visa::status::split_message;
use crate::visa::{SystemVisa, VisaLibrary};
use crate::{consts, Error, Result};

pub struct App {
    lib: Arc<dyn VisaLibrary>,
    registry: Registry,
}

impl App {
    pub fn new(lib: Arc<dyn VisaLibrary>) -> Self {
        App {
            lib,
            registry: Registry::new(),
        }
    }

    /// Dispatcher backed by the installed VISA runtime.
    pub fn with_system_visa() -> Result<Self> {
        Ok(App::new(Arc::new(SystemVisa::load()?)))
    }

    pub fn registry(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn handle(&mut self, request: Request) -> Response {
        log::debug!("handling request: {:?}", request);
        match self.dispatch(request) {
            Ok(response) => response,
            Err(err) => Response::Error(err.into()),
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::OpenDefaultRm => {
                let session = Session::open_default_rm(self.lib.clone())?;
                let name = self.registry.register(session)?;
                Ok(Response::Channel(name))
            }
            Request::Open {
                parent,
                resource,
                access_mode,
                timeout,
            } => {
                let access_mode = opt_u32(access_mode, "access mode")?.unwrap_or(consts::VI_NULL);
                let timeout = opt_u32(timeout, "timeout")?.unwrap_or(consts::VI_NULL);
                let parent = self.registry.get_mut(&parent)?;
                let session = parent.open(&resource, access_mode, timeout)?;
                let name = self.registry.register(session)?;
                Ok(Response::Channel(name))
            }
            Request::Close { channel } => {
                self.registry.close(&channel)?;
                Ok(Response::Done)
            }
            Request::Read { channel, count } => {
                let count = to_u32(count, "count")? as usize;
                let session = self.registry.get_mut(&channel)?;
                let mut buf = vec![0u8; count];
                match session.read(&mut buf)? {
                    Transfer::Bytes(n) => {
                        buf.truncate(n);
                        Ok(Response::Data(buf))
                    }
                    Transfer::WouldBlock => Ok(Response::WouldBlock),
                }
            }
            Request::Write { channel, data } => {
                let session = self.registry.get_mut(&channel)?;
                match session.write(&data)? {
                    Transfer::Bytes(n) => Ok(Response::Count(n as u64)),
                    Transfer::WouldBlock => Ok(Response::WouldBlock),
                }
            }
            Request::SetBlocking { channel, blocking } => {
                let session = self.registry.get_mut(&channel)?;
                Channel::set_blocking(session, blocking)?;
                Ok(Response::Done)
            }
            Request::SetOption {
                channel,
                option,
                value,
            } => {
                let session = self.registry.get_mut(&channel)?;
                session.set_option(&option, &value)?;
                Ok(Response::Done)
            }
            Request::GetOption { channel, option } => {
                let session = self.registry.get_mut(&channel)?;
                Ok(Response::OptionValue(session.get_option(&option)?))
            }
            Request::GetAttribute { channel, attribute } => {
                let attribute = to_u32(attribute, "attribute")?;
                let session = self.registry.get_mut(&channel)?;
                let value = session.get_attribute(attribute)?;
                Ok(Response::Value(value as i64))
            }
            Request::SetAttribute {
                channel,
                attribute,
                value,
            } => {
                let attribute = to_u32(attribute, "attribute")?;
                let session = self.registry.get_mut(&channel)?;
                session.set_attribute(attribute, value as u64)?;
                Ok(Response::Done)
            }
            Request::Clear { channel } => {
                self.registry.get_mut(&channel)?.clear()?;
                Ok(Response::Done)
            }
            Request::Lock {
                channel,
                lock_type,
                timeout,
                requested_key,
            } => {
                let lock_type =
                    opt_u32(lock_type, "lock type")?.unwrap_or(consts::VI_EXCLUSIVE_LOCK);
                let timeout = opt_u32(timeout, "timeout")?.unwrap_or(consts::VI_TMO_INFINITE);
                let session = self.registry.get_mut(&channel)?;
                match session.lock(lock_type, timeout, requested_key.as_deref())? {
                    Some(key) => Ok(Response::AccessKey(key)),
                    None => Ok(Response::Done),
                }
            }
            Request::Unlock { channel } => {
                self.registry.get_mut(&channel)?.unlock()?;
                Ok(Response::Done)
            }
            Request::Find {
                channel,
                expression,
            } => {
                let session = self.registry.get_mut(&channel)?;
                Ok(Response::Resources(session.find(&expression)?))
            }
            Request::ParseResource { channel, resource } => {
                let session = self.registry.get_mut(&channel)?;
                let parsed = session.parse_resource(&resource)?.map(|(kind, number)| {
                    ResourceInterface {
                        interface_type: kind,
                        interface_number: number,
                    }
                });
                Ok(Response::ParsedResource(parsed))
            }
            Request::LastError { channel } => {
                let session = self.registry.get_mut(&channel)?;
                let code = session.last_error().raw();
                let (symbol, description) = match session.last_error_message() {
                    Some(message) => {
                        let (symbol, description) = split_message(message);
                        (symbol.to_string(), description.to_string())
                    }
                    None => (String::new(), String::new()),
                };
                Ok(Response::LastError(LastError {
                    code,
                    symbol,
                    description,
                }))
            }
            Request::AssertTrigger { channel, protocol } => {
                let protocol =
                    opt_u16(protocol, "protocol")?.unwrap_or(consts::VI_TRIG_PROT_DEFAULT);
                self.registry.get_mut(&channel)?.assert_trigger(protocol)?;
                Ok(Response::Done)
            }
            Request::AssertIntrSignal {
                channel,
                mode,
                status_id,
            } => {
                let mode = to_u16(mode, "mode")? as i16;
                let status_id = opt_u32(status_id, "status id")?.unwrap_or(0);
                self.registry
                    .get_mut(&channel)?
                    .assert_intr_signal(mode, status_id)?;
                Ok(Response::Done)
            }
            Request::AssertUtilSignal { channel, line } => {
                let line = to_u16(line, "line")?;
                self.registry.get_mut(&channel)?.assert_util_signal(line)?;
                Ok(Response::Done)
            }
            Request::GpibCommand {
                channel,
                data,
                count,
            } => {
                let count = match count {
                    Some(count) => (to_u32(count, "count")? as usize).min(data.len()),
                    None => data.len().min(u32::MAX as usize),
                };
                let session = self.registry.get_mut(&channel)?;
                let transmitted = session.gpib_command(&data[..count])?;
                Ok(Response::Count(transmitted as u64))
            }
            Request::GpibControlAtn { channel, mode } => {
                let mode = to_u16(mode, "mode")?;
                self.registry.get_mut(&channel)?.gpib_control_atn(mode)?;
                Ok(Response::Done)
            }
            Request::GpibControlRen { channel, mode } => {
                let mode = to_u16(mode, "mode")?;
                self.registry.get_mut(&channel)?.gpib_control_ren(mode)?;
                Ok(Response::Done)
            }
            Request::GpibPassControl {
                channel,
                primary,
                secondary,
            } => {
                let primary = to_u16(primary, "primary address")?;
                let secondary =
                    opt_u16(secondary, "secondary address")?.unwrap_or(consts::VI_NO_SEC_ADDR);
                self.registry
                    .get_mut(&channel)?
                    .gpib_pass_control(primary, secondary)?;
                Ok(Response::Done)
            }
            Request::GpibSendIfc { channel } => {
                self.registry.get_mut(&channel)?.gpib_send_ifc()?;
                Ok(Response::Done)
            }
            Request::ReadToFile {
                channel,
                path,
                count,
            } => {
                let count = to_u32(count, "count")?;
                let session = self.registry.get_mut(&channel)?;
                Ok(Response::Count(session.read_to_file(&path, count)? as u64))
            }
            Request::WriteFromFile {
                channel,
                path,
                count,
            } => {
                let count = opt_u32(count, "count")?;
                let session = self.registry.get_mut(&channel)?;
                Ok(Response::Count(
                    session.write_from_file(&path, count)? as u64
                ))
            }
            Request::ListChannels => Ok(Response::Channels(self.registry.list())),
        }
    }
}

fn to_u16(value: i64, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        Error::argument(anyhow!(
            "{} out of range for an unsigned 16-bit value: {}",
            what,
            value
        ))
    })
}

fn to_u32(value: i64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::argument(anyhow!(
            "{} out of range for an unsigned 32-bit value: {}",
            what,
            value
        ))
    })
}

fn opt_u16(value: Option<i64>, what: &str) -> Result<Option<u16>> {
    value.map(|v| to_u16(v, what)).transpose()
}

fn opt_u32(value: Option<i64>, what: &str) -> Result<Option<u32>> {
    value.map(|v| to_u32(v, what)).transpose()
}
