//! Adapter between VISA instrument sessions and a generic byte-stream
//! channel abstraction.
//!
//! The VISA runtime (NI-VISA, Keysight IO Libraries, librsvisa, ...) exposes
//! lab instruments on GPIB, serial, USB and TCP/IP through a blocking,
//! status-code based session API. This crate wraps one such session in a
//! [`Session`] that behaves like a configurable byte stream: it can be read
//! and written with partial-transfer semantics, switched between blocking
//! and non-blocking mode, and configured through named options (`mode`,
//! `timeout`, `handshake`, `xchar`, `ttycontrol`, `ttystatus`, `queue`).
//!
//! On top of the adapter sit a [`registry::Registry`] that owns open
//! channels under generated names and an [`app::App`] dispatcher that maps
//! `vischan_protocol` requests onto them, which is the surface a scripting
//! interpreter front-end binds to.
//!
//! The runtime itself is consumed through the [`visa::VisaLibrary`] trait;
//! [`visa::SystemVisa`] loads the installed shared library at runtime.

#[macro_use]
extern crate dlopen_derive;
#[macro_use]
extern crate lazy_static;

use std::io;

use thiserror::Error;

use crate::visa::status::Status;
pub use vischan_protocol::VisaError;

pub mod app;
pub mod channel;
pub mod consts;
pub mod options;
pub mod registry;
pub mod session;
pub mod visa;

#[cfg(test)]
pub(crate) mod testing;

pub use app::App;
pub use channel::{Channel, Transfer};
pub use registry::Registry;
pub use session::{Session, SessionKind};

#[derive(Error, Debug)]
pub enum Error {
    #[error("error while communicating with instrument: {0}")]
    Visa(VisaError),
    #[error("argument error: {0}")]
    Argument(anyhow::Error),
    #[error("bad option \"{option}\": should be one of {known}")]
    BadOption {
        option: String,
        known: &'static str,
    },
    #[error("argument passed is not a valid VISA channel: {0}")]
    BadChannel(String),
    #[error("operation not supported by this channel")]
    NotSupported,
    #[error("could not load VISA library: {0}")]
    Library(#[from] dlopen::Error),
    #[error("IO error occurred: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn argument<T: Into<anyhow::Error>>(err: T) -> Self {
        Error::Argument(err.into())
    }

    pub(crate) fn visa(status: Status) -> Self {
        Error::Visa(VisaError {
            code: status.raw(),
            desc: status.describe(),
        })
    }
}

impl From<Error> for vischan_protocol::Error {
    fn from(err: Error) -> Self {
        use vischan_protocol::Error as Wire;
        match err {
            Error::Visa(x) => Wire::Visa(x),
            Error::Argument(x) => Wire::Argument(x.to_string()),
            Error::BadOption { option, known } => Wire::BadOption {
                option,
                known: known.to_string(),
            },
            Error::BadChannel(x) => Wire::BadChannel(x),
            Error::NotSupported => Wire::NotSupported,
            Error::Library(x) => Wire::Library(x.to_string()),
            Error::Io(x) => Wire::Io(x.to_string()),
        }
    }
}
