//! Wire types for the vischan command surface.
//!
//! Embedders (typically a scripting interpreter front-end) talk to the
//! channel dispatcher with these request/response enums. Numeric arguments
//! that scripts supply are carried as `i64` and range-checked by the
//! dispatcher, so out-of-range values produce explicit errors instead of
//! silent truncation.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

pub mod error;
mod util;

pub use crate::error::{Error, VisaError};

#[derive(Clone, Serialize, Deserialize)]
pub enum Request {
    OpenDefaultRm,
    Open {
        parent: String,
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        access_mode: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        timeout: Option<i64>,
    },
    Close {
        channel: String,
    },
    Read {
        channel: String,
        count: i64,
    },
    Write {
        channel: String,
        #[serde(
            serialize_with = "util::to_base64",
            deserialize_with = "util::from_base64"
        )]
        data: Vec<u8>,
    },
    SetBlocking {
        channel: String,
        blocking: bool,
    },
    SetOption {
        channel: String,
        option: String,
        value: String,
    },
    GetOption {
        channel: String,
        option: String,
    },
    GetAttribute {
        channel: String,
        attribute: i64,
    },
    SetAttribute {
        channel: String,
        attribute: i64,
        value: i64,
    },
    Clear {
        channel: String,
    },
    Lock {
        channel: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        lock_type: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        timeout: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        requested_key: Option<String>,
    },
    Unlock {
        channel: String,
    },
    Find {
        channel: String,
        expression: String,
    },
    ParseResource {
        channel: String,
        resource: String,
    },
    LastError {
        channel: String,
    },
    AssertTrigger {
        channel: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        protocol: Option<i64>,
    },
    AssertIntrSignal {
        channel: String,
        mode: i64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        status_id: Option<i64>,
    },
    AssertUtilSignal {
        channel: String,
        line: i64,
    },
    GpibCommand {
        channel: String,
        #[serde(
            serialize_with = "util::to_base64",
            deserialize_with = "util::from_base64"
        )]
        data: Vec<u8>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        count: Option<i64>,
    },
    GpibControlAtn {
        channel: String,
        mode: i64,
    },
    GpibControlRen {
        channel: String,
        mode: i64,
    },
    GpibPassControl {
        channel: String,
        primary: i64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        secondary: Option<i64>,
    },
    GpibSendIfc {
        channel: String,
    },
    ReadToFile {
        channel: String,
        path: String,
        count: i64,
    },
    WriteFromFile {
        channel: String,
        path: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        count: Option<i64>,
    },
    ListChannels,
}

/// Interface type and number of a parsed resource address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInterface {
    pub interface_type: u16,
    pub interface_number: u16,
}

/// Cached status of the most recent operation on a channel.
///
/// `symbol` and `description` are the two halves of the translated status
/// message; both are empty when the last operation succeeded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastError {
    pub code: i32,
    pub symbol: String,
    pub description: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub enum Response {
    Done,
    Channel(String),
    Count(u64),
    Data(
        #[serde(
            serialize_with = "util::to_base64",
            deserialize_with = "util::from_base64"
        )]
        Vec<u8>,
    ),
    WouldBlock,
    Value(i64),
    OptionValue(String),
    Resources(Vec<String>),
    ParsedResource(Option<ResourceInterface>),
    AccessKey(String),
    LastError(LastError),
    Channels(Vec<String>),
    Error(Error),
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Request::OpenDefaultRm => "OpenDefaultRm",
            Request::Open { .. } => "Open",
            Request::Close { .. } => "Close",
            Request::Read { .. } => "Read",
            Request::Write { .. } => "Write",
            Request::SetBlocking { .. } => "SetBlocking",
            Request::SetOption { .. } => "SetOption",
            Request::GetOption { .. } => "GetOption",
            Request::GetAttribute { .. } => "GetAttribute",
            Request::SetAttribute { .. } => "SetAttribute",
            Request::Clear { .. } => "Clear",
            Request::Lock { .. } => "Lock",
            Request::Unlock { .. } => "Unlock",
            Request::Find { .. } => "Find",
            Request::ParseResource { .. } => "ParseResource",
            Request::LastError { .. } => "LastError",
            Request::AssertTrigger { .. } => "AssertTrigger",
            Request::AssertIntrSignal { .. } => "AssertIntrSignal",
            Request::AssertUtilSignal { .. } => "AssertUtilSignal",
            Request::GpibCommand { .. } => "GpibCommand",
            Request::GpibControlAtn { .. } => "GpibControlAtn",
            Request::GpibControlRen { .. } => "GpibControlRen",
            Request::GpibPassControl { .. } => "GpibPassControl",
            Request::GpibSendIfc { .. } => "GpibSendIfc",
            Request::ReadToFile { .. } => "ReadToFile",
            Request::WriteFromFile { .. } => "WriteFromFile",
            Request::ListChannels => "ListChannels",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_payload_roundtrips_as_base64() {
        let req = Request::Write {
            channel: "visa_session1".to_string(),
            data: b"*IDN?\n".to_vec(),
        };
        let encoded = serde_json::to_string(&req).unwrap();
        assert!(encoded.contains(&base64::encode(b"*IDN?\n")));
        match serde_json::from_str(&encoded).unwrap() {
            Request::Write { channel, data } => {
                assert_eq!(channel, "visa_session1");
                assert_eq!(data, b"*IDN?\n");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let req: Request = serde_json::from_str(
            r#"{"Open": {"parent": "visa_session1", "resource": "ASRL1::INSTR"}}"#,
        )
        .unwrap();
        match req {
            Request::Open {
                access_mode,
                timeout,
                ..
            } => {
                assert!(access_mode.is_none());
                assert!(timeout.is_none());
            }
            _ => panic!(),
        }
    }

    #[test]
    fn last_error_roundtrip() {
        let resp = Response::LastError(LastError {
            code: -1073807339,
            symbol: "VI_ERROR_TMO".to_string(),
            description: "Timeout expired before operation completed.".to_string(),
        });
        let encoded = serde_json::to_string(&resp).unwrap();
        match serde_json::from_str(&encoded).unwrap() {
            Response::LastError(le) => {
                assert_eq!(le.code, -1073807339);
                assert_eq!(le.symbol, "VI_ERROR_TMO");
            }
            _ => panic!(),
        }
    }
}
