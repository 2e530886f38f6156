use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure status reported by the VISA runtime, together with its
/// translated `[SYMBOLIC_NAME] description` message.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("VisaError({code}): `{desc}`")]
pub struct VisaError {
    pub code: i32,
    pub desc: String,
}

#[derive(Error, Clone, Debug, Serialize, Deserialize)]
pub enum Error {
    #[error("{0}")]
    Visa(VisaError),
    #[error("argument error: {0}")]
    Argument(String),
    #[error("bad option \"{option}\": should be one of {known}")]
    BadOption { option: String, known: String },
    #[error("argument passed is not a valid VISA channel: {0}")]
    BadChannel(String),
    #[error("operation not supported by this channel")]
    NotSupported,
    #[error("could not load VISA library: {0}")]
    Library(String),
    #[error("IO error occurred: {0}")]
    Io(String),
}

impl From<VisaError> for Error {
    fn from(err: VisaError) -> Self {
        Error::Visa(err)
    }
}
