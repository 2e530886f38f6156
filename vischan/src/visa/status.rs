//! Translation of VISA status codes.
//!
//! The runtime's status space becomes a closed enumeration with an explicit
//! [`Status::Unknown`] variant for vendor-specific codes, so translation is
//! total by construction. Every translated message has the shape
//! `[SYMBOLIC_NAME] description`; [`split_message`] recovers the two halves.

macro_rules! statuses {
    ($($variant:ident = ($code:expr, $symbol:expr, $text:expr),)*) => {
        /// A VISA completion or error code. Negative raw values are errors,
        /// non-negative values are successes (possibly warnings).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Status {
            $($variant,)*
            /// A code this crate does not recognize, e.g. a vendor extension.
            Unknown(i32),
        }

        impl Status {
            pub fn from_raw(code: i32) -> Status {
                match code {
                    $(c if c == $code as i32 => Status::$variant,)*
                    other => Status::Unknown(other),
                }
            }

            pub fn raw(&self) -> i32 {
                match self {
                    $(Status::$variant => $code as i32,)*
                    Status::Unknown(code) => *code,
                }
            }

            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Status::$variant => $symbol,)*
                    Status::Unknown(_) => "UNKNOWN",
                }
            }

            pub fn text(&self) -> &'static str {
                match self {
                    $(Status::$variant => $text,)*
                    Status::Unknown(_) => "Unknown VISA status.",
                }
            }
        }

        /// All recognized codes by symbolic name, for the constants table.
        pub const KNOWN: &[(&str, i32)] = &[
            $(($symbol, $code as i32),)*
        ];
    };
}

statuses! {
    Success = (0u32, "VI_SUCCESS", "Operation completed successfully."),
    SuccessQueueEmpty = (0x3FFF_0004u32, "VI_SUCCESS_QUEUE_EMPTY", "Operation completed successfully, but queue was already empty."),
    SuccessTermChar = (0x3FFF_0005u32, "VI_SUCCESS_TERM_CHAR", "The specified termination character was read."),
    SuccessMaxCount = (0x3FFF_0006u32, "VI_SUCCESS_MAX_CNT", "The number of bytes read is equal to the requested input count."),
    SuccessDeviceNotPresent = (0x3FFF_007Du32, "VI_SUCCESS_DEV_NPRESENT", "Session opened successfully, but the device at the specified address is not responding."),
    SuccessQueueNotEmpty = (0x3FFF_0080u32, "VI_SUCCESS_QUEUE_NEMPTY", "Wait terminated successfully on receipt of an event notification. There is still at least one more event of the requested type available for this session."),
    SuccessNestedShared = (0x3FFF_0099u32, "VI_SUCCESS_NESTED_SHARED", "Operation completed successfully, and this session has nested shared locks."),
    SuccessNestedExclusive = (0x3FFF_009Au32, "VI_SUCCESS_NESTED_EXCLUSIVE", "Operation completed successfully, and this session has nested exclusive locks."),
    SuccessSync = (0x3FFF_009Bu32, "VI_SUCCESS_SYNC", "Operation completed successfully, but the operation was actually synchronous rather than asynchronous."),
    WarnQueueOverflow = (0x3FFF_000Cu32, "VI_WARN_QUEUE_OVERFLOW", "VISA received more event information of the specified type than the configured queue size could hold."),
    WarnConfigNotLoaded = (0x3FFF_0077u32, "VI_WARN_CONFIG_NLOADED", "The specified configuration either does not exist or could not be loaded; VISA-specified defaults are used."),
    WarnNullObject = (0x3FFF_0082u32, "VI_WARN_NULL_OBJECT", "The specified object reference is uninitialized."),
    WarnUnsupportedAttributeState = (0x3FFF_0084u32, "VI_WARN_NSUP_ATTR_STATE", "Although the specified attribute state is valid, it is not supported by this implementation."),
    WarnUnknownStatus = (0x3FFF_0085u32, "VI_WARN_UNKNOWN_STATUS", "The status code passed to the operation could not be interpreted."),
    WarnUnsupportedBuffer = (0x3FFF_0088u32, "VI_WARN_NSUP_BUF", "The specified buffer is not supported."),
    SystemError = (0xBFFF_0000u32, "VI_ERROR_SYSTEM_ERROR", "The VISA system failed to initialize."),
    InvalidObject = (0xBFFF_000Eu32, "VI_ERROR_INV_OBJECT", "The given session reference is invalid."),
    ResourceLocked = (0xBFFF_000Fu32, "VI_ERROR_RSRC_LOCKED", "Specified operation could not be performed because the resource identified by vi has been locked for this kind of access."),
    InvalidExpression = (0xBFFF_0010u32, "VI_ERROR_INV_EXPR", "Invalid expression specified for search."),
    ResourceNotFound = (0xBFFF_0011u32, "VI_ERROR_RSRC_NFOUND", "Insufficient location information or resource not present in the system."),
    InvalidResourceName = (0xBFFF_0012u32, "VI_ERROR_INV_RSRC_NAME", "Invalid resource reference specified. Parsing error."),
    InvalidAccessMode = (0xBFFF_0013u32, "VI_ERROR_INV_ACC_MODE", "Invalid access mode."),
    Timeout = (0xBFFF_0015u32, "VI_ERROR_TMO", "The read/write operation was aborted because timeout expired while operation was in progress."),
    ClosingFailed = (0xBFFF_0016u32, "VI_ERROR_CLOSING_FAILED", "Unable to deallocate the previously allocated data structures corresponding to this session or object reference."),
    UnsupportedAttribute = (0xBFFF_001Du32, "VI_ERROR_NSUP_ATTR", "The specified attribute is not defined by the referenced object."),
    UnsupportedAttributeState = (0xBFFF_001Eu32, "VI_ERROR_NSUP_ATTR_STATE", "The specified state of the attribute is not valid, or is not supported as defined by the object."),
    AttributeReadOnly = (0xBFFF_001Fu32, "VI_ERROR_ATTR_READONLY", "The specified attribute is read-only."),
    InvalidLockType = (0xBFFF_0020u32, "VI_ERROR_INV_LOCK_TYPE", "The specified type of lock is not supported by this resource."),
    InvalidAccessKey = (0xBFFF_0021u32, "VI_ERROR_INV_ACCESS_KEY", "The access key to the resource associated with this session is invalid."),
    RawWriteProtocolViolation = (0xBFFF_0034u32, "VI_ERROR_RAW_WR_PROT_VIOL", "Violation of raw write protocol occurred during transfer."),
    RawReadProtocolViolation = (0xBFFF_0035u32, "VI_ERROR_RAW_RD_PROT_VIOL", "Violation of raw read protocol occurred during transfer."),
    OutputProtocolViolation = (0xBFFF_0036u32, "VI_ERROR_OUTP_PROT_VIOL", "Device reported an output protocol error during transfer."),
    InputProtocolViolation = (0xBFFF_0037u32, "VI_ERROR_INP_PROT_VIOL", "Device reported an input protocol error during transfer."),
    BusError = (0xBFFF_0038u32, "VI_ERROR_BERR", "Bus error occurred during transfer."),
    InvalidSetup = (0xBFFF_003Au32, "VI_ERROR_INV_SETUP", "Some implementation-specific configuration file is corrupt or does not exist."),
    QueueError = (0xBFFF_003Bu32, "VI_ERROR_QUEUE_ERROR", "Unable to queue move operation."),
    AllocationFailed = (0xBFFF_003Cu32, "VI_ERROR_ALLOC", "Insufficient system resources to open a session."),
    InvalidMask = (0xBFFF_003Du32, "VI_ERROR_INV_MASK", "The specified mask does not specify a valid flush operation on read/write resource."),
    IoError = (0xBFFF_003Eu32, "VI_ERROR_IO", "Could not perform read/write operation because of I/O error."),
    InvalidFormat = (0xBFFF_003Fu32, "VI_ERROR_INV_FMT", "A format specifier in the format string is invalid."),
    UnsupportedFormat = (0xBFFF_0041u32, "VI_ERROR_NSUP_FMT", "A format specifier in the format string is not supported."),
    LineInUse = (0xBFFF_0042u32, "VI_ERROR_LINE_IN_USE", "The specified trigger line is currently in use."),
    UnsupportedMode = (0xBFFF_0046u32, "VI_ERROR_NSUP_MODE", "The specified mode is not supported by this VISA implementation."),
    ServiceRequestNotReceived = (0xBFFF_004Au32, "VI_ERROR_SRQ_NOCCURRED", "Service request has not been received for the session."),
    InvalidSpace = (0xBFFF_004Eu32, "VI_ERROR_INV_SPACE", "Invalid address space specified."),
    InvalidOffset = (0xBFFF_0051u32, "VI_ERROR_INV_OFFSET", "Invalid offset specified."),
    InvalidWidth = (0xBFFF_0052u32, "VI_ERROR_INV_WIDTH", "Invalid source or destination width specified."),
    UnsupportedOffset = (0xBFFF_0054u32, "VI_ERROR_NSUP_OFFSET", "Specified offset is not accessible from this hardware."),
    UnsupportedVariableWidth = (0xBFFF_0055u32, "VI_ERROR_NSUP_VAR_WIDTH", "Cannot support source and destination widths that are different."),
    WindowNotMapped = (0xBFFF_0057u32, "VI_ERROR_WINDOW_NMAPPED", "The specified session is not currently mapped."),
    ResponsePending = (0xBFFF_0059u32, "VI_ERROR_RESP_PENDING", "A previous response is still pending, causing a multiple query error."),
    NoListeners = (0xBFFF_005Fu32, "VI_ERROR_NLISTENERS", "No-listeners condition is detected (both NRFD and NDAC are unasserted)."),
    NotControllerInCharge = (0xBFFF_0060u32, "VI_ERROR_NCIC", "The interface associated with the given vi is not currently the controller in charge."),
    NotSystemController = (0xBFFF_0061u32, "VI_ERROR_NSYS_CNTLR", "The interface associated with this session is not the system controller."),
    UnsupportedOperation = (0xBFFF_0067u32, "VI_ERROR_NSUP_OPER", "The given session does not support this operation."),
    InterruptPending = (0xBFFF_0068u32, "VI_ERROR_INTR_PENDING", "An interrupt is still pending from a previous call."),
    SerialParity = (0xBFFF_006Au32, "VI_ERROR_ASRL_PARITY", "A parity error occurred during transfer."),
    SerialFraming = (0xBFFF_006Bu32, "VI_ERROR_ASRL_FRAMING", "A framing error occurred during transfer."),
    SerialOverrun = (0xBFFF_006Cu32, "VI_ERROR_ASRL_OVERRUN", "An overrun error occurred during transfer. A character was not read from the hardware before the next character arrived."),
    TriggerNotMapped = (0xBFFF_006Eu32, "VI_ERROR_TRIG_NMAPPED", "The path from trigSrc to trigDest is not currently mapped."),
    UnsupportedAlignOffset = (0xBFFF_0070u32, "VI_ERROR_NSUP_ALIGN_OFFSET", "The specified offset is not properly aligned for the access width of the operation."),
    UserBuffer = (0xBFFF_0071u32, "VI_ERROR_USER_BUF", "A specified user buffer is not valid or cannot be accessed for the required size."),
    ResourceBusy = (0xBFFF_0072u32, "VI_ERROR_RSRC_BUSY", "The resource is valid, but VISA cannot currently access it."),
    UnsupportedWidth = (0xBFFF_0076u32, "VI_ERROR_NSUP_WIDTH", "Specified width is not supported by this hardware."),
    InvalidParameter = (0xBFFF_0078u32, "VI_ERROR_INV_PARAMETER", "The value of some parameter - which parameter is not known - is invalid."),
    InvalidProtocol = (0xBFFF_0079u32, "VI_ERROR_INV_PROT", "The protocol specified is invalid."),
    InvalidSize = (0xBFFF_007Bu32, "VI_ERROR_INV_SIZE", "Invalid size of window specified."),
    WindowMapped = (0xBFFF_0080u32, "VI_ERROR_WINDOW_MAPPED", "The specified session currently contains a mapped window."),
    NotImplementedOperation = (0xBFFF_0081u32, "VI_ERROR_NIMPL_OPER", "The given operation is not implemented."),
    InvalidLength = (0xBFFF_0083u32, "VI_ERROR_INV_LENGTH", "Invalid length specified."),
    InvalidMode = (0xBFFF_0091u32, "VI_ERROR_INV_MODE", "The specified mode is invalid."),
    SessionNotLocked = (0xBFFF_009Cu32, "VI_ERROR_SESN_NLOCKED", "The current session did not have any lock on the resource."),
    MemoryNotShared = (0xBFFF_009Du32, "VI_ERROR_MEM_NSHARED", "The device does not export any memory."),
    LibraryNotFound = (0xBFFF_009Eu32, "VI_ERROR_LIBRARY_NFOUND", "A code library required by VISA could not be located or loaded."),
    UnsupportedInterrupt = (0xBFFF_009Fu32, "VI_ERROR_NSUP_INTR", "The interface cannot generate an interrupt on the requested level or with the requested statusID value."),
    InvalidLine = (0xBFFF_00A0u32, "VI_ERROR_INV_LINE", "The value specified by the line parameter is invalid."),
    FileAccess = (0xBFFF_00A1u32, "VI_ERROR_FILE_ACCESS", "An error occurred while trying to open the specified file. Possible reasons include an invalid path or lack of access rights."),
    FileIo = (0xBFFF_00A2u32, "VI_ERROR_FILE_IO", "An error occurred while accessing the specified file."),
    UnsupportedLine = (0xBFFF_00A3u32, "VI_ERROR_NSUP_LINE", "One of the specified lines (trigSrc or trigDest) is not supported by this VISA implementation, or the combination of lines is not a valid mapping."),
    UnsupportedMechanism = (0xBFFF_00A4u32, "VI_ERROR_NSUP_MECH", "The specified mechanism is not supported by the given event type."),
    InterfaceNumberNotConfigured = (0xBFFF_00A5u32, "VI_ERROR_INTF_NUM_NCONFIG", "The interface type is valid, but the specified interface number is not configured."),
    ConnectionLost = (0xBFFF_00A6u32, "VI_ERROR_CONN_LOST", "The I/O connection for the given session has been lost."),
    MachineNotAvailable = (0xBFFF_00A7u32, "VI_ERROR_MACHINE_NAVAIL", "The remote machine does not exist or is not accepting any connections."),
    NoPermission = (0xBFFF_00A8u32, "VI_ERROR_NPERMISSION", "Access to the remote machine is denied."),
}

impl Status {
    /// Whether the raw value denotes a failure.
    pub fn is_error(&self) -> bool {
        self.raw() < 0
    }

    /// The full `[SYMBOLIC_NAME] description` message for this status.
    pub fn describe(&self) -> String {
        format!("[{}] {}", self.symbol(), self.text())
    }
}

/// Split a translated message into its symbolic token and description.
///
/// Inverse of [`Status::describe`]: reassembling the halves with
/// `format!("[{}] {}", symbol, description)` reproduces the message exactly.
/// A message without a bracketed token yields an empty symbol.
pub fn split_message(msg: &str) -> (&str, &str) {
    if let Some(rest) = msg.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return (&rest[..end], rest[end + 1..].trim_start());
        }
    }
    ("", msg)
}
