//! Boundary to the VISA runtime.
//!
//! The runtime is consumed as an opaque, versioned contract: every operation
//! returns a signed status code (negative means failure) plus out-parameters.
//! [`VisaLibrary`] mirrors that contract; [`SystemVisa`] implements it against
//! the installed shared library. The adapter layers above never call the
//! runtime directly, which is also what lets the test suite run against a
//! scripted in-memory implementation.

pub mod status;
pub mod sys;

pub use status::Status;
pub use sys::SystemVisa;

pub type ViStatus = i32;
pub type ViAccessMode = u32;
pub type ViSession = u32;
pub type ViObject = u32;
pub type ViFindList = u32;
pub type ViAttr = u32;
pub type ViAttrState = u64;

/// Outcome of operations whose out-parameters are only meaningful on
/// success. `Ok` carries the non-negative completion status alongside the
/// payload so that warning codes survive; `Err` carries the negative status.
pub type ViResult<T> = Result<(Status, T), Status>;

/// The operation surface of the instrument-control runtime.
///
/// Method-per-function transcription of the C API. `read`, `write` and
/// `gpib_command` return `(Status, count)` unconditionally because the
/// transferred byte count is valid even when the status is a timeout error.
pub trait VisaLibrary {
    fn open_default_rm(&self) -> ViResult<ViSession>;
    fn open(
        &self,
        parent: ViSession,
        resource: &str,
        access_mode: ViAccessMode,
        open_timeout_ms: u32,
    ) -> ViResult<ViObject>;
    fn close(&self, vi: ViObject) -> ViResult<()>;

    fn read(&self, vi: ViSession, buf: &mut [u8]) -> (Status, usize);
    fn write(&self, vi: ViSession, buf: &[u8]) -> (Status, usize);
    fn flush(&self, vi: ViSession, mask: u16) -> ViResult<()>;

    fn get_attribute(&self, vi: ViObject, attr: ViAttr) -> ViResult<ViAttrState>;
    fn set_attribute(&self, vi: ViObject, attr: ViAttr, value: ViAttrState) -> ViResult<()>;

    fn clear(&self, vi: ViSession) -> ViResult<()>;
    fn lock(
        &self,
        vi: ViSession,
        lock_type: ViAccessMode,
        timeout_ms: u32,
        requested_key: Option<&str>,
    ) -> ViResult<Option<String>>;
    fn unlock(&self, vi: ViSession) -> ViResult<()>;

    fn find_rsrc(&self, vi: ViSession, expression: &str) -> ViResult<(ViFindList, u32, String)>;
    fn find_next(&self, list: ViFindList) -> ViResult<String>;
    fn parse_rsrc(&self, vi: ViSession, resource: &str) -> ViResult<(u16, u16)>;

    fn assert_trigger(&self, vi: ViSession, protocol: u16) -> ViResult<()>;
    fn assert_intr_signal(&self, vi: ViSession, mode: i16, status_id: u32) -> ViResult<()>;
    fn assert_util_signal(&self, vi: ViSession, line: u16) -> ViResult<()>;

    fn gpib_command(&self, vi: ViSession, data: &[u8]) -> (Status, usize);
    fn gpib_control_atn(&self, vi: ViSession, mode: u16) -> ViResult<()>;
    fn gpib_control_ren(&self, vi: ViSession, mode: u16) -> ViResult<()>;
    fn gpib_pass_control(&self, vi: ViSession, primary: u16, secondary: u16) -> ViResult<()>;
    fn gpib_send_ifc(&self, vi: ViSession) -> ViResult<()>;

    fn read_to_file(&self, vi: ViSession, path: &str, count: u32) -> (Status, u32);
    fn write_from_file(&self, vi: ViSession, path: &str, count: u32) -> (Status, u32);
}
