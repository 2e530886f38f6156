//! dlopen-backed implementation of [`VisaLibrary`] against the installed
//! VISA runtime (NI-VISA, Keysight IO Libraries, librsvisa, ...).

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use dlopen::wrapper::{Container, WrapperApi};

use super::status::Status;
use super::{
    ViAccessMode, ViAttr, ViAttrState, ViFindList, ViObject, ViResult, ViSession, ViStatus,
    VisaLibrary,
};
use crate::consts;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        const LIBRARY_CANDIDATES: &[&str] = &["visa64.dll", "visa32.dll"];
    } else if #[cfg(target_os = "macos")] {
        const LIBRARY_CANDIDATES: &[&str] = &[
            "/Library/Frameworks/VISA.framework/VISA",
            "librsvisa.dylib",
        ];
    } else {
        const LIBRARY_CANDIDATES: &[&str] = &[
            "librsvisa.so",
            "libiovisa.so",
            "libvisa.so",
            "libvisa.so.0",
        ];
    }
}

#[derive(WrapperApi)]
#[allow(non_snake_case)]
struct Api {
    viOpenDefaultRM: unsafe extern "C" fn(vi: *mut ViSession) -> ViStatus,
    viOpen: unsafe extern "C" fn(
        session: ViSession,
        rsrc: *const c_char,
        access_mode: ViAccessMode,
        timeout: u32,
        vi: *mut ViObject,
    ) -> ViStatus,
    viClose: unsafe extern "C" fn(vi: ViObject) -> ViStatus,
    viRead:
        unsafe extern "C" fn(vi: ViSession, buf: *mut u8, cnt: u32, cnt_ret: *mut u32) -> ViStatus,
    viWrite: unsafe extern "C" fn(
        vi: ViSession,
        buf: *const u8,
        cnt: u32,
        cnt_ret: *mut u32,
    ) -> ViStatus,
    viFlush: unsafe extern "C" fn(vi: ViSession, mask: u16) -> ViStatus,
    viClear: unsafe extern "C" fn(vi: ViSession) -> ViStatus,
    viGetAttribute:
        unsafe extern "C" fn(vi: ViObject, attr: ViAttr, value: *mut ViAttrState) -> ViStatus,
    viSetAttribute:
        unsafe extern "C" fn(vi: ViObject, attr: ViAttr, value: ViAttrState) -> ViStatus,
    viLock: unsafe extern "C" fn(
        vi: ViSession,
        lock_type: ViAccessMode,
        timeout: u32,
        requested_key: *const c_char,
        access_key: *mut c_char,
    ) -> ViStatus,
    viUnlock: unsafe extern "C" fn(vi: ViSession) -> ViStatus,
    viFindRsrc: unsafe extern "C" fn(
        session: ViSession,
        expr: *const c_char,
        list: *mut ViFindList,
        ret_cnt: *mut u32,
        desc: *mut c_char,
    ) -> ViStatus,
    viFindNext: unsafe extern "C" fn(list: ViFindList, desc: *mut c_char) -> ViStatus,
    viParseRsrc: unsafe extern "C" fn(
        session: ViSession,
        rsrc: *const c_char,
        intf_type: *mut u16,
        intf_num: *mut u16,
    ) -> ViStatus,
    viAssertTrigger: unsafe extern "C" fn(vi: ViSession, protocol: u16) -> ViStatus,
    viAssertIntrSignal:
        unsafe extern "C" fn(vi: ViSession, mode: i16, status_id: u32) -> ViStatus,
    viAssertUtilSignal: unsafe extern "C" fn(vi: ViSession, line: u16) -> ViStatus,
    viGpibCommand: unsafe extern "C" fn(
        vi: ViSession,
        buf: *const u8,
        cnt: u32,
        ret_cnt: *mut u32,
    ) -> ViStatus,
    viGpibControlATN: unsafe extern "C" fn(vi: ViSession, mode: u16) -> ViStatus,
    viGpibControlREN: unsafe extern "C" fn(vi: ViSession, mode: u16) -> ViStatus,
    viGpibPassControl:
        unsafe extern "C" fn(vi: ViSession, prim_addr: u16, sec_addr: u16) -> ViStatus,
    viGpibSendIFC: unsafe extern "C" fn(vi: ViSession) -> ViStatus,
    viReadToFile: unsafe extern "C" fn(
        vi: ViSession,
        filename: *const c_char,
        cnt: u32,
        ret_cnt: *mut u32,
    ) -> ViStatus,
    viWriteFromFile: unsafe extern "C" fn(
        vi: ViSession,
        filename: *const c_char,
        cnt: u32,
        ret_cnt: *mut u32,
    ) -> ViStatus,
}

/// The installed VISA shared library, loaded from the system search path.
pub struct SystemVisa {
    api: Container<Api>,
}

impl SystemVisa {
    /// Try the well-known library names for this platform and wrap the first
    /// one that loads and exports the full operation set.
    pub fn load() -> crate::Result<Self> {
        let mut last_err = None;
        for name in LIBRARY_CANDIDATES {
            match unsafe { Container::load(name) } {
                Ok(api) => {
                    log::debug!("loaded VISA library {}", name);
                    return Ok(SystemVisa { api });
                }
                Err(err) => {
                    log::debug!("could not load VISA library {}: {}", name, err);
                    last_err = Some(err);
                }
            }
        }
        Err(crate::Error::Library(
            last_err.expect("candidate list is never empty"),
        ))
    }
}

fn wrap<T>(status: ViStatus, value: T) -> ViResult<T> {
    let status = Status::from_raw(status);
    if status.is_error() {
        Err(status)
    } else {
        Ok((status, value))
    }
}

/// Strings handed to the runtime must not contain NUL bytes; the runtime
/// itself would reject such a parameter.
fn cstring(s: &str) -> Result<CString, Status> {
    CString::new(s).map_err(|_| Status::InvalidParameter)
}

fn from_desc_buf(buf: &[c_char]) -> String {
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

impl VisaLibrary for SystemVisa {
    fn open_default_rm(&self) -> ViResult<ViSession> {
        let mut vi: ViSession = 0;
        let status = unsafe { self.api.viOpenDefaultRM(&mut vi) };
        wrap(status, vi)
    }

    fn open(
        &self,
        parent: ViSession,
        resource: &str,
        access_mode: ViAccessMode,
        open_timeout_ms: u32,
    ) -> ViResult<ViObject> {
        let resource = cstring(resource)?;
        let mut vi: ViObject = 0;
        let status = unsafe {
            self.api
                .viOpen(parent, resource.as_ptr(), access_mode, open_timeout_ms, &mut vi)
        };
        wrap(status, vi)
    }

    fn close(&self, vi: ViObject) -> ViResult<()> {
        let status = unsafe { self.api.viClose(vi) };
        wrap(status, ())
    }

    fn read(&self, vi: ViSession, buf: &mut [u8]) -> (Status, usize) {
        let cnt = buf.len().min(u32::MAX as usize) as u32;
        let mut ret: u32 = 0;
        let status = unsafe { self.api.viRead(vi, buf.as_mut_ptr(), cnt, &mut ret) };
        (Status::from_raw(status), ret as usize)
    }

    fn write(&self, vi: ViSession, buf: &[u8]) -> (Status, usize) {
        let cnt = buf.len().min(u32::MAX as usize) as u32;
        let mut ret: u32 = 0;
        let status = unsafe { self.api.viWrite(vi, buf.as_ptr(), cnt, &mut ret) };
        (Status::from_raw(status), ret as usize)
    }

    fn flush(&self, vi: ViSession, mask: u16) -> ViResult<()> {
        let status = unsafe { self.api.viFlush(vi, mask) };
        wrap(status, ())
    }

    fn get_attribute(&self, vi: ViObject, attr: ViAttr) -> ViResult<ViAttrState> {
        let mut value: ViAttrState = 0;
        let status = unsafe { self.api.viGetAttribute(vi, attr, &mut value) };
        wrap(status, value)
    }

    fn set_attribute(&self, vi: ViObject, attr: ViAttr, value: ViAttrState) -> ViResult<()> {
        let status = unsafe { self.api.viSetAttribute(vi, attr, value) };
        wrap(status, ())
    }

    fn clear(&self, vi: ViSession) -> ViResult<()> {
        let status = unsafe { self.api.viClear(vi) };
        wrap(status, ())
    }

    fn lock(
        &self,
        vi: ViSession,
        lock_type: ViAccessMode,
        timeout_ms: u32,
        requested_key: Option<&str>,
    ) -> ViResult<Option<String>> {
        let requested = match requested_key {
            Some(key) => Some(cstring(key)?),
            None => None,
        };
        // an access key is only produced for shared locks
        let exclusive = lock_type == consts::VI_EXCLUSIVE_LOCK;
        let mut key_buf = [0 as c_char; consts::VI_FIND_BUFLEN];
        let status = unsafe {
            self.api.viLock(
                vi,
                lock_type,
                timeout_ms,
                requested.as_ref().map_or(ptr::null(), |c| c.as_ptr()),
                if exclusive {
                    ptr::null_mut()
                } else {
                    key_buf.as_mut_ptr()
                },
            )
        };
        let key = if exclusive {
            None
        } else {
            Some(from_desc_buf(&key_buf))
        };
        wrap(status, key)
    }

    fn unlock(&self, vi: ViSession) -> ViResult<()> {
        let status = unsafe { self.api.viUnlock(vi) };
        wrap(status, ())
    }

    fn find_rsrc(&self, vi: ViSession, expression: &str) -> ViResult<(ViFindList, u32, String)> {
        let expression = cstring(expression)?;
        let mut list: ViFindList = 0;
        let mut count: u32 = 0;
        let mut desc = [0 as c_char; consts::VI_FIND_BUFLEN];
        let status = unsafe {
            self.api.viFindRsrc(
                vi,
                expression.as_ptr(),
                &mut list,
                &mut count,
                desc.as_mut_ptr(),
            )
        };
        wrap(status, (list, count, from_desc_buf(&desc)))
    }

    fn find_next(&self, list: ViFindList) -> ViResult<String> {
        let mut desc = [0 as c_char; consts::VI_FIND_BUFLEN];
        let status = unsafe { self.api.viFindNext(list, desc.as_mut_ptr()) };
        wrap(status, from_desc_buf(&desc))
    }

    fn parse_rsrc(&self, vi: ViSession, resource: &str) -> ViResult<(u16, u16)> {
        let resource = cstring(resource)?;
        let mut intf_type: u16 = 0;
        let mut intf_num: u16 = 0;
        let status = unsafe {
            self.api
                .viParseRsrc(vi, resource.as_ptr(), &mut intf_type, &mut intf_num)
        };
        wrap(status, (intf_type, intf_num))
    }

    fn assert_trigger(&self, vi: ViSession, protocol: u16) -> ViResult<()> {
        let status = unsafe { self.api.viAssertTrigger(vi, protocol) };
        wrap(status, ())
    }

    fn assert_intr_signal(&self, vi: ViSession, mode: i16, status_id: u32) -> ViResult<()> {
        let status = unsafe { self.api.viAssertIntrSignal(vi, mode, status_id) };
        wrap(status, ())
    }

    fn assert_util_signal(&self, vi: ViSession, line: u16) -> ViResult<()> {
        let status = unsafe { self.api.viAssertUtilSignal(vi, line) };
        wrap(status, ())
    }

    fn gpib_command(&self, vi: ViSession, data: &[u8]) -> (Status, usize) {
        let cnt = data.len().min(u32::MAX as usize) as u32;
        let mut ret: u32 = 0;
        let status = unsafe { self.api.viGpibCommand(vi, data.as_ptr(), cnt, &mut ret) };
        (Status::from_raw(status), ret as usize)
    }

    fn gpib_control_atn(&self, vi: ViSession, mode: u16) -> ViResult<()> {
        let status = unsafe { self.api.viGpibControlATN(vi, mode) };
        wrap(status, ())
    }

    fn gpib_control_ren(&self, vi: ViSession, mode: u16) -> ViResult<()> {
        let status = unsafe { self.api.viGpibControlREN(vi, mode) };
        wrap(status, ())
    }

    fn gpib_pass_control(&self, vi: ViSession, primary: u16, secondary: u16) -> ViResult<()> {
        let status = unsafe { self.api.viGpibPassControl(vi, primary, secondary) };
        wrap(status, ())
    }

    fn gpib_send_ifc(&self, vi: ViSession) -> ViResult<()> {
        let status = unsafe { self.api.viGpibSendIFC(vi) };
        wrap(status, ())
    }

    fn read_to_file(&self, vi: ViSession, path: &str, count: u32) -> (Status, u32) {
        let path = match cstring(path) {
            Ok(path) => path,
            Err(status) => return (status, 0),
        };
        let mut ret: u32 = 0;
        let status = unsafe { self.api.viReadToFile(vi, path.as_ptr(), count, &mut ret) };
        (Status::from_raw(status), ret)
    }

    fn write_from_file(&self, vi: ViSession, path: &str, count: u32) -> (Status, u32) {
        let path = match cstring(path) {
            Ok(path) => path,
            Err(status) => return (status, 0),
        };
        let mut ret: u32 = 0;
        let status = unsafe { self.api.viWriteFromFile(vi, path.as_ptr(), count, &mut ret) };
        (Status::from_raw(status), ret)
    }
}
