//! Scripted in-memory implementation of the VISA boundary, so the adapter
//! paths can be exercised without an installed runtime or instruments.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::consts;
use crate::visa::status::Status;
use crate::visa::{ViAttr, ViAttrState, ViFindList, ViObject, ViResult, ViSession, VisaLibrary};

/// One observed runtime call, for asserting on call sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetAttr(ViSession, ViAttr, ViAttrState),
    Flush(ViSession, u16),
    Clear(ViSession),
    Lock(ViSession, u32),
    Unlock(ViSession),
    AssertTrigger(ViSession, u16),
    AssertIntrSignal(ViSession, i16, u32),
    AssertUtilSignal(ViSession, u16),
    GpibCommand(ViSession, Vec<u8>),
    GpibControlAtn(ViSession, u16),
    GpibControlRen(ViSession, u16),
    GpibPassControl(ViSession, u16, u16),
    GpibSendIfc(ViSession),
    ReadToFile(ViSession, String, u32),
    WriteFromFile(ViSession, String, u32),
}

struct FakeSession {
    attrs: HashMap<ViAttr, ViAttrState>,
    read_queue: VecDeque<u8>,
    written: Vec<u8>,
    forced_read: Option<Status>,
    fail_set: HashMap<ViAttr, Status>,
    fail_get: HashMap<ViAttr, Status>,
    fail_close: bool,
}

impl FakeSession {
    fn new() -> FakeSession {
        let mut attrs = HashMap::new();
        attrs.insert(consts::VI_ATTR_TMO_VALUE, 2000);
        attrs.insert(consts::VI_ATTR_ASRL_BAUD, 9600);
        attrs.insert(consts::VI_ATTR_ASRL_PARITY, consts::VI_ASRL_PAR_NONE);
        attrs.insert(consts::VI_ATTR_ASRL_DATA_BITS, 8);
        attrs.insert(consts::VI_ATTR_ASRL_STOP_BITS, consts::VI_ASRL_STOP_ONE);
        attrs.insert(consts::VI_ATTR_ASRL_FLOW_CNTRL, consts::VI_ASRL_FLOW_NONE);
        attrs.insert(consts::VI_ATTR_ASRL_XON_CHAR, 0x11);
        attrs.insert(consts::VI_ATTR_ASRL_XOFF_CHAR, 0x13);
        attrs.insert(consts::VI_ATTR_ASRL_AVAIL_NUM, 0);
        FakeSession {
            attrs,
            read_queue: VecDeque::new(),
            written: Vec::new(),
            forced_read: None,
            fail_set: HashMap::new(),
            fail_get: HashMap::new(),
            fail_close: false,
        }
    }
}

#[derive(Default)]
struct Inner {
    next_handle: ViSession,
    sessions: HashMap<ViSession, FakeSession>,
    resources: Vec<String>,
    find_lists: HashMap<ViFindList, VecDeque<String>>,
    calls: Vec<Call>,
}

impl Inner {
    fn alloc_handle(&mut self) -> ViSession {
        self.next_handle += 1;
        self.next_handle
    }

    fn session(&mut self, vi: ViSession) -> Result<&mut FakeSession, Status> {
        self.sessions.get_mut(&vi).ok_or(Status::InvalidObject)
    }
}

/// In-memory stand-in for the VISA runtime.
pub struct FakeVisa {
    inner: Mutex<Inner>,
}

impl FakeVisa {
    pub fn with_resources(resources: &[&str]) -> FakeVisa {
        let inner = Inner {
            resources: resources.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        };
        FakeVisa {
            inner: Mutex::new(inner),
        }
    }

    pub fn push_read_data(&self, vi: ViSession, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        let session = inner.session(vi).unwrap();
        session.read_queue.extend(data.iter().copied());
    }

    pub fn written(&self, vi: ViSession) -> Vec<u8> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi).unwrap().written.clone()
    }

    pub fn attr(&self, vi: ViSession, attr: ViAttr) -> ViAttrState {
        let mut inner = self.inner.lock().unwrap();
        *inner.session(vi).unwrap().attrs.get(&attr).unwrap_or(&0)
    }

    pub fn set_attr(&self, vi: ViSession, attr: ViAttr, value: ViAttrState) {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi).unwrap().attrs.insert(attr, value);
    }

    pub fn fail_set_attr(&self, vi: ViSession, attr: ViAttr, status: Status) {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi).unwrap().fail_set.insert(attr, status);
    }

    pub fn fail_get_attr(&self, vi: ViSession, attr: ViAttr, status: Status) {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi).unwrap().fail_get.insert(attr, status);
    }

    pub fn force_read_status(&self, vi: ViSession, status: Status) {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi).unwrap().forced_read = Some(status);
    }

    pub fn fail_close(&self, vi: ViSession, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi).unwrap().fail_close = fail;
    }

    pub fn is_open(&self, vi: ViSession) -> bool {
        self.inner.lock().unwrap().sessions.contains_key(&vi)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// The attribute writes issued against `vi`, in order.
    pub fn attr_writes(&self, vi: ViSession) -> Vec<(ViAttr, ViAttrState)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetAttr(session, attr, value) if session == vi => Some((attr, value)),
                _ => None,
            })
            .collect()
    }
}

impl VisaLibrary for FakeVisa {
    fn open_default_rm(&self) -> ViResult<ViSession> {
        let mut inner = self.inner.lock().unwrap();
        let vi = inner.alloc_handle();
        inner.sessions.insert(vi, FakeSession::new());
        Ok((Status::Success, vi))
    }

    fn open(
        &self,
        parent: ViSession,
        resource: &str,
        _access_mode: u32,
        _open_timeout_ms: u32,
    ) -> ViResult<ViObject> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.sessions.contains_key(&parent) {
            return Err(Status::InvalidObject);
        }
        if !inner.resources.iter().any(|r| r == resource) {
            return Err(Status::ResourceNotFound);
        }
        let vi = inner.alloc_handle();
        inner.sessions.insert(vi, FakeSession::new());
        Ok((Status::Success, vi))
    }

    fn close(&self, vi: ViObject) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.find_lists.remove(&vi).is_some() {
            return Ok((Status::Success, ()));
        }
        match inner.sessions.get(&vi) {
            Some(session) if session.fail_close => Err(Status::ResourceBusy),
            Some(_) => {
                inner.sessions.remove(&vi);
                Ok((Status::Success, ()))
            }
            None => Err(Status::InvalidObject),
        }
    }

    fn read(&self, vi: ViSession, buf: &mut [u8]) -> (Status, usize) {
        let mut inner = self.inner.lock().unwrap();
        let session = match inner.session(vi) {
            Ok(session) => session,
            Err(status) => return (status, 0),
        };
        if let Some(status) = session.forced_read.take() {
            return (status, 0);
        }
        if buf.is_empty() {
            return (Status::Success, 0);
        }
        let count = buf.len().min(session.read_queue.len());
        for slot in buf.iter_mut().take(count) {
            *slot = session.read_queue.pop_front().unwrap();
        }
        if count < buf.len() {
            // the device ran dry before the buffer filled
            (Status::Timeout, count)
        } else {
            (Status::SuccessMaxCount, count)
        }
    }

    fn write(&self, vi: ViSession, buf: &[u8]) -> (Status, usize) {
        let mut inner = self.inner.lock().unwrap();
        let session = match inner.session(vi) {
            Ok(session) => session,
            Err(status) => return (status, 0),
        };
        session.written.extend_from_slice(buf);
        (Status::Success, buf.len())
    }

    fn flush(&self, vi: ViSession, mask: u16) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::Flush(vi, mask));
        Ok((Status::Success, ()))
    }

    fn get_attribute(&self, vi: ViObject, attr: ViAttr) -> ViResult<ViAttrState> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner.session(vi)?;
        if let Some(status) = session.fail_get.get(&attr) {
            return Err(*status);
        }
        Ok((Status::Success, *session.attrs.get(&attr).unwrap_or(&0)))
    }

    fn set_attribute(&self, vi: ViObject, attr: ViAttr, value: ViAttrState) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::SetAttr(vi, attr, value));
        let session = inner.session(vi)?;
        if let Some(status) = session.fail_set.get(&attr) {
            return Err(*status);
        }
        session.attrs.insert(attr, value);
        Ok((Status::Success, ()))
    }

    fn clear(&self, vi: ViSession) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::Clear(vi));
        Ok((Status::Success, ()))
    }

    fn lock(
        &self,
        vi: ViSession,
        lock_type: u32,
        _timeout_ms: u32,
        requested_key: Option<&str>,
    ) -> ViResult<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::Lock(vi, lock_type));
        if lock_type == consts::VI_EXCLUSIVE_LOCK {
            Ok((Status::Success, None))
        } else {
            let key = requested_key.unwrap_or("shared_key_1").to_string();
            Ok((Status::Success, Some(key)))
        }
    }

    fn unlock(&self, vi: ViSession) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::Unlock(vi));
        Ok((Status::Success, ()))
    }

    fn find_rsrc(&self, vi: ViSession, expression: &str) -> ViResult<(ViFindList, u32, String)> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        let prefix = expression
            .split(|c| c == '?' || c == '*')
            .next()
            .unwrap_or("");
        let matching: Vec<String> = inner
            .resources
            .iter()
            .filter(|r| r.starts_with(prefix))
            .cloned()
            .collect();
        if matching.is_empty() {
            return Err(Status::ResourceNotFound);
        }
        let list = inner.alloc_handle();
        let count = matching.len() as u32;
        let first = matching[0].clone();
        inner
            .find_lists
            .insert(list, matching.into_iter().skip(1).collect());
        Ok((Status::Success, (list, count, first)))
    }

    fn find_next(&self, list: ViFindList) -> ViResult<String> {
        let mut inner = self.inner.lock().unwrap();
        let entries = inner.find_lists.get_mut(&list).ok_or(Status::InvalidObject)?;
        match entries.pop_front() {
            Some(name) => Ok((Status::Success, name)),
            None => Err(Status::ResourceNotFound),
        }
    }

    fn parse_rsrc(&self, vi: ViSession, resource: &str) -> ViResult<(u16, u16)> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        let kinds: [(&str, u16); 4] = [
            ("ASRL", consts::VI_INTF_ASRL),
            ("GPIB", consts::VI_INTF_GPIB),
            ("TCPIP", consts::VI_INTF_TCPIP),
            ("USB", consts::VI_INTF_USB),
        ];
        for (prefix, interface) in kinds.iter() {
            if let Some(rest) = resource.strip_prefix(prefix) {
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                let number = digits.parse().unwrap_or(0);
                return Ok((Status::Success, (*interface, number)));
            }
        }
        Err(Status::InvalidResourceName)
    }

    fn assert_trigger(&self, vi: ViSession, protocol: u16) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::AssertTrigger(vi, protocol));
        Ok((Status::Success, ()))
    }

    fn assert_intr_signal(&self, vi: ViSession, mode: i16, status_id: u32) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::AssertIntrSignal(vi, mode, status_id));
        Ok((Status::Success, ()))
    }

    fn assert_util_signal(&self, vi: ViSession, line: u16) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::AssertUtilSignal(vi, line));
        Ok((Status::Success, ()))
    }

    fn gpib_command(&self, vi: ViSession, data: &[u8]) -> (Status, usize) {
        let mut inner = self.inner.lock().unwrap();
        if inner.session(vi).is_err() {
            return (Status::InvalidObject, 0);
        }
        inner.calls.push(Call::GpibCommand(vi, data.to_vec()));
        (Status::Success, data.len())
    }

    fn gpib_control_atn(&self, vi: ViSession, mode: u16) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::GpibControlAtn(vi, mode));
        Ok((Status::Success, ()))
    }

    fn gpib_control_ren(&self, vi: ViSession, mode: u16) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::GpibControlRen(vi, mode));
        Ok((Status::Success, ()))
    }

    fn gpib_pass_control(&self, vi: ViSession, primary: u16, secondary: u16) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::GpibPassControl(vi, primary, secondary));
        Ok((Status::Success, ()))
    }

    fn gpib_send_ifc(&self, vi: ViSession) -> ViResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.session(vi)?;
        inner.calls.push(Call::GpibSendIfc(vi));
        Ok((Status::Success, ()))
    }

    fn read_to_file(&self, vi: ViSession, path: &str, count: u32) -> (Status, u32) {
        let mut inner = self.inner.lock().unwrap();
        if inner.session(vi).is_err() {
            return (Status::InvalidObject, 0);
        }
        inner.calls.push(Call::ReadToFile(vi, path.to_string(), count));
        (Status::Success, count)
    }

    fn write_from_file(&self, vi: ViSession, path: &str, count: u32) -> (Status, u32) {
        let mut inner = self.inner.lock().unwrap();
        if inner.session(vi).is_err() {
            return (Status::InvalidObject, 0);
        }
        inner
            .calls
            .push(Call::WriteFromFile(vi, path.to_string(), count));
        (Status::Success, count)
    }
}
