//! Recording native library for tests
//!
//! Pointers handed out are fake addresses and are never dereferenced. Every
//! call is recorded so tests can assert order and counts; return values come
//! from a [`Script`] that tests adjust before exercising the code.
//!
//! The error queue behaves like libcrypto's: a mocked call that fails pushes
//! [`Script::error_code`], and entries stay until they are cleared.

use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::{c_int, c_ulong, c_void, CStr};
use std::sync::Mutex;

use crate::native::ffi::{ENGINE, EVP_PKEY, UI_METHOD};
use crate::native::NativeLib;

pub const ENGINE_ADDR: usize = 0x1000;
pub const FIRST_KEY_ADDR: usize = 0x2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ErrPeekLastError,
    ErrErrorString(c_ulong),
    ErrClearError,
    EngineById(String),
    EngineCtrlCmdString {
        engine: usize,
        cmd: String,
        arg: String,
        optional: c_int,
    },
    EngineInit(usize),
    EngineFinish(usize),
    EngineFree(usize),
    EngineLoadPublicKey {
        engine: usize,
        key_id: String,
        null_ui: bool,
    },
    EngineLoadPrivateKey {
        engine: usize,
        key_id: String,
        null_ui: bool,
    },
    PkeyFree(usize),
    PkeyId(usize),
    PkeySize(usize),
}

/// Return values used by [`MockNativeLib`]
///
/// Defaults describe a healthy engine holding RSA-2048 keys.
#[derive(Debug, Clone)]
pub struct Script {
    /// Code pushed onto the error queue by each failing call
    pub error_code: c_ulong,
    pub error_message: String,
    /// Address returned by `engine_by_id`, 0 for null
    pub engine: usize,
    /// Per-command return of `engine_ctrl_cmd_string`; missing commands return 1
    pub ctrl_cmd: HashMap<String, c_int>,
    pub init: c_int,
    pub finish: c_int,
    pub free: c_int,
    /// Queued addresses for key loads; when empty a fresh address is used.
    /// A queued 0 makes the load return null.
    pub public_keys: VecDeque<usize>,
    pub private_keys: VecDeque<usize>,
    /// Key ids for which every load returns null
    pub unknown_key_ids: HashSet<String>,
    pub pkey_id: c_int,
    pub size: c_int,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            error_code: 1,
            error_message: "bla bla bla".to_string(),
            engine: ENGINE_ADDR,
            ctrl_cmd: HashMap::new(),
            init: 1,
            finish: 1,
            free: 1,
            public_keys: VecDeque::new(),
            private_keys: VecDeque::new(),
            unknown_key_ids: HashSet::new(),
            pkey_id: 6,
            size: 256,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockNativeLib {
    calls: Mutex<Vec<Call>>,
    script: Mutex<Script>,
    error_queue: Mutex<Vec<c_ulong>>,
    next_key: Mutex<usize>,
}

impl MockNativeLib {
    pub fn new() -> Self {
        Self {
            next_key: Mutex::new(FIRST_KEY_ADDR),
            ..Self::default()
        }
    }

    pub fn script(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    /// Push an entry onto the error queue without recording a call
    pub fn push_error(&self, code: c_ulong) {
        self.error_queue.lock().unwrap().push(code);
    }

    /// Push the scripted error code, as a failing native call would
    pub fn raise(&self) {
        let code = self.script.lock().unwrap().error_code;
        self.push_error(code);
    }

    pub fn queued_errors(&self) -> Vec<c_ulong> {
        self.error_queue.lock().unwrap().clone()
    }

    fn status(&self, rv: c_int) -> c_int {
        if rv != 1 {
            self.raise();
        }
        rv
    }

    fn positive(&self, rv: c_int) -> c_int {
        if rv <= 0 {
            self.raise();
        }
        rv
    }

    fn pointer<T>(&self, addr: usize) -> *mut T {
        if addr == 0 {
            self.raise();
        }
        addr as *mut T
    }

    /// A key address not handed out before
    pub fn fresh_key(&self) -> usize {
        let mut next = self.next_key.lock().unwrap();
        let addr = *next;
        *next += 0x10;
        addr
    }

    fn next_public(&self, key_id: &str) -> usize {
        let queued = {
            let mut script = self.script.lock().unwrap();
            if script.unknown_key_ids.contains(key_id) {
                return 0;
            }
            script.public_keys.pop_front()
        };
        queued.unwrap_or_else(|| self.fresh_key())
    }

    fn next_private(&self, key_id: &str) -> usize {
        let queued = {
            let mut script = self.script.lock().unwrap();
            if script.unknown_key_ids.contains(key_id) {
                return 0;
            }
            script.private_keys.pop_front()
        };
        queued.unwrap_or_else(|| self.fresh_key())
    }
}

fn text(s: &CStr) -> String {
    s.to_string_lossy().into_owned()
}

impl NativeLib for MockNativeLib {
    fn err_peek_last_error(&self) -> c_ulong {
        self.record(Call::ErrPeekLastError);
        self.error_queue.lock().unwrap().last().copied().unwrap_or(0)
    }

    fn err_clear_error(&self) {
        self.record(Call::ErrClearError);
        self.error_queue.lock().unwrap().clear();
    }

    fn err_error_string(&self, code: c_ulong) -> String {
        self.record(Call::ErrErrorString(code));
        self.script.lock().unwrap().error_message.clone()
    }

    fn engine_by_id(&self, id: &CStr) -> *mut ENGINE {
        self.record(Call::EngineById(text(id)));
        let addr = self.script.lock().unwrap().engine;
        self.pointer(addr)
    }

    unsafe fn engine_ctrl_cmd_string(
        &self,
        engine: *mut ENGINE,
        cmd_name: &CStr,
        arg: &CStr,
        cmd_optional: c_int,
    ) -> c_int {
        let cmd = text(cmd_name);
        self.record(Call::EngineCtrlCmdString {
            engine: engine as usize,
            cmd: cmd.clone(),
            arg: text(arg),
            optional: cmd_optional,
        });
        let rv = *self.script.lock().unwrap().ctrl_cmd.get(&cmd).unwrap_or(&1);
        self.status(rv)
    }

    unsafe fn engine_init(&self, engine: *mut ENGINE) -> c_int {
        self.record(Call::EngineInit(engine as usize));
        let rv = self.script.lock().unwrap().init;
        self.status(rv)
    }

    unsafe fn engine_finish(&self, engine: *mut ENGINE) -> c_int {
        self.record(Call::EngineFinish(engine as usize));
        let rv = self.script.lock().unwrap().finish;
        self.status(rv)
    }

    unsafe fn engine_free(&self, engine: *mut ENGINE) -> c_int {
        self.record(Call::EngineFree(engine as usize));
        let rv = self.script.lock().unwrap().free;
        self.status(rv)
    }

    unsafe fn engine_load_public_key(
        &self,
        engine: *mut ENGINE,
        key_id: &CStr,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY {
        let key_id = text(key_id);
        self.record(Call::EngineLoadPublicKey {
            engine: engine as usize,
            key_id: key_id.clone(),
            null_ui: ui_method.is_null() && callback_data.is_null(),
        });
        let addr = self.next_public(&key_id);
        self.pointer(addr)
    }

    unsafe fn engine_load_private_key(
        &self,
        engine: *mut ENGINE,
        key_id: &CStr,
        ui_method: *mut UI_METHOD,
        callback_data: *mut c_void,
    ) -> *mut EVP_PKEY {
        let key_id = text(key_id);
        self.record(Call::EngineLoadPrivateKey {
            engine: engine as usize,
            key_id: key_id.clone(),
            null_ui: ui_method.is_null() && callback_data.is_null(),
        });
        let addr = self.next_private(&key_id);
        self.pointer(addr)
    }

    unsafe fn evp_pkey_free(&self, key: *mut EVP_PKEY) {
        self.record(Call::PkeyFree(key as usize));
    }

    unsafe fn evp_pkey_id(&self, key: *const EVP_PKEY) -> c_int {
        self.record(Call::PkeyId(key as usize));
        let rv = self.script.lock().unwrap().pkey_id;
        self.positive(rv)
    }

    unsafe fn evp_pkey_size(&self, key: *const EVP_PKEY) -> c_int {
        self.record(Call::PkeySize(key as usize));
        let rv = self.script.lock().unwrap().size;
        self.positive(rv)
    }
}
