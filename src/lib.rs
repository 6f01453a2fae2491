#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;

#[macro_use]
pub mod error;
#[macro_use]
pub mod util;
pub mod api;
pub mod models;
pub mod gateway;
pub mod session;
pub mod store;
pub mod notifications;
pub mod rsvp;
pub mod dispatch;

use std::sync::{Arc, RwLock};

use jedi::Value;

use crate::error::{RError, RResult};
use crate::rsvp::Rsvp;

lazy_static! {
    /// The app state the C api talks to. Rust embedders can skip this and
    /// hold their own `Rsvp`.
    static ref RSVP: RwLock<Option<Arc<Rsvp>>> = RwLock::new(None);
}

/// Init any state/logging/etc the app needs.
///
/// NOTE: we have two configs. Our runtime config, which is passed in here as a
/// JSON string, and our app config loaded from config.yaml (or wherever
/// `config_file`/`$RSVP_CONFIG_FILE` point). The runtime config is merged over
/// the app config, so the embedder has the last word.
pub fn init(config_str: &str) -> RResult<()> {
    let runtime_config: Value = match jedi::parse(config_str) {
        Ok(x) => x,
        Err(e) => {
            println!("Problem parsing runtime config: {}", e);
            jedi::obj()
        }
    };
    let config_location: Option<String> = jedi::get_opt(&["config_file"], &runtime_config);
    config::load_config(config_location)?;
    config::merge(&runtime_config)?;
    util::logger::setup_logger()?;
    log_panics::init();
    Ok(())
}

/// Init, then build the global app state around the real api
pub fn start(config_str: &str) -> RResult<()> {
    init(config_str)?;
    let rsvp = Arc::new(Rsvp::with_api()?);
    info!("main::start() -- core started, endpoint {:?}", config::get::<String>(&["api", "endpoint"]).ok());
    *lockw!(RSVP) = Some(rsvp);
    Ok(())
}

/// Run a message through the global app state's dispatcher
pub fn send(msg: &str) -> RResult<String> {
    let rsvp = match lockr!(RSVP).as_ref() {
        Some(x) => x.clone(),
        None => return RErr!(RError::MissingData(String::from("core not started"))),
    };
    dispatch::process(&rsvp, msg)
}

// -----------------------------------------------------------------------------
// our C api
// -----------------------------------------------------------------------------
pub mod c_api {
    use super::*;
    use std::ffi::{CStr, CString};
    use std::os::raw::c_char;
    use std::panic;
    use std::ptr;

    lazy_static! {
        static ref LAST_ERR: RwLock<Option<String>> = RwLock::new(None);
    }

    macro_rules! cerror {
        ($( $arg:tt ),* ) => {{
            let errstr = format!($( $arg ),*);
            error!("{}", errstr);
            let mut guard = lockw!(*LAST_ERR);
            *guard = Some(errstr);
            drop(guard);
        }}
    }

    fn from_c<'a>(cstr: *const c_char) -> Result<&'a str, String> {
        if cstr.is_null() {
            return Err(String::from("null string given"));
        }
        unsafe { CStr::from_ptr(cstr) }.to_str().map_err(|e| format!("{}", e))
    }

    #[no_mangle]
    pub extern "C" fn rsvpc_start(config_c: *const c_char) -> i32 {
        let res = panic::catch_unwind(|| -> i32 {
            let config = match from_c(config_c) {
                Ok(x) => x,
                Err(e) => {
                    cerror!("rsvpc_start() -- error: parsing config: {}", e);
                    return -1;
                }
            };
            match start(config) {
                Ok(_) => 0,
                Err(e) => {
                    cerror!("rsvpc_start() -- error: start(): {}", e);
                    -2
                }
            }
        });
        match res {
            Ok(x) => x,
            Err(e) => {
                cerror!("rsvpc_start() -- panic: {:?}", e);
                -5
            }
        }
    }

    /// Process a message and hand back the response as a C string. Returns
    /// null on error (see `rsvpc_lasterr()`); free the result with
    /// `rsvpc_free()`.
    #[no_mangle]
    pub extern "C" fn rsvpc_send(msg_c: *const c_char) -> *mut c_char {
        let res = panic::catch_unwind(|| -> *mut c_char {
            let msg = match from_c(msg_c) {
                Ok(x) => x,
                Err(e) => {
                    cerror!("rsvpc_send() -- bad message: {}", e);
                    return ptr::null_mut();
                }
            };
            let out = match send(msg) {
                Ok(x) => x,
                Err(e) => {
                    cerror!("rsvpc_send() -- error: {}", e);
                    return ptr::null_mut();
                }
            };
            match CString::new(out) {
                Ok(x) => x.into_raw(),
                Err(e) => {
                    cerror!("rsvpc_send() -- response has a null: {}", e);
                    ptr::null_mut()
                }
            }
        });
        match res {
            Ok(x) => x,
            Err(e) => {
                cerror!("rsvpc_send() -- panic: {:?}", e);
                ptr::null_mut()
            }
        }
    }

    #[no_mangle]
    pub extern "C" fn rsvpc_free(msg: *mut c_char) -> i32 {
        if msg.is_null() {
            return -1;
        }
        unsafe { drop(CString::from_raw(msg)) };
        0
    }

    #[no_mangle]
    pub extern "C" fn rsvpc_lasterr() -> *mut c_char {
        let guard = lockr!(*LAST_ERR);
        match guard.as_ref() {
            Some(errstr) => match CString::new(errstr.as_str()) {
                Ok(x) => x.into_raw(),
                Err(_) => ptr::null_mut(),
            },
            None => ptr::null_mut(),
        }
    }
}
