use std::error::Error;
use std::convert::From;

use jedi::JSONError;

quick_error! {
    #[derive(Debug)]
    /// The core's main error object.
    pub enum RError {
        Boxed(err: Box<dyn Error + Send + Sync>) {
            description("boxed error")
            display("error: {}", err)
        }
        Msg(str: String) {
            description(str)
            display("error: {}", str)
        }
        BadValue(str: String) {
            description(str)
            display("bad value: {}", str)
        }
        MissingField(str: String) {
            description(str)
            display("missing field: {}", str)
        }
        MissingData(str: String) {
            description(str)
            display("missing data: {}", str)
        }
        MissingCommand(str: String) {
            description(str)
            display("unknown command: {}", str)
        }
        Json(err: JSONError) {
            cause(err)
            description("JSON error")
            display("JSON error: {}", err)
        }
        Transport(str: String) {
            description(str)
            display("transport error: {}", str)
        }
        Api(status: u16, msg: String) {
            description("API error")
            display("api error ({}): {}", status, msg)
        }
        NotAuthenticated {
            description("not authenticated")
            display("not authenticated")
        }
    }
}

impl RError {
    /// The string we show a human. Server messages pass through untouched,
    /// everything else gets its display form.
    pub fn human(&self) -> String {
        match *self {
            RError::Api(status, ref msg) => {
                if msg.trim().is_empty() {
                    format!("request failed with status {}", status)
                } else {
                    msg.clone()
                }
            }
            RError::Msg(ref msg) => msg.clone(),
            RError::Transport(ref msg) => msg.clone(),
            _ => format!("{}", self),
        }
    }
}

/// converts non-RError errors to RError, via the From trait.
#[macro_export]
macro_rules! torerr {
    ($e:expr) => (
        {
            let err: $crate::error::RError = From::from($e);
            err
        }
    )
}

/// Return an error, or blow up if we're built with `panic-on-error` (nice for
/// tracking down where an error started)
#[macro_export]
macro_rules! RErr {
    ($e:expr) => (
        {
            let err: $crate::error::RError = $e;
            if cfg!(feature = "panic-on-error") {
                panic!("{:?}", err);
            }
            Err(err)
        }
    )
}

/// A macro to make it easy to create From impls for RError
macro_rules! from_err {
    ($t:ty) => (
        impl From<$t> for RError {
            fn from(err: $t) -> RError {
                RError::Boxed(Box::new(err))
            }
        }
    )
}

impl From<JSONError> for RError {
    fn from(err: JSONError) -> RError {
        match err {
            JSONError::Boxed(x) => RError::Boxed(x),
            _ => RError::Json(err),
        }
    }
}
impl From<::serde_json::Error> for RError {
    fn from(err: ::serde_json::Error) -> RError {
        RError::Json(JSONError::Parse(err))
    }
}
impl From<::reqwest::Error> for RError {
    fn from(err: ::reqwest::Error) -> RError {
        if err.is_timeout() {
            RError::Transport(String::from("the server took too long to respond"))
        } else if err.is_connect() {
            RError::Transport(String::from("unable to reach the server"))
        } else {
            RError::Transport(format!("{}", err))
        }
    }
}
from_err!(::std::io::Error);
from_err!(::url::ParseError);

pub type RResult<T> = Result<T, RError>;

/// A helper to make reporting errors easier
#[macro_export]
macro_rules! try_or {
    ($ex:expr, $sym:ident, $err:expr) => {
        match $ex {
            Ok(_) => (),
            Err($sym) => {
                $err;
            },
        }
    }
}
