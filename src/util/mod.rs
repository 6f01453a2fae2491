macro_rules! do_lock {
    ($lock:expr) => {{
        $lock.expect(concat!("rsvp::util::do_lock!() -- failed to grab lock at ", file!(), "::", line!()))
    }}
}

/// Grab a Mutex. A poisoned lock means some thread already panicked holding
/// it, so we go down with it.
#[macro_export]
macro_rules! lock {
    ($lockable:expr) => { do_lock!($lockable.lock()) }
}

/// Read-lock an RwLock
#[macro_export]
macro_rules! lockr {
    ($lockable:expr) => { do_lock!($lockable.read()) }
}

/// Write-lock an RwLock
#[macro_export]
macro_rules! lockw {
    ($lockable:expr) => { do_lock!($lockable.write()) }
}

pub mod event;
pub mod logger;
pub mod reltime;
pub mod ser;
