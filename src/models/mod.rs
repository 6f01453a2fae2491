//! The data the server hands us. Nothing here does I/O; the status and label
//! derivations on `Invitation` are the one place every list goes through to
//! decide whether a pending invitation has quietly expired.

pub mod invitation;
pub mod notification;
pub mod user;
