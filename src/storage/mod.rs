//!  Storage is organized through [session_storage::SessionStorageImpl].
//!  The basic idea is:
//!   - There is a single file under the application directory holding every saved session.
//!   - The file is a JSON array of `{seconds, timestamp}` objects, with the timestamp in epoch
//!     milliseconds. This is the same shape the browser version kept under `timerSessions`.
//!   - Sessions are only ever appended.

pub mod entities;
pub mod session_storage;
