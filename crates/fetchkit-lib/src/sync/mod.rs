//! Keeping text and tree in step.
//!
//! [`SyncCoordinator`] decides which direction may run, [`Session`] drives
//! both directions for one [`EditorHost`].

mod clock;
mod coordinator;
mod editor;
mod session;


pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{SyncCoordinator, SyncDirection, SyncGuard};
pub use editor::{EditorHost, MemoryEditor};
pub use session::Session;
