//! Location access: the platform seam, a manual platform for the CLI, the
//! persisted last-known location and the permission state machine.

mod accessor;
mod manual;
mod permission;
mod store;

pub use accessor::*;
pub use manual::*;
pub use permission::*;
pub use store::*;
