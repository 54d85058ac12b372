//! Approval preferences
//!
//! Records which tools need a human confirmation before they run. The
//! conversation loop takes a store as `Arc<dyn ApprovalStore>`; there is no
//! global instance.

mod file;
mod memory;
mod traits;

pub use file::FileApprovalStore;
pub use memory::MemoryApprovalStore;
pub use traits::{ApprovalError, ApprovalRecord, ApprovalResult, ApprovalStore};
