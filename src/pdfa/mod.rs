//! PDF/A-3 archival requirements: the output intent with its ICC profile and
//! the invariant checks run before the file is finalized.

mod enforce;
mod icc;
mod intent;

pub use enforce::{ArchivalEnforcer, Violation};
pub use icc::IccProfile;
pub use intent::{GTS_PDFA1, write_output_intent};
