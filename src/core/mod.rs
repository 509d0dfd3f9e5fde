//! Core types: the invoice record, assembly options, clock and errors.

mod clock;
mod error;
mod options;
mod record;

pub use clock::*;
pub use error::*;
pub use options::*;
pub use record::*;
