//! Message splitting and reassembly for transparent large-message transport.
//!
//! The [`Splitter`] turns one application message into one or more frames and
//! the [`ReassemblyTable`] rebuilds multi-part messages on the receiving side.
//! Both are transport-agnostic so the proxy and its tests can drive them
//! directly.

pub mod error;
pub mod splitter;
pub mod table;

pub use error::{MalformedFrame, ReassemblyError, SplitError};
pub use splitter::{FrameBatch, Splitter};
pub use table::{Assembly, ReassemblyTable};

#[cfg(test)]
mod tests;
