//! Bar sources and canonicalization.

pub mod canonicalize;
pub mod provider;

pub use canonicalize::{canonicalize, CanonicalBars, RejectedBar};
pub use provider::{BarSource, DataError, MemoryBarSource};
