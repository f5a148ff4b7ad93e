//! The split-L1/unified-L2 exclusive cache hierarchy, built from generic
//! per-level [`SetAssociativeCache`] instances.

mod hierarchy;
mod levels;

pub use hierarchy::{AccessKind, CacheHierarchy};
pub use levels::{Line, SetAssociativeCache};
