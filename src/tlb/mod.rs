//! Address-translation caching: either a single fully-associative
//! reference-mode TLB, or the split-L1/unified-L2 direct-mapped
//! hierarchy, selected at simulator construction time.

mod fully_associative;
mod hierarchy;

pub use fully_associative::FullyAssociativeTlb;
pub use hierarchy::{AccessKind, TlbHierarchy};
