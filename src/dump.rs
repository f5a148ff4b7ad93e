//! Textual dump/print routines. Generic doubly-linked-list and
//! error-reporting utilities stay out of scope for this module, but the
//! textual dump format itself is specified, so the boundary ring renders
//! it.
//!
//! Each core component already knows how to print its own state
//! (`FullyAssociativeTlb::dump`, `TlbHierarchy::dump`, `CacheHierarchy::dump`);
//! this module is the thin outer-ring piece that formats a single
//! virtual/physical address and assembles a labeled, full simulator-state
//! dump for the CLI's `--dump-on-halt` path.

use std::io::{self, Write};

use crate::addr::{PhysAddr, VirtAddr};
use crate::simulator::Simulator;

/// One-line rendering of a virtual address and its page-table indices.
pub fn format_vaddr(vaddr: VirtAddr) -> String {
    format!(
        "VADDR {vaddr}: PGD:{:#x} PUD:{:#x} PMD:{:#x} PTE:{:#x} OFFSET:{:#x}",
        vaddr.pgd, vaddr.pud, vaddr.pmd, vaddr.pte, vaddr.offset
    )
}

/// One-line rendering of a physical address and its frame/offset split.
pub fn format_paddr(paddr: PhysAddr) -> String {
    format!(
        "PADDR {paddr}: FRAME:{:#x} OFFSET:{:#x}",
        paddr.frame, paddr.offset
    )
}

/// Writes every TLB and cache level to `out`, each under its own labeled
/// section, in the `WAY/LINE: V: AGE: TAG: WORDS` / `LINE: V: TAG: FRAME`
/// format the per-level `dump` methods already produce.
pub fn dump_all(sim: &Simulator, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "=== TLB ===")?;
    sim.dump_tlb(out)?;
    writeln!(out, "=== CACHE ===")?;
    sim.dump_cache(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::PhysicalMemory;
    use crate::simulator::TlbMode;

    #[test]
    fn format_vaddr_includes_every_field() {
        let v = VirtAddr::encode(1, 2, 3, 4, 5).unwrap();
        let text = format_vaddr(v);
        assert!(text.contains("PGD:0x1"));
        assert!(text.contains("OFFSET:0x5"));
    }

    #[test]
    fn format_paddr_includes_frame_and_offset() {
        let p = PhysAddr::encode(0xABCDE, 0x123).unwrap();
        let text = format_paddr(p);
        assert!(text.contains("FRAME:0xabcde"));
        assert!(text.contains("OFFSET:0x123"));
    }

    #[test]
    fn dump_all_emits_both_sections() {
        let sim = Simulator::new(PhysicalMemory::new(4096), TlbMode::hierarchical());
        let mut out = Vec::new();
        dump_all(&sim, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("=== TLB ==="));
        assert!(text.contains("=== CACHE ==="));
    }
}
