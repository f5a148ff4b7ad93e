//! The top-level simulator context: the "read/write orchestration"
//! component. `Simulator` owns simulated physical memory, the selected
//! TLB organization, and the cache hierarchy, and is the only thing in
//! the boundary ring that mutates any of them -- component routines
//! receive exclusive `&mut` access for the duration of a call, nothing
//! else touches this state concurrently.
//!
//! A command is serviced in two stages: [`Simulator::translate`] resolves
//! the virtual address through whichever TLB is configured, falling back
//! to [`page_walk::translate`] on a full miss; the resulting physical
//! address is then handed to the [`CacheHierarchy`] to actually read or
//! write the word or byte, write-through included.

use std::io;

use crate::addr::{PhysAddr, VirtAddr};
use crate::cache::{AccessKind as CacheAccessKind, CacheHierarchy};
use crate::command::{AccessType, Command, DataSize, Order, Program};
use crate::constants::FA_TLB_SLOTS;
use crate::error::{HitOrMiss, Result};
use crate::memory::PhysicalMemory;
use crate::page_walk;
use crate::tlb::{AccessKind as TlbAccessKind, FullyAssociativeTlb, TlbHierarchy};

/// Which TLB organization backs address translation: the direct-mapped
/// split/unified hierarchy, or the fully-associative reference mode.
pub enum TlbMode {
    FullyAssociative(FullyAssociativeTlb),
    Hierarchical(TlbHierarchy),
}

impl TlbMode {
    pub fn fully_associative() -> Self {
        TlbMode::FullyAssociative(FullyAssociativeTlb::new(FA_TLB_SLOTS))
    }

    pub fn hierarchical() -> Self {
        TlbMode::Hierarchical(TlbHierarchy::new())
    }

    fn dump(&self, out: &mut dyn io::Write) -> io::Result<()> {
        match self {
            TlbMode::FullyAssociative(tlb) => tlb.dump(out),
            TlbMode::Hierarchical(tlb) => tlb.dump(out),
        }
    }
}

fn to_cache_kind(access: AccessType) -> CacheAccessKind {
    match access {
        AccessType::Instruction => CacheAccessKind::Instruction,
        AccessType::Data => CacheAccessKind::Data,
    }
}

fn to_tlb_kind(access: AccessType) -> TlbAccessKind {
    match access {
        AccessType::Instruction => TlbAccessKind::Instruction,
        AccessType::Data => TlbAccessKind::Data,
    }
}

/// The outcome of one [`Command`], carrying enough hit/miss detail for the
/// driver to log or trace without re-deriving it.
#[derive(Debug, Clone, Copy)]
pub struct AccessOutcome {
    pub paddr: PhysAddr,
    /// Whether the TLB itself resolved the address (`Miss` means the
    /// page-walker ran).
    pub tlb: HitOrMiss,
    pub cache_l1: HitOrMiss,
    pub cache_l2: HitOrMiss,
    /// `Some` for reads (the byte or word delivered to the caller, the
    /// byte case left zero-extended in the low 8 bits); `None` for writes.
    pub read_value: Option<u32>,
}

/// Owns every piece of simulator state and is the sole entry point that
/// mutates it.
pub struct Simulator {
    mem: PhysicalMemory,
    tlb: TlbMode,
    cache: CacheHierarchy,
}

impl Simulator {
    pub fn new(mem: PhysicalMemory, tlb: TlbMode) -> Self {
        Simulator {
            mem,
            tlb,
            cache: CacheHierarchy::new(),
        }
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.mem
    }

    /// Re-initializes the TLB and cache to their all-invalid state,
    /// keeping the current TLB mode and the simulated memory contents.
    /// TLB and cache structures are allocated zero-initialized and
    /// flushed on command.
    pub fn flush(&mut self) {
        self.tlb = match self.tlb {
            TlbMode::FullyAssociative(_) => TlbMode::fully_associative(),
            TlbMode::Hierarchical(_) => TlbMode::hierarchical(),
        };
        self.cache = CacheHierarchy::new();
        debug!("flushed all TLB and cache state");
    }

    /// Resolves `vaddr` to a physical address, consulting the configured
    /// TLB first and falling back to the page-walker on a full miss,
    /// installing the freshly walked translation back into the TLB.
    fn translate(&mut self, access: AccessType, vaddr: VirtAddr) -> Result<(PhysAddr, HitOrMiss)> {
        let vpn = vaddr.vpn();
        let resolved_frame = match &mut self.tlb {
            TlbMode::FullyAssociative(tlb) => tlb.lookup(vpn),
            TlbMode::Hierarchical(tlb) => tlb.lookup(to_tlb_kind(access), vpn).2,
        };
        if let Some(frame) = resolved_frame {
            return Ok((PhysAddr::encode(frame, vaddr.offset)?, HitOrMiss::Hit));
        }

        let paddr = page_walk::translate(&self.mem, vaddr)?;
        match &mut self.tlb {
            TlbMode::FullyAssociative(tlb) => {
                if let Some((evicted_vpn, evicted_frame)) = tlb.insert(vpn, paddr.frame) {
                    debug!("FA-TLB evicted VPN={evicted_vpn:#x} frame={evicted_frame:#x}");
                }
            }
            TlbMode::Hierarchical(tlb) => tlb.fill(to_tlb_kind(access), vpn, paddr.frame),
        }
        Ok((paddr, HitOrMiss::Miss))
    }

    /// Services one [`Command`] end to end: translate, then read or write
    /// through the cache hierarchy (write-through for stores).
    pub fn execute(&mut self, cmd: Command) -> Result<AccessOutcome> {
        let (paddr, tlb) = self.translate(cmd.access, cmd.vaddr)?;
        let cache_kind = to_cache_kind(cmd.access);

        let (read_value, cache_l1, cache_l2) = match (cmd.order, cmd.data_size) {
            (Order::Read, DataSize::Word) => {
                let (word, l1, l2) = self.cache.read_word(cache_kind, &self.mem, paddr)?;
                (Some(word), l1, l2)
            }
            (Order::Read, DataSize::Byte) => {
                let (byte, l1, l2) = self.cache.read_byte(cache_kind, &self.mem, paddr)?;
                (Some(byte as u32), l1, l2)
            }
            (Order::Write, DataSize::Word) => {
                let (l1, l2) =
                    self.cache
                        .write_word(cache_kind, &mut self.mem, paddr, cmd.write_data)?;
                (None, l1, l2)
            }
            (Order::Write, DataSize::Byte) => {
                let (l1, l2) = self.cache.write_byte(
                    cache_kind,
                    &mut self.mem,
                    paddr,
                    cmd.write_data as u8,
                )?;
                (None, l1, l2)
            }
        };

        Ok(AccessOutcome {
            paddr,
            tlb,
            cache_l1,
            cache_l2,
            read_value,
        })
    }

    /// Runs every command in `program` in program order, never reordered,
    /// stopping at the first error: the driver prints the error code and
    /// the offending command and halts the run.
    pub fn run(&mut self, program: &Program) -> Result<Vec<AccessOutcome>> {
        let mut outcomes = Vec::with_capacity(program.commands.len());
        for cmd in &program.commands {
            outcomes.push(self.execute(*cmd)?);
        }
        Ok(outcomes)
    }

    pub fn dump_tlb(&self, out: &mut dyn io::Write) -> io::Result<()> {
        self.tlb.dump(out)
    }

    pub fn dump_cache(&self, out: &mut dyn io::Write) -> io::Result<()> {
        self.cache.dump(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{AccessType, Command, DataSize, Order};
    use crate::constants::PAGE_SIZE;

    fn identity_mapped_mem() -> PhysicalMemory {
        // PGD[0] -> PUD table, PUD[0] -> PMD table, PMD[0] -> PTE table,
        // PTE[0] -> frame 1 (frame 0 is unusable: a zero PTE word means
        // "unmapped", so the lowest frame a leaf entry can name is 1).
        // vaddr `offset` then maps onto paddr `0x1000 + offset`.
        let mut mem = PhysicalMemory::new(8 * PAGE_SIZE);
        mem.write_word(0, PAGE_SIZE as u32).unwrap();
        mem.write_word(PAGE_SIZE, 2 * PAGE_SIZE as u32).unwrap();
        mem.write_word(2 * PAGE_SIZE, 3 * PAGE_SIZE as u32).unwrap();
        mem.write_word(3 * PAGE_SIZE, PAGE_SIZE as u32).unwrap();
        mem
    }

    #[test]
    fn write_then_read_round_trips_through_the_cache() {
        let mut sim = Simulator::new(identity_mapped_mem(), TlbMode::hierarchical());
        let vaddr = VirtAddr::decode(0x40);
        let write = Command::new(Order::Write, AccessType::Data, DataSize::Word, 0xCAFEBABE, vaddr)
            .unwrap();
        sim.execute(write).unwrap();

        let read = Command::new(Order::Read, AccessType::Data, DataSize::Word, 0, vaddr).unwrap();
        let outcome = sim.execute(read).unwrap();
        assert_eq!(outcome.read_value, Some(0xCAFEBABE));
        assert_eq!(outcome.cache_l1, HitOrMiss::Hit);

        // Write-through: memory reflects the write regardless of caching.
        assert_eq!(
            sim.memory().read_word(PAGE_SIZE + 0x40).unwrap(),
            0xCAFEBABE
        );
    }

    #[test]
    fn repeat_translation_hits_the_tlb() {
        let mut sim = Simulator::new(identity_mapped_mem(), TlbMode::fully_associative());
        let vaddr = VirtAddr::decode(0x100);
        let cmd = Command::new(Order::Read, AccessType::Data, DataSize::Byte, 0, vaddr).unwrap();
        let first = sim.execute(cmd).unwrap();
        assert_eq!(first.tlb, HitOrMiss::Miss);
        let second = sim.execute(cmd).unwrap();
        assert_eq!(second.tlb, HitOrMiss::Hit);
    }

    #[test]
    fn unmapped_address_propagates_address_error() {
        let mem = PhysicalMemory::new(8 * PAGE_SIZE);
        let mut sim = Simulator::new(mem, TlbMode::hierarchical());
        let vaddr = VirtAddr::decode(0x1000);
        let cmd = Command::new(Order::Read, AccessType::Data, DataSize::Byte, 0, vaddr).unwrap();
        let err = sim.execute(cmd).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Addr);
    }

    #[test]
    fn flush_clears_cached_translations() {
        let mut sim = Simulator::new(identity_mapped_mem(), TlbMode::fully_associative());
        let vaddr = VirtAddr::decode(0x100);
        let cmd = Command::new(Order::Read, AccessType::Data, DataSize::Byte, 0, vaddr).unwrap();
        sim.execute(cmd).unwrap();
        sim.flush();
        let outcome = sim.execute(cmd).unwrap();
        assert_eq!(outcome.tlb, HitOrMiss::Miss);
    }
}
