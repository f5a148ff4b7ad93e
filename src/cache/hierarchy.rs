//! The split-L1/unified-L2 exclusive cache hierarchy.
//!
//! L1 and L2 never hold the same line at once: an L2 hit is removed from
//! L2 before being installed in L1, and an L1 eviction is installed into
//! L2 rather than simply dropped (the victim-cache discipline). Reads
//! miss all the way to physical memory; writes are write-through, so a
//! write always reaches memory regardless of where it hits.

use crate::addr::PhysAddr;
use crate::cache::levels::{Line, SetAssociativeCache};
use crate::constants::{
    BYTES_PER_LINE, L1_CACHE_SETS, L1_CACHE_WAYS, L2_CACHE_SETS, L2_CACHE_WAYS, LOG_BYTES_PER_LINE,
    log2_usize,
};
use crate::error::{HitOrMiss, Result};
use crate::memory::PhysicalMemory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Instruction,
    Data,
}

pub struct CacheHierarchy {
    l1i: SetAssociativeCache,
    l1d: SetAssociativeCache,
    l2: SetAssociativeCache,
}

impl Default for CacheHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheHierarchy {
    pub fn new() -> Self {
        CacheHierarchy {
            l1i: SetAssociativeCache::new(L1_CACHE_SETS, L1_CACHE_WAYS, log2_usize(L1_CACHE_SETS)),
            l1d: SetAssociativeCache::new(L1_CACHE_SETS, L1_CACHE_WAYS, log2_usize(L1_CACHE_SETS)),
            l2: SetAssociativeCache::new(L2_CACHE_SETS, L2_CACHE_WAYS, log2_usize(L2_CACHE_SETS)),
        }
    }

    fn l1_mut(&mut self, kind: AccessKind) -> &mut SetAssociativeCache {
        match kind {
            AccessKind::Instruction => &mut self.l1i,
            AccessKind::Data => &mut self.l1d,
        }
    }

    fn line_base(addr: PhysAddr) -> u32 {
        let raw = addr.to_u32();
        raw & !((1u32 << LOG_BYTES_PER_LINE) - 1)
    }

    /// Installs `line` into L1, and if that evicts an existing L1 line,
    /// pushes the evicted line down into L2 (never leaving it present at
    /// both levels).
    fn install_l1_with_victim(&mut self, kind: AccessKind, line: Line) {
        if let Some(evicted) = self.l1_mut(kind).install(line) {
            self.l2.install(evicted);
        }
    }

    /// Resolves the line containing `addr`, fetching from memory on a
    /// full miss. Returns the line plus the L1/L2 hit status for stats.
    fn resolve_line(
        &mut self,
        kind: AccessKind,
        mem: &PhysicalMemory,
        addr: PhysAddr,
    ) -> Result<(Line, HitOrMiss, HitOrMiss)> {
        let base = Self::line_base(addr);
        if let Some(line) = self.l1_mut(kind).lookup(base) {
            return Ok((line, HitOrMiss::Hit, HitOrMiss::Hit));
        }
        if let Some(line) = self.l2.remove(base) {
            self.install_l1_with_victim(kind, line);
            return Ok((line, HitOrMiss::Miss, HitOrMiss::Hit));
        }
        let data = mem.read_line(base as usize)?;
        let line = Line::new(base, data);
        self.install_l1_with_victim(kind, line);
        Ok((line, HitOrMiss::Miss, HitOrMiss::Miss))
    }

    pub fn read_byte(
        &mut self,
        kind: AccessKind,
        mem: &PhysicalMemory,
        addr: PhysAddr,
    ) -> Result<(u8, HitOrMiss, HitOrMiss)> {
        let (line, l1, l2) = self.resolve_line(kind, mem, addr)?;
        let offset = (addr.to_u32() as usize) & (BYTES_PER_LINE - 1);
        Ok((line.data[offset], l1, l2))
    }

    /// Reads a little-endian word; `addr` must be 4-byte aligned (checked
    /// at the `Command` boundary, not re-validated here).
    pub fn read_word(
        &mut self,
        kind: AccessKind,
        mem: &PhysicalMemory,
        addr: PhysAddr,
    ) -> Result<(u32, HitOrMiss, HitOrMiss)> {
        let (line, l1, l2) = self.resolve_line(kind, mem, addr)?;
        let offset = (addr.to_u32() as usize) & (BYTES_PER_LINE - 1);
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&line.data[offset..offset + 4]);
        Ok((u32::from_le_bytes(buf), l1, l2))
    }

    pub fn write_word(
        &mut self,
        kind: AccessKind,
        mem: &mut PhysicalMemory,
        addr: PhysAddr,
        value: u32,
    ) -> Result<(HitOrMiss, HitOrMiss)> {
        let base = Self::line_base(addr);
        let offset = (addr.to_u32() as usize) & (BYTES_PER_LINE - 1);
        let bytes = value.to_le_bytes();

        let (l1, l2) = if let Some(line) = self.l1_mut(kind).lookup_mut(base) {
            line.data[offset..offset + 4].copy_from_slice(&bytes);
            (HitOrMiss::Hit, HitOrMiss::Hit)
        } else if let Some(mut line) = self.l2.remove(base) {
            line.data[offset..offset + 4].copy_from_slice(&bytes);
            self.install_l1_with_victim(kind, line);
            (HitOrMiss::Miss, HitOrMiss::Hit)
        } else {
            let mut line = Line::new(base, mem.read_line(base as usize)?);
            line.data[offset..offset + 4].copy_from_slice(&bytes);
            self.install_l1_with_victim(kind, line);
            (HitOrMiss::Miss, HitOrMiss::Miss)
        };

        mem.write_word(addr.to_u32() as usize, value)?;
        Ok((l1, l2))
    }

    /// Write-through: the line is updated wherever it is cached (or
    /// freshly fetched), and the write is always also applied to memory.
    pub fn write_byte(
        &mut self,
        kind: AccessKind,
        mem: &mut PhysicalMemory,
        addr: PhysAddr,
        value: u8,
    ) -> Result<(HitOrMiss, HitOrMiss)> {
        let base = Self::line_base(addr);
        let offset = (addr.to_u32() as usize) & (BYTES_PER_LINE - 1);

        let (l1, l2) = if let Some(line) = self.l1_mut(kind).lookup_mut(base) {
            // Already resident in L1: update in place, no eviction involved.
            line.data[offset] = value;
            (HitOrMiss::Hit, HitOrMiss::Hit)
        } else if let Some(mut line) = self.l2.remove(base) {
            line.data[offset] = value;
            self.install_l1_with_victim(kind, line);
            (HitOrMiss::Miss, HitOrMiss::Hit)
        } else {
            let mut line = Line::new(base, mem.read_line(base as usize)?);
            line.data[offset] = value;
            self.install_l1_with_victim(kind, line);
            (HitOrMiss::Miss, HitOrMiss::Miss)
        };

        mem.write_byte(addr.to_u32() as usize, value)?;
        Ok((l1, l2))
    }

    /// Dumps all three levels to `out`.
    pub fn dump(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        self.l1i.dump("L1I", out)?;
        self.l1d.dump("L1D", out)?;
        self.l2.dump("L2", out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(offset: u32) -> PhysAddr {
        PhysAddr::encode(0, offset as u16).unwrap()
    }

    #[test]
    fn cold_read_misses_both_levels_then_hits_l1() {
        let mut mem = PhysicalMemory::new(4096);
        mem.write_byte(0x20, 0x7A).unwrap();
        let mut hier = CacheHierarchy::new();
        let (byte, l1, l2) = hier.read_byte(AccessKind::Data, &mem, addr(0x20)).unwrap();
        assert_eq!(byte, 0x7A);
        assert_eq!(l1, HitOrMiss::Miss);
        assert_eq!(l2, HitOrMiss::Miss);

        let (byte, l1, l2) = hier.read_byte(AccessKind::Data, &mem, addr(0x20)).unwrap();
        assert_eq!(byte, 0x7A);
        assert_eq!(l1, HitOrMiss::Hit);
        assert_eq!(l2, HitOrMiss::Hit);
    }

    #[test]
    fn write_is_write_through_to_memory() {
        let mut mem = PhysicalMemory::new(4096);
        let mut hier = CacheHierarchy::new();
        hier.write_byte(AccessKind::Data, &mut mem, addr(0x40), 0x11)
            .unwrap();
        assert_eq!(mem.read_byte(0x40).unwrap(), 0x11);
    }

    #[test]
    fn l1_eviction_is_never_simply_dropped() {
        let mut mem = PhysicalMemory::new(1 << 20);
        let mut hier = CacheHierarchy::new();
        // Fill one L1D set (128 sets, stride by set count * line size) past
        // its 4 ways so the first-loaded line is evicted from L1.
        let stride = (L1_CACHE_SETS as u32) * (BYTES_PER_LINE as u32);
        let first = addr(0);
        for way in 0..(L1_CACHE_WAYS as u32 + 1) {
            let a = addr(way * stride);
            hier.read_byte(AccessKind::Data, &mem, a).unwrap();
        }
        // The evicted first line must now be servable from L2, not a cold miss.
        let (_, l1, l2) = hier.read_byte(AccessKind::Data, &mem, first).unwrap();
        assert_eq!(l1, HitOrMiss::Miss);
        assert_eq!(l2, HitOrMiss::Hit);
    }
}
