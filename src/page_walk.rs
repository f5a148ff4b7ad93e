//! The 4-level radix page-table walker: PGD -> PUD -> PMD -> PTE.
//!
//! Each level's entry is a 32-bit word holding a *byte address*: for
//! PGD/PUD/PMD it is the byte offset into simulated memory of the next
//! level's table (the PGD table itself always starts at offset 0); for
//! PTE it is the byte-aligned base address of the destination page, whose
//! low 12 bits are discarded to get the physical frame number. A zero
//! entry at any level means the mapping does not exist and the walk fails
//! with [`SimError::Addr`] -- there is no faulting-in.

use crate::addr::{PhysAddr, VirtAddr};
use crate::constants::BYTES_PER_PTE;
use crate::error::{Result, SimError};
use crate::memory::PhysicalMemory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Pgd,
    Pud,
    Pmd,
    Pte,
}

impl Level {
    fn name(self) -> &'static str {
        match self {
            Level::Pgd => "PGD",
            Level::Pud => "PUD",
            Level::Pmd => "PMD",
            Level::Pte => "PTE",
        }
    }
}

/// Walks the page tables (PGD always at byte offset 0) to translate
/// `vaddr` to a physical address.
pub fn translate(mem: &PhysicalMemory, vaddr: VirtAddr) -> Result<PhysAddr> {
    let mut cursor: u32 = 0;
    for (level, index) in [
        (Level::Pgd, vaddr.pgd),
        (Level::Pud, vaddr.pud),
        (Level::Pmd, vaddr.pmd),
        (Level::Pte, vaddr.pte),
    ] {
        cursor = read_entry(mem, cursor, index, level, vaddr)?;
    }
    PhysAddr::from_frame_base(cursor, vaddr.offset)
}

fn read_entry(
    mem: &PhysicalMemory,
    cursor: u32,
    index: u16,
    level: Level,
    vaddr: VirtAddr,
) -> Result<u32> {
    let entry_offset = cursor as usize + index as usize * BYTES_PER_PTE;
    let entry = mem.read_word(entry_offset)?;
    if entry == 0 {
        return Err(SimError::addr(
            vaddr,
            format!("{} entry {index:#x} is unmapped", level.name()),
        ));
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PAGE_SIZE;

    fn write_entry(mem: &mut PhysicalMemory, table_offset: u32, index: u16, value: u32) {
        let offset = table_offset as usize + index as usize * BYTES_PER_PTE;
        mem.write_word(offset, value).unwrap();
    }

    #[test]
    fn full_walk_resolves_to_expected_frame() {
        let mut mem = PhysicalMemory::new(8 * PAGE_SIZE);
        write_entry(&mut mem, 0, 1, PAGE_SIZE as u32); // PGD[1] -> PUD table at offset PAGE_SIZE
        write_entry(&mut mem, PAGE_SIZE as u32, 2, 2 * PAGE_SIZE as u32); // PUD[2] -> PMD table
        write_entry(&mut mem, 2 * PAGE_SIZE as u32, 3, 3 * PAGE_SIZE as u32); // PMD[3] -> PTE table
        write_entry(&mut mem, 3 * PAGE_SIZE as u32, 4, 7 * PAGE_SIZE as u32); // PTE[4] -> page base of frame 7

        let vaddr = VirtAddr::encode(1, 2, 3, 4, 0x42).unwrap();
        let phys = translate(&mem, vaddr).unwrap();
        assert_eq!(phys.frame, 7);
        assert_eq!(phys.offset, 0x42);
    }

    #[test]
    fn unmapped_entry_is_an_address_error() {
        let mem = PhysicalMemory::new(8 * PAGE_SIZE);
        let vaddr = VirtAddr::encode(5, 0, 0, 0, 0).unwrap();
        let err = translate(&mem, vaddr).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Addr);
    }
}
