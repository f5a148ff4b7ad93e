//! Virtual and physical address encoding.
//!
//! The raw 64-/32-bit layout is packed into a private `bitfield!` type;
//! the public [`VirtAddr`]/[`PhysAddr`] expose already-validated fields.

use std::fmt;

use bitfield::bitfield;

use crate::error::{Result, SimError};

const MAX_9BIT_VALUE: u16 = 0x1FF;
const MAX_12BIT_VALUE: u16 = 0xFFF;
const MAX_20BIT_VALUE: u32 = 0xF_FFFF;

bitfield! {
    struct RawVirtAddr(u64);
    impl Debug;
    u16, offset, set_offset: 11, 0;
    u16, pte_entry, set_pte_entry: 20, 12;
    u16, pmd_entry, set_pmd_entry: 29, 21;
    u16, pud_entry, set_pud_entry: 38, 30;
    u16, pgd_entry, set_pgd_entry: 47, 39;
    u16, reserved, set_reserved: 63, 48;
}

bitfield! {
    struct RawPhysAddr(u32);
    impl Debug;
    u16, offset, set_offset: 11, 0;
    u32, frame, set_frame: 31, 12;
}

/// A 64-bit virtual address, decomposed into its page-table indices.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtAddr {
    pub pgd: u16,
    pub pud: u16,
    pub pmd: u16,
    pub pte: u16,
    pub offset: u16,
}

impl VirtAddr {
    /// Builds a virtual address from its five fields, validating each
    /// against its bit-width.
    pub fn encode(pgd: u16, pud: u16, pmd: u16, pte: u16, offset: u16) -> Result<Self> {
        if pgd > MAX_9BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "pgd entry should be a 9-bit value, was {pgd:#x}"
            )));
        }
        if pud > MAX_9BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "pud entry should be a 9-bit value, was {pud:#x}"
            )));
        }
        if pmd > MAX_9BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "pmd entry should be a 9-bit value, was {pmd:#x}"
            )));
        }
        if pte > MAX_9BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "pte entry should be a 9-bit value, was {pte:#x}"
            )));
        }
        if offset > MAX_12BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "page offset should be a 12-bit value, was {offset:#x}"
            )));
        }
        Ok(VirtAddr {
            pgd,
            pud,
            pmd,
            pte,
            offset,
        })
    }

    /// Decodes a raw 64-bit value. The reserved high 16 bits are silently
    /// dropped on decode, though the encoder refuses to set them.
    pub fn decode(bits: u64) -> Self {
        let raw = RawVirtAddr(bits);
        VirtAddr {
            pgd: raw.pgd_entry(),
            pud: raw.pud_entry(),
            pmd: raw.pmd_entry(),
            pte: raw.pte_entry(),
            offset: raw.offset(),
        }
    }

    /// Packs the address back into its 64-bit representation (reserved
    /// bits are always zero on the way out).
    pub fn to_u64(self) -> u64 {
        let mut raw = RawVirtAddr(0);
        raw.set_pgd_entry(self.pgd);
        raw.set_pud_entry(self.pud);
        raw.set_pmd_entry(self.pmd);
        raw.set_pte_entry(self.pte);
        raw.set_offset(self.offset);
        raw.0
    }

    /// The 36-bit virtual page number: the concatenation of the four
    /// page-table indices.
    pub fn vpn(self) -> u64 {
        self.to_u64() >> 12
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PGD={:#x}; PUD={:#x}; PMD={:#x}; PTE={:#x}; offset={:#x}",
            self.pgd, self.pud, self.pmd, self.pte, self.offset
        )
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.to_u64())
    }
}

/// A 32-bit physical address: a 20-bit frame number and a 12-bit offset.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysAddr {
    pub frame: u32,
    pub offset: u16,
}

impl PhysAddr {
    pub fn encode(frame: u32, offset: u16) -> Result<Self> {
        if frame > MAX_20BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "frame should be a 20-bit value, was {frame:#x}"
            )));
        }
        if offset > MAX_12BIT_VALUE {
            return Err(SimError::bad_param(format!(
                "page offset should be a 12-bit value, was {offset:#x}"
            )));
        }
        Ok(PhysAddr { frame, offset })
    }

    /// Builds a physical address from a byte-granular frame *base* (the
    /// low 12 bits of `page_begin` are discarded, matching
    /// `init_phy_addr`'s `page_begin >> PAGE_OFFSET`).
    pub fn from_frame_base(page_begin: u32, offset: u16) -> Result<Self> {
        Self::encode(page_begin >> 12, offset)
    }

    pub fn to_u32(self) -> u32 {
        let mut raw = RawPhysAddr(0);
        raw.set_frame(self.frame);
        raw.set_offset(self.offset);
        raw.0
    }

    /// Byte offset of this address in the simulated physical memory buffer.
    pub fn byte_offset(self) -> usize {
        self.to_u32() as usize
    }
}

impl fmt::Debug for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page num={:#x}; offset={:#x}",
            self.frame, self.offset
        )
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.to_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_rejects_out_of_range_fields() {
        assert!(VirtAddr::encode(0x200, 0, 0, 0, 0).is_err());
        assert!(VirtAddr::encode(0, 0, 0, 0, 0x1000).is_err());
        assert!(PhysAddr::encode(1 << 20, 0).is_err());
    }

    #[test]
    fn round_trip_identity_on_low_48_bits() {
        let bits = 0xFFFF_ABCD_1234_5678u64;
        let decoded = VirtAddr::decode(bits);
        assert_eq!(decoded.to_u64(), bits & 0x0000_FFFF_FFFF_FFFF);
    }

    #[test]
    fn vpn_matches_offset_packing() {
        let v = VirtAddr::encode(1, 2, 3, 4, 0xABC).unwrap();
        assert_eq!((v.vpn() << 12) | v.offset as u64, v.to_u64());
    }

    #[test]
    fn vpn_is_field_concatenation() {
        let v = VirtAddr::encode(0x1FF, 0x001, 0x000, 0x0AA, 0).unwrap();
        let expected = (0x1FFu64 << 27) | (0x001u64 << 18) | (0x000u64 << 9) | 0x0AAu64;
        assert_eq!(v.vpn(), expected);
    }

    #[test]
    fn phys_addr_round_trip() {
        let p = PhysAddr::encode(0xABCDE, 0x123).unwrap();
        assert_eq!(p.to_u32(), (0xABCDEu32 << 12) | 0x123);
    }

    #[test]
    fn phys_addr_from_frame_base_discards_low_bits() {
        let p = PhysAddr::from_frame_base(0xABCDE123, 0x456).unwrap();
        assert_eq!(p.frame, 0xABCDE);
        assert_eq!(p.offset, 0x456);
    }
}
