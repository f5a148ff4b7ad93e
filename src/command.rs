//! The command/program model fed to the simulator driver.
//!
//! Kept architecturally outside the core: the page-walker, TLBs, and
//! caches never see a [`Command`], only the raw `(VirtAddr, AccessKind,
//! DataSize)` tuples the driver extracts from one.

use crate::addr::VirtAddr;
use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    Instruction,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSize {
    Byte,
    Word,
}

/// A single simulated memory operation.
///
/// Construction enforces three independent constraints -- each checked
/// regardless of the others, unlike the C original's single combined
/// check that could never actually fire for both conditions at once:
/// writes cannot target instruction fetches, instruction fetches are
/// always word-sized, and word-sized accesses must be 4-byte aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub order: Order,
    pub access: AccessType,
    pub data_size: DataSize,
    pub write_data: u32,
    pub vaddr: VirtAddr,
}

impl Command {
    pub fn new(
        order: Order,
        access: AccessType,
        data_size: DataSize,
        write_data: u32,
        vaddr: VirtAddr,
    ) -> Result<Self> {
        if access == AccessType::Instruction && order == Order::Write {
            return Err(SimError::bad_param(
                "instruction fetches cannot be writes",
            ));
        }
        if access == AccessType::Instruction && data_size != DataSize::Word {
            return Err(SimError::bad_param(
                "instruction fetches are always word-sized",
            ));
        }
        if data_size == DataSize::Word && vaddr.offset % 4 != 0 {
            return Err(SimError::bad_param(format!(
                "word access at offset {:#x} is not 4-byte aligned",
                vaddr.offset
            )));
        }
        Ok(Command {
            order,
            access,
            data_size,
            write_data,
            vaddr,
        })
    }
}

/// An ordered stream of commands, executed one at a time in program
/// order; commands are never reordered or run concurrently.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub commands: Vec<Command>,
}

impl Program {
    pub fn new(commands: Vec<Command>) -> Self {
        Program { commands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vaddr() -> VirtAddr {
        VirtAddr::encode(0, 0, 0, 0, 0x100).unwrap()
    }

    #[test]
    fn write_instruction_is_rejected() {
        let err = Command::new(
            Order::Write,
            AccessType::Instruction,
            DataSize::Word,
            0,
            vaddr(),
        )
        .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::BadParam);
    }

    #[test]
    fn byte_sized_instruction_is_rejected() {
        let err = Command::new(
            Order::Read,
            AccessType::Instruction,
            DataSize::Byte,
            0,
            vaddr(),
        )
        .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::BadParam);
    }

    #[test]
    fn misaligned_word_access_is_rejected() {
        let v = VirtAddr::encode(0, 0, 0, 0, 0x101).unwrap();
        let err = Command::new(Order::Read, AccessType::Data, DataSize::Word, 0, v).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::BadParam);
    }

    #[test]
    fn well_formed_command_is_accepted() {
        let cmd = Command::new(Order::Read, AccessType::Data, DataSize::Byte, 0, vaddr()).unwrap();
        assert_eq!(cmd.order, Order::Read);
    }
}
