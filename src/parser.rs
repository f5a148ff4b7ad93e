//! Command-script text parser.
//!
//! One command per line: `<R|W> <I|DW|DB> [0xDATA] @0xADDR16`. Blank
//! lines and `#`-prefixed comments are skipped.

use std::io::BufRead;

use crate::command::{AccessType, Command, DataSize, Order, Program};
use crate::error::{Result, SimError};

fn parse_order(token: &str) -> Result<Order> {
    match token {
        "R" => Ok(Order::Read),
        "W" => Ok(Order::Write),
        other => Err(SimError::bad_param(format!("unknown order token {other:?}"))),
    }
}

fn parse_type_size(token: &str) -> Result<(AccessType, DataSize)> {
    match token {
        "I" => Ok((AccessType::Instruction, DataSize::Word)),
        "DW" => Ok((AccessType::Data, DataSize::Word)),
        "DB" => Ok((AccessType::Data, DataSize::Byte)),
        other => Err(SimError::bad_param(format!(
            "unknown type/size token {other:?}"
        ))),
    }
}

fn parse_data(token: &str) -> Result<u32> {
    let hex = token
        .strip_prefix("0x")
        .ok_or_else(|| SimError::bad_param(format!("data token {token:?} missing 0x prefix")))?;
    u32::from_str_radix(hex, 16)
        .map_err(|_| SimError::bad_param(format!("data token {token:?} is not valid hex")))
}

fn parse_addr(token: &str) -> Result<u64> {
    let hex = token
        .strip_prefix("@0x")
        .ok_or_else(|| SimError::bad_param(format!("address token {token:?} missing @0x prefix")))?;
    if hex.len() != 16 {
        return Err(SimError::bad_param(format!(
            "address token {token:?} must have exactly 16 hex digits"
        )));
    }
    u64::from_str_radix(hex, 16)
        .map_err(|_| SimError::bad_param(format!("address token {token:?} is not valid hex")))
}

/// Parses one non-blank, non-comment line into a [`Command`].
pub fn parse_line(line: &str) -> Result<Command> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(SimError::bad_param(format!(
            "expected at least an order and type/size token, got {line:?}"
        )));
    }

    let order = parse_order(fields[0])?;
    let (access, data_size) = parse_type_size(fields[1])?;

    let (write_data, addr_token) = if order == Order::Write {
        let data = fields
            .get(2)
            .ok_or_else(|| SimError::bad_param("write command missing data token"))?;
        (parse_data(data)?, *fields.get(3).ok_or_else(|| {
            SimError::bad_param("write command missing address token")
        })?)
    } else {
        (
            0,
            *fields
                .get(2)
                .ok_or_else(|| SimError::bad_param("command missing address token"))?,
        )
    };

    let bits = parse_addr(addr_token)?;
    let vaddr = crate::addr::VirtAddr::decode(bits);
    Command::new(order, access, data_size, write_data, vaddr)
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Parses a full command-script reader into a [`Program`], in file order.
pub fn parse_program<R: BufRead>(reader: R) -> Result<Program> {
    let mut commands = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.map_err(SimError::from)?;
        if is_skippable(&line) {
            continue;
        }
        let command = parse_line(&line).map_err(|e| {
            SimError::bad_param(format!("line {}: {}", lineno + 1, e))
        })?;
        commands.push(command);
    }
    Ok(Program::new(commands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_a_data_word_read() {
        let cmd = parse_line("R DW @0x0000000000001000").unwrap();
        assert_eq!(cmd.order, Order::Read);
        assert_eq!(cmd.access, AccessType::Data);
        assert_eq!(cmd.data_size, DataSize::Word);
        assert_eq!(cmd.vaddr.offset, 0x1000 & 0xFFF);
    }

    #[test]
    fn write_instruction_is_rejected_at_construction() {
        let err = parse_line("W I @0x0000000000001000").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::BadParam);
    }

    #[test]
    fn parses_a_write_with_data() {
        let cmd = parse_line("W DB 0xAB @0x0000000000001004").unwrap();
        assert_eq!(cmd.order, Order::Write);
        assert_eq!(cmd.write_data, 0xAB);
    }

    #[test]
    fn program_skips_blank_and_comment_lines() {
        let text = "# a comment\n\nR DW @0x0000000000000000\n";
        let program = parse_program(Cursor::new(text)).unwrap();
        assert_eq!(program.commands.len(), 1);
    }
}
