//! Memory-description-file loader.
//!
//! Format:
//! ```text
//! <total size in bytes, decimal>
//! <path to the PGD page file>
//! <N, number of other translation pages>
//! <hex physical offset> <page-file path>   (repeated N times)
//! <hex 64-bit virtual address> <page-file path>   (repeated until EOF)
//! ```
//! Translation pages are placed verbatim at their given physical offset;
//! data pages are placed at the physical frame the page-walker resolves
//! their virtual address to, so the translation pages must already be in
//! place by the time a data-page line is processed.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::addr::VirtAddr;
use crate::constants::PAGE_SIZE;
use crate::error::{Result, SimError};
use crate::memory::PhysicalMemory;
use crate::page_walk;

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)?;
    BufReader::new(file)
        .lines()
        .map(|l| l.map_err(SimError::from))
        .collect()
}

fn read_page_file(base_dir: &Path, file_name: &str) -> Result<Vec<u8>> {
    let path = base_dir.join(file_name);
    let bytes = fs::read(&path)?;
    Ok(bytes)
}

/// Loads a memory-description file into a freshly allocated
/// [`PhysicalMemory`]. Page-file paths in the description are resolved
/// relative to the description file's own directory.
pub fn load(description_path: &Path) -> Result<PhysicalMemory> {
    let base_dir = description_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let lines = read_lines(description_path)?;
    let mut lines = lines.into_iter();

    let total_size: usize = lines
        .next()
        .ok_or_else(|| SimError::bad_param("missing total size line"))?
        .trim()
        .parse()
        .map_err(|_| SimError::bad_param("total size is not a valid decimal number"))?;
    let mut mem = PhysicalMemory::new(total_size);

    let pgd_path = lines
        .next()
        .ok_or_else(|| SimError::bad_param("missing PGD page path line"))?;
    let pgd_bytes = read_page_file(&base_dir, pgd_path.trim())?;
    mem.write_page(0, &pgd_bytes)?;

    let translation_count: usize = lines
        .next()
        .ok_or_else(|| SimError::bad_param("missing translation page count line"))?
        .trim()
        .parse()
        .map_err(|_| SimError::bad_param("translation page count is not a valid number"))?;

    for _ in 0..translation_count {
        let line = lines
            .next()
            .ok_or_else(|| SimError::bad_param("missing translation page descriptor line"))?;
        let (offset_token, path_token) = split_two(&line)?;
        let offset = parse_hex_offset(offset_token)?;
        if offset % PAGE_SIZE != 0 {
            return Err(SimError::bad_param(format!(
                "translation page offset {offset:#x} is not 4 KiB-aligned"
            )));
        }
        let bytes = read_page_file(&base_dir, path_token)?;
        if bytes.len() != PAGE_SIZE {
            return Err(SimError::size(format!(
                "translation page {path_token} is {} bytes, expected {PAGE_SIZE}",
                bytes.len()
            )));
        }
        mem.write_page(offset, &bytes)?;
    }

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (vaddr_token, path_token) = split_two(&line)?;
        let bits = u64::from_str_radix(vaddr_token.trim_start_matches("0x"), 16)
            .map_err(|_| SimError::bad_param(format!("data page address {vaddr_token:?} is not valid hex")))?;
        let vaddr = VirtAddr::decode(bits);
        let phys = page_walk::translate(&mem, vaddr)?;
        let frame_base = (phys.frame as usize) << 12;
        let bytes = read_page_file(&base_dir, path_token)?;
        mem.write_page(frame_base, &bytes)?;
    }

    Ok(mem)
}

fn split_two(line: &str) -> Result<(&str, &str)> {
    let mut fields = line.split_whitespace();
    let first = fields
        .next()
        .ok_or_else(|| SimError::bad_param("expected two whitespace-separated fields"))?;
    let second = fields
        .next()
        .ok_or_else(|| SimError::bad_param("expected two whitespace-separated fields"))?;
    Ok((first, second))
}

fn parse_hex_offset(token: &str) -> Result<usize> {
    usize::from_str_radix(token.trim_start_matches("0x"), 16)
        .map_err(|_| SimError::bad_param(format!("offset {token:?} is not valid hex")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn loads_pgd_and_translation_pages() {
        let dir = std::env::temp_dir().join(format!("memsim-loader-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let pgd_bytes = vec![0xAAu8; PAGE_SIZE];
        fs::write(dir.join("pgd.bin"), &pgd_bytes).unwrap();
        let trans_bytes = vec![0xBBu8; PAGE_SIZE];
        fs::write(dir.join("trans.bin"), &trans_bytes).unwrap();

        let desc_path = dir.join("mem.desc");
        let mut f = fs::File::create(&desc_path).unwrap();
        writeln!(f, "{}", 4 * PAGE_SIZE).unwrap();
        writeln!(f, "pgd.bin").unwrap();
        writeln!(f, "1").unwrap();
        writeln!(f, "{:#x} trans.bin", PAGE_SIZE).unwrap();

        let mem = load(&desc_path).unwrap();
        assert_eq!(mem.len(), 4 * PAGE_SIZE);
        assert_eq!(mem.read_byte(0).unwrap(), 0xAA);
        assert_eq!(mem.read_byte(PAGE_SIZE).unwrap(), 0xBB);

        fs::remove_dir_all(&dir).ok();
    }
}
