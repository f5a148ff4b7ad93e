//! A single set-associative cache level: `sets` sets of `ways` lines
//! each, LRU replacement tracked per set as a recency permutation of
//! `0..ways`.

use crate::constants::{BYTES_PER_LINE, LOG_BYTES_PER_LINE};

#[derive(Debug, Clone, Copy)]
pub struct Line {
    /// The line-aligned block number (`phys_addr >> LOG_BYTES_PER_LINE`).
    /// Carrying the full block rather than just this level's tag bits
    /// lets a line move between levels with different set counts without
    /// losing its address.
    pub block: u64,
    pub data: [u8; BYTES_PER_LINE],
}

impl Line {
    pub fn new(addr: u32, data: [u8; BYTES_PER_LINE]) -> Self {
        Line {
            block: (addr as u64) >> LOG_BYTES_PER_LINE,
            data,
        }
    }

    pub fn addr(&self) -> u32 {
        (self.block << LOG_BYTES_PER_LINE) as u32
    }
}

struct Set {
    ways: Vec<Option<Line>>,
    /// Recency permutation of `0..ways.len()`; index 0 is most recently
    /// used, the last index is the next eviction victim.
    order: Vec<usize>,
}

impl Set {
    fn new(ways: usize) -> Self {
        Set {
            ways: vec![None; ways],
            order: (0..ways).collect(),
        }
    }

    fn touch(&mut self, way: usize) {
        if let Some(pos) = self.order.iter().position(|&w| w == way) {
            self.order.remove(pos);
        }
        self.order.insert(0, way);
    }

    /// Retires `way` to the back of the recency order -- the position an
    /// empty way belongs in, so it is the next one `install` reuses.
    fn retire(&mut self, way: usize) {
        if let Some(pos) = self.order.iter().position(|&w| w == way) {
            self.order.remove(pos);
        }
        self.order.push(way);
    }

    fn find(&self, block: u64) -> Option<usize> {
        self.ways
            .iter()
            .position(|line| matches!(line, Some(l) if l.block == block))
    }
}

/// A cache level addressed by `(block, set index)`, where `index` is a
/// function of the level's own set count.
pub struct SetAssociativeCache {
    sets: Vec<Set>,
    log_sets: u32,
    ways: usize,
}

impl SetAssociativeCache {
    pub fn new(num_sets: usize, ways: usize, log_sets: u32) -> Self {
        SetAssociativeCache {
            sets: (0..num_sets).map(|_| Set::new(ways)).collect(),
            log_sets,
            ways,
        }
    }

    pub fn ways(&self) -> usize {
        self.ways
    }

    fn index_of(&self, block: u64) -> usize {
        (block as usize) & (self.sets.len() - 1)
    }

    pub fn lookup(&mut self, phys_addr: u32) -> Option<Line> {
        let block = (phys_addr as u64) >> LOG_BYTES_PER_LINE;
        let index = self.index_of(block);
        let set = &mut self.sets[index];
        let way = set.find(block)?;
        set.touch(way);
        set.ways[way]
    }

    /// Like [`lookup`](Self::lookup), but hands back a mutable reference
    /// so a write hit can update the line in place without disturbing
    /// LRU order or risking an unrelated eviction.
    pub fn lookup_mut(&mut self, phys_addr: u32) -> Option<&mut Line> {
        let block = (phys_addr as u64) >> LOG_BYTES_PER_LINE;
        let index = self.index_of(block);
        let set = &mut self.sets[index];
        let way = set.find(block)?;
        set.touch(way);
        set.ways[way].as_mut()
    }

    /// Installs `line`, evicting the LRU way of its set if full, and
    /// returns whatever line it replaced.
    pub fn install(&mut self, line: Line) -> Option<Line> {
        let index = self.index_of(line.block);
        let set = &mut self.sets[index];
        let victim_way = *set.order.last().expect("ways is always > 0");
        let evicted = set.ways[victim_way].take();
        set.ways[victim_way] = Some(line);
        set.touch(victim_way);
        evicted
    }

    /// Removes the line matching `phys_addr`, if present -- used by the
    /// exclusive L1/L2 victim path to pull a line out of L2 once it has
    /// been promoted into L1.
    pub fn remove(&mut self, phys_addr: u32) -> Option<Line> {
        let block = (phys_addr as u64) >> LOG_BYTES_PER_LINE;
        let index = self.index_of(block);
        let set = &mut self.sets[index];
        let way = set.find(block)?;
        let line = set.ways[way].take();
        set.retire(way);
        line
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    /// Renders every set/way as one `WAY/LINE: V: AGE: TAG: WORDS` line,
    /// invalid ways printing dashes. `age` is this way's position in its
    /// set's recency order (0 = most recently used).
    pub fn dump(&self, label: &str, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for (set_idx, set) in self.sets.iter().enumerate() {
            for way in 0..self.ways {
                let age = set.order.iter().position(|&w| w == way);
                match (&set.ways[way], age) {
                    (Some(line), Some(age)) => {
                        let tag = line.block >> self.log_sets;
                        let words: Vec<String> = line
                            .data
                            .chunks_exact(4)
                            .map(|c| {
                                format!(
                                    "{:#010x}",
                                    u32::from_le_bytes([c[0], c[1], c[2], c[3]])
                                )
                            })
                            .collect();
                        writeln!(
                            out,
                            "{label} set={set_idx} way={way}: V:1: AGE:{age}: TAG:{tag:#x}: {}",
                            words.join(" ")
                        )?;
                    }
                    _ => {
                        writeln!(
                            out,
                            "{label} set={set_idx} way={way}: V:0: AGE:-: TAG:-: -"
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}
