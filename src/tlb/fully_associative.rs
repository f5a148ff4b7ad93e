//! The fully-associative reference-mode TLB: every slot can hold any
//! virtual page number, and eviction is governed purely by recency via
//! [`LruList`].

use crate::lru_list::LruList;

#[derive(Debug, Clone, Copy)]
struct Entry {
    vpn: u64,
    frame: u32,
}

pub struct FullyAssociativeTlb {
    entries: Vec<Option<Entry>>,
    order: LruList,
}

impl FullyAssociativeTlb {
    pub fn new(capacity: usize) -> Self {
        FullyAssociativeTlb {
            entries: vec![None; capacity],
            order: LruList::new(capacity),
        }
    }

    /// Searches every slot for `vpn`. A hit refreshes its recency.
    pub fn lookup(&mut self, vpn: u64) -> Option<u32> {
        let hit_slot = self
            .entries
            .iter()
            .position(|e| matches!(e, Some(entry) if entry.vpn == vpn))?;
        self.order.touch(hit_slot as u32);
        self.entries[hit_slot].map(|e| e.frame)
    }

    /// Installs `(vpn, frame)` in the least-recently-used slot, returning
    /// whatever mapping it replaced (if that slot was occupied).
    pub fn insert(&mut self, vpn: u64, frame: u32) -> Option<(u64, u32)> {
        let victim = self
            .order
            .lru()
            .expect("capacity is always > 0 for a configured TLB");
        let evicted = self.entries[victim as usize]
            .take()
            .map(|e| (e.vpn, e.frame));
        self.entries[victim as usize] = Some(Entry { vpn, frame });
        self.order.touch(victim);
        evicted
    }

    /// Renders every slot as one `SLOT: V: VPN: FRAME` line, in MRU
    /// order first.
    pub fn dump(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for slot in self.order.iter_mru() {
            match self.entries[slot as usize] {
                Some(entry) => writeln!(
                    out,
                    "FA-TLB slot={slot}: V:1: VPN:{:#x}: FRAME:{:#x}",
                    entry.vpn, entry.frame
                )?,
                None => writeln!(out, "FA-TLB slot={slot}: V:0: VPN:-: FRAME:-")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit_after_insert() {
        let mut tlb = FullyAssociativeTlb::new(4);
        assert_eq!(tlb.lookup(0x10), None);
        tlb.insert(0x10, 7);
        assert_eq!(tlb.lookup(0x10), Some(7));
    }

    #[test]
    fn eviction_picks_the_least_recently_used_slot() {
        let mut tlb = FullyAssociativeTlb::new(2);
        tlb.insert(1, 10);
        tlb.insert(2, 20);
        // touch 1 so 2 becomes LRU
        tlb.lookup(1);
        let evicted = tlb.insert(3, 30);
        assert_eq!(evicted, Some((2, 20)));
        assert_eq!(tlb.lookup(1), Some(10));
        assert_eq!(tlb.lookup(3), Some(30));
        assert_eq!(tlb.lookup(2), None);
    }
}
