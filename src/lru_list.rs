//! An arena-backed doubly-linked list used by the fully-associative TLB's
//! LRU queue. Per the component design, this is a fixed-capacity list
//! over `0..capacity` slot indices -- no allocation after construction,
//! no raw pointers, just `Option<u32>` links into a `Vec`.

#[derive(Debug, Clone, Copy)]
struct Node {
    prev: Option<u32>,
    next: Option<u32>,
}

/// Tracks recency order over a fixed set of slot indices `0..capacity`.
/// `mru()` (internally `head`, `prev == None`) is most-recently-used;
/// `lru()` (internally `tail`, `next == None`) is least-recently-used
/// and the next eviction candidate.
pub struct LruList {
    nodes: Vec<Node>,
    head: Option<u32>,
    tail: Option<u32>,
}

impl LruList {
    /// Builds a list over `0..capacity`, ordered so slot 0 starts as LRU
    /// and `capacity - 1` starts as MRU. This matches the original's fill
    /// order for the fully-associative TLB: the first 128 misses consume
    /// slots 0, 1, 2, ... in turn via repeated `lru()` lookups.
    pub fn new(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity);
        for i in 0..capacity as u32 {
            nodes.push(Node {
                prev: if i + 1 == capacity as u32 { None } else { Some(i + 1) },
                next: if i == 0 { None } else { Some(i - 1) },
            });
        }
        let head = if capacity == 0 { None } else { Some(capacity as u32 - 1) };
        let tail = if capacity == 0 { None } else { Some(0) };
        LruList { nodes, head, tail }
    }

    fn unlink(&mut self, index: u32) {
        let (prev, next) = {
            let node = self.nodes[index as usize];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n as usize].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, index: u32) {
        self.nodes[index as usize].prev = None;
        self.nodes[index as usize].next = self.head;
        if let Some(h) = self.head {
            self.nodes[h as usize].prev = Some(index);
        }
        self.head = Some(index);
        if self.tail.is_none() {
            self.tail = Some(index);
        }
    }

    /// Marks `index` as most recently used.
    pub fn touch(&mut self, index: u32) {
        if self.head == Some(index) {
            return;
        }
        self.unlink(index);
        self.push_front(index);
    }

    /// The least recently used slot -- the next eviction victim.
    pub fn lru(&self) -> Option<u32> {
        self.tail
    }

    /// The most recently used slot.
    pub fn mru(&self) -> Option<u32> {
        self.head
    }

    /// Iterates slot indices from most to least recently used.
    pub fn iter_mru(&self) -> impl Iterator<Item = u32> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let current = cursor?;
            cursor = self.nodes[current as usize].next;
            Some(current)
        })
    }
}
