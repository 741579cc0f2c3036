//! Block-pooled storage for fixed-layout records.
//!
//! An [`EntryArena`] hands out slots from blocks of `block_size` records that
//! are allocated together. Every block threads its unused slots through an
//! intrusive free list of slot indices, and the arena threads the blocks that
//! still have a free slot through a chain of block indices. Acquiring and
//! releasing a record never touches the general-purpose allocator except when
//! a brand new block is needed.
//!
//! Records are named by a [`NodeHandle`], a `(block, slot)` index pair. A
//! handle is how a released record finds its way back to the free list of the
//! block it came from.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::Index;
use core::ops::IndexMut;

/// Block size used when none (or zero) is configured.
pub const DEFAULT_BLOCK_SIZE: usize = 64;

/// Identifies a record held by an [`EntryArena`].
///
/// Handles are plain indices. Using a handle after its record was released,
/// or with an arena it did not come from, panics or names an unrelated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    block: u32,
    slot: u32,
}

impl NodeHandle {
    /// Index of the block holding the record.
    pub fn block(&self) -> usize {
        self.block as usize
    }

    /// Index of the record inside its block.
    pub fn slot(&self) -> usize {
        self.slot as usize
    }
}

#[derive(Clone)]
enum Slot<T> {
    Vacant { next_free: Option<u32> },
    Occupied(T),
}

#[derive(Clone)]
struct EntryBlock<T> {
    slots: Box<[Slot<T>]>,
    free_head: Option<u32>,
    next_block: Option<u32>,
}

impl<T> EntryBlock<T> {
    fn new(block_size: usize) -> Self {
        let mut block = Self {
            slots: (0..block_size)
                .map(|_| Slot::Vacant { next_free: None })
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            free_head: None,
            next_block: None,
        };
        block.reset();
        block
    }

    /// Marks every slot vacant, threaded in index order.
    fn reset(&mut self) {
        let size = self.slots.len();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            *slot = Slot::Vacant {
                next_free: if i + 1 < size {
                    Some((i + 1) as u32)
                } else {
                    None
                },
            };
        }
        self.free_head = if size == 0 { None } else { Some(0) };
    }
}

/// A pool of records organized as linked blocks with per-block free lists.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::EntryArena;
/// #
/// let mut arena = EntryArena::with_block_size(2);
/// let a = arena.acquire("a");
/// let b = arena.acquire("b");
/// assert_eq!(arena.total_count(), 2);
/// assert_eq!(arena.free_count(), 0);
///
/// assert_eq!(arena.release(b), "b");
/// assert_eq!(arena[a], "a");
/// assert_eq!(arena.free_count(), 1);
/// ```
#[derive(Clone)]
pub struct EntryArena<T> {
    blocks: Vec<EntryBlock<T>>,
    block_size: usize,
    total_count: usize,
    free_count: usize,
    free_block: Option<u32>,
}

impl<T> Default for EntryArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for EntryArena<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntryArena")
            .field("block_size", &self.block_size)
            .field("blocks", &self.blocks.len())
            .field("total_count", &self.total_count)
            .field("free_count", &self.free_count)
            .field("free_block", &self.free_block)
            .finish()
    }
}

impl<T> EntryArena<T> {
    /// Creates an empty arena using [`DEFAULT_BLOCK_SIZE`].
    ///
    /// No block is allocated until the first [`acquire`](Self::acquire).
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Creates an empty arena whose blocks hold `block_size` records.
    ///
    /// A `block_size` of zero selects [`DEFAULT_BLOCK_SIZE`].
    pub fn with_block_size(block_size: usize) -> Self {
        let block_size = if block_size == 0 {
            DEFAULT_BLOCK_SIZE
        } else {
            block_size.min(u32::MAX as usize)
        };

        Self {
            blocks: Vec::new(),
            block_size,
            total_count: 0,
            free_count: 0,
            free_block: None,
        }
    }

    /// Number of records each block holds.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of blocks ever created. Blocks are never returned.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total number of slots across all blocks.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Number of slots not currently holding a record.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.total_count - self.free_count
    }

    /// Returns `true` if no record is currently held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `record` in a free slot and returns its handle.
    ///
    /// Slots come from the first block on the free-block chain. A new block is
    /// created and placed at the front of the chain when no block has a free
    /// slot. A block is unlinked from the chain as soon as its last free slot
    /// is taken.
    pub fn acquire(&mut self, record: T) -> NodeHandle {
        let block_index = match self.free_block {
            Some(index) => index,
            None => self.push_block(),
        };

        let block = &mut self.blocks[block_index as usize];
        let slot_index = block
            .free_head
            .expect("block on the free-block chain has no free slot");

        let slot = &mut block.slots[slot_index as usize];
        let next_free = match slot {
            Slot::Vacant { next_free } => *next_free,
            Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
        };
        *slot = Slot::Occupied(record);

        block.free_head = next_free;
        if next_free.is_none() {
            self.free_block = block.next_block.take();
        }
        self.free_count -= 1;

        NodeHandle {
            block: block_index,
            slot: slot_index,
        }
    }

    /// Removes the record named by `handle` and returns it.
    ///
    /// The slot goes to the head of its own block's free list. A block that
    /// was full before this call is relinked at the front of the free-block
    /// chain.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not name a record currently held by this arena.
    pub fn release(&mut self, handle: NodeHandle) -> T {
        let Some(block) = self.blocks.get_mut(handle.block as usize) else {
            panic!("released a vacant arena slot: {:?}", handle);
        };
        let was_full = block.free_head.is_none();

        let Some(slot) = block.slots.get_mut(handle.slot as usize) else {
            panic!("released a vacant arena slot: {:?}", handle);
        };
        let record = match core::mem::replace(
            slot,
            Slot::Vacant {
                next_free: block.free_head,
            },
        ) {
            Slot::Occupied(record) => record,
            Slot::Vacant { next_free } => {
                *slot = Slot::Vacant { next_free };
                panic!("released a vacant arena slot: {:?}", handle);
            }
        };
        block.free_head = Some(handle.slot);

        if was_full {
            block.next_block = self.free_block;
            self.free_block = Some(handle.block);
        }
        self.free_count += 1;

        record
    }

    /// Returns the record named by `handle`, if it is held.
    pub fn get(&self, handle: NodeHandle) -> Option<&T> {
        match self
            .blocks
            .get(handle.block as usize)?
            .slots
            .get(handle.slot as usize)?
        {
            Slot::Occupied(record) => Some(record),
            Slot::Vacant { .. } => None,
        }
    }

    /// Returns the record named by `handle` mutably, if it is held.
    pub fn get_mut(&mut self, handle: NodeHandle) -> Option<&mut T> {
        match self
            .blocks
            .get_mut(handle.block as usize)?
            .slots
            .get_mut(handle.slot as usize)?
        {
            Slot::Occupied(record) => Some(record),
            Slot::Vacant { .. } => None,
        }
    }

    /// Drops every held record and threads all slots back into their free
    /// lists. Blocks are kept.
    pub fn clear(&mut self) {
        self.free_block = None;
        for (index, block) in self.blocks.iter_mut().enumerate().rev() {
            block.reset();
            block.next_block = self.free_block;
            self.free_block = Some(index as u32);
        }
        self.free_count = self.total_count;
    }

    /// Lines describing the arena's occupancy.
    ///
    /// The first two lines report the totals. Then, for every block on the
    /// free-block chain in chain order, one line names the block and one line
    /// per free slot follows in free-list order. Lines only mention indices, so
    /// two arenas with the same free-list topology produce the same output.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::EntryArena;
    /// #
    /// let mut arena = EntryArena::with_block_size(2);
    /// let handle = arena.acquire(1u32);
    /// let lines: Vec<String> = arena.stats().collect();
    /// assert_eq!(lines[0], "total_count : 2");
    /// assert_eq!(lines[1], "free_count  : 1");
    /// # arena.release(handle);
    /// ```
    pub fn stats(&self) -> StatsLines<'_, T> {
        StatsLines {
            arena: self,
            state: StatsState::Total,
        }
    }

    fn push_block(&mut self) -> u32 {
        let index = u32::try_from(self.blocks.len()).expect("entry arena block count overflow");
        let mut block = EntryBlock::new(self.block_size);
        block.next_block = self.free_block;
        self.blocks.push(block);

        self.free_block = Some(index);
        self.total_count += self.block_size;
        self.free_count += self.block_size;

        tracing::trace!(
            block = index,
            block_size = self.block_size,
            total_count = self.total_count,
            "entry arena grew"
        );

        index
    }
}

impl<T> Index<NodeHandle> for EntryArena<T> {
    type Output = T;

    fn index(&self, handle: NodeHandle) -> &T {
        match self.get(handle) {
            Some(record) => record,
            None => panic!("stale arena handle: {:?}", handle),
        }
    }
}

impl<T> IndexMut<NodeHandle> for EntryArena<T> {
    fn index_mut(&mut self, handle: NodeHandle) -> &mut T {
        match self.get_mut(handle) {
            Some(record) => record,
            None => panic!("stale arena handle: {:?}", handle),
        }
    }
}

enum StatsState {
    Total,
    Free,
    Block {
        position: usize,
        block: u32,
    },
    Slot {
        position: usize,
        block: u32,
        nth: usize,
        slot: u32,
    },
    Done,
}

/// Iterator over the occupancy lines of an [`EntryArena`].
///
/// This struct is created by [`EntryArena::stats`].
pub struct StatsLines<'a, T> {
    arena: &'a EntryArena<T>,
    state: StatsState,
}

impl<T> StatsLines<'_, T> {
    fn block_state(&self, position: usize, block: Option<u32>) -> StatsState {
        match block {
            Some(block) => StatsState::Block { position, block },
            None => StatsState::Done,
        }
    }

    fn after_slot(&self, position: usize, block: u32, nth: usize, next: Option<u32>) -> StatsState {
        match next {
            Some(slot) => StatsState::Slot {
                position,
                block,
                nth: nth + 1,
                slot,
            },
            None => self.block_state(
                position + 1,
                self.arena.blocks[block as usize].next_block,
            ),
        }
    }
}

impl<T> Iterator for StatsLines<'_, T> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let (line, next_state) = match self.state {
            StatsState::Total => (
                format!("total_count : {}", self.arena.total_count),
                StatsState::Free,
            ),
            StatsState::Free => (
                format!("free_count  : {}", self.arena.free_count),
                self.block_state(1, self.arena.free_block),
            ),
            StatsState::Block { position, block } => {
                let entry_block = &self.arena.blocks[block as usize];
                let next_state = match entry_block.free_head {
                    Some(slot) => StatsState::Slot {
                        position,
                        block,
                        nth: 1,
                        slot,
                    },
                    None => self.block_state(position + 1, entry_block.next_block),
                };
                (
                    format!("EntryBlock[{:3}]     : block {}", position, block),
                    next_state,
                )
            }
            StatsState::Slot {
                position,
                block,
                nth,
                slot,
            } => {
                let next_free = match self.arena.blocks[block as usize].slots[slot as usize] {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => None,
                };
                (
                    format!("     Entry[{:3}][{:3}]: slot {}", position, nth, slot),
                    self.after_slot(position, block, nth, next_free),
                )
            }
            StatsState::Done => return None,
        };

        self.state = next_state;
        Some(line)
    }
}
