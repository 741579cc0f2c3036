#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod entry_arena;

mod error;

pub mod hash;

/// A byte-keyed cache with random eviction.
///
/// This module provides a `HashCache` that wraps the `HashTable` and adds
/// `evict_random`, which removes the chain head nearest to a random bucket.
/// It costs a random draw and, at normal load factors, a short scan.
pub mod hash_cache;

pub mod hash_table;

pub use entry_arena::EntryArena;
pub use entry_arena::NodeHandle;
pub use error::Error;
pub use hash::DefaultKeyHasher;
pub use hash::KeyHasher;
pub use hash_cache::HashCache;
pub use hash_table::Config;
pub use hash_table::HashTable;
pub use hash_table::Stats;
