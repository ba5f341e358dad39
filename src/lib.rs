#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod config;
mod error;
mod macros;

pub mod index;

pub mod hasher;

pub mod hash_table;

/// A key-value map over the Robin Hood table.
///
/// This module provides [`RobinMap`], which pairs a [`HashTable`] with a
/// [`KeyHasher`] and a per-map seed, together with its entry and iterator
/// types.
pub mod hash_map;

pub mod slot;

pub mod stable_map;

pub use config::DEFAULT_LOAD_FACTOR;
pub use config::DEFAULT_SEED;
pub use config::TableConfig;
pub use error::TryReserveError;
pub use hash_map::Entry;
pub use hash_map::RobinMap;
pub use hash_table::HashTable;
pub use hasher::DefaultKeyHasher;
pub use hasher::KeyHasher;
pub use index::GrowthPolicy;
pub use stable_map::StableMap;
