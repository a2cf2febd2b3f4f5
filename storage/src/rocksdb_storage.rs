//! Storage layer implemented over RocksDB backend.
mod environment;
mod raw_iterator;
pub mod test_utils;
mod transaction;

pub use environment::{Environment, EnvironmentConfig};
pub use raw_iterator::PrefixedRocksDbRawIterator;
pub use transaction::{ReadTransaction, WriteTransaction};
