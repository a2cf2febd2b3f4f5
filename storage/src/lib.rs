#![deny(missing_docs)]

//! Storage abstraction for Merkle tree stores: an environment of named
//! keyspaces with one exclusive writer and any number of snapshot readers.

mod error;
#[cfg(feature = "rocksdb_storage")]
pub mod rocksdb_storage;
mod storage;

pub use crate::{
    error::Error,
    storage::{build_prefix, Keyspace, KeyspaceKind, RawIterator, SubtreePrefix, TransactionRead},
};
#[cfg(feature = "rocksdb_storage")]
pub use crate::rocksdb_storage::{Environment, EnvironmentConfig, ReadTransaction, WriteTransaction};
